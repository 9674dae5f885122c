//! Template engine implementation
//!
//! Templates are compiled once into a flat list of text and field segments;
//! rendering a row is then a single pass over the segments with no parsing.

mod tokenize;

use crate::template::error::TemplateError;
use std::collections::BTreeMap;

use tokenize::{Token, TokenStream};

/// Field values visible to one rendering call
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    fields: &'a BTreeMap<String, String>,
}

impl<'a> RenderContext<'a> {
    pub fn new(fields: &'a BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> Option<&'a str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// A `{{ field | filter ... }}` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub required: bool,
    pub raw: bool,
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Placeholder),
}

/// A template parsed into segments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledTemplate {
    segments: Vec<Segment>,
}

impl CompiledTemplate {
    /// Parse template text, validating every placeholder
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut compiled = CompiledTemplate::default();
        let mut cursor = 0;
        let mut stream = TokenStream::new(source);

        for token in stream.by_ref() {
            compiled.push_text(&source[cursor..token.lead_start()]);
            // Each pair of backslashes collapses to one literal backslash
            for _ in 0..token.backslash_count / 2 {
                compiled.push_text("\\");
            }

            if token.is_escaped() {
                compiled.push_text(&source[token.start..token.end()]);
            } else {
                let placeholder = parse_placeholder(&token)?;
                compiled.segments.push(Segment::Field(placeholder));
            }
            cursor = token.end();
        }

        if let Some(line) = stream.unclosed_line() {
            return Err(TemplateError::MalformedSyntax {
                message: "Unclosed placeholder, expected '}}'".to_string(),
                line,
            });
        }

        compiled.push_text(&source[cursor..]);
        Ok(compiled)
    }

    fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.segments.last_mut() {
            Some(Segment::Text(existing)) => existing.push_str(text),
            _ => self.segments.push(Segment::Text(text.to_string())),
        }
    }

    /// Substitute the context into the template
    pub fn render(&self, context: &RenderContext<'_>) -> Result<String, TemplateError> {
        let mut output = String::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => output.push_str(text),
                Segment::Field(placeholder) => {
                    let value = context.get(&placeholder.name).unwrap_or("");
                    if placeholder.required && value.trim().is_empty() {
                        return Err(TemplateError::MissingRequiredField {
                            field: placeholder.name.clone(),
                            line: placeholder.line,
                        });
                    }
                    if placeholder.raw {
                        output.push_str(value);
                    } else {
                        push_escaped(&mut output, value);
                    }
                }
            }
        }

        Ok(output)
    }

    /// Placeholders in template order, including repeats
    pub fn placeholders(&self) -> impl Iterator<Item = &Placeholder> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Field(placeholder) => Some(placeholder),
            Segment::Text(_) => None,
        })
    }

    /// Distinct field names in first-appearance order
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for placeholder in self.placeholders() {
            if !fields.contains(&placeholder.name) {
                fields.push(placeholder.name.clone());
            }
        }
        fields
    }

    /// Distinct field names marked `required` anywhere in the template
    pub fn required_fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = Vec::new();
        for placeholder in self.placeholders().filter(|p| p.required) {
            if !fields.contains(&placeholder.name) {
                fields.push(placeholder.name.clone());
            }
        }
        fields
    }
}

/// Parse `name | filter | filter` inside a token
fn parse_placeholder(token: &Token) -> Result<Placeholder, TemplateError> {
    let mut parts = token.content.split('|').map(str::trim);
    let name = parts.next().unwrap_or_default();

    if name.is_empty() {
        return Err(TemplateError::MalformedSyntax {
            message: "Empty placeholder, expected a field name".to_string(),
            line: token.line,
        });
    }

    let mut placeholder = Placeholder {
        name: name.to_string(),
        required: false,
        raw: false,
        line: token.line,
    };

    for filter in parts {
        match filter {
            "required" => placeholder.required = true,
            "raw" => placeholder.raw = true,
            "" => {
                return Err(TemplateError::MalformedSyntax {
                    message: format!("Empty filter in '{{{{{}}}}}'", token.content.trim()),
                    line: token.line,
                });
            }
            other => {
                return Err(TemplateError::MalformedSyntax {
                    message: format!(
                        "Unknown filter '{}' for field '{}', expected 'required' or 'raw'",
                        other, placeholder.name
                    ),
                    line: token.line,
                });
            }
        }
    }

    Ok(placeholder)
}

/// HTML-escape a substituted value
fn push_escaped(output: &mut String, value: &str) {
    for c in value.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&quot;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }
}

/// Compile and render in one step
pub fn render(template: &str, context: &RenderContext<'_>) -> Result<String, TemplateError> {
    CompiledTemplate::compile(template)?.render(context)
}

#[cfg(test)]
mod tests;
