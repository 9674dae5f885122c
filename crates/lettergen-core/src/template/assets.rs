//! Relative asset resolution
//!
//! Rendered HTML is handed to converters that have no notion of the
//! template's location, so every relative asset reference is rewritten to an
//! absolute `file://` URL and a `<base>` tag is injected for anything the
//! rewrite does not reach.

use super::error::TemplateError;
use lol_html::html_content::ContentType;
use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use url::Url;

/// Rewrite relative references in `html` against `base`
pub fn resolve_assets(html: &str, base: &Url) -> Result<String, TemplateError> {
    let saw_head = Rc::new(Cell::new(false));
    let style_buffer = Rc::new(RefCell::new(String::new()));
    let base_tag = base_tag(base);

    let rewritten = rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("head", {
                    let saw_head = Rc::clone(&saw_head);
                    let base_tag = base_tag.clone();
                    move |el| {
                        if !saw_head.get() {
                            el.prepend(&base_tag, ContentType::Html);
                            saw_head.set(true);
                        }
                        Ok(())
                    }
                }),
                element!("[src]", move |el| {
                    if let Some(src) = el.get_attribute("src")
                        && let Some(resolved) = resolve_reference(&src, base)
                    {
                        el.set_attribute("src", &resolved)?;
                    }
                    Ok(())
                }),
                element!("link[href]", move |el| {
                    if let Some(href) = el.get_attribute("href")
                        && let Some(resolved) = resolve_reference(&href, base)
                    {
                        el.set_attribute("href", &resolved)?;
                    }
                    Ok(())
                }),
                element!("[style]", move |el| {
                    if let Some(style) = el.get_attribute("style") {
                        let rewritten = rewrite_css_urls(&style, base);
                        if rewritten != style {
                            el.set_attribute("style", &rewritten)?;
                        }
                    }
                    Ok(())
                }),
                text!("style", {
                    let style_buffer = Rc::clone(&style_buffer);
                    move |chunk| {
                        // Chunks of one text node are gathered so a url() split
                        // across chunk boundaries is still seen whole
                        let mut buffer = style_buffer.borrow_mut();
                        buffer.push_str(chunk.as_str());
                        if chunk.last_in_text_node() {
                            let css = rewrite_css_urls(&buffer, base);
                            chunk.replace(&css, ContentType::Html);
                            buffer.clear();
                        } else {
                            chunk.remove();
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| TemplateError::AssetRewrite {
        message: err.to_string(),
    })?;

    if saw_head.get() {
        Ok(rewritten)
    } else {
        Ok(insert_without_head(&rewritten, &base_tag))
    }
}

fn base_tag(base: &Url) -> String {
    format!("<base href=\"{}\">", base.as_str().replace('"', "%22"))
}

/// Place the base tag at the start of the document, after any doctype
fn insert_without_head(html: &str, base_tag: &str) -> String {
    let trimmed = html.trim_start();
    let lead = html.len() - trimmed.len();

    let is_doctype = trimmed
        .get(..9)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("<!doctype"));
    if is_doctype && let Some(close) = trimmed.find('>') {
        let split = lead + close + 1;
        return format!("{}{}{}", &html[..split], base_tag, &html[split..]);
    }

    format!("{}{}", base_tag, html)
}

/// Absolute URL for a relative reference, `None` when it must stay untouched
pub fn resolve_reference(reference: &str, base: &Url) -> Option<String> {
    let value = reference.trim();
    if value.is_empty() || value.starts_with('#') || value.starts_with('/') {
        return None;
    }
    if value.starts_with('\\') || has_scheme(value) {
        return None;
    }
    base.join(value).ok().map(String::from)
}

/// `scheme:` prefix per RFC 3986 (`http:`, `data:`, `mailto:`, ...)
fn has_scheme(value: &str) -> bool {
    let Some(colon) = value.find(':') else {
        return false;
    };
    let scheme = &value[..colon];
    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars
            .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '-' || c == '.'),
        _ => false,
    }
}

/// Rewrite every relative `url(...)` in a CSS fragment
pub fn rewrite_css_urls(css: &str, base: &Url) -> String {
    let mut output = String::with_capacity(css.len());
    let mut rest = css;

    while let Some(at) = find_ascii_case_insensitive(rest, "url(") {
        let open = at + 4;
        output.push_str(&rest[..open]);
        let after = &rest[open..];

        let Some(close) = after.find(')') else {
            output.push_str(after);
            return output;
        };

        let inner = &after[..close];
        let trimmed = inner.trim();
        let (quote, reference) = match trimmed.chars().next() {
            Some(q @ ('"' | '\'')) if trimmed.len() >= 2 && trimmed.ends_with(q) => {
                (Some(q), &trimmed[1..trimmed.len() - 1])
            }
            _ => (None, trimmed),
        };

        match resolve_reference(reference, base) {
            Some(resolved) => {
                let q = quote.map(String::from).unwrap_or_default();
                output.push_str(&format!("{q}{resolved}{q}"));
            }
            None => output.push_str(inner),
        }
        output.push(')');
        rest = &after[close + 1..];
    }

    output.push_str(rest);
    output
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}
