//! Error handling tests for template engine

use super::helpers::letter_fields;
use super::*;

#[test]
fn test_error_malformed_unclosed_placeholder() {
    let fields = letter_fields();
    let result = render("Value: {{name", &RenderContext::new(&fields));
    match result {
        Err(TemplateError::MalformedSyntax { message, line }) => {
            assert!(message.contains("Unclosed"));
            assert_eq!(line, 1);
        }
        _ => panic!("Expected MalformedSyntax error"),
    }
}

#[test]
fn test_error_unclosed_reports_opening_line() {
    let result = CompiledTemplate::compile("a\nb {{ name\nc\nd");
    match result {
        Err(TemplateError::MalformedSyntax { line, .. }) => assert_eq!(line, 2),
        _ => panic!("Expected MalformedSyntax error"),
    }
}

#[test]
fn test_error_empty_placeholder() {
    let result = CompiledTemplate::compile("<p>{{   }}</p>");
    match result {
        Err(TemplateError::MalformedSyntax { message, .. }) => {
            assert!(message.contains("Empty placeholder"));
        }
        _ => panic!("Expected MalformedSyntax error"),
    }
}

#[test]
fn test_error_unknown_filter() {
    let result = CompiledTemplate::compile("{{ name | upper }}");
    match result {
        Err(TemplateError::MalformedSyntax { message, .. }) => {
            assert!(message.contains("upper"));
        }
        _ => panic!("Expected MalformedSyntax error"),
    }
}

#[test]
fn test_error_empty_filter() {
    let result = CompiledTemplate::compile("{{ name | }}");
    assert!(matches!(result, Err(TemplateError::MalformedSyntax { .. })));
}

#[test]
fn test_error_is_raised_at_compile_time() {
    // A malformed template fails before any context is involved
    assert!(CompiledTemplate::compile("{{ ok }} {{ | required }}").is_err());
}
