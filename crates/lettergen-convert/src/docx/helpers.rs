//! Helper functions for reading HTML attributes

use markup5ever::Attribute;
use std::cell::RefCell;

/// Gets attribute value by name from element attributes
pub fn get_attr(attrs: &RefCell<Vec<Attribute>>, name: &str) -> Option<String> {
    attrs
        .borrow()
        .iter()
        .find(|attr| attr.name.local.as_ref() == name)
        .map(|attr| attr.value.to_string())
}

/// Value of one declaration in an inline `style` attribute
///
/// The last declaration wins, as in CSS.
pub fn style_property(attrs: &RefCell<Vec<Attribute>>, property: &str) -> Option<String> {
    let style = get_attr(attrs, "style")?;
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| {
            value
                .trim()
                .trim_end_matches("!important")
                .trim()
                .to_ascii_lowercase()
        })
        .last()
}

/// Pixel length from an HTML dimension (`120`, `120px`); percentages are ignored
pub fn parse_px(value: &str) -> Option<f64> {
    let value = value.trim();
    let number = value.strip_suffix("px").unwrap_or(value).trim();
    number.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}
