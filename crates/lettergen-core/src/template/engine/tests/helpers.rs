//! Shared test helpers for template engine tests

use std::collections::BTreeMap;

/// Letter fields as they come out of a CSV row
pub(super) fn letter_fields() -> BTreeMap<String, String> {
    [
        ("name", "Alice Martin"),
        ("amount", "1,250.00"),
        ("First Name", "Alice"),
        ("company", "Smith & Sons <Ltd>"),
        ("note", "<em>urgent</em>"),
        ("empty", ""),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}
