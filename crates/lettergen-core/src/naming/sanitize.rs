//! Filesystem-safe base names

use crate::config::consts::naming::MAX_STEM_CHARS;

const ILLEGAL: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

const RESERVED: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Name used when a row has no usable filename value
pub fn fallback_name(index: usize) -> String {
    format!("row_{}", index)
}

/// Turn a raw field value into a portable file stem
///
/// Returns `None` when nothing usable is left.
pub fn sanitize(raw: &str) -> Option<String> {
    let mut cleaned = String::with_capacity(raw.len());
    let mut in_illegal_run = false;
    for c in raw.chars() {
        if ILLEGAL.contains(&c) || c.is_ascii_control() {
            if !in_illegal_run {
                cleaned.push('_');
                in_illegal_run = true;
            }
        } else {
            cleaned.push(c);
            in_illegal_run = false;
        }
    }

    let trimmed = trim_dots_and_spaces(&cleaned);
    let truncated = truncate_chars(trimmed, MAX_STEM_CHARS);
    // Truncation can expose a trailing dot or space again
    let mut stem = trim_dots_and_spaces(truncated).to_string();

    if stem.is_empty() {
        return None;
    }
    if is_reserved(&stem) {
        stem.push('_');
    }
    Some(stem)
}

fn trim_dots_and_spaces(s: &str) -> &str {
    s.trim_matches(|c| c == '.' || c == ' ')
}

/// Prefix of `s` holding at most `max` characters
pub(crate) fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((byte, _)) => &s[..byte],
        None => s,
    }
}

/// Windows device names are reserved with or without an extension
fn is_reserved(stem: &str) -> bool {
    let device = stem.split('.').next().unwrap_or(stem).trim_end();
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(device))
}
