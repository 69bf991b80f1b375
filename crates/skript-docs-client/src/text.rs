use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const UNKNOWN_SENTINEL: &str = "unknown";

static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]{2,8});").expect("valid entity regex")
});

/// Normalizes a vendor version constraint.
///
/// `"unknown"` (any case) means no constraint; a value starting with it keeps
/// only the remainder, e.g. `"Unknown (vault required)"` becomes `"(vault required)"`.
#[must_use]
pub fn normalize_addon_version(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(UNKNOWN_SENTINEL) {
        return None;
    }
    match trimmed.get(..UNKNOWN_SENTINEL.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(UNKNOWN_SENTINEL) => {
            let rest = trimmed[UNKNOWN_SENTINEL.len()..].trim();
            (!rest.is_empty()).then(|| rest.to_string())
        }
        _ => Some(trimmed.to_string()),
    }
}

/// Decodes the HTML entities vendors leave in patterns and examples.
///
/// Unknown named entities are left untouched.
#[must_use]
pub fn decode_html_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    ENTITY.replace_all(input, |captures: &Captures<'_>| {
        let body = &captures[1];
        let decoded = if let Some(hex) = body
            .strip_prefix("#x")
            .or_else(|| body.strip_prefix("#X"))
        {
            u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
        } else if let Some(decimal) = body.strip_prefix('#') {
            decimal.parse::<u32>().ok().and_then(char::from_u32)
        } else {
            named_entity(body)
        };
        decoded.map_or_else(|| captures[0].to_string(), String::from)
    })
}

fn named_entity(name: &str) -> Option<char> {
    let decoded = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => return None,
    };
    Some(decoded)
}
