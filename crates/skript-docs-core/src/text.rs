use once_cell::sync::Lazy;
use regex::Regex;

static MARKDOWN_SPECIAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\*_`~|>]").expect("valid markdown regex"));

/// Escapes chat markdown so user or vendor text renders literally.
#[must_use]
pub fn escape_markdown(input: &str) -> String {
    MARKDOWN_SPECIAL.replace_all(input, r"\$0").into_owned()
}

/// Breaks up backtick runs with zero-width spaces so content cannot close a code fence.
#[must_use]
pub fn escape_code_block_content(input: &str) -> String {
    input.replace('`', "`\u{200B}`\u{200B}`\u{200B}")
}

/// "A", "A and B", "A, B, and C".
#[must_use]
pub fn join_english_and<S: AsRef<str>>(parts: &[S]) -> String {
    join_english(parts, "and")
}

/// "A", "A or B", "A, B, or C".
#[must_use]
pub fn join_english_or<S: AsRef<str>>(parts: &[S]) -> String {
    join_english(parts, "or")
}

fn join_english<S: AsRef<str>>(parts: &[S], conjunction: &str) -> String {
    match parts {
        [] => String::new(),
        [only] => only.as_ref().to_string(),
        [first, second] => format!("{} {conjunction} {}", first.as_ref(), second.as_ref()),
        [head @ .., last] => {
            let head: Vec<&str> = head.iter().map(AsRef::as_ref).collect();
            format!("{}, {conjunction} {}", head.join(", "), last.as_ref())
        }
    }
}

/// First `max_chars` characters of `input`.
#[must_use]
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
    match input.char_indices().nth(max_chars) {
        Some((index, _)) => &input[..index],
        None => input,
    }
}

/// Clips `input` to `max_chars`, ending with `…` when anything was cut.
#[must_use]
pub fn clip_with_ellipsis(input: &str, max_chars: usize) -> String {
    if input.chars().count() <= max_chars {
        return input.to_string();
    }
    let mut clipped = truncate_chars(input, max_chars.saturating_sub(1)).to_string();
    clipped.push('…');
    clipped
}
