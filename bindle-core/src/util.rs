use std::borrow::Cow;

const TRUNCATE_AT: usize = 497;

/// Shortens long text (queries, string values) for logs and error messages.
pub fn truncate_long(text: &str) -> Cow<'_, str> {
    if text.len() <= TRUNCATE_AT {
        return Cow::Borrowed(text.trim_end());
    }
    let mut end = TRUNCATE_AT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    Cow::Owned(format!("{}...", text[..end].trim_end()))
}
