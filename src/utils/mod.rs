/// Utility functions and helpers

/// Render a string as a single-quoted SQL literal.
///
/// The admin interface hands statements to SQLite, where the only escape
/// inside a literal is a doubled quote. Backslashes are kept as-is.
pub fn quote_literal(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            quoted.push('\'');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

/// Strip one level of single quotes added by [`quote_literal`]
pub fn unquote_literal(literal: &str) -> Option<String> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\'' {
            // a lone quote cannot appear inside a well-formed literal
            if chars.next() != Some('\'') {
                return None;
            }
        }
        value.push(ch);
    }
    Some(value)
}
