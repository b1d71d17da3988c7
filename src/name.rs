//! Name normalization shared by command paths, parameter names, and
//! enumeration members, plus the quote-aware splitting used by the
//! tuple/list/builder token grammars.

use crate::error::SpecError;

/// Normalizes a single name: lowercase, leading/trailing `_` runs stripped,
/// each remaining `_` turned into `-`.
///
/// A name that has nothing left but dashes is rejected.
pub fn normalize_word(raw: &str) -> Result<String, SpecError> {
    normalize(raw, false)
}

/// Normalizes a raw dotted path into its segments.
///
/// The two-character hierarchy marker `__` delimits segments; each segment is
/// normalized with the same rule as [`normalize_word`]. The display path is
/// the segments joined by a single space.
pub fn normalize_path(raw: &str) -> Result<Vec<String>, SpecError> {
    let joined = normalize(raw, true)?;
    Ok(joined.split(' ').map(str::to_string).collect())
}

fn normalize(raw: &str, segments: bool) -> Result<String, SpecError> {
    let lower = raw.to_lowercase();
    let stripped = lower.trim_matches('_');
    let spaced = if segments { stripped.replace("__", " ") } else { stripped.to_string() };
    let result = spaced.replace('_', "-");
    if result.trim_matches(|c| c == '-' || c == ' ').is_empty() {
        return Err(SpecError::EmptyName { raw: raw.to_string() });
    }
    Ok(result)
}

/// Splits `text` at `delimiter`, except where the delimiter is inside a pair
/// of matching quote characters (either `'` or `"`). The quotes are kept; use
/// [`unwrap_quotes`] on the pieces.
pub(crate) fn split_unquoted(text: &str, delimiter: char) -> Vec<String> {
    let mut result = Vec::new();
    let mut acc = String::new();
    let mut quote: Option<char> = None;
    for c in text.chars() {
        if c == delimiter && quote.is_none() {
            result.push(std::mem::take(&mut acc));
            continue;
        }
        if c == '\'' || c == '"' {
            match quote {
                None => quote = Some(c),
                Some(q) if q == c => quote = None,
                Some(_) => {}
            }
        }
        acc.push(c);
    }
    result.push(acc);
    result
}

/// Removes one pair of wrapping quotes, if they match and are the first and
/// last character.
pub(crate) fn unwrap_quotes(s: &str) -> &str {
    if s.len() >= 2 {
        let first = s.as_bytes()[0];
        let last = s.as_bytes()[s.len() - 1];
        if first == last && (first == b'"' || first == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
