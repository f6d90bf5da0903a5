//! Location string cleanup.
//!
//! Matching is plain substring search, so cleanup stays minimal: fold case
//! and turn the separators people use between city and country into spaces.

/// Separators replaced by a single space. Includes the full-width comma.
const SEPARATORS: &[char] = &['\n', ',', '，'];

/// Clean a raw profile location into the form the matcher expects.
///
/// `None` and `""` both yield `""`, which never matches anything.
pub fn normalize_location(raw: Option<&str>) -> String {
    match raw {
        Some(text) => text.to_lowercase().replace(SEPARATORS, " "),
        None => String::new(),
    }
}
