//! Accountant name extraction from free-text payment descriptions.
//!
//! Descriptions look like `"Bookkeeping for March - CPA Dana Levi"` or
//! `"ליווי עוסק מורשה - רו"ח אילן קאופמן"`: the accountant is whatever
//! follows the last dash or the last title marker.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::normalize::unify_punctuation;

/// RawName used when a description yields nothing.
pub const UNIDENTIFIED: &str = "unidentified";

/// Title markers that precede an accountant name, as whole words only:
/// "ICPA" or "CPAs" are not markers.
static TITLE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b(?:רו"ח|cpa)\b"#).expect("static regex"));

/// Extract the accountant RawName from a payment description.
///
/// Quote and dash variants are unified first. The cut point is the later of
/// the last `-` and the end of the last title marker; without either, the
/// whole trimmed description is the name.
pub fn accountant_from_description(description: &str) -> String {
    let text = unify_punctuation(description);

    let after_dash = text.rfind('-').map(|i| i + 1);
    let after_marker = TITLE_MARKER.find_iter(&text).last().map(|m| m.end());

    let start = after_dash.max(after_marker).unwrap_or(0);
    let name = text[start..].trim();

    if name.is_empty() {
        UNIDENTIFIED.to_string()
    } else {
        name.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
