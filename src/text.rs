//! Helpful utilities for working with post text.

use htmlentity::entity::{self, ICodedDataTrait};

/// Converts HTML entities into their single-character equivalents.
///
/// The X API escapes "&" as "&amp;", ">" as "&gt;", and "<" as "&lt;"
/// in post text; this function converts those HTML entities back into
/// single, human-readable characters.
///
/// Leading and trailing whitespace will also be trimmed from the string.
///
/// # Examples
///
/// ```
/// use birdseye::text::convert_html_entities;
/// let raw = "shipping v2 &amp; loving it &lt;3";
/// let converted = convert_html_entities(raw);
/// assert_eq!(converted, "shipping v2 & loving it <3");
/// ```
///
/// ```
/// use birdseye::text::convert_html_entities;
/// let raw = "  &gt;be me&lt;  ";
/// let converted = convert_html_entities(raw);
/// assert_eq!(converted, ">be me<");
/// ```
///
/// ```
/// use birdseye::text::convert_html_entities;
/// let raw = "a plain post";
/// let converted = convert_html_entities(raw);
/// assert_eq!(converted, raw);
/// ```
pub fn convert_html_entities(text: &str) -> String {
    let text = text.trim();
    entity::decode(text.as_bytes())
        .to_string()
        .unwrap_or(text.to_string())
}

/// Collapses all runs of whitespace, newlines included, into single
/// spaces so a post body occupies a single logical table cell.
///
/// # Examples
///
/// ```
/// use birdseye::text::flatten_whitespace;
/// let raw = "line one\n\nline two\tindented";
/// assert_eq!(flatten_whitespace(raw), "line one line two indented");
/// ```
pub fn flatten_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
