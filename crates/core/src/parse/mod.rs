//! Line-oriented parsing of pasted report text.
//!
//! Input is first cut into blocks by a [`Segmenter`], then every block is parsed
//! on its own. A block that does not produce a valid record is dropped and
//! counted; it never stops the rest of the batch.

/// Author report parsing.
pub mod authors;
/// Mod report parsing.
pub mod mods;
mod segment;

use once_cell::sync::Lazy;
use regex::Regex;

pub use authors::{parse_author_block, parse_author_reports, parse_author_reports_with};
pub use mods::{parse_mod_block, parse_mod_reports, parse_mod_reports_with};
pub use segment::{segment, Boundary, Segmenter};

/// Records parsed from one batch of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome<T> {
    /// Valid records in input order.
    pub records: Vec<T>,
    /// Number of non-empty blocks that did not yield a record.
    pub dropped: usize,
}

impl<T> Default for ParseOutcome<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            dropped: 0,
        }
    }
}

impl<T> ParseOutcome<T> {
    /// True when no valid record was found.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of valid records.
    pub fn len(&self) -> usize {
        self.records.len()
    }
}

/// Split a `Key: Value` line. The key must start the line; `scheme://` is not a key.
pub(crate) fn split_key_value(line: &str) -> Option<(&str, &str)> {
    static KEY_VALUE_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^(\S[^:]*):(.*)$").expect("invalid key/value regex"));

    let caps = KEY_VALUE_RE.captures(line)?;
    let key = caps.get(1)?.as_str();
    let value = caps.get(2)?.as_str();
    if value.starts_with("//") {
        return None;
    }
    Some((key.trim(), value.trim()))
}

/// Normalise an optional value: `-`, empty and any casing of `null` mean "none".
pub(crate) fn normalize_optional(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() || value == "-" || value.eq_ignore_ascii_case("null") {
        None
    } else {
        Some(value.to_string())
    }
}

pub(crate) fn is_indented(line: &str) -> bool {
    line.starts_with(' ') || line.starts_with('\t')
}
