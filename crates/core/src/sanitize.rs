//! Text clean-up applied to report fields and to documents before they are written.
//!
//! Text pasted from rich-text sources can carry invisible filler characters
//! (most commonly U+3164 HANGUL FILLER). Those are stripped from every string,
//! and values that only ever meant "nothing" are turned into JSON `null`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{AuthorReport, LabelDetails, ModReport};

/// U+3164, the filler character that slips in from rich-text pastes.
pub const HANGUL_FILLER: char = '\u{3164}';

/// Configurable sanitisation rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sanitizer {
    /// Characters removed from every string value.
    #[serde(default = "default_invisible_chars")]
    pub invisible_chars: Vec<char>,
    /// Treat the case-insensitive string `"null"` as JSON `null`.
    #[serde(default = "default_true")]
    pub null_literals: bool,
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self {
            invisible_chars: default_invisible_chars(),
            null_literals: true,
        }
    }
}

fn default_invisible_chars() -> Vec<char> {
    vec![HANGUL_FILLER]
}

fn default_true() -> bool {
    true
}

impl Sanitizer {
    /// Remove the configured invisible characters.
    pub fn strip(&self, value: &str) -> String {
        value
            .chars()
            .filter(|ch| !self.invisible_chars.contains(ch))
            .collect()
    }

    /// Whether `value` should be written as JSON `null`.
    ///
    /// True for the `"null"` literal (when enabled) and for non-empty strings made up
    /// solely of invisible characters.
    pub fn is_null_like(&self, value: &str) -> bool {
        if self.null_literals && value.trim().eq_ignore_ascii_case("null") {
            return true;
        }
        !value.is_empty() && value.chars().all(|ch| self.invisible_chars.contains(&ch))
    }

    /// Clean a required field: strip invisible characters and surrounding whitespace.
    pub fn clean(&self, value: &str) -> String {
        self.strip(value).trim().to_string()
    }

    /// Clean an optional field, collapsing null-like and empty values to `None`.
    pub fn clean_optional(&self, value: Option<&str>) -> Option<String> {
        let value = value?;
        if self.is_null_like(value) {
            return None;
        }
        Some(self.clean(value)).filter(|cleaned| !cleaned.is_empty())
    }

    /// Sanitise every string field of a mod report.
    pub fn mod_report(&self, report: &ModReport) -> ModReport {
        ModReport {
            game: self.clean(&report.game),
            mod_id: self.clean(&report.mod_id),
            status: self.clean(&report.status),
            reason: self.clean_optional(report.reason.as_deref()),
            alternative: self.clean_optional(report.alternative.as_deref()),
        }
    }

    /// Sanitise every string field of an author report, including label names.
    pub fn author_report(&self, report: &AuthorReport) -> AuthorReport {
        AuthorReport {
            username: self.clean(&report.username),
            label_list: report
                .label_list
                .iter()
                .map(|label| self.clean(label))
                .filter(|label| !label.is_empty())
                .collect(),
            labels: report
                .labels
                .iter()
                .map(|(name, details)| {
                    let details = LabelDetails {
                        description: self.clean_optional(details.description.as_deref()),
                        reference_link: self.clean_optional(details.reference_link.as_deref()),
                    };
                    (self.clean(name), details)
                })
                .collect(),
        }
    }

    /// Walk a JSON tree in place before it is written.
    ///
    /// Object values that are null-like become `null`; every other string has the
    /// invisible characters stripped. Array elements are only stripped, so id lists
    /// keep their shape.
    pub fn sanitize_value(&self, value: &mut Value) {
        match value {
            Value::Object(map) => {
                for entry in map.values_mut() {
                    if matches!(entry, Value::String(text) if self.is_null_like(text)) {
                        *entry = Value::Null;
                    } else {
                        self.sanitize_value(entry);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|item| self.sanitize_value(item)),
            Value::String(text) => {
                if text.chars().any(|ch| self.invisible_chars.contains(&ch)) {
                    *text = self.strip(text);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_like_values() {
        let sanitizer = Sanitizer::default();
        assert!(sanitizer.is_null_like("null"));
        assert!(sanitizer.is_null_like("NULL"));
        assert!(sanitizer.is_null_like("\u{3164}"));
        assert!(sanitizer.is_null_like("\u{3164}\u{3164}"));
        assert!(!sanitizer.is_null_like(""));
        assert!(!sanitizer.is_null_like("nullable"));

        let literal_off = Sanitizer {
            null_literals: false,
            ..Sanitizer::default()
        };
        assert!(!literal_off.is_null_like("null"));
        assert!(literal_off.is_null_like("\u{3164}"));
    }

    #[test]
    fn cleans_report_fields() {
        let report = ModReport::new(" bg3\u{3164}", "12", "BROKEN")
            .with_reason("crashes\u{3164} on load ")
            .with_alternative("\u{3164}");
        let cleaned = Sanitizer::default().mod_report(&report);

        assert_eq!(cleaned.game, "bg3");
        assert_eq!(cleaned.reason.as_deref(), Some("crashes on load"));
        assert_eq!(cleaned.alternative, None);
    }

    #[test]
    fn sanitizes_json_tree() {
        let mut value = json!({
            "Tooltips": {
                "someone": {
                    "Bug Ignorer": {"label": "Null", "referenceLink": "https://x\u{3164}"}
                }
            },
            "ids": ["1\u{3164}", "null"],
            "count": 3
        });
        Sanitizer::default().sanitize_value(&mut value);

        assert_eq!(
            value,
            json!({
                "Tooltips": {
                    "someone": {
                        "Bug Ignorer": {"label": null, "referenceLink": "https://x"}
                    }
                },
                "ids": ["1", "null"],
                "count": 3
            })
        );
    }

    #[test]
    fn custom_invisible_set() {
        let sanitizer = Sanitizer {
            invisible_chars: vec!['\u{200B}'],
            null_literals: true,
        };
        assert_eq!(sanitizer.strip("a\u{200B}b\u{3164}"), "ab\u{3164}");
    }
}
