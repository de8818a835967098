//! Report records produced by the parser.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Statuses offered to moderators. Other values are accepted as free text.
pub const KNOWN_STATUSES: [&str; 5] = ["BROKEN", "LAME", "ABANDONED", "CAUTION", "INFORMATIVE"];

/// A moderator report flagging a single mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModReport {
    /// Game shortname as used in site URLs (e.g. `baldursgate3`).
    pub game: String,
    /// Mod identifier within the game.
    pub mod_id: String,
    /// Status bucket the mod is filed under.
    pub status: String,
    /// Optional free-text reason, possibly spanning several lines.
    pub reason: Option<String>,
    /// Link to a replacement mod; `None` means no alternative.
    pub alternative: Option<String>,
}

impl ModReport {
    /// Build a report with no reason and no alternative.
    pub fn new(
        game: impl Into<String>,
        mod_id: impl Into<String>,
        status: impl Into<String>,
    ) -> Self {
        Self {
            game: game.into(),
            mod_id: mod_id.into(),
            status: status.into(),
            reason: None,
            alternative: None,
        }
    }

    /// Attach a reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach an alternative link.
    pub fn with_alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternative = Some(alternative.into());
        self
    }

    /// Identity key of the report.
    pub fn key(&self) -> (&str, &str) {
        (&self.game, &self.mod_id)
    }

    /// Whether the status is one of [`KNOWN_STATUSES`].
    pub fn has_known_status(&self) -> bool {
        KNOWN_STATUSES.contains(&self.status.as_str())
    }

    /// Whether game, mod id and status are all non-empty.
    pub fn is_complete(&self) -> bool {
        !self.game.is_empty() && !self.mod_id.is_empty() && !self.status.is_empty()
    }
}

/// Tooltip details supplied for one label of an author report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelDetails {
    /// Descriptive text shown for the label.
    pub description: Option<String>,
    /// Link to evidence backing the label.
    pub reference_link: Option<String>,
}

impl LabelDetails {
    /// Build details from optional description and reference.
    pub fn new(description: Option<&str>, reference_link: Option<&str>) -> Self {
        Self {
            description: description.map(str::to_string),
            reference_link: reference_link.map(str::to_string),
        }
    }
}

/// A moderator report attaching behavioural labels to a username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorReport {
    /// Username of the content creator.
    pub username: String,
    /// Labels in the order they were listed on the `Labels:` line.
    pub label_list: Vec<String>,
    /// Per-label sections keyed by label name.
    pub labels: IndexMap<String, LabelDetails>,
}

impl AuthorReport {
    /// Details for `label`, or empty details when the report has no section for it.
    pub fn details_for(&self, label: &str) -> LabelDetails {
        self.labels.get(label).cloned().unwrap_or_default()
    }

    /// Label sections that were written out but not listed on the `Labels:` line.
    pub fn unlisted_sections(&self) -> impl Iterator<Item = &str> {
        self.labels
            .keys()
            .filter(|name| !self.label_list.contains(name))
            .map(String::as_str)
    }

    /// Whether the report names an author, lists labels and has at least one section.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.label_list.is_empty() && !self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_status_lookup_is_exact() {
        assert!(ModReport::new("bg3", "1", "BROKEN").has_known_status());
        assert!(!ModReport::new("bg3", "1", "broken").has_known_status());
        assert!(!ModReport::new("bg3", "1", "SPICY").has_known_status());
    }

    #[test]
    fn unlisted_sections_are_reported() {
        let mut labels = IndexMap::new();
        labels.insert("Bug Ignorer".to_string(), LabelDetails::default());
        labels.insert("Paywaller".to_string(), LabelDetails::default());
        let report = AuthorReport {
            username: "someone".to_string(),
            label_list: vec!["Bug Ignorer".to_string()],
            labels,
        };

        assert_eq!(report.unlisted_sections().collect::<Vec<_>>(), ["Paywaller"]);
        assert_eq!(report.details_for("Flight Risk"), LabelDetails::default());
    }
}
