use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::LabelDetails;

/// Label suggestions offered when the document has none.
pub const DEFAULT_LABELS: [&str; 5] = [
    "Bug Ignorer",
    "Flight Risk",
    "Copystriker",
    "Paywaller",
    "Incident",
];

/// The `author-status.json` document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthorStatusDocument {
    /// label name → label entry.
    #[serde(rename = "Labels", default)]
    pub labels: IndexMap<String, LabelEntry>,
    /// username → label name → tooltip.
    #[serde(rename = "Tooltips", default)]
    pub tooltips: IndexMap<String, IndexMap<String, Tooltip>>,
    /// Unknown top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One label bucket. Display fields (icon, colour, ...) are carried in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    authors: Option<Vec<String>>,
    /// Fields this tool does not manage.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LabelEntry {
    /// Usernames carrying this label, in insertion order.
    pub fn authors(&self) -> &[String] {
        self.authors.as_deref().unwrap_or(&[])
    }

    /// Append `username` unless already present.
    pub fn add_author(&mut self, username: &str) {
        let authors = self.authors.get_or_insert_with(Vec::new);
        if !authors.iter().any(|author| author == username) {
            authors.push(username.to_string());
        }
    }
}

/// Text and link shown for one author+label pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Tooltip {
    /// Descriptive text.
    #[serde(default)]
    pub label: Option<String>,
    /// Evidence link.
    #[serde(rename = "referenceLink", default)]
    pub reference_link: Option<String>,
    /// Unknown tooltip keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Tooltip {
    /// Whether the tooltip shows exactly the given details.
    pub fn matches(&self, details: &LabelDetails) -> bool {
        self.label == details.description && self.reference_link == details.reference_link
    }
}

impl From<&LabelDetails> for Tooltip {
    fn from(details: &LabelDetails) -> Self {
        Self {
            label: details.description.clone(),
            reference_link: details.reference_link.clone(),
            extra: Map::new(),
        }
    }
}

impl AuthorStatusDocument {
    /// Whether `username` carries `label`, either as a listed author or via a tooltip.
    pub fn has_label(&self, username: &str, label: &str) -> bool {
        self.is_listed(username, label) || self.tooltip(username, label).is_some()
    }

    /// Whether `username` is in the author list of `label`.
    pub fn is_listed(&self, username: &str, label: &str) -> bool {
        self.labels
            .get(label)
            .is_some_and(|entry| entry.authors().iter().any(|author| author == username))
    }

    /// Tooltip for an author+label pair.
    pub fn tooltip(&self, username: &str, label: &str) -> Option<&Tooltip> {
        self.tooltips.get(username)?.get(label)
    }

    /// Tooltips recorded for `username`.
    pub fn tooltips_of(&self, username: &str) -> Option<&IndexMap<String, Tooltip>> {
        self.tooltips.get(username)
    }

    /// Labels listing `username` as an author, in document order.
    pub fn labels_of(&self, username: &str) -> Vec<String> {
        self.labels
            .iter()
            .filter(|(_, entry)| entry.authors().iter().any(|author| author == username))
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// Whether `username` appears anywhere in the document.
    pub fn knows_author(&self, username: &str) -> bool {
        self.tooltips.contains_key(username) || !self.labels_of(username).is_empty()
    }

    /// Give `username` the label: create the bucket if needed, list the author
    /// once, and set the tooltip. Returns the tooltip that was replaced, if any.
    pub fn assign_label(
        &mut self,
        username: &str,
        label: &str,
        details: &LabelDetails,
    ) -> Option<Tooltip> {
        self.labels
            .entry(label.to_string())
            .or_default()
            .add_author(username);

        let tooltips = self.tooltips.entry(username.to_string()).or_default();
        match tooltips.get_mut(label) {
            Some(existing) => {
                let previous = existing.clone();
                existing.label = details.description.clone();
                existing.reference_link = details.reference_link.clone();
                Some(previous)
            }
            None => {
                tooltips.insert(label.to_string(), Tooltip::from(details));
                None
            }
        }
    }

    /// Sorted label names known to the document, or [`DEFAULT_LABELS`] when empty.
    pub fn label_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.labels.keys().cloned().collect();
        names.sort();
        if names.is_empty() {
            return DEFAULT_LABELS.iter().map(|label| label.to_string()).collect();
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn sample() -> Result<AuthorStatusDocument> {
        Ok(serde_json::from_value(json!({
            "Labels": {
                "Bug Ignorer": {"authors": ["alice"], "icon": "🐛"},
                "Paywaller": {"class": "warning"}
            },
            "Tooltips": {
                "alice": {"Bug Ignorer": {"label": "ignores bugs", "referenceLink": null}},
                "bob": {"Paywaller": {"label": null, "referenceLink": "https://x.test"}}
            }
        }))?)
    }

    #[test]
    fn label_membership_checks_authors_and_tooltips() -> Result<()> {
        let doc = sample()?;
        assert!(doc.has_label("alice", "Bug Ignorer"));
        assert!(doc.has_label("bob", "Paywaller"));
        assert!(!doc.has_label("alice", "Paywaller"));
        assert!(doc.knows_author("bob"));
        assert!(!doc.knows_author("carol"));
        assert_eq!(doc.labels_of("alice"), ["Bug Ignorer"]);
        Ok(())
    }

    #[test]
    fn assign_creates_bucket_and_overwrites_tooltip() -> Result<()> {
        let mut doc = sample()?;
        let details = LabelDetails::new(Some("new text"), Some("https://y.test"));

        assert_eq!(doc.assign_label("carol", "Flight Risk", &details), None);
        assert_eq!(doc.labels["Flight Risk"].authors(), ["carol"]);

        let previous = doc.assign_label("alice", "Bug Ignorer", &details);
        assert_eq!(previous.and_then(|tooltip| tooltip.label).as_deref(), Some("ignores bugs"));
        assert_eq!(doc.labels["Bug Ignorer"].authors(), ["alice"]);
        assert!(doc
            .tooltip("alice", "Bug Ignorer")
            .is_some_and(|tooltip| tooltip.matches(&details)));
        Ok(())
    }

    #[test]
    fn round_trip_keeps_label_fields() -> Result<()> {
        let value = serde_json::to_value(sample()?)?;
        assert_eq!(value["Labels"]["Bug Ignorer"]["icon"], json!("🐛"));
        assert!(value["Labels"]["Paywaller"].get("authors").is_none());
        assert_eq!(value["Tooltips"]["bob"]["Paywaller"]["label"], Value::Null);
        Ok(())
    }

    #[test]
    fn label_names_fall_back_to_defaults() -> Result<()> {
        assert_eq!(AuthorStatusDocument::default().label_names(), DEFAULT_LABELS);
        assert_eq!(sample()?.label_names(), ["Bug Ignorer", "Paywaller"]);
        Ok(())
    }
}
