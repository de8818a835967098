use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::present;
use crate::models::ModReport;

/// Game suggestions offered when the document has none.
pub const DEFAULT_GAMES: [&str; 3] = ["baldursgate3", "skyrimspecialedition", "newvegas"];

/// The `mod-status.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModStatusDocument {
    /// game → status → mod ids.
    #[serde(rename = "Mod Statuses", default)]
    pub statuses: IndexMap<String, IndexMap<String, Vec<String>>>,
    /// game → mod id → descriptor.
    #[serde(rename = "Mod Descriptors", default)]
    pub descriptors: IndexMap<String, IndexMap<String, ModDescriptor>>,
    /// Keyword matching rules, consumed by the userscript and never touched here.
    #[serde(rename = "Keyword Rules", default = "default_keyword_rules")]
    pub keyword_rules: Value,
    /// Unknown top-level keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_keyword_rules() -> Value {
    json!({ "global": {} })
}

impl Default for ModStatusDocument {
    fn default() -> Self {
        Self {
            statuses: IndexMap::new(),
            descriptors: IndexMap::new(),
            keyword_rules: default_keyword_rules(),
            extra: Map::new(),
        }
    }
}

/// Reason and alternative attached to a flagged mod.
///
/// The outer `Option` records whether the key exists at all so untouched entries
/// are written back exactly as they were read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModDescriptor {
    /// Free-text reason.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub reason: Option<Option<String>>,
    /// Replacement link; `Some(None)` is an explicit "no alternative".
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub alternative: Option<Option<String>>,
    /// Unknown descriptor keys.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ModDescriptor {
    /// Descriptor written for a newly accepted report.
    ///
    /// The reason key is only written when a reason was given; the alternative is
    /// always written, as `null` when there is none.
    pub fn from_report(report: &ModReport) -> Self {
        Self {
            reason: report.reason.clone().map(Some),
            alternative: Some(report.alternative.clone()),
            extra: Map::new(),
        }
    }

    /// Reason text, if any.
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_ref().and_then(|reason| reason.as_deref())
    }

    /// Alternative link, if any.
    pub fn alternative(&self) -> Option<&str> {
        self.alternative.as_ref().and_then(|alt| alt.as_deref())
    }
}

/// What the document already records for a `(game, mod id)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingMod {
    /// First status bucket holding the id; `None` when only a descriptor exists.
    pub status: Option<String>,
    /// Reason from the descriptor, if any.
    pub reason: Option<String>,
}

impl ModStatusDocument {
    /// Look up an existing entry in the status buckets and the descriptor table.
    pub fn find(&self, game: &str, mod_id: &str) -> Option<ExistingMod> {
        let status = self.statuses.get(game).and_then(|buckets| {
            buckets
                .iter()
                .find(|(_, ids)| ids.iter().any(|id| id == mod_id))
                .map(|(status, _)| status.clone())
        });
        let descriptor = self.descriptor(game, mod_id);

        if status.is_none() && descriptor.is_none() {
            return None;
        }
        Some(ExistingMod {
            status,
            reason: descriptor.and_then(ModDescriptor::reason).map(str::to_string),
        })
    }

    /// Descriptor for a mod, if present.
    pub fn descriptor(&self, game: &str, mod_id: &str) -> Option<&ModDescriptor> {
        self.descriptors.get(game)?.get(mod_id)
    }

    /// Mod ids filed under `status` for `game`.
    pub fn ids(&self, game: &str, status: &str) -> &[String] {
        self.statuses
            .get(game)
            .and_then(|buckets| buckets.get(status))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// File a report: create the game and status bucket as needed, append the id
    /// once, and set the descriptor.
    pub fn insert(&mut self, report: &ModReport) {
        let bucket = self
            .statuses
            .entry(report.game.clone())
            .or_default()
            .entry(report.status.clone())
            .or_default();
        if !bucket.contains(&report.mod_id) {
            bucket.push(report.mod_id.clone());
        }

        self.descriptors
            .entry(report.game.clone())
            .or_default()
            .insert(report.mod_id.clone(), ModDescriptor::from_report(report));
    }

    /// Sorted game shortnames known to the document, or [`DEFAULT_GAMES`] when empty.
    pub fn games(&self) -> Vec<String> {
        let mut games: Vec<String> = self
            .statuses
            .keys()
            .chain(self.descriptors.keys())
            .cloned()
            .collect();
        games.sort();
        games.dedup();
        if games.is_empty() {
            return DEFAULT_GAMES.iter().map(|game| game.to_string()).collect();
        }
        games
    }
}
