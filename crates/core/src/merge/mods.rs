use std::{collections::BTreeMap, fmt};

use tracing::info;

use super::SaveTarget;
use crate::{document::ModStatusDocument, models::ModReport};

/// How a single mod report was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModOutcome {
    /// Filed as a new entry.
    Added,
    /// Already present with the same status and reason; nothing changed.
    Duplicate,
    /// Already present with a different status or reason; left untouched.
    Conflict {
        /// Status bucket currently holding the mod, if any.
        existing_status: Option<String>,
        /// Reason currently on record, if any.
        existing_reason: Option<String>,
    },
}

/// Merge one report into the document.
pub fn merge_mod_report(doc: &mut ModStatusDocument, report: &ModReport) -> ModOutcome {
    match doc.find(&report.game, &report.mod_id) {
        Some(existing) => {
            if existing.status.as_deref() == Some(report.status.as_str())
                && existing.reason == report.reason
            {
                ModOutcome::Duplicate
            } else {
                ModOutcome::Conflict {
                    existing_status: existing.status,
                    existing_reason: existing.reason,
                }
            }
        }
        None => {
            doc.insert(report);
            ModOutcome::Added
        }
    }
}

/// Merge a batch of reports in order, collecting a summary.
pub fn merge_mod_reports(doc: &mut ModStatusDocument, reports: &[ModReport]) -> ModMergeSummary {
    let mut summary = ModMergeSummary::default();
    for report in reports {
        let outcome = merge_mod_report(doc, report);
        info!(
            game = %report.game,
            mod_id = %report.mod_id,
            status = %report.status,
            ?outcome,
            "merged mod report"
        );
        summary.entries.push(ModMergeEntry {
            game: report.game.clone(),
            mod_id: report.mod_id.clone(),
            outcome,
        });
    }
    summary
}

/// Outcome for one report in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModMergeEntry {
    /// Game shortname.
    pub game: String,
    /// Mod identifier.
    pub mod_id: String,
    /// What happened.
    pub outcome: ModOutcome,
}

/// Result of merging a batch of mod reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModMergeSummary {
    /// Per-report outcomes in input order.
    pub entries: Vec<ModMergeEntry>,
    /// Whether and where the result was written.
    pub target: SaveTarget,
}

impl ModMergeSummary {
    /// Reports filed as new entries.
    pub fn added(&self) -> impl Iterator<Item = &ModMergeEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == ModOutcome::Added)
    }

    /// Reports skipped as exact duplicates.
    pub fn duplicates(&self) -> impl Iterator<Item = &ModMergeEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.outcome == ModOutcome::Duplicate)
    }

    /// Reports skipped because they disagree with the existing entry.
    pub fn conflicts(&self) -> impl Iterator<Item = &ModMergeEntry> {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.outcome, ModOutcome::Conflict { .. }))
    }

    /// Whether the document was modified.
    pub fn has_changes(&self) -> bool {
        self.added().next().is_some()
    }

    /// Duplicate mod ids grouped by game.
    pub fn duplicates_by_game(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for entry in self.duplicates() {
            grouped.entry(&entry.game).or_default().push(&entry.mod_id);
        }
        grouped
    }

    /// Conflicting entries grouped by game.
    pub fn conflicts_by_game(&self) -> BTreeMap<&str, Vec<&ModMergeEntry>> {
        let mut grouped: BTreeMap<&str, Vec<&ModMergeEntry>> = BTreeMap::new();
        for entry in self.conflicts() {
            grouped.entry(&entry.game).or_default().push(entry);
        }
        grouped
    }
}

impl fmt::Display for ModMergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let added = self.added().count();
        match &self.target {
            SaveTarget::Written(path) => {
                write!(f, "Saved {added} new mod reports to {}", path.display())?
            }
            SaveTarget::Unsaved if added > 0 => write!(f, "Merged {added} new mod reports (not saved)")?,
            SaveTarget::Unsaved => write!(f, "No new mod reports; nothing was written")?,
        }

        let skipped = self.entries.len() - added;
        if skipped == 0 {
            return Ok(());
        }
        write!(f, "\n\nSkipped {skipped} existing mods:")?;

        let duplicates = self.duplicates_by_game();
        if !duplicates.is_empty() {
            write!(f, "\n\nDuplicate reports (same status and reason):")?;
            for (game, ids) in duplicates {
                write!(f, "\n{game}: {}", ids.join(", "))?;
            }
        }

        let conflicts = self.conflicts_by_game();
        if !conflicts.is_empty() {
            write!(f, "\n\nMods with a different status or reason:")?;
            for (game, entries) in conflicts {
                write!(f, "\n\n{game}:")?;
                for entry in entries {
                    if let ModOutcome::Conflict {
                        existing_status,
                        existing_reason,
                    } = &entry.outcome
                    {
                        write!(
                            f,
                            "\n  - {}\n    Status: {}\n    Reason: {}",
                            entry.mod_id,
                            existing_status.as_deref().unwrap_or("(descriptor only)"),
                            existing_reason.as_deref().unwrap_or("No reason provided"),
                        )?;
                    }
                }
            }
        }
        Ok(())
    }
}
