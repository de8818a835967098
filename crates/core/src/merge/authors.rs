use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::SaveTarget;
use crate::{
    document::{AuthorStatusDocument, Tooltip},
    models::{AuthorReport, LabelDetails},
};

/// Granularity used when an author already appears in the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorMergePolicy {
    /// Each label is added, updated or skipped on its own.
    #[default]
    PerLabel,
    /// Legacy behaviour: a known author is skipped entirely.
    WholeRecord,
}

/// How one label of an author report was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum LabelOutcome {
    /// The author did not carry the label before.
    Added,
    /// The author carried the label with other details; the tooltip was replaced.
    Updated {
        /// Tooltip before the update, if there was one.
        previous: Option<Tooltip>,
    },
    /// The author already carried the label with identical details.
    Duplicate,
}

/// How one author report was handled.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorOutcome {
    /// Per-label outcomes, in `Labels:` order.
    Labels(Vec<(String, LabelOutcome)>),
    /// Whole-record policy: the author already has exactly these labels and tooltips.
    Duplicate,
    /// Whole-record policy: the author is known with different labels or details.
    Conflict {
        /// Labels currently listing the author.
        existing_labels: Vec<String>,
        /// Labels named by the report.
        new_labels: Vec<String>,
        /// Whether stored tooltips differ from the report's sections.
        tooltips_differ: bool,
    },
}

/// Merge one author report into the document.
pub fn merge_author_report(
    doc: &mut AuthorStatusDocument,
    report: &AuthorReport,
    policy: AuthorMergePolicy,
) -> AuthorOutcome {
    for section in report.unlisted_sections() {
        warn!(
            username = %report.username,
            label = section,
            "label section is not listed on the Labels line; ignoring it"
        );
    }

    match policy {
        AuthorMergePolicy::PerLabel => AuthorOutcome::Labels(
            report
                .label_list
                .iter()
                .map(|label| {
                    let details = report.details_for(label);
                    let outcome = merge_label(doc, &report.username, label, &details);
                    (label.clone(), outcome)
                })
                .collect(),
        ),
        AuthorMergePolicy::WholeRecord => merge_whole_record(doc, report),
    }
}

fn merge_label(
    doc: &mut AuthorStatusDocument,
    username: &str,
    label: &str,
    details: &LabelDetails,
) -> LabelOutcome {
    if !doc.has_label(username, label) {
        doc.assign_label(username, label, details);
        return LabelOutcome::Added;
    }

    let unchanged = doc
        .tooltip(username, label)
        .is_some_and(|tooltip| tooltip.matches(details));
    if unchanged && doc.is_listed(username, label) {
        return LabelOutcome::Duplicate;
    }

    let previous = doc.assign_label(username, label, details);
    LabelOutcome::Updated { previous }
}

fn merge_whole_record(doc: &mut AuthorStatusDocument, report: &AuthorReport) -> AuthorOutcome {
    let username = report.username.as_str();
    if !doc.knows_author(username) {
        let labels = report
            .label_list
            .iter()
            .map(|label| {
                doc.assign_label(username, label, &report.details_for(label));
                (label.clone(), LabelOutcome::Added)
            })
            .collect();
        return AuthorOutcome::Labels(labels);
    }

    let existing_labels = doc.labels_of(username);
    let same_labels = existing_labels.iter().collect::<BTreeSet<_>>()
        == report.label_list.iter().collect::<BTreeSet<_>>();
    let same_tooltips = tooltips_match(doc.tooltips_of(username), report);

    if same_labels && same_tooltips {
        AuthorOutcome::Duplicate
    } else {
        AuthorOutcome::Conflict {
            existing_labels,
            new_labels: report.label_list.clone(),
            tooltips_differ: !same_tooltips,
        }
    }
}

/// Compare stored tooltips with what the add path would write: one tooltip per
/// listed label. Unlisted sections are never written, so they are not compared.
fn tooltips_match(existing: Option<&IndexMap<String, Tooltip>>, report: &AuthorReport) -> bool {
    let listed: BTreeSet<&str> = report.label_list.iter().map(String::as_str).collect();
    let Some(existing) = existing else {
        return listed.is_empty();
    };
    existing.len() == listed.len()
        && listed.iter().all(|label| {
            existing
                .get(*label)
                .is_some_and(|tooltip| tooltip.matches(&report.details_for(label)))
        })
}

/// Merge a batch of author reports in order, collecting a summary.
pub fn merge_author_reports(
    doc: &mut AuthorStatusDocument,
    reports: &[AuthorReport],
    policy: AuthorMergePolicy,
) -> AuthorMergeSummary {
    let mut summary = AuthorMergeSummary::default();
    for report in reports {
        let outcome = merge_author_report(doc, report, policy);
        info!(username = %report.username, ?policy, ?outcome, "merged author report");
        summary.entries.push(AuthorMergeEntry {
            username: report.username.clone(),
            outcome,
        });
    }
    summary
}

/// Outcome for one author report in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorMergeEntry {
    /// Username the report was about.
    pub username: String,
    /// What happened.
    pub outcome: AuthorOutcome,
}

/// Result of merging a batch of author reports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorMergeSummary {
    /// Per-report outcomes in input order.
    pub entries: Vec<AuthorMergeEntry>,
    /// Whether and where the result was written.
    pub target: SaveTarget,
}

impl AuthorMergeSummary {
    /// Every per-label outcome as `(username, label, outcome)`.
    pub fn label_outcomes(&self) -> impl Iterator<Item = (&str, &str, &LabelOutcome)> {
        self.entries.iter().flat_map(|entry| {
            let labels: &[(String, LabelOutcome)] = match &entry.outcome {
                AuthorOutcome::Labels(labels) => labels,
                _ => &[],
            };
            labels
                .iter()
                .map(move |(label, outcome)| (entry.username.as_str(), label.as_str(), outcome))
        })
    }

    /// Number of labels newly given to an author.
    pub fn added_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, LabelOutcome::Added))
    }

    /// Number of labels whose tooltip was replaced.
    pub fn updated_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, LabelOutcome::Updated { .. }))
    }

    /// Number of labels skipped as duplicates.
    pub fn duplicate_count(&self) -> usize {
        self.count(|outcome| matches!(outcome, LabelOutcome::Duplicate))
    }

    /// Whether the document was modified.
    pub fn has_changes(&self) -> bool {
        self.added_count() + self.updated_count() > 0
    }

    /// Authors skipped as a whole under [`AuthorMergePolicy::WholeRecord`].
    pub fn skipped_authors(&self) -> impl Iterator<Item = &AuthorMergeEntry> {
        self.entries
            .iter()
            .filter(|entry| !matches!(entry.outcome, AuthorOutcome::Labels(_)))
    }

    fn count(&self, predicate: impl Fn(&LabelOutcome) -> bool) -> usize {
        self.label_outcomes()
            .filter(|(_, _, outcome)| predicate(outcome))
            .count()
    }

    fn labels_by_author(
        &self,
        predicate: impl Fn(&LabelOutcome) -> bool,
    ) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (username, label, outcome) in self.label_outcomes() {
            if predicate(outcome) {
                grouped.entry(username).or_default().push(label);
            }
        }
        grouped
    }
}

impl fmt::Display for AuthorMergeSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            SaveTarget::Written(path) => write!(f, "Saved author reports to {}", path.display())?,
            SaveTarget::Unsaved if self.has_changes() => write!(f, "Merged author reports (not saved)")?,
            SaveTarget::Unsaved => write!(f, "No label changes; nothing was written")?,
        }
        write!(
            f,
            "\n{} labels added, {} updated, {} skipped as duplicates",
            self.added_count(),
            self.updated_count(),
            self.duplicate_count()
        )?;

        let sections: [(&str, fn(&LabelOutcome) -> bool); 3] = [
            ("Added labels:", |outcome| matches!(outcome, LabelOutcome::Added)),
            ("Updated labels (details changed):", |outcome| {
                matches!(outcome, LabelOutcome::Updated { .. })
            }),
            ("Duplicate labels (same details):", |outcome| {
                matches!(outcome, LabelOutcome::Duplicate)
            }),
        ];
        for (heading, predicate) in sections {
            let grouped = self.labels_by_author(predicate);
            if grouped.is_empty() {
                continue;
            }
            write!(f, "\n\n{heading}")?;
            for (username, labels) in grouped {
                write!(f, "\n  {username}: {}", labels.join(", "))?;
            }
        }

        let skipped: Vec<_> = self.skipped_authors().collect();
        if skipped.is_empty() {
            return Ok(());
        }
        write!(f, "\n\nSkipped {} existing authors:", skipped.len())?;

        let mut duplicates: Vec<&str> = skipped
            .iter()
            .filter(|entry| entry.outcome == AuthorOutcome::Duplicate)
            .map(|entry| entry.username.as_str())
            .collect();
        duplicates.sort_unstable();
        if !duplicates.is_empty() {
            write!(f, "\n\nDuplicate reports (same labels and details):")?;
            write!(f, "\n{}", duplicates.join(", "))?;
        }

        let mut conflicts: Vec<_> = skipped
            .iter()
            .filter_map(|entry| match &entry.outcome {
                AuthorOutcome::Conflict {
                    existing_labels,
                    new_labels,
                    tooltips_differ,
                } => Some((&entry.username, existing_labels, new_labels, *tooltips_differ)),
                _ => None,
            })
            .collect();
        conflicts.sort_by(|a, b| a.0.cmp(b.0));
        if !conflicts.is_empty() {
            write!(f, "\n\nAuthors with different labels or details:")?;
            for (username, existing, new, tooltips_differ) in conflicts {
                let existing = if existing.is_empty() {
                    "None".to_string()
                } else {
                    existing.join(", ")
                };
                write!(
                    f,
                    "\n  - {username}\n    Existing labels: {existing}\n    New labels: {}",
                    new.join(", ")
                )?;
                if tooltips_differ {
                    write!(f, "\n    Note: existing tooltips have different details")?;
                }
            }
        }
        Ok(())
    }
}
