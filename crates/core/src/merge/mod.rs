//! Duplicate detection and merge rules.
//!
//! Merging never overwrites an existing mod entry: conflicting reports are left
//! for the operator to reconcile by hand. Author labels are merged per label and
//! may update a tooltip in place.

/// Author report merging.
pub mod authors;
/// Mod report merging.
pub mod mods;

use std::path::PathBuf;

pub use authors::{
    merge_author_report, merge_author_reports, AuthorMergeEntry, AuthorMergePolicy,
    AuthorMergeSummary, AuthorOutcome, LabelOutcome,
};
pub use mods::{merge_mod_report, merge_mod_reports, ModMergeEntry, ModMergeSummary, ModOutcome};

/// Where a summary's changes were written, once they have been.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SaveTarget {
    /// The merge produced no changes, so nothing was written.
    #[default]
    Unsaved,
    /// Changes were written to this path.
    Written(PathBuf),
}
