//! The two status documents and the operations a frontend drives on them.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::{
    config::AppConfig,
    document::{AuthorStatusDocument, ModStatusDocument},
    merge::{
        merge_author_reports, merge_mod_reports, AuthorMergePolicy, AuthorMergeSummary,
        ModMergeSummary, SaveTarget,
    },
    models::{AuthorReport, ModReport},
    parse::{self, ParseOutcome, Segmenter},
    sanitize::Sanitizer,
    store::{DocumentStore, StoreError},
};

/// Loaded documents plus the rules used to parse and merge into them.
#[derive(Debug, Clone)]
pub struct Workspace {
    mods: DocumentStore<ModStatusDocument>,
    authors: DocumentStore<AuthorStatusDocument>,
    sanitizer: Sanitizer,
    author_policy: AuthorMergePolicy,
    mod_segmenter: Segmenter,
    author_segmenter: Segmenter,
}

impl Workspace {
    /// Load both documents named by `config`. Load problems come back as warnings.
    pub fn open(config: &AppConfig) -> (Self, Vec<StoreError>) {
        let options = config.save_options();
        let (mods, mod_warning) = DocumentStore::open(&config.mod_status_path, options.clone());
        let (authors, author_warning) = DocumentStore::open(&config.author_status_path, options);

        let workspace = Self {
            mods,
            authors,
            sanitizer: config.sanitizer(),
            author_policy: config.author_merge,
            mod_segmenter: Segmenter::mod_reports(),
            author_segmenter: Segmenter::author_reports(),
        };
        let warnings = mod_warning.into_iter().chain(author_warning).collect();
        (workspace, warnings)
    }

    /// Build a workspace around documents already in memory.
    pub fn from_stores(
        mods: DocumentStore<ModStatusDocument>,
        authors: DocumentStore<AuthorStatusDocument>,
        sanitizer: Sanitizer,
    ) -> Self {
        Self {
            mods,
            authors,
            sanitizer,
            author_policy: AuthorMergePolicy::default(),
            mod_segmenter: Segmenter::mod_reports(),
            author_segmenter: Segmenter::author_reports(),
        }
    }

    /// Parse mod reports and sanitise their fields.
    ///
    /// Reports left without a game, mod id or status once invisible characters
    /// are stripped are counted as dropped.
    pub fn parse_mod_reports(&self, text: &str) -> ParseOutcome<ModReport> {
        let mut outcome = parse::parse_mod_reports_with(text, &self.mod_segmenter);
        let parsed = outcome.records.len();
        outcome.records = outcome
            .records
            .iter()
            .map(|report| self.sanitizer.mod_report(report))
            .filter(ModReport::is_complete)
            .collect();
        outcome.dropped += parsed - outcome.records.len();
        debug!(parsed = outcome.len(), dropped = outcome.dropped, "mod reports parsed");
        outcome
    }

    /// Parse author reports and sanitise their fields.
    ///
    /// Reports left without a username, a label list or any section once
    /// invisible characters are stripped are counted as dropped.
    pub fn parse_author_reports(&self, text: &str) -> ParseOutcome<AuthorReport> {
        let mut outcome = parse::parse_author_reports_with(text, &self.author_segmenter);
        let parsed = outcome.records.len();
        outcome.records = outcome
            .records
            .iter()
            .map(|report| self.sanitizer.author_report(report))
            .filter(AuthorReport::is_complete)
            .collect();
        outcome.dropped += parsed - outcome.records.len();
        debug!(parsed = outcome.len(), dropped = outcome.dropped, "author reports parsed");
        outcome
    }

    /// Merge mod reports and write the document when anything was added.
    ///
    /// On a failed write the merge is rolled back so memory matches the file.
    pub fn save_mod_reports(
        &mut self,
        reports: &[ModReport],
    ) -> Result<ModMergeSummary, StoreError> {
        let before = self.mods.document().clone();
        let mut summary = merge_mod_reports(self.mods.document_mut(), reports);
        if !summary.has_changes() {
            info!("no new mod reports; skipping write");
            return Ok(summary);
        }

        match self.mods.save() {
            Ok(receipt) => {
                summary.target = SaveTarget::Written(receipt.path);
                Ok(summary)
            }
            Err(err) => {
                *self.mods.document_mut() = before;
                Err(err)
            }
        }
    }

    /// Merge author reports and write the document when any label changed.
    ///
    /// On a failed write the merge is rolled back so memory matches the file.
    pub fn save_author_reports(
        &mut self,
        reports: &[AuthorReport],
    ) -> Result<AuthorMergeSummary, StoreError> {
        let before = self.authors.document().clone();
        let mut summary =
            merge_author_reports(self.authors.document_mut(), reports, self.author_policy);
        if !summary.has_changes() {
            info!("no author label changes; skipping write");
            return Ok(summary);
        }

        match self.authors.save() {
            Ok(receipt) => {
                summary.target = SaveTarget::Written(receipt.path);
                Ok(summary)
            }
            Err(err) => {
                *self.authors.document_mut() = before;
                Err(err)
            }
        }
    }

    /// Switch the mod status file and reload it.
    pub fn set_mod_status_path(&mut self, path: impl Into<PathBuf>) -> Option<StoreError> {
        self.mods.set_path(path)
    }

    /// Switch the author status file and reload it.
    pub fn set_author_status_path(&mut self, path: impl Into<PathBuf>) -> Option<StoreError> {
        self.authors.set_path(path)
    }

    /// Select how author reports are merged.
    pub fn set_author_policy(&mut self, policy: AuthorMergePolicy) {
        self.author_policy = policy;
    }

    /// Merge policy in effect for author reports.
    pub fn author_policy(&self) -> AuthorMergePolicy {
        self.author_policy
    }

    /// Current mod status document.
    pub fn mod_status(&self) -> &ModStatusDocument {
        self.mods.document()
    }

    /// Current author status document.
    pub fn author_status(&self) -> &AuthorStatusDocument {
        self.authors.document()
    }

    /// Path of the mod status file.
    pub fn mod_status_path(&self) -> &Path {
        self.mods.path()
    }

    /// Path of the author status file.
    pub fn author_status_path(&self) -> &Path {
        self.authors.path()
    }
}
