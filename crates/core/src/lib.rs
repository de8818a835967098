#![warn(clippy::all, missing_docs)]

//! Core logic for the Nexus Content Curator status updater.
//!
//! This crate hosts the report records, the freeform text parser,
//! the duplicate detection and merge rules, and the JSON document
//! store used by the command-line shell and any future frontends.

pub mod config;
pub mod document;
pub mod merge;
pub mod models;
pub mod parse;
pub mod preview;
pub mod sanitize;
pub mod store;
pub mod workspace;

pub use config::AppConfig;
pub use document::{AuthorStatusDocument, ModStatusDocument};
pub use merge::{AuthorMergePolicy, AuthorMergeSummary, ModMergeSummary};
pub use models::{AuthorReport, LabelDetails, ModReport};
pub use parse::{Boundary, ParseOutcome, Segmenter};
pub use sanitize::Sanitizer;
pub use store::{DocumentStore, SaveOptions, StoreError};
pub use workspace::Workspace;
