//! Loading and writing the JSON documents.
//!
//! The store is the only place that touches the filesystem. Loading never
//! fails: a missing or unreadable document is replaced by its empty shape and
//! the problem is handed back as a warning. Saving reports errors and leaves
//! the in-memory document as it was.

use std::{
    ffi::OsString,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{info, warn};

use crate::{document::StatusDocument, sanitize::Sanitizer};

/// Failures while reading or writing a document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The file could not be read (including "not found").
    #[error("could not read {}: {source}", path.display())]
    Read {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The file is not a valid document.
    #[error("could not parse {}: {source}", path.display())]
    Parse {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The in-memory document could not be serialised.
    #[error("could not serialise {kind} document: {source}")]
    Serialize {
        /// Document kind.
        kind: &'static str,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// The backup copy could not be written.
    #[error("could not back up {} to {}: {source}", path.display(), backup.display())]
    Backup {
        /// File being backed up.
        path: PathBuf,
        /// Backup destination.
        backup: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
    /// The document could not be written.
    #[error("could not write {}: {source}", path.display())]
    Write {
        /// File involved.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },
}

impl StoreError {
    /// Whether this is a read error for a file that does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}

/// How documents are written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveOptions {
    /// Copy the previous file to `<name>.bak` before overwriting it.
    pub backup: bool,
    /// Clean-up applied to the JSON tree before writing.
    pub sanitizer: Sanitizer,
}

/// Details of a completed write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveReceipt {
    /// File written.
    pub path: PathBuf,
    /// Backup written alongside it, if any.
    pub backup: Option<PathBuf>,
    /// When the write finished.
    pub saved_at: DateTime<Utc>,
}

/// A document bound to the path it was loaded from.
#[derive(Debug, Clone)]
pub struct DocumentStore<D> {
    path: PathBuf,
    document: D,
    options: SaveOptions,
}

impl<D: StatusDocument> DocumentStore<D> {
    /// Load the document at `path`, substituting the empty shape on failure.
    pub fn open(path: impl Into<PathBuf>, options: SaveOptions) -> (Self, Option<StoreError>) {
        let path = path.into();
        let (document, warning) = load_or_default(&path);
        (
            Self {
                path,
                document,
                options,
            },
            warning,
        )
    }

    /// Wrap an in-memory document without touching the filesystem.
    pub fn with_document(path: impl Into<PathBuf>, document: D, options: SaveOptions) -> Self {
        Self {
            path: path.into(),
            document,
            options,
        }
    }

    /// Path the document is saved to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current document.
    pub fn document(&self) -> &D {
        &self.document
    }

    /// Mutable access for the merge step.
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.document
    }

    /// Write options in effect.
    pub fn options(&self) -> &SaveOptions {
        &self.options
    }

    /// Re-read the document from its path.
    pub fn reload(&mut self) -> Option<StoreError> {
        let (document, warning) = load_or_default(&self.path);
        self.document = document;
        warning
    }

    /// Point the store at another file and load it.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) -> Option<StoreError> {
        self.path = path.into();
        self.reload()
    }

    /// Write the document, keeping a backup of the previous file when enabled.
    pub fn save(&self) -> Result<SaveReceipt, StoreError> {
        let rendered = render_document(&self.document, &self.options.sanitizer)?;

        let backup = if self.options.backup && self.path.is_file() {
            let backup = backup_path(&self.path);
            fs::copy(&self.path, &backup).map_err(|source| StoreError::Backup {
                path: self.path.clone(),
                backup: backup.clone(),
                source,
            })?;
            Some(backup)
        } else {
            None
        };

        write_atomically(&self.path, rendered.as_bytes()).map_err(|source| {
            StoreError::Write {
                path: self.path.clone(),
                source,
            }
        })?;

        info!(kind = D::KIND, path = %self.path.display(), "document saved");
        Ok(SaveReceipt {
            path: self.path.clone(),
            backup,
            saved_at: Utc::now(),
        })
    }
}

/// Read and parse a document.
pub fn load_document<D: StatusDocument>(path: &Path) -> Result<D, StoreError> {
    let contents = fs::read_to_string(path).map_err(|source| StoreError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| StoreError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn load_or_default<D: StatusDocument>(path: &Path) -> (D, Option<StoreError>) {
    match load_document(path) {
        Ok(document) => (document, None),
        Err(err) => {
            warn!(kind = D::KIND, "{err}; using an empty document");
            (D::default(), Some(err))
        }
    }
}

/// Serialise a document as sanitised, 2-space indented JSON with a trailing newline.
pub fn render_document<D: StatusDocument>(
    document: &D,
    sanitizer: &Sanitizer,
) -> Result<String, StoreError> {
    let serialize_error = |source| StoreError::Serialize {
        kind: D::KIND,
        source,
    };
    let mut value = serde_json::to_value(document).map_err(serialize_error)?;
    sanitizer.sanitize_value(&mut value);
    let mut rendered = serde_json::to_string_pretty(&value).map_err(serialize_error)?;
    rendered.push('\n');
    Ok(rendered)
}

/// `<file name>.bak` next to `path`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("document"));
    name.push(".bak");
    path.with_file_name(name)
}

fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(contents)?;
    // temp files are created owner-only; keep the mode of the file being replaced
    if let Ok(metadata) = fs::metadata(path) {
        file.as_file().set_permissions(metadata.permissions())?;
    }
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{AuthorStatusDocument, ModStatusDocument};
    use crate::models::ModReport;
    use anyhow::Result;
    use serde_json::{json, Value};
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_default_and_warning() -> Result<()> {
        let dir = tempdir()?;
        let (store, warning) = DocumentStore::<ModStatusDocument>::open(
            dir.path().join("mod-status.json"),
            SaveOptions::default(),
        );
        assert!(warning.as_ref().is_some_and(StoreError::is_not_found));
        assert_eq!(store.document(), &ModStatusDocument::default());
        Ok(())
    }

    #[test]
    fn malformed_file_yields_default_and_parse_warning() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("author-status.json");
        fs::write(&path, "{ not json")?;

        let (store, warning) =
            DocumentStore::<AuthorStatusDocument>::open(&path, SaveOptions::default());
        assert!(matches!(warning, Some(StoreError::Parse { .. })));
        assert_eq!(store.document(), &AuthorStatusDocument::default());
        Ok(())
    }

    #[test]
    fn save_round_trip_with_backup() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("mod-status.json");
        let original = json!({
            "Mod Statuses": {"bg3": {"BROKEN": ["1"]}},
            "Mod Descriptors": {"bg3": {"1": {"reason": "crashes"}}},
            "Keyword Rules": {"global": {"LAME": ["reupload"]}}
        });
        fs::write(&path, serde_json::to_string(&original)?)?;

        let options = SaveOptions {
            backup: true,
            ..SaveOptions::default()
        };
        let (mut store, warning) = DocumentStore::<ModStatusDocument>::open(&path, options);
        assert!(warning.is_none());

        let receipt = store.save()?;
        let written: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(written, original);
        assert_eq!(receipt.backup.as_deref(), Some(backup_path(&path).as_path()));

        store
            .document_mut()
            .insert(&ModReport::new("bg3", "2", "LAME"));
        store.save()?;

        let backup: Value = serde_json::from_str(&fs::read_to_string(backup_path(&path))?)?;
        assert_eq!(backup, original);
        let written: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(written["Mod Statuses"]["bg3"]["LAME"], json!(["2"]));
        Ok(())
    }

    #[test]
    fn output_is_two_space_indented_and_sanitised() -> Result<()> {
        let mut doc = AuthorStatusDocument::default();
        doc.assign_label(
            "someone",
            "Incident",
            &crate::models::LabelDetails::new(Some("null"), Some("https://x.test\u{3164}")),
        );
        let rendered = render_document(&doc, &Sanitizer::default())?;

        assert!(rendered.starts_with("{\n  \"Labels\": {\n    \"Incident\": {"));
        assert!(rendered.ends_with("}\n"));
        let value: Value = serde_json::from_str(&rendered)?;
        assert_eq!(
            value["Tooltips"]["someone"]["Incident"],
            json!({"label": null, "referenceLink": "https://x.test"})
        );
        Ok(())
    }

    #[test]
    fn save_failure_keeps_document() -> Result<()> {
        let dir = tempdir()?;
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "")?;

        let mut store = DocumentStore::with_document(
            blocker.join("mod-status.json"),
            ModStatusDocument::default(),
            SaveOptions::default(),
        );
        store
            .document_mut()
            .insert(&ModReport::new("bg3", "3", "BROKEN"));

        assert!(matches!(store.save(), Err(StoreError::Write { .. })));
        assert_eq!(store.document().ids("bg3", "BROKEN"), ["3"]);
        Ok(())
    }

    #[test]
    fn set_path_reloads() -> Result<()> {
        let dir = tempdir()?;
        let other = dir.path().join("other.json");
        fs::write(&other, r#"{"Labels": {"Paywaller": {"authors": ["a"]}}, "Tooltips": {}}"#)?;

        let (mut store, _) = DocumentStore::<AuthorStatusDocument>::open(
            dir.path().join("missing.json"),
            SaveOptions::default(),
        );
        assert!(store.set_path(&other).is_none());
        assert_eq!(store.path(), other.as_path());
        assert_eq!(store.document().labels_of("a"), ["Paywaller"]);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_existing_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let path = dir.path().join("mod-status.json");
        fs::write(&path, "{}")?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644))?;

        let (store, _) = DocumentStore::<ModStatusDocument>::open(&path, SaveOptions::default());
        store.save()?;

        assert_eq!(fs::metadata(&path)?.permissions().mode() & 0o777, 0o644);
        Ok(())
    }

    #[test]
    fn backup_name_appends_suffix() {
        assert_eq!(
            backup_path(Path::new("Resources/mod-status.json")),
            PathBuf::from("Resources/mod-status.json.bak")
        );
    }
}
