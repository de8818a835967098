//! Application configuration.
//!
//! Values are layered: built-in defaults, then an optional JSON file, then
//! `CURATOR_*` environment variables (`__` separates nested keys, e.g.
//! `CURATOR_SANITIZE__NULL_LITERALS=false`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{merge::AuthorMergePolicy, sanitize::Sanitizer, store::SaveOptions};

/// Directory under the platform config dir.
pub const CONFIG_DIR: &str = "nexus-curator";
/// Config file name.
pub const CONFIG_FILE: &str = "config.json";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "CURATOR";

/// Settings shared by every frontend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Location of `mod-status.json`.
    pub mod_status_path: PathBuf,
    /// Location of `author-status.json`.
    pub author_status_path: PathBuf,
    /// Keep a `.bak` copy of the previous file on save.
    pub backup: bool,
    /// How author reports are merged.
    pub author_merge: AuthorMergePolicy,
    /// Clean-up rules for report text and written documents.
    pub sanitize: Sanitizer,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mod_status_path: PathBuf::from("Resources/mod-status.json"),
            author_status_path: PathBuf::from("Resources/author-status.json"),
            backup: true,
            author_merge: AuthorMergePolicy::default(),
            sanitize: Sanitizer::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default config file (if present) and the environment.
    pub fn load() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::build(None),
        }
    }

    /// Load from `path` (if present) and the environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::build(Some(path))
    }

    fn build(path: Option<&Path>) -> Result<Self> {
        let defaults =
            Config::try_from(&Self::default()).context("failed to encode default config")?;
        let mut builder = Config::builder().add_source(defaults);
        if let Some(path) = path {
            builder = builder.add_source(
                File::from(path)
                    .format(FileFormat::Json)
                    .required(false),
            );
        }
        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?;

        settings
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Sanitiser built from the `sanitize` section.
    pub fn sanitizer(&self) -> Sanitizer {
        self.sanitize.clone()
    }

    /// Write options for the document stores.
    pub fn save_options(&self) -> SaveOptions {
        SaveOptions {
            backup: self.backup,
            sanitizer: self.sanitizer(),
        }
    }
}

/// `<config dir>/nexus-curator/config.json`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Create the default config file if it does not exist yet.
pub fn ensure_default_config() -> Result<Option<PathBuf>> {
    match default_config_path() {
        Some(path) => write_default_config(&path).map(Some),
        None => Ok(None),
    }
}

/// Write the default config to `path` unless a file is already there.
pub fn write_default_config(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config dir {}", parent.display()))?;
    }
    let mut contents = serde_json::to_vec_pretty(&AppConfig::default())?;
    contents.push(b'\n');
    fs::write(path, contents)
        .with_context(|| format!("failed to write default config to {}", path.display()))?;
    info!(path = %path.display(), "wrote default config");
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(&dir.path().join("absent.json"))?;
        assert_eq!(config.mod_status_path, PathBuf::from("Resources/mod-status.json"));
        assert!(config.backup);
        assert_eq!(config.author_merge, AuthorMergePolicy::PerLabel);
        Ok(())
    }

    #[test]
    fn file_overrides_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"{
                "mod_status_path": "data/mods.json",
                "backup": false,
                "author_merge": "whole_record",
                "sanitize": {"null_literals": false}
            }"#,
        )?;

        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.mod_status_path, PathBuf::from("data/mods.json"));
        assert_eq!(
            config.author_status_path,
            PathBuf::from("Resources/author-status.json")
        );
        assert!(!config.backup);
        assert_eq!(config.author_merge, AuthorMergePolicy::WholeRecord);
        assert!(!config.sanitizer().null_literals);
        assert!(!config.save_options().backup);
        Ok(())
    }

    #[test]
    fn default_config_is_written_once() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);

        write_default_config(&path)?;
        let written: AppConfig = serde_json::from_slice(&fs::read(&path)?)?;
        assert_eq!(written, AppConfig::default());

        fs::write(&path, r#"{"backup": false}"#)?;
        write_default_config(&path)?;
        assert_eq!(fs::read_to_string(&path)?, r#"{"backup": false}"#);
        Ok(())
    }
}
