use std::{
    fs,
    io::{self, Read},
    path::Path,
};

use anyhow::{Context, Result};
use curator_core::{
    models::KNOWN_STATUSES, preview, AppConfig, AuthorMergePolicy, ParseOutcome, Workspace,
};
use tracing::info;

use crate::ListKind;

/// Command-line frontend over a [`Workspace`].
pub struct App {
    workspace: Workspace,
}

impl App {
    /// Load both documents, reporting load problems on stderr.
    pub fn open(config: &AppConfig) -> Self {
        let (workspace, warnings) = Workspace::open(config);
        for warning in warnings {
            eprintln!("warning: {warning}; starting from an empty document");
        }
        Self { workspace }
    }

    pub fn preview_mods(&self, input: Option<&Path>) -> Result<()> {
        let text = read_input(input)?;
        let parsed = self.workspace.parse_mod_reports(&text);
        report_parse("mod", &parsed);
        print!("{}", preview::mod_reports(&parsed.records));
        Ok(())
    }

    pub fn save_mods(&mut self, input: Option<&Path>) -> Result<()> {
        let text = read_input(input)?;
        let parsed = self.workspace.parse_mod_reports(&text);
        report_parse("mod", &parsed);
        if parsed.is_empty() {
            return Ok(());
        }

        let summary = self
            .workspace
            .save_mod_reports(&parsed.records)
            .context("failed to save mod reports")?;
        println!("{summary}");
        Ok(())
    }

    pub fn preview_authors(&self, input: Option<&Path>) -> Result<()> {
        let text = read_input(input)?;
        let parsed = self.workspace.parse_author_reports(&text);
        report_parse("author", &parsed);
        print!("{}", preview::author_reports(&parsed.records));
        Ok(())
    }

    pub fn save_authors(&mut self, input: Option<&Path>, whole_record: bool) -> Result<()> {
        if whole_record {
            self.workspace
                .set_author_policy(AuthorMergePolicy::WholeRecord);
        }

        let text = read_input(input)?;
        let parsed = self.workspace.parse_author_reports(&text);
        report_parse("author", &parsed);
        if parsed.is_empty() {
            return Ok(());
        }

        let summary = self
            .workspace
            .save_author_reports(&parsed.records)
            .context("failed to save author reports")?;
        println!("{summary}");
        Ok(())
    }

    pub fn list(&self, what: ListKind) {
        let values = match what {
            ListKind::Games => self.workspace.mod_status().games(),
            ListKind::Labels => self.workspace.author_status().label_names(),
            ListKind::Statuses => KNOWN_STATUSES.iter().map(|s| s.to_string()).collect(),
        };
        for value in values {
            println!("{value}");
        }
    }
}

fn report_parse<T>(kind: &str, parsed: &ParseOutcome<T>) {
    info!(kind, parsed = parsed.len(), dropped = parsed.dropped, "input parsed");
    if parsed.dropped > 0 {
        eprintln!(
            "warning: skipped {} block(s) missing required fields",
            parsed.dropped
        );
    }
    if parsed.is_empty() {
        eprintln!("warning: no valid {kind} reports found in input");
    }
}

fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}
