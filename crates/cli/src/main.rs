mod app;

use std::{
    fs::OpenOptions,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use curator_core::config::{self, AppConfig};
use tracing::warn;
use tracing_subscriber::{prelude::*, EnvFilter};

/// Merge freeform mod and author reports into the curator status files.
#[derive(Debug, Parser)]
#[command(name = "curator-status", version, about)]
struct Cli {
    /// Config file (defaults to the platform config dir)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Mod status document (overrides config)
    #[arg(long, value_name = "PATH")]
    mod_status: Option<PathBuf>,

    /// Author status document (overrides config)
    #[arg(long, value_name = "PATH")]
    author_status: Option<PathBuf>,

    /// Do not keep a .bak copy of the previous file
    #[arg(long)]
    no_backup: bool,

    /// Also append log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Mod reports
    Mods {
        #[command(subcommand)]
        action: ModAction,
    },
    /// Author reports
    Authors {
        #[command(subcommand)]
        action: AuthorAction,
    },
    /// Print known values
    List {
        #[arg(value_enum)]
        what: ListKind,
    },
}

#[derive(Debug, Subcommand)]
enum ModAction {
    /// Preview parsed reports without saving
    Parse {
        /// Report text file; stdin when omitted or "-"
        input: Option<PathBuf>,
    },
    /// Parse, merge and save
    Save {
        /// Report text file; stdin when omitted or "-"
        input: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
enum AuthorAction {
    /// Preview parsed reports without saving
    Parse {
        /// Report text file; stdin when omitted or "-"
        input: Option<PathBuf>,
    },
    /// Parse, merge and save
    Save {
        /// Report text file; stdin when omitted or "-"
        input: Option<PathBuf>,
        /// Skip authors already present instead of merging per label
        #[arg(long)]
        whole_record: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ListKind {
    Games,
    Labels,
    Statuses,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(path) = cli.mod_status {
        config.mod_status_path = path;
    }
    if let Some(path) = cli.author_status {
        config.author_status_path = path;
    }
    if cli.no_backup {
        config.backup = false;
    }

    let mut app = app::App::open(&config);
    match cli.command {
        Command::Mods { action } => match action {
            ModAction::Parse { input } => app.preview_mods(input.as_deref()),
            ModAction::Save { input } => app.save_mods(input.as_deref()),
        },
        Command::Authors { action } => match action {
            AuthorAction::Parse { input } => app.preview_authors(input.as_deref()),
            AuthorAction::Save {
                input,
                whole_record,
            } => app.save_authors(input.as_deref(), whole_record),
        },
        Command::List { what } => {
            app.list(what);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    match path {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("failed to load config from {}", path.display())),
        None => {
            if let Err(err) = config::ensure_default_config() {
                warn!("could not write default config: {err:#}");
            }
            AppConfig::load()
        }
    }
}

fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("error"))?;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .compact()
        .with_writer(std::io::stderr);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_ansi(false)
                    .compact()
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(())
}
