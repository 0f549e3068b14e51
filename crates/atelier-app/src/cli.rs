//! CLI argument definitions for the Atelier binary.
//!
//! Uses `clap` with derive macros for ergonomic argument parsing.
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Atelier — local storage for a study/practice application.
#[derive(Parser, Debug)]
#[command(name = "atelier", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Data directory for the SQLite database.
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the most recently created or modified records in a collection.
    Recent {
        #[arg(value_enum)]
        kind: EntityKind,
        /// Row count; falls back to the configured default.
        #[arg(short = 'n', long = "limit")]
        limit: Option<u32>,
    },
    /// One-shot substring search over a collection.
    Search {
        #[arg(value_enum)]
        kind: EntityKind,
        query: String,
    },
    /// Follow a collection, printing every snapshot as it changes.
    Watch {
        #[arg(value_enum)]
        kind: EntityKind,
    },
    /// Per-collection row counts.
    Stats,
}

/// The entity collections the inspection commands can target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum EntityKind {
    Works,
    Personas,
    StudyCards,
    Topics,
    Observations,
    CustomRoutes,
    Settings,
    RunLogs,
    PracticeSessions,
    Comparisons,
    Experiments,
    RevisionSessions,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ATELIER_CONFIG env var > platform default
    /// (~/.atelier/config.toml).
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ATELIER_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the data directory path.
    ///
    /// Priority: --data-dir flag > config file value.
    /// Returns `None` if not overridden (use config default).
    pub fn resolve_data_dir(&self) -> Option<String> {
        self.data_dir
            .as_ref()
            .map(|p| p.to_string_lossy().to_string())
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    /// Returns `None` if not overridden.
    pub fn resolve_log_level(&self) -> Option<String> {
        self.log_level.clone()
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".atelier").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".atelier").join("config.toml");
    }
    PathBuf::from("config.toml")
}
