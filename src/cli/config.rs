use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::menubar::indexer::IndexerConfig;
use crate::state::store::AppStateStore;
use crate::trace::logger::TraceConfig;

// ============================================================================
// CLI Argument Parsing (clap derive)
// ============================================================================

#[derive(Parser, Debug)]
#[command(
    name = "stein",
    version,
    about = "Hide and show third-party menu-bar extras"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to config file (default: stein.yaml in current dir)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Use a YAML fixture desktop instead of the live accessibility API
    #[arg(long, global = true)]
    pub fixture: Option<String>,

    /// Path to the state file (default: platform data dir)
    #[arg(long, global = true)]
    pub state: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Report whether accessibility permission is granted
    Permission {
        /// Ask the OS to show its permission prompt
        #[arg(long)]
        prompt: bool,
    },

    /// Scan the menu bar for extras owned by other applications
    Scan {
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Merge the results into the managed catalog
        #[arg(long)]
        merge: bool,
    },

    /// List the managed catalog
    List,

    /// Show a managed item
    Show {
        /// Item id or unique id prefix
        item: String,
    },

    /// Hide a managed item
    Hide {
        /// Item id or unique id prefix
        item: String,
    },

    /// Show or hide every managed item at once
    ToggleAll,

    /// Add a placeholder item
    Add {
        title: String,
    },

    /// Create a group
    Group {
        title: String,

        /// Symbol shown for the group
        #[arg(long)]
        symbol: Option<String>,
    },

    /// Move an item into a group, or out of all groups
    Assign {
        /// Item id or unique id prefix
        item: String,

        /// Group id or title; omit to ungroup
        #[arg(long)]
        group: Option<String>,
    },

    /// Change preferences
    Prefs {
        /// Start newly discovered items hidden
        #[arg(long)]
        hide_new_by_default: Option<bool>,

        /// Symbol for the status item
        #[arg(long)]
        symbol: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

// ============================================================================
// Config File Model (optional YAML)
// ============================================================================

/// Optional YAML config file: `stein.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub indexer: IndexerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: Option<String>,
}

// ============================================================================
// Config File Loading
// ============================================================================

/// Load config from a YAML file. Returns defaults if file is missing or malformed.
pub fn load_config(path: Option<&str>) -> AppConfig {
    let config_path = path.unwrap_or("stein.yaml");
    match std::fs::read_to_string(config_path) {
        Ok(content) => serde_yaml::from_str(&content).unwrap_or_else(|e| {
            log::warn!("ignoring malformed config {}: {}", config_path, e);
            AppConfig::default()
        }),
        Err(_) => AppConfig::default(),
    }
}

// ============================================================================
// Resolution (CLI > config file > defaults)
// ============================================================================

pub fn resolve_state_path(cli_state: Option<&str>, config: &AppConfig) -> PathBuf {
    cli_state
        .or(config.store.path.as_deref())
        .map(PathBuf::from)
        .unwrap_or_else(AppStateStore::default_path)
}

/// Map `-v` count to a log level: warn, info, debug, then trace.
pub fn log_level(verbose: u8) -> log::LevelFilter {
    match verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    }
}
