//! Command line surface, declared with clap derive
//!
//! Nothing here performs I/O; the structs only describe flags and
//! subcommands, and `main` hands the parsed values to `commands::*`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Ironwatch -- SIEM detection rule engine.
///
/// Use `ironwatch <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "ironwatch", version, about, long_about = None)]
pub struct Cli {
    /// Path to the ironwatch.toml configuration file.
    #[arg(short, long, default_value = "ironwatch.toml")]
    pub config: PathBuf,

    /// Log filter for this invocation (trace..error); beats RUST_LOG.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Inspect and manage detection rules.
    Rules(RulesArgs),

    /// Inspect and apply field name mappings.
    Map(MapArgs),

    /// Check rule queries for common problems.
    Diagnose(DiagnoseArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- rules ----

/// Inspect and manage detection rules.
#[derive(Args, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub action: RulesAction,
}

#[derive(Subcommand, Debug)]
pub enum RulesAction {
    /// List detection rules with optional filters.
    List {
        /// Filter by compliance category (GDPR, NIST, PCI-DSS, unknown).
        #[arg(long)]
        category: Option<String>,

        /// Filter by severity (low, medium, high, critical).
        #[arg(long)]
        severity: Option<String>,

        /// Filter by state (enabled, disabled).
        #[arg(long)]
        state: Option<String>,
    },
    /// Show full details of a single rule.
    Show {
        /// Rule identifier (12-char hex as shown by `rules list`).
        id: String,
    },
    /// Show aggregate rule statistics.
    Stats,
    /// Parse every rule file in a directory and report broken ones.
    Validate {
        /// Directory containing YAML rule files (default: rules_dir from config).
        path: Option<PathBuf>,
    },
    /// Enable every rule file in a directory tree.
    Enable {
        /// Directory containing YAML rule files (default: rules_dir from config).
        path: Option<PathBuf>,
    },
    /// Disable every rule file in a directory tree.
    Disable {
        /// Directory containing YAML rule files (default: rules_dir from config).
        path: Option<PathBuf>,
    },
}

// ---- map ----

/// Inspect and apply field name mappings.
#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(subcommand)]
    pub action: MapAction,
}

#[derive(Subcommand, Debug)]
pub enum MapAction {
    /// Rewrite canonical field names in a query to raw schema names.
    Transform {
        /// Query text to transform.
        #[arg(long)]
        query: String,

        /// Emit COALESCE fallback expressions instead of direct substitution.
        #[arg(long)]
        fallback: bool,
    },
    /// List every entry in the built-in mapping table.
    List,
}

// ---- diagnose ----

/// Check rule queries for common problems (empty queries, missing
/// time filters, missing index patterns).
#[derive(Args, Debug)]
pub struct DiagnoseArgs {
    /// Directory containing YAML rule files (default: rules_dir from config).
    pub path: Option<PathBuf>,
}

// ---- config ----

/// Manage ironwatch configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Check the configuration file and list every problem found.
    Validate,
    /// Print the merged configuration: defaults, then file, then env.
    Show {
        /// Show only a specific section (general, detection, backend).
        #[arg(long)]
        section: Option<String>,
    },
}
