//! Subcommand implementations; each module owns one top-level command

use std::path::{Path, PathBuf};

use ironwatch_core::config::IronwatchConfig;

use crate::error::CliError;

pub mod config;
pub mod diagnose;
pub mod map;
pub mod rules;

/// Resolve the rules directory for a command.
///
/// An explicit path argument wins; otherwise the `detection.rules_dir`
/// value from the configuration file is used.
pub(crate) async fn resolve_rules_dir(
    config_path: &Path,
    path: Option<PathBuf>,
) -> Result<PathBuf, CliError> {
    if let Some(p) = path {
        return Ok(p);
    }
    let config = IronwatchConfig::load(config_path).await?;
    Ok(PathBuf::from(config.detection.rules_dir))
}
