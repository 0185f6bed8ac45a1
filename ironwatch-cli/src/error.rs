//! Error and exit-code handling for the command line frontend

use ironwatch_core::error::IronwatchError;
use ironwatch_detection::DetectionError;

/// Errors surfaced by CLI commands.
///
/// Every variant renders a short operator-facing message; `exit_code()`
/// translates the variant into the process exit status so scripts can
/// branch on the result.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// The configuration file could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand could not complete its work.
    #[error("{0}")]
    Command(String),

    /// A report ran to completion but found problems that warrant a
    /// non-zero exit (invalid rule files, query issues).
    #[error("{0}")]
    Validation(String),

    /// Rendering a report as JSON failed.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// Underlying filesystem or stream failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Error bubbled up from ironwatch-core.
    #[error("{0}")]
    Core(#[from] IronwatchError),

    /// Error from the detection crate (rule loading, toggling).
    #[error("rule error: {0}")]
    Rule(String),
}

impl CliError {
    /// Exit status reported to the shell.
    ///
    /// | Exit | When                                        |
    /// |------|---------------------------------------------|
    /// | 0    | success                                     |
    /// | 1    | command, rule, or serialization failure     |
    /// | 2    | configuration problem                       |
    /// | 4    | validate/diagnose reported findings         |
    /// | 10   | io failure                                  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Validation(_) => 4,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Core(_) | Self::Rule(_) => 1,
        }
    }
}

impl From<DetectionError> for CliError {
    fn from(e: DetectionError) -> Self {
        Self::Rule(e.to_string())
    }
}
