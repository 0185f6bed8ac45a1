//! Report rendering for text and JSON output modes
//!
//! Every subcommand builds a serializable report struct and hands it to
//! [`OutputWriter`]; the writer decides how the bytes reach stdout so
//! command handlers never branch on the output format themselves.

use std::io::Write;

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::CliError;

/// Routes a report to stdout in the format chosen on the command line.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Write a report to stdout.
    pub fn render<T: Render + Serialize>(&self, payload: &T) -> Result<(), CliError> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        self.render_to(payload, &mut handle)
    }

    /// Write a report into an arbitrary sink.
    ///
    /// Text mode defers to the payload's [`Render`] impl; JSON mode
    /// pretty-prints the `Serialize` form and terminates it with a
    /// newline so piped output stays line-oriented.
    fn render_to<T, W>(&self, payload: &T, sink: &mut W) -> Result<(), CliError>
    where
        T: Render + Serialize,
        W: Write,
    {
        match self.format {
            OutputFormat::Text => {
                payload.render_text(sink)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *sink, payload)?;
                writeln!(sink)?;
            }
        }
        Ok(())
    }
}

/// Human-readable rendering for a report struct.
///
/// Paired with `serde::Serialize` on every report type so the same
/// value can feed both output modes.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}
