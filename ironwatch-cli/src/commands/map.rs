//! `ironwatch map` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;

use ironwatch_detection::FieldMapper;

use crate::cli::{MapAction, MapArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `map` command.
///
/// Mapping commands work entirely on the built-in table and never touch
/// the configuration file.
pub async fn execute(
    args: MapArgs,
    _config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        MapAction::Transform { query, fallback } => execute_transform(&query, fallback, writer),
        MapAction::List => execute_list(writer),
    }
}

fn execute_transform(query: &str, fallback: bool, writer: &OutputWriter) -> Result<(), CliError> {
    let mapper = FieldMapper::new();

    let output = if fallback {
        mapper.transform_with_fallback(query)
    } else {
        mapper.transform_direct(query)
    };

    let report = TransformReport {
        mode: if fallback { "fallback" } else { "direct" }.to_owned(),
        changed: output != query,
        input: query.to_owned(),
        output,
    };

    writer.render(&report)?;

    Ok(())
}

fn execute_list(writer: &OutputWriter) -> Result<(), CliError> {
    let mapper = FieldMapper::new();

    let report = MappingListReport {
        total: mapper.len(),
        mappings: mapper
            .mappings()
            .iter()
            .map(|entry| MappingRow {
                canonical: entry.canonical().to_owned(),
                aliases: entry.aliases().to_vec(),
            })
            .collect(),
    };

    writer.render(&report)?;

    Ok(())
}

#[derive(Serialize)]
pub struct TransformReport {
    pub mode: String,
    pub changed: bool,
    pub input: String,
    pub output: String,
}

impl Render for TransformReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Query Transform ({})", self.mode.bold())?;
        writeln!(w, "  Input:  {}", self.input)?;
        writeln!(w, "  Output: {}", self.output)?;

        if !self.changed {
            writeln!(w)?;
            writeln!(
                w,
                "  {}",
                "no canonical field names matched; query unchanged".yellow()
            )?;
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct MappingListReport {
    pub total: usize,
    pub mappings: Vec<MappingRow>,
}

#[derive(Serialize)]
pub struct MappingRow {
    pub canonical: String,
    pub aliases: Vec<String>,
}

impl Render for MappingListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Field Mappings ({} total)", self.total.to_string().bold())?;
        writeln!(w)?;
        writeln!(w, "{:<28} Raw schema aliases", "Canonical field")?;
        writeln!(w, "{}", "-".repeat(80))?;

        for m in &self.mappings {
            writeln!(w, "{:<28} {}", m.canonical, m.aliases.join(", "))?;
        }

        Ok(())
    }
}
