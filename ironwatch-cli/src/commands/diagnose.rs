//! `ironwatch diagnose` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use ironwatch_detection::diagnostics::{self, QueryAnalysis};
use ironwatch_detection::rule::RuleRepository;

use crate::cli::DiagnoseArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `diagnose` command.
///
/// Loads the rule set and checks every enabled query for common problems.
/// Exits non-zero when any problem is found so the command can gate CI.
pub async fn execute(
    args: DiagnoseArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let dir = super::resolve_rules_dir(config_path, args.path).await?;

    info!(path = %dir.display(), "diagnosing rule queries");

    let mut repository = RuleRepository::new(dir.clone());
    repository.load_all().await?;

    let analysis = diagnostics::analyze(repository.all());

    let report = DiagnoseReport {
        path: dir.display().to_string(),
        total_rules: repository.len(),
        issue_count: analysis.issue_count(),
        analysis,
    };

    writer.render(&report)?;

    if report.issue_count > 0 {
        return Err(CliError::Validation(format!(
            "{} rule queries need attention",
            report.issue_count
        )));
    }

    Ok(())
}

#[derive(Serialize)]
pub struct DiagnoseReport {
    pub path: String,
    pub total_rules: usize,
    pub issue_count: usize,
    pub analysis: QueryAnalysis,
}

impl Render for DiagnoseReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Query Diagnosis: {}", self.path.bold())?;
        writeln!(
            w,
            "  Rules: {} total, {} enabled checked",
            self.total_rules, self.analysis.total_enabled
        )?;

        if self.issue_count == 0 {
            writeln!(w, "  Status: {}", "CLEAN".green().bold())?;
            return Ok(());
        }

        writeln!(
            w,
            "  Status: {} ({} issues)",
            "ISSUES FOUND".red().bold(),
            self.issue_count
        )?;

        if !self.analysis.empty_query.is_empty() {
            writeln!(w)?;
            writeln!(w, "Rules with empty queries:")?;
            for name in &self.analysis.empty_query {
                writeln!(w, "  {}", name.red())?;
            }
        }

        if !self.analysis.missing_time_filter.is_empty() {
            writeln!(w)?;
            writeln!(w, "Rules referencing @timestamp without NOW():")?;
            for name in &self.analysis.missing_time_filter {
                writeln!(w, "  {}", name.yellow())?;
            }
        }

        if !self.analysis.missing_index.is_empty() {
            writeln!(w)?;
            writeln!(w, "Rules without an index pattern:")?;
            for name in &self.analysis.missing_index {
                writeln!(w, "  {}", name.yellow())?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnose_report_render_clean() {
        let report = DiagnoseReport {
            path: "rules".to_owned(),
            total_rules: 4,
            issue_count: 0,
            analysis: QueryAnalysis {
                total_enabled: 3,
                ..QueryAnalysis::default()
            },
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("render into Vec cannot fail");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("CLEAN"), "clean result should be shown");
        assert!(
            !output.contains("empty queries"),
            "clean report should not list issue sections"
        );
    }

    #[test]
    fn test_diagnose_report_render_issues() {
        let report = DiagnoseReport {
            path: "rules".to_owned(),
            total_rules: 3,
            issue_count: 2,
            analysis: QueryAnalysis {
                total_enabled: 3,
                empty_query: vec!["Broken Rule".to_owned()],
                missing_time_filter: vec!["Stale Window Rule".to_owned()],
                missing_index: Vec::new(),
            },
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("render into Vec cannot fail");

        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("ISSUES FOUND"));
        assert!(output.contains("Broken Rule"));
        assert!(output.contains("Stale Window Rule"));
        assert!(
            !output.contains("without an index pattern"),
            "empty issue lists should be omitted"
        );
    }

    #[test]
    fn test_diagnose_report_json_shape() {
        let report = DiagnoseReport {
            path: "rules".to_owned(),
            total_rules: 1,
            issue_count: 1,
            analysis: QueryAnalysis {
                total_enabled: 1,
                empty_query: vec!["Broken Rule".to_owned()],
                missing_time_filter: Vec::new(),
                missing_index: Vec::new(),
            },
        };

        let json = serde_json::to_string(&report).expect("serialization succeeds");
        let parsed: serde_json::Value = serde_json::from_str(&json).expect("parses back");

        assert_eq!(parsed["issue_count"].as_u64(), Some(1));
        assert_eq!(
            parsed["analysis"]["empty_query"][0].as_str(),
            Some("Broken Rule")
        );
    }
}
