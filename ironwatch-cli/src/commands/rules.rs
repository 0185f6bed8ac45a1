//! `ironwatch rules` command handler

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use ironwatch_core::Severity;
use ironwatch_detection::DetectionError;
use ironwatch_detection::rule::{
    Rule, RuleFilter, RuleLoader, RuleRepository, RuleStatistics, set_all_enabled,
};

use crate::cli::{RulesAction, RulesArgs};
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `rules` command.
pub async fn execute(
    args: RulesArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        RulesAction::List {
            category,
            severity,
            state,
        } => execute_list(config_path, category, severity, state, writer).await,
        RulesAction::Show { id } => execute_show(config_path, &id, writer).await,
        RulesAction::Stats => execute_stats(config_path, writer).await,
        RulesAction::Validate { path } => execute_validate(config_path, path, writer).await,
        RulesAction::Enable { path } => execute_toggle(config_path, path, true, writer).await,
        RulesAction::Disable { path } => execute_toggle(config_path, path, false, writer).await,
    }
}

async fn execute_list(
    config_path: &Path,
    category: Option<String>,
    severity: Option<String>,
    state: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let filter = RuleFilter {
        category,
        severity: severity.as_deref().map(parse_severity).transpose()?,
        enabled: state.as_deref().map(parse_state).transpose()?,
    };

    let repository = load_repository(config_path).await?;
    let rules = repository.list(&filter);

    let report = RuleListReport {
        total: rules.len(),
        rules: rules.into_iter().map(RuleEntry::from_rule).collect(),
    };

    writer.render(&report)?;

    Ok(())
}

async fn execute_show(
    config_path: &Path,
    rule_id: &str,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let repository = load_repository(config_path).await?;
    let rule = repository
        .get_by_id(rule_id)
        .ok_or_else(|| CliError::Command(format!("rule not found: {}", rule_id)))?;

    let report = RuleDetailReport::from_rule(rule);

    writer.render(&report)?;

    Ok(())
}

async fn execute_stats(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    let repository = load_repository(config_path).await?;

    let report = RuleStatsReport {
        rules_dir: repository.rules_dir().display().to_string(),
        stats: repository.statistics(),
    };

    writer.render(&report)?;

    Ok(())
}

async fn execute_validate(
    config_path: &Path,
    path: Option<PathBuf>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let dir = super::resolve_rules_dir(config_path, path).await?;

    info!(path = %dir.display(), "validating detection rules");

    let files = collect_rule_files(&dir).await?;

    let mut valid = 0usize;
    let mut empty = 0usize;
    let mut errors = Vec::new();
    for file in &files {
        match RuleLoader::load_file(file).await {
            Ok(_) => valid += 1,
            Err(DetectionError::EmptyRuleFile { .. }) => empty += 1,
            Err(e) => errors.push(RuleFileError {
                file: file.display().to_string(),
                error: e.to_string(),
            }),
        }
    }

    let report = RuleValidationReport {
        path: dir.display().to_string(),
        total_files: files.len(),
        valid,
        empty,
        invalid: errors.len(),
        errors,
    };

    writer.render(&report)?;

    if report.invalid > 0 {
        return Err(CliError::Validation(format!(
            "{} invalid rule files",
            report.invalid
        )));
    }

    Ok(())
}

async fn execute_toggle(
    config_path: &Path,
    path: Option<PathBuf>,
    enable: bool,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let dir = super::resolve_rules_dir(config_path, path).await?;

    info!(path = %dir.display(), enable, "toggling rule files");

    let summary = set_all_enabled(&dir, enable).await?;

    let report = ToggleReport {
        path: dir.display().to_string(),
        target_state: if enable { "enabled" } else { "disabled" }.to_owned(),
        total_files: summary.total_files,
        modified: summary.modified,
        errors: summary.errors,
    };

    writer.render(&report)?;

    if report.errors > 0 {
        return Err(CliError::Rule(format!(
            "{} rule files could not be updated",
            report.errors
        )));
    }

    Ok(())
}

/// Load the rule repository from the directory named in the config file.
async fn load_repository(config_path: &Path) -> Result<RuleRepository, CliError> {
    let dir = super::resolve_rules_dir(config_path, None).await?;

    info!(rules_dir = %dir.display(), "loading detection rules");

    let mut repository = RuleRepository::new(dir);
    repository.load_all().await?;
    Ok(repository)
}

/// Collect `.yml` / `.yaml` files from a directory tree, sorted by path.
///
/// Unlike repository loading, validation needs each file individually so
/// that per-file errors can be reported.
async fn collect_rule_files(root: &Path) -> Result<Vec<PathBuf>, CliError> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(current) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&current).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
                continue;
            }
            let is_yaml = path
                .extension()
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if is_yaml {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

fn parse_severity(s: &str) -> Result<Severity, CliError> {
    Severity::from_str_loose(s).ok_or_else(|| {
        CliError::Command(format!(
            "unknown severity: {} (expected: low, medium, high, critical)",
            s
        ))
    })
}

fn parse_state(s: &str) -> Result<bool, CliError> {
    match s {
        "enabled" => Ok(true),
        "disabled" => Ok(false),
        other => Err(CliError::Command(format!(
            "unknown state: {} (expected: enabled, disabled)",
            other
        ))),
    }
}

fn severity_colored(severity: &str) -> colored::ColoredString {
    use colored::Colorize;

    match severity {
        "critical" => severity.red().bold(),
        "high" => severity.red(),
        "medium" => severity.yellow(),
        "low" => severity.green(),
        _ => severity.normal(),
    }
}

#[derive(Serialize)]
pub struct RuleListReport {
    pub total: usize,
    pub rules: Vec<RuleEntry>,
}

#[derive(Serialize)]
pub struct RuleEntry {
    pub id: String,
    pub name: String,
    pub severity: String,
    pub category: String,
    pub risk_score: u32,
    pub enabled: bool,
}

impl RuleEntry {
    fn from_rule(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            severity: rule.severity.as_str().to_owned(),
            category: rule.category.clone(),
            risk_score: rule.risk_score,
            enabled: rule.enabled,
        }
    }
}

impl Render for RuleListReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Detection Rules ({} total)",
            self.total.to_string().bold()
        )?;
        writeln!(w)?;
        writeln!(
            w,
            "{:<14} {:<40} {:<10} {:<10} {:<6} State",
            "ID", "Name", "Severity", "Category", "Risk"
        )?;
        writeln!(w, "{}", "-".repeat(92))?;

        for r in &self.rules {
            let state = if r.enabled {
                "enabled".green()
            } else {
                "disabled".yellow()
            };

            writeln!(
                w,
                "{:<14} {:<40} {:<10} {:<10} {:<6} {}",
                r.id,
                r.name,
                severity_colored(&r.severity),
                r.category,
                r.risk_score,
                state
            )?;
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct RuleDetailReport {
    pub id: String,
    pub name: String,
    pub description: String,
    pub rule_type: String,
    pub query_language: String,
    pub severity: String,
    pub risk_score: u32,
    pub category: String,
    pub enabled: bool,
    pub index: Vec<String>,
    pub tags: Vec<String>,
    pub schedule_interval: String,
    pub source_path: String,
    pub query: String,
}

impl RuleDetailReport {
    fn from_rule(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            description: rule.description.clone(),
            rule_type: rule.rule_type.clone(),
            query_language: rule.query_language.clone(),
            severity: rule.severity.as_str().to_owned(),
            risk_score: rule.risk_score,
            category: rule.category.clone(),
            enabled: rule.enabled,
            index: rule.index.clone(),
            tags: rule.tags.clone(),
            schedule_interval: rule.schedule_interval.clone(),
            source_path: rule.source_path.clone(),
            query: rule.query.clone(),
        }
    }
}

impl Render for RuleDetailReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule: {} ({})", self.name.bold(), self.id)?;
        writeln!(
            w,
            "  Severity:  {:<10} Risk: {}",
            severity_colored(&self.severity),
            self.risk_score
        )?;
        writeln!(w, "  Category:  {}", self.category)?;
        writeln!(
            w,
            "  State:     {}",
            if self.enabled {
                "enabled".green()
            } else {
                "disabled".yellow()
            }
        )?;
        writeln!(
            w,
            "  Type:      {} ({})",
            self.rule_type, self.query_language
        )?;
        writeln!(w, "  Index:     {}", self.index.join(", "))?;
        writeln!(w, "  Tags:      {}", self.tags.join(", "))?;
        writeln!(w, "  Schedule:  {}", self.schedule_interval)?;
        writeln!(w, "  Source:    {}", self.source_path)?;

        if !self.description.is_empty() {
            writeln!(w)?;
            writeln!(w, "  {}", self.description)?;
        }

        writeln!(w)?;
        writeln!(w, "Query:")?;
        for line in self.query.lines() {
            writeln!(w, "    {}", line)?;
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct RuleStatsReport {
    pub rules_dir: String,
    pub stats: RuleStatistics,
}

impl Render for RuleStatsReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule Statistics ({})", self.rules_dir.bold())?;
        writeln!(
            w,
            "  Total: {} ({} enabled, {} disabled)",
            self.stats.total,
            self.stats.enabled.to_string().green(),
            self.stats.disabled.to_string().yellow()
        )?;

        writeln!(w)?;
        writeln!(w, "  By Category:")?;
        for (category, count) in &self.stats.by_category {
            writeln!(w, "    {:<10} {}", category, count)?;
        }

        writeln!(w)?;
        writeln!(w, "  By Severity:")?;
        for (severity, count) in &self.stats.by_severity {
            writeln!(w, "    {:<10} {}", severity_colored(severity.as_str()), count)?;
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct RuleValidationReport {
    pub path: String,
    pub total_files: usize,
    pub valid: usize,
    pub empty: usize,
    pub invalid: usize,
    pub errors: Vec<RuleFileError>,
}

#[derive(Serialize)]
pub struct RuleFileError {
    pub file: String,
    pub error: String,
}

impl Render for RuleValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Rule check: {}", self.path.bold())?;
        writeln!(
            w,
            "  Files: {} total, {} valid, {} empty, {} invalid",
            self.total_files,
            self.valid.to_string().green(),
            self.empty,
            if self.invalid > 0 {
                self.invalid.to_string().red()
            } else {
                self.invalid.to_string().normal()
            }
        )?;

        if !self.errors.is_empty() {
            writeln!(w)?;
            writeln!(w, "Errors:")?;
            for e in &self.errors {
                writeln!(w, "    {}  {}", e.file.red(), e.error)?;
            }
        }

        Ok(())
    }
}

#[derive(Serialize)]
pub struct ToggleReport {
    pub path: String,
    pub target_state: String,
    pub total_files: usize,
    pub modified: usize,
    pub errors: usize,
}

impl Render for ToggleReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Set rules {} under {}",
            self.target_state.bold(),
            self.path
        )?;
        writeln!(
            w,
            "  Files: {} total, {} modified, {} errors",
            self.total_files,
            self.modified.to_string().green(),
            if self.errors > 0 {
                self.errors.to_string().red()
            } else {
                self.errors.to_string().normal()
            }
        )?;

        Ok(())
    }
}
