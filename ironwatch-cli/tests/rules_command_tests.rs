//! Integration tests for `ironwatch rules` command operations.
//!
//! Tests rule loading, lookup, toggling and config resolution with real
//! files on disk, the same way the command handlers drive the libraries.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use ironwatch_core::config::IronwatchConfig;
use ironwatch_detection::DetectionError;
use ironwatch_detection::rule::{RuleFilter, RuleLoader, RuleRepository, set_all_enabled};

fn write_rule(root: &Path, rel: &str, yaml: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("should create rule subdirectory");
    }
    fs::write(&path, yaml).expect("should write rule file");
}

const GOOD_RULE: &str = r#"
name: Multiple Failed Logons
type: esql
query: FROM logs-* | WHERE event.code == "4625"
severity: high
risk_score: 73
enabled: true
index:
  - winlogbeat-*
"#;

#[tokio::test]
async fn test_rules_list_loads_from_config_rules_dir() {
    // Given: A config file pointing at a populated rules directory
    let temp_dir = TempDir::new().expect("should create temp dir");
    let rules_dir = temp_dir.path().join("rules");
    write_rule(&rules_dir, "NIST_rule_base/logons.yml", GOOD_RULE);
    write_rule(
        &rules_dir,
        "GDPR_yml/access.yml",
        "name: Data Access\nquery: FROM logs-*\nseverity: low\nenabled: false\n",
    );

    let config_path = temp_dir.path().join("ironwatch.toml");
    let config_toml = format!(
        "[detection]\nrules_dir = \"{}\"\n",
        rules_dir.display().to_string().replace('\\', "/")
    );
    fs::write(&config_path, config_toml).expect("should write config");

    // When: Resolving the directory from config and loading the repository
    let config = IronwatchConfig::load(&config_path)
        .await
        .expect("config should load");
    let mut repository = RuleRepository::new(&config.detection.rules_dir);
    let loaded = repository.load_all().await.expect("rules should load");

    // Then: Both rules are available with their derived categories
    assert_eq!(loaded, 2, "should load both rule files");
    let nist = repository.get_by_category("NIST");
    assert_eq!(nist.len(), 1);
    assert_eq!(nist[0].name, "Multiple Failed Logons");
    let gdpr = repository.get_by_category("GDPR");
    assert_eq!(gdpr.len(), 1);
}

#[tokio::test]
async fn test_rules_list_filters_combine() {
    // Given: Rules across categories and states
    let temp_dir = TempDir::new().expect("should create temp dir");
    let rules_dir = temp_dir.path().join("rules");
    write_rule(&rules_dir, "NIST_rule_base/a.yml", GOOD_RULE);
    write_rule(
        &rules_dir,
        "NIST_rule_base/b.yml",
        "name: Disabled High\nquery: FROM logs-*\nseverity: high\nenabled: false\n",
    );
    write_rule(
        &rules_dir,
        "PCI-DSS_yml/c.yml",
        "name: Card Access\nquery: FROM logs-*\nseverity: high\nenabled: true\n",
    );

    let mut repository = RuleRepository::new(&rules_dir);
    repository.load_all().await.expect("rules should load");

    // When: Applying the same AND-combined filter `rules list` builds
    let filter = RuleFilter {
        category: Some("NIST".to_owned()),
        severity: Some(ironwatch_core::Severity::High),
        enabled: Some(true),
    };
    let matches = repository.list(&filter);

    // Then: Only the enabled high-severity NIST rule remains
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].name, "Multiple Failed Logons");
}

#[tokio::test]
async fn test_rules_show_finds_rule_by_derived_id() {
    // Given: A loaded repository
    let temp_dir = TempDir::new().expect("should create temp dir");
    let rules_dir = temp_dir.path().join("rules");
    write_rule(&rules_dir, "NIST_rule_base/logons.yml", GOOD_RULE);

    let mut repository = RuleRepository::new(&rules_dir);
    repository.load_all().await.expect("rules should load");

    // When: Looking up the id shown by `rules list`
    let id = repository.all()[0].id.clone();
    let rule = repository.get_by_id(&id);

    // Then: The same rule comes back; unknown ids return None
    assert!(rule.is_some(), "derived id should resolve");
    assert_eq!(rule.expect("rule present").name, "Multiple Failed Logons");
    assert_eq!(id.len(), 12, "id should be 12-char hex");
    assert!(repository.get_by_id("000000000000").is_none());
}

#[tokio::test]
async fn test_rules_validate_distinguishes_broken_and_empty_files() {
    // Given: A valid rule, a broken rule, and an empty rule file
    let temp_dir = TempDir::new().expect("should create temp dir");
    let rules_dir = temp_dir.path().join("rules");
    write_rule(&rules_dir, "NIST_rule_base/good.yml", GOOD_RULE);
    write_rule(&rules_dir, "NIST_rule_base/broken.yml", "name: [unclosed\n");
    write_rule(&rules_dir, "NIST_rule_base/empty.yml", "# comment only\n");

    // When: Validating each file the way `rules validate` does
    let good = RuleLoader::load_file(rules_dir.join("NIST_rule_base/good.yml")).await;
    let broken = RuleLoader::load_file(rules_dir.join("NIST_rule_base/broken.yml")).await;
    let empty = RuleLoader::load_file(rules_dir.join("NIST_rule_base/empty.yml")).await;

    // Then: Each outcome maps to a distinct report bucket
    assert!(good.is_ok(), "valid file should parse");
    assert!(
        matches!(broken, Err(DetectionError::RuleParse { .. })),
        "broken YAML should be a parse error"
    );
    assert!(
        matches!(empty, Err(DetectionError::EmptyRuleFile { .. })),
        "comment-only file should be reported as empty"
    );
}

#[tokio::test]
async fn test_rules_disable_then_enable_rewrites_files() {
    // Given: Two enabled rule files and one with no enabled key
    let temp_dir = TempDir::new().expect("should create temp dir");
    let rules_dir = temp_dir.path().join("rules");
    write_rule(&rules_dir, "GDPR_yml/a.yml", GOOD_RULE);
    write_rule(&rules_dir, "GDPR_yml/b.yml", GOOD_RULE);
    write_rule(
        &rules_dir,
        "GDPR_yml/no-key.yml",
        "name: No Key\nquery: FROM logs-*\n",
    );

    // When: Disabling the whole tree
    let summary = set_all_enabled(&rules_dir, false)
        .await
        .expect("toggle should succeed");

    // Then: Only files carrying the key are rewritten
    assert_eq!(summary.total_files, 3);
    assert_eq!(summary.modified, 2, "file without enabled key is untouched");
    assert_eq!(summary.errors, 0);

    let content =
        fs::read_to_string(rules_dir.join("GDPR_yml/a.yml")).expect("should read rule back");
    assert!(content.contains("enabled: false"));

    // When: Enabling again
    let summary = set_all_enabled(&rules_dir, true)
        .await
        .expect("toggle should succeed");

    // Then: The same two files flip back
    assert_eq!(summary.modified, 2);
    let content =
        fs::read_to_string(rules_dir.join("GDPR_yml/b.yml")).expect("should read rule back");
    assert!(content.contains("enabled: true"));
}

#[tokio::test]
async fn test_rules_stats_aggregates_by_category_and_severity() {
    // Given: Rules across two categories
    let temp_dir = TempDir::new().expect("should create temp dir");
    let rules_dir = temp_dir.path().join("rules");
    write_rule(&rules_dir, "GDPR_yml/a.yml", GOOD_RULE);
    write_rule(
        &rules_dir,
        "GDPR_yml/b.yml",
        "name: B\nquery: FROM logs-*\nseverity: low\nenabled: false\n",
    );
    write_rule(&rules_dir, "PCI-DSS_yml/c.yml", GOOD_RULE);

    let mut repository = RuleRepository::new(&rules_dir);
    repository.load_all().await.expect("rules should load");

    // When: Computing statistics
    let stats = repository.statistics();

    // Then: Counters line up with the fixture
    assert_eq!(stats.total, 3);
    assert_eq!(stats.enabled, 2);
    assert_eq!(stats.disabled, 1);
    assert!(stats.by_category.contains(&("GDPR".to_owned(), 2)));
    assert!(stats.by_category.contains(&("PCI-DSS".to_owned(), 1)));
    assert!(
        stats
            .by_severity
            .contains(&(ironwatch_core::Severity::High, 2))
    );
}

#[tokio::test]
async fn test_config_validate_rejects_bad_detection_values() {
    // Given: A config with an invalid max_alerts value
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[detection]\nmax_alerts = 0\n").expect("should write config");

    // When: Loading the config
    let result = IronwatchConfig::load(&config_path).await;

    // Then: Validation fails with the offending field named
    let err = result.expect_err("zero max_alerts should fail validation");
    assert!(
        err.to_string().contains("max_alerts"),
        "error should name the field: {}",
        err
    );
}

#[tokio::test]
async fn test_missing_rules_dir_loads_empty_set() {
    // Given: A rules directory that does not exist
    let missing = Path::new("/nonexistent/ironwatch/rules");

    // When: Loading the repository
    let mut repository = RuleRepository::new(missing);
    let loaded = repository
        .load_all()
        .await
        .expect("missing directory should not be a hard error");

    // Then: The repository is usable but empty, so `rules list` shows zero
    assert_eq!(loaded, 0);
    assert!(repository.is_empty());
}
