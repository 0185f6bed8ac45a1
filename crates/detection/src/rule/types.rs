//! 탐지 규칙 데이터 타입
//!
//! YAML 규칙 파일에서 역직렬화되는 원시 구조체([`RuleFile`])와
//! 로딩이 끝난 정규화 모델([`Rule`])을 분리합니다. 기본값 적용과
//! ID/분류 파생은 [`Rule::from_file`]에서 한 번만 수행됩니다.

use std::fmt;
use std::path::Path;

use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

use ironwatch_core::types::Severity;

/// 규칙 ID로 사용하는 해시 접두 길이 (16진수 문자 수)
const RULE_ID_HEX_LEN: usize = 12;

/// 원시 규칙 파일 -- 하나의 YAML 파일에 대응합니다.
///
/// 모든 필드는 선택적이며 문서화된 기본값을 가집니다. `name`은 ID 파생에
/// 원본 값이 필요하므로 기본값을 여기서 적용하지 않고 `Option`으로 둡니다.
///
/// # YAML 스키마
/// ```yaml
/// name: Multiple Failed Logons
/// description: Detects repeated failed logon attempts for one account
/// type: esql
/// query: FROM logs-* | WHERE event.code == "4625" | STATS count = COUNT(*) BY user.name
/// severity: high
/// risk_score: 73
/// enabled: true
/// index:
///   - winlogbeat-*
/// tags:
///   - authentication
/// schedule_interval: 5m
/// mitre_attack:
///   tactic: TA0006
///   technique: T1110
/// nist:
///   - AC-7
/// pci-dss:
///   - "8.1.6"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFile {
    /// 규칙 이름 (없으면 "Unnamed Rule"로 표시되지만 ID에는 빈 문자열이 쓰임)
    pub name: Option<String>,
    /// 규칙 설명
    #[serde(default)]
    pub description: String,
    /// 규칙 유형
    #[serde(rename = "type", default = "default_query_language")]
    pub rule_type: String,
    /// 백엔드 쿼리 텍스트
    #[serde(default)]
    pub query: String,
    /// 쿼리 언어 태그
    #[serde(default = "default_query_language")]
    pub query_language: String,
    /// 대상 인덱스 패턴 목록
    #[serde(default)]
    pub index: Vec<String>,
    /// 활성화 여부
    #[serde(default)]
    pub enabled: bool,
    /// 심각도
    #[serde(default)]
    pub severity: Severity,
    /// 위험 점수 (0-100)
    #[serde(default = "default_risk_score")]
    pub risk_score: u32,
    /// 분류 태그
    #[serde(default)]
    pub tags: Vec<String>,
    /// 실행 주기 (메타데이터로만 보존)
    #[serde(default = "default_schedule_interval")]
    pub schedule_interval: String,
    /// MITRE ATT&CK 참조
    #[serde(default)]
    pub mitre_attack: serde_json::Map<String, serde_json::Value>,
    /// NIST 컨트롤 참조
    #[serde(default)]
    pub nist: Vec<serde_json::Value>,
    /// GDPR 조항 참조
    #[serde(default)]
    pub gdpr: Vec<serde_json::Value>,
    /// PCI-DSS 요구사항 참조
    #[serde(rename = "pci-dss", default)]
    pub pci_dss: Vec<serde_json::Value>,
    /// HIPAA 조항 참조
    #[serde(default)]
    pub hipaa: Vec<serde_json::Value>,
}

fn default_query_language() -> String {
    "esql".to_owned()
}

fn default_risk_score() -> u32 {
    50
}

fn default_schedule_interval() -> String {
    "5m".to_owned()
}

/// 정규화된 탐지 규칙
///
/// 로딩 시점에 ID, 분류, 기본값이 모두 결정된 불변 모델입니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    /// 안정 식별자 -- `"{source_path}:{원본 name}"`의 MD5 앞 12자
    pub id: String,
    /// 규칙 이름
    pub name: String,
    /// 규칙 설명
    pub description: String,
    /// 규칙 유형
    pub rule_type: String,
    /// 백엔드 쿼리 텍스트
    pub query: String,
    /// 쿼리 언어 태그
    pub query_language: String,
    /// 대상 인덱스 패턴 목록
    pub index: Vec<String>,
    /// 활성화 여부
    pub enabled: bool,
    /// 심각도
    pub severity: Severity,
    /// 위험 점수 (0-100)
    pub risk_score: u32,
    /// 분류 태그
    pub tags: Vec<String>,
    /// 실행 주기 (메타데이터)
    pub schedule_interval: String,
    /// 컴플라이언스 분류 -- 디렉토리 조상에서 파생 (GDPR, NIST, PCI-DSS, unknown)
    pub category: String,
    /// MITRE ATT&CK 참조
    pub mitre_attack: serde_json::Map<String, serde_json::Value>,
    /// NIST 컨트롤 참조
    pub nist: Vec<serde_json::Value>,
    /// GDPR 조항 참조
    pub gdpr: Vec<serde_json::Value>,
    /// PCI-DSS 요구사항 참조
    pub pci_dss: Vec<serde_json::Value>,
    /// HIPAA 조항 참조
    pub hipaa: Vec<serde_json::Value>,
    /// 규칙 파일 경로
    pub source_path: String,
}

impl Rule {
    /// 원시 파일 구조체를 정규화 모델로 변환합니다.
    ///
    /// ID는 파일 경로와 원본 `name` 값(없으면 빈 문자열)으로 파생되므로
    /// 같은 파일을 다시 로드하면 항상 같은 ID가 나옵니다. `name` 표시값의
    /// 기본 적용은 ID 파생 이후에 수행됩니다.
    pub fn from_file(file: RuleFile, source_path: &Path) -> Self {
        let raw_name = file.name.as_deref().unwrap_or("");
        let id = derive_rule_id(source_path, raw_name);
        let category = category_from_path(source_path);

        Self {
            id,
            name: file.name.unwrap_or_else(|| "Unnamed Rule".to_owned()),
            description: file.description,
            rule_type: file.rule_type,
            query: file.query,
            query_language: file.query_language,
            index: file.index,
            enabled: file.enabled,
            severity: file.severity,
            risk_score: file.risk_score,
            tags: file.tags,
            schedule_interval: file.schedule_interval,
            category,
            mitre_attack: file.mitre_attack,
            nist: file.nist,
            gdpr: file.gdpr,
            pci_dss: file.pci_dss,
            hipaa: file.hipaa,
            source_path: source_path.display().to_string(),
        }
    }

    /// 실행 가능한 쿼리를 가지고 있는지 확인합니다.
    ///
    /// 공백만 있는 쿼리는 실행 대상이 아닙니다.
    pub fn has_query(&self) -> bool {
        !self.query.trim().is_empty()
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}, category: {})",
            self.severity, self.name, self.id, self.category,
        )
    }
}

/// 규칙 ID를 파생합니다.
///
/// 입력 문자열 구성(`"{경로}:{이름}"`)은 기존 배포의 ID와 호환을 유지하기
/// 위한 것이므로 바꾸면 안 됩니다.
pub fn derive_rule_id(source_path: &Path, raw_name: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(format!("{}:{}", source_path.display(), raw_name).as_bytes());
    let digest = hasher.finalize();
    let mut id = hex::encode(digest);
    id.truncate(RULE_ID_HEX_LEN);
    id
}

/// 경로 조상에서 컴플라이언스 분류를 파생합니다.
///
/// 마커 디렉토리명과의 일치를 이 우선순위로 검사합니다:
/// `GDPR_yml` → `NIST_rule_base` → `PCI-DSS_yml`. 없으면 `unknown`.
pub fn category_from_path(path: &Path) -> String {
    let has_component = |marker: &str| path.components().any(|c| c.as_os_str() == marker);

    if has_component("GDPR_yml") {
        "GDPR".to_owned()
    } else if has_component("NIST_rule_base") {
        "NIST".to_owned()
    } else if has_component("PCI-DSS_yml") {
        "PCI-DSS".to_owned()
    } else {
        "unknown".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_yaml() -> &'static str {
        r#"
name: Multiple Failed Logons
description: Detects repeated failed logon attempts
type: esql
query: FROM logs-* | WHERE event.code == "4625"
severity: high
risk_score: 73
enabled: true
index:
  - winlogbeat-*
tags:
  - authentication
nist:
  - AC-7
"#
    }

    #[test]
    fn parse_full_rule_file() {
        let file: RuleFile = serde_yaml::from_str(sample_yaml()).unwrap();
        assert_eq!(file.name.as_deref(), Some("Multiple Failed Logons"));
        assert_eq!(file.severity, Severity::High);
        assert_eq!(file.risk_score, 73);
        assert!(file.enabled);
        assert_eq!(file.index, vec!["winlogbeat-*"]);
        assert_eq!(file.nist.len(), 1);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let file: RuleFile = serde_yaml::from_str("name: Minimal Rule").unwrap();
        assert_eq!(file.description, "");
        assert_eq!(file.rule_type, "esql");
        assert_eq!(file.query, "");
        assert_eq!(file.query_language, "esql");
        assert!(file.index.is_empty());
        assert!(!file.enabled);
        assert_eq!(file.severity, Severity::Medium);
        assert_eq!(file.risk_score, 50);
        assert!(file.tags.is_empty());
        assert_eq!(file.schedule_interval, "5m");
        assert!(file.mitre_attack.is_empty());
        assert!(file.pci_dss.is_empty());
    }

    #[test]
    fn missing_name_displays_unnamed() {
        let file: RuleFile = serde_yaml::from_str("query: FROM logs-*").unwrap();
        let rule = Rule::from_file(file, &PathBuf::from("rules/orphan.yml"));
        assert_eq!(rule.name, "Unnamed Rule");
    }

    #[test]
    fn pci_dss_key_uses_dash() {
        let yaml = r#"
name: PCI Rule
pci-dss:
  - "10.2.4"
"#;
        let file: RuleFile = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(file.pci_dss.len(), 1);
    }

    #[test]
    fn rule_id_is_deterministic() {
        let path = PathBuf::from("rules/NIST_rule_base/logon.yml");
        let a = derive_rule_id(&path, "Multiple Failed Logons");
        let b = derive_rule_id(&path, "Multiple Failed Logons");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn rule_id_changes_with_path_and_name() {
        let path_a = PathBuf::from("rules/a.yml");
        let path_b = PathBuf::from("rules/b.yml");
        assert_ne!(
            derive_rule_id(&path_a, "Same Name"),
            derive_rule_id(&path_b, "Same Name")
        );
        assert_ne!(
            derive_rule_id(&path_a, "Name One"),
            derive_rule_id(&path_a, "Name Two")
        );
    }

    #[test]
    fn rule_id_uses_raw_name_not_display_default() {
        // name이 없는 파일과 name이 "Unnamed Rule"인 파일은 표시 이름은 같지만
        // ID는 달라야 한다 (원본 값 기준이므로)
        let path = PathBuf::from("rules/x.yml");
        let without_name: RuleFile = serde_yaml::from_str("query: FROM a").unwrap();
        let with_default_name: RuleFile =
            serde_yaml::from_str("name: Unnamed Rule\nquery: FROM a").unwrap();
        let rule_a = Rule::from_file(without_name, &path);
        let rule_b = Rule::from_file(with_default_name, &path);
        assert_eq!(rule_a.name, rule_b.name);
        assert_ne!(rule_a.id, rule_b.id);
        assert_eq!(rule_a.id, derive_rule_id(&path, ""));
    }

    #[test]
    fn category_from_marker_directories() {
        assert_eq!(
            category_from_path(&PathBuf::from("rules/GDPR_yml/access.yml")),
            "GDPR"
        );
        assert_eq!(
            category_from_path(&PathBuf::from("rules/NIST_rule_base/logon.yml")),
            "NIST"
        );
        assert_eq!(
            category_from_path(&PathBuf::from("rules/PCI-DSS_yml/card.yml")),
            "PCI-DSS"
        );
        assert_eq!(
            category_from_path(&PathBuf::from("rules/custom/thing.yml")),
            "unknown"
        );
    }

    #[test]
    fn category_marker_requires_whole_component() {
        // 부분 문자열이 아니라 디렉토리명 전체가 일치해야 한다
        assert_eq!(
            category_from_path(&PathBuf::from("rules/GDPR_yml_backup/a.yml")),
            "unknown"
        );
    }

    #[test]
    fn category_precedence_is_gdpr_first() {
        let path = PathBuf::from("GDPR_yml/NIST_rule_base/a.yml");
        assert_eq!(category_from_path(&path), "GDPR");
    }

    #[test]
    fn from_file_builds_canonical_rule() {
        let file: RuleFile = serde_yaml::from_str(sample_yaml()).unwrap();
        let path = PathBuf::from("rules/NIST_rule_base/logon.yml");
        let rule = Rule::from_file(file, &path);

        assert_eq!(rule.name, "Multiple Failed Logons");
        assert_eq!(rule.category, "NIST");
        assert_eq!(rule.source_path, "rules/NIST_rule_base/logon.yml");
        assert_eq!(rule.id, derive_rule_id(&path, "Multiple Failed Logons"));
        assert!(rule.has_query());
    }

    #[test]
    fn has_query_rejects_whitespace() {
        let file: RuleFile = serde_yaml::from_str("name: Blank\nquery: \"   \"").unwrap();
        let rule = Rule::from_file(file, &PathBuf::from("rules/blank.yml"));
        assert!(!rule.has_query());
    }

    #[test]
    fn rule_display() {
        let file: RuleFile = serde_yaml::from_str(sample_yaml()).unwrap();
        let rule = Rule::from_file(file, &PathBuf::from("rules/NIST_rule_base/logon.yml"));
        let display = rule.to_string();
        assert!(display.contains("high"));
        assert!(display.contains("Multiple Failed Logons"));
        assert!(display.contains("NIST"));
    }
}
