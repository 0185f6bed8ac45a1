//! 규칙 저장소 -- 로드된 규칙의 조회와 통계
//!
//! [`RuleRepository`]는 [`RuleLoader`]가 읽어온 규칙을 메모리에 보관하고
//! ID/분류/심각도 기준 조회, 조합 필터, 통계 집계를 제공합니다.
//! 재로드는 전체 성공 시에만 기존 목록을 교체합니다.

use std::path::PathBuf;

use serde::Serialize;

use ironwatch_core::metrics as m;
use ironwatch_core::types::Severity;

use super::loader::RuleLoader;
use super::types::Rule;
use crate::error::DetectionError;

/// 규칙 조회 필터 -- 모든 조건은 AND 결합입니다.
#[derive(Debug, Clone, Default)]
pub struct RuleFilter {
    /// 컴플라이언스 분류 (GDPR, NIST, PCI-DSS, unknown)
    pub category: Option<String>,
    /// 심각도
    pub severity: Option<Severity>,
    /// 활성화 여부
    pub enabled: Option<bool>,
}

impl RuleFilter {
    /// 규칙이 필터의 모든 조건을 만족하는지 확인합니다.
    pub fn matches(&self, rule: &Rule) -> bool {
        if let Some(category) = &self.category
            && !rule.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(severity) = self.severity
            && rule.severity != severity
        {
            return false;
        }
        if let Some(enabled) = self.enabled
            && rule.enabled != enabled
        {
            return false;
        }
        true
    }
}

/// 규칙 집계 통계
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleStatistics {
    /// 전체 규칙 수
    pub total: usize,
    /// 활성 규칙 수
    pub enabled: usize,
    /// 비활성 규칙 수
    pub disabled: usize,
    /// 분류별 규칙 수 (로드 순서 기준 첫 등장 순)
    pub by_category: Vec<(String, usize)>,
    /// 심각도별 규칙 수 (로드 순서 기준 첫 등장 순)
    pub by_severity: Vec<(Severity, usize)>,
}

/// 규칙 저장소
pub struct RuleRepository {
    rules: Vec<Rule>,
    rules_dir: PathBuf,
}

impl RuleRepository {
    /// 주어진 규칙 디렉토리를 대상으로 빈 저장소를 생성합니다.
    ///
    /// 규칙은 [`RuleRepository::load_all`]을 호출하기 전까지 비어 있습니다.
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules: Vec::new(),
            rules_dir: rules_dir.into(),
        }
    }

    /// 규칙 디렉토리를 다시 스캔하여 전체 규칙을 로드합니다.
    ///
    /// 로드에 실패하면 기존 규칙 목록을 그대로 유지합니다.
    ///
    /// # Errors
    /// - 디렉토리 순회 중 I/O 오류가 발생한 경우
    /// - 규칙 수 상한을 초과한 경우
    pub async fn load_all(&mut self) -> Result<usize, DetectionError> {
        let rules = RuleLoader::load_directory(&self.rules_dir).await?;

        let active = rules.iter().filter(|r| r.enabled).count();
        metrics::gauge!(m::RULES_ACTIVE).set(active as f64);

        self.rules = rules;
        Ok(self.rules.len())
    }

    /// 규칙 디렉토리 경로를 반환합니다.
    pub fn rules_dir(&self) -> &PathBuf {
        &self.rules_dir
    }

    /// 로드된 모든 규칙을 반환합니다.
    pub fn all(&self) -> &[Rule] {
        &self.rules
    }

    /// 로드된 규칙 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 규칙이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// ID로 규칙을 조회합니다.
    pub fn get_by_id(&self, rule_id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == rule_id)
    }

    /// ID 목록으로 규칙을 조회합니다.
    ///
    /// 존재하지 않는 ID는 조용히 건너뜁니다. 결과 순서는 로드 순서를
    /// 따르며 요청 순서가 아닙니다.
    pub fn get_many(&self, rule_ids: &[String]) -> Vec<Rule> {
        self.rules
            .iter()
            .filter(|r| rule_ids.contains(&r.id))
            .cloned()
            .collect()
    }

    /// 분류별 규칙을 조회합니다 (대소문자 무시).
    pub fn get_by_category(&self, category: &str) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// 심각도별 규칙을 조회합니다.
    pub fn get_by_severity(&self, severity: Severity) -> Vec<&Rule> {
        self.rules
            .iter()
            .filter(|r| r.severity == severity)
            .collect()
    }

    /// 활성화된 규칙만 조회합니다.
    pub fn enabled(&self) -> Vec<&Rule> {
        self.rules.iter().filter(|r| r.enabled).collect()
    }

    /// 조합 필터로 규칙을 조회합니다.
    pub fn list(&self, filter: &RuleFilter) -> Vec<&Rule> {
        self.rules.iter().filter(|r| filter.matches(r)).collect()
    }

    /// 규칙 통계를 집계합니다.
    ///
    /// 분류/심각도 집계는 규칙 로드 순서에서 각 키가 처음 등장한 순서를
    /// 유지합니다.
    pub fn statistics(&self) -> RuleStatistics {
        let enabled = self.rules.iter().filter(|r| r.enabled).count();

        let mut by_category: Vec<(String, usize)> = Vec::new();
        let mut by_severity: Vec<(Severity, usize)> = Vec::new();

        for rule in &self.rules {
            match by_category.iter_mut().find(|(c, _)| *c == rule.category) {
                Some(entry) => entry.1 += 1,
                None => by_category.push((rule.category.clone(), 1)),
            }
            match by_severity.iter_mut().find(|(s, _)| *s == rule.severity) {
                Some(entry) => entry.1 += 1,
                None => by_severity.push((rule.severity, 1)),
            }
        }

        RuleStatistics {
            total: self.rules.len(),
            enabled,
            disabled: self.rules.len() - enabled,
            by_category,
            by_severity,
        }
    }
}
