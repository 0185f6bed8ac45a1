//! 규칙 쿼리 정적 점검
//!
//! 규칙을 실행하지 않고 흔한 품질 문제를 찾아냅니다. 활성 규칙만
//! 검사하며, 비활성 규칙은 어차피 실행되지 않으므로 건너뜁니다.
//!
//! 점검 항목:
//! - 쿼리가 비어 있는 규칙 (실행 시 건너뛰어지므로 탐지 공백)
//! - `@timestamp`를 참조하면서 `NOW()` 기준 시간 창이 없는 쿼리
//!   (스케줄 실행마다 전체 이력을 다시 스캔하게 됨)
//! - 대상 인덱스가 지정되지 않은 규칙

use serde::Serialize;

use crate::rule::Rule;

/// 쿼리 점검 결과
///
/// 각 항목은 문제가 발견된 규칙 이름 목록입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryAnalysis {
    /// 검사된 활성 규칙 수
    pub total_enabled: usize,
    /// 쿼리가 비어 있는 규칙
    pub empty_query: Vec<String>,
    /// 시간 창 없이 `@timestamp`를 참조하는 규칙
    pub missing_time_filter: Vec<String>,
    /// 대상 인덱스가 없는 규칙
    pub missing_index: Vec<String>,
}

impl QueryAnalysis {
    /// 발견된 문제가 하나도 없으면 true
    pub fn is_clean(&self) -> bool {
        self.empty_query.is_empty()
            && self.missing_time_filter.is_empty()
            && self.missing_index.is_empty()
    }

    /// 발견된 문제 수 (규칙이 여러 항목에 걸리면 중복 집계)
    pub fn issue_count(&self) -> usize {
        self.empty_query.len() + self.missing_time_filter.len() + self.missing_index.len()
    }
}

/// 활성 규칙의 쿼리를 점검합니다.
///
/// 쿼리가 빈 규칙은 목록에 올린 뒤 나머지 점검에서 제외합니다.
pub fn analyze(rules: &[Rule]) -> QueryAnalysis {
    let mut analysis = QueryAnalysis::default();

    for rule in rules.iter().filter(|r| r.enabled) {
        analysis.total_enabled += 1;

        if !rule.has_query() {
            analysis.empty_query.push(rule.name.clone());
            continue;
        }
        if rule.query.contains("@timestamp") && !rule.query.contains("NOW()") {
            analysis.missing_time_filter.push(rule.name.clone());
        }
        if rule.index.is_empty() {
            analysis.missing_index.push(rule.name.clone());
        }
    }

    analysis
}
