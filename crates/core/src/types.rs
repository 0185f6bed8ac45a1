//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 탐지 규칙 실행 결과로 생성되는 알림과 심각도 레벨을 정의합니다.
//! 규칙 모델 자체는 detection 크레이트에 있으며, 여기에는 크레이트 간
//! 경계를 넘는 타입만 둡니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 쿼리 결과의 행 하나 — 컬럼명에서 값으로의 매핑
pub type LogRecord = serde_json::Map<String, serde_json::Value>;

/// 규칙과 알림이 공유하는 심각도 레벨
///
/// 변형 선언 순서가 곧 `Ord` 순서라서
/// `Low < Medium < High < Critical`로 비교할 수 있습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 참고 수준
    Low,
    /// 검토가 필요한 수준. 심각도를 생략한 규칙의 기본값
    #[default]
    Medium,
    /// 우선 대응 대상
    High,
    /// 즉시 대응이 필요한 침해 징후
    Critical,
}

impl Severity {
    /// 대소문자와 축약형(`med`, `crit`)을 허용하는 느슨한 파싱.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 소문자 표기를 반환합니다. 직렬화 형식과 동일합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// 규칙 파일의 "Medium", "HIGH" 같은 표기도 받아들이기 위해 수동 구현
impl<'de> Deserialize<'de> for Severity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Severity::from_str_loose(&s).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "unknown severity '{s}' (expected low, medium, high, critical)"
            ))
        })
    }
}

/// 알림에 포함되는 매칭 데이터
///
/// 쿼리 결과가 행 목록이면 `Rows`, 집계 스칼라 등 그 외 형태이면
/// `Scalar`입니다. `log_count`는 `Rows`일 때 행 수, 아니면 1입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MatchedData {
    /// 컬럼명 → 값 매핑으로 변환된 결과 행들
    Rows(Vec<LogRecord>),
    /// 행 목록이 아닌 결과 (집계값 등)
    Scalar(serde_json::Value),
}

impl MatchedData {
    /// 알림의 `log_count`로 기록되는 값을 반환합니다.
    pub fn log_count(&self) -> usize {
        match self {
            Self::Rows(rows) => rows.len(),
            Self::Scalar(_) => 1,
        }
    }

    /// 행 목록이면 참조를 반환합니다.
    pub fn rows(&self) -> Option<&[LogRecord]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Scalar(_) => None,
        }
    }
}

impl From<Vec<LogRecord>> for MatchedData {
    fn from(rows: Vec<LogRecord>) -> Self {
        Self::Rows(rows)
    }
}

/// 보안 알림
///
/// 탐지 규칙의 쿼리가 매칭 행을 반환했을 때 생성됩니다.
/// 규칙 메타데이터는 생성 시점에 스냅샷으로 복사되며, 이후 규칙이
/// 수정되어도 기존 알림은 변하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// 알림 ID (`alert_<n>`, 프로세스 수명 동안 단조 증가)
    pub id: String,
    /// 생성 시각 (UTC)
    pub timestamp: DateTime<Utc>,
    /// 규칙 ID
    pub rule_id: String,
    /// 규칙명
    pub rule_name: String,
    /// 심각도
    pub severity: Severity,
    /// 위험 점수 (0-100)
    pub risk_score: u32,
    /// 규칙 분류 (컴플라이언스 프레임워크)
    pub category: String,
    /// 규칙 태그
    pub tags: Vec<String>,
    /// 규칙 설명
    pub description: String,
    /// 매칭된 로그 행
    pub matched_logs: MatchedData,
    /// 매칭 행 수
    pub log_count: usize,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (rule: {}, logs: {})",
            self.severity, self.id, self.rule_name, self.log_count,
        )
    }
}
