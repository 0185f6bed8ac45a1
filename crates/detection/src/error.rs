//! 탐지 엔진 에러 타입
//!
//! [`DetectionError`]는 규칙 로딩, 쿼리 변환, 실행, 알림 저장 중 발생하는
//! 모든 에러를 표현합니다. `From<DetectionError> for IronwatchError` 변환이
//! 구현되어 있어 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use ironwatch_core::error::{EngineError, IronwatchError};

/// 탐지 엔진 도메인 에러
///
/// 규칙 하나, 파일 하나에 국한되는 실패는 호출 측에서 건너뛰기로
/// 처리되며 배치 전체를 중단시키지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum DetectionError {
    /// 규칙 파일 파싱 실패
    #[error("rule parse error: {path}: {reason}")]
    RuleParse {
        /// 규칙 파일 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 비어 있는 규칙 파일 (null 또는 빈 문서)
    #[error("empty rule file: {path}")]
    EmptyRuleFile {
        /// 규칙 파일 경로
        path: String,
    },

    /// 알 수 없는 규칙 ID 조회
    #[error("rule not found: {rule_id}")]
    RuleNotFound {
        /// 조회한 규칙 ID
        rule_id: String,
    },

    /// 쿼리 백엔드에 연결할 수 없음
    #[error("backend unavailable: {reason}")]
    BackendUnavailable {
        /// 사유
        reason: String,
    },

    /// 쿼리 실행 실패 (결과 없음, 타임아웃 등)
    #[error("query execution failed for rule '{rule_name}': {reason}")]
    QueryExecution {
        /// 규칙명
        rule_name: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<DetectionError> for IronwatchError {
    fn from(err: DetectionError) -> Self {
        match err {
            DetectionError::Config { field, reason } => {
                IronwatchError::Config(ironwatch_core::error::ConfigError::InvalidValue {
                    field,
                    reason,
                })
            }
            DetectionError::BackendUnavailable { .. } | DetectionError::QueryExecution { .. } => {
                IronwatchError::Engine(EngineError::Backend(err.to_string()))
            }
            DetectionError::Io(e) => IronwatchError::Io(e),
            other => IronwatchError::Engine(EngineError::Rule(other.to_string())),
        }
    }
}
