//! 크레이트 전역에서 공유하는 에러 계층

/// Ironwatch 워크스페이스의 최상위 에러.
///
/// 하위 크레이트의 도메인 에러는 `#[from]` 변환을 거쳐 이 타입으로 모인다.
#[derive(Debug, thiserror::Error)]
pub enum IronwatchError {
    /// 설정 로드/검증 실패
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 탐지 엔진 실행 실패
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),

    /// 파일시스템 I/O 실패
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 파일 처리 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 지정한 경로에 설정 파일이 없음
    #[error("config file missing: {path}")]
    FileNotFound { path: String },

    /// TOML 파싱 실패
    #[error("cannot parse config: {reason}")]
    ParseFailed { reason: String },

    /// 필드 값이 허용 범위를 벗어남
    #[error("invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 탐지 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// 탐지 규칙 에러
    #[error("rule error: {0}")]
    Rule(String),

    /// 쿼리 백엔드 에러
    #[error("backend error: {0}")]
    Backend(String),

    /// 알림 저장소 에러
    #[error("storage error: {0}")]
    Storage(String),
}
