//! ironwatch.toml 로딩과 런타임 설정 병합
//!
//! [`IronwatchConfig`] 하나가 전체 설정을 담고, 각 구성 요소는 자기
//! 섹션만 꺼내 쓴다.
//!
//! # 값이 결정되는 순서
//! 기본값(`Default`) 위에 설정 파일이, 그 위에
//! `IRONWATCH_{SECTION}_{FIELD}` 형식의 환경변수가 덮인다.
//! CLI 인자는 명령 쪽에서 마지막으로 적용한다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), ironwatch_core::error::IronwatchError> {
//! use ironwatch_core::config::IronwatchConfig;
//!
//! // 파일 → 환경변수 순으로 병합된 최종 설정
//! let config = IronwatchConfig::load("ironwatch.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = IronwatchConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, IronwatchError};

/// `ironwatch.toml` 전체에 대응하는 최상위 설정 구조체
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IronwatchConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 탐지 엔진 설정
    #[serde(default)]
    pub detection: DetectionConfig,
    /// 쿼리 백엔드 설정
    #[serde(default)]
    pub backend: BackendConfig,
}

impl IronwatchConfig {
    /// 파일을 읽은 뒤 `IRONWATCH_*` 환경변수를 덧씌워 최종 설정을 만듭니다.
    ///
    /// 병합이 끝난 설정은 [`validate`](Self::validate)를 통과해야 합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, IronwatchError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 환경변수를 반영하지 않고 파일 내용 그대로 로드합니다.
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, IronwatchError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IronwatchError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                IronwatchError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열을 파싱합니다. 빠진 필드는 기본값으로 채워집니다.
    pub fn parse(toml_str: &str) -> Result<Self, IronwatchError> {
        toml::from_str(toml_str).map_err(|e| {
            IronwatchError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// `IRONWATCH_{SECTION}_{FIELD}` 환경변수 값으로 필드를 덮어씁니다.
    ///
    /// 예: `IRONWATCH_BACKEND_URL=http://es:9200`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "IRONWATCH_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "IRONWATCH_GENERAL_LOG_FORMAT");

        // Detection
        override_string(
            &mut self.detection.rules_dir,
            "IRONWATCH_DETECTION_RULES_DIR",
        );
        override_usize(
            &mut self.detection.max_alerts,
            "IRONWATCH_DETECTION_MAX_ALERTS",
        );
        override_u64(
            &mut self.detection.rule_timeout_secs,
            "IRONWATCH_DETECTION_RULE_TIMEOUT_SECS",
        );
        override_bool(
            &mut self.detection.mapping_enabled,
            "IRONWATCH_DETECTION_MAPPING_ENABLED",
        );
        override_usize(
            &mut self.detection.alerts_per_page,
            "IRONWATCH_DETECTION_ALERTS_PER_PAGE",
        );
        override_usize(
            &mut self.detection.timeline_buckets,
            "IRONWATCH_DETECTION_TIMELINE_BUCKETS",
        );
        override_usize(
            &mut self.detection.top_items_limit,
            "IRONWATCH_DETECTION_TOP_ITEMS_LIMIT",
        );

        // Backend
        override_string(&mut self.backend.url, "IRONWATCH_BACKEND_URL");
        override_string(&mut self.backend.username, "IRONWATCH_BACKEND_USERNAME");
        override_string(&mut self.backend.password, "IRONWATCH_BACKEND_PASSWORD");
        override_u64(
            &mut self.backend.timeout_secs,
            "IRONWATCH_BACKEND_TIMEOUT_SECS",
        );
        override_u32(
            &mut self.backend.max_retries,
            "IRONWATCH_BACKEND_MAX_RETRIES",
        );
    }

    /// 각 필드가 허용 범위에 있는지 확인합니다.
    pub fn validate(&self) -> Result<(), IronwatchError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("expected one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("expected one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.detection.rules_dir.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "detection.rules_dir".to_owned(),
                reason: "rules directory must not be empty".to_owned(),
            }
            .into());
        }

        if self.detection.max_alerts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.max_alerts".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.detection.rule_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.rule_timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.detection.alerts_per_page == 0 {
            return Err(ConfigError::InvalidValue {
                field: "detection.alerts_per_page".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.backend.url.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "backend.url".to_owned(),
                reason: "backend url must not be empty".to_owned(),
            }
            .into());
        }

        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.timeout_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨. trace/debug/info/warn/error 중 하나
    pub log_level: String,
    /// 로그 출력 형식. json 또는 pretty
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// 탐지 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// 규칙 파일 루트 디렉토리
    pub rules_dir: String,
    /// 알림 저장소 상한
    pub max_alerts: usize,
    /// 규칙당 실행 타임아웃 (초)
    pub rule_timeout_secs: u64,
    /// 쿼리 필드 매핑 적용 여부
    pub mapping_enabled: bool,
    /// 알림 목록 페이지 크기
    pub alerts_per_page: usize,
    /// 타임라인 버킷 수
    pub timeline_buckets: usize,
    /// 상위 항목 집계 개수 (top rules, top sources)
    pub top_items_limit: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            rules_dir: "rules".to_owned(),
            max_alerts: 1000,
            rule_timeout_secs: 60,
            mapping_enabled: true,
            alerts_per_page: 20,
            timeline_buckets: 24,
            top_items_limit: 10,
        }
    }
}

/// 쿼리 백엔드 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// 백엔드 URL
    pub url: String,
    /// 인증 사용자명 (빈 문자열이면 인증 없음)
    pub username: String,
    /// 인증 비밀번호
    pub password: String,
    /// 연결 타임아웃 (초)
    pub timeout_secs: u64,
    /// 최대 재시도 횟수
    pub max_retries: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:9200".to_owned(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

// --- 환경변수 헬퍼 ---
// 파싱 불가능한 값은 경고만 남기고 기존 값을 유지한다.

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "env override is not a valid bool, keeping configured value"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "env override is not a valid usize, keeping configured value"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "env override is not a valid u32, keeping configured value"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "env override is not a valid u64, keeping configured value"
            ),
        }
    }
}
