//! 탐지 엔진 설정
//!
//! [`EngineConfig`]는 core의 [`DetectionConfig`](ironwatch_core::config::DetectionConfig)를
//! 기반으로 탐지 엔진 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use ironwatch_core::config::IronwatchConfig;
//! use ironwatch_detection::config::EngineConfig;
//!
//! let core_config = IronwatchConfig::default();
//! let config = EngineConfig::from_core(&core_config.detection);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::DetectionError;

/// 탐지 엔진 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// 규칙 디렉토리 경로
    pub rules_dir: String,
    /// 알림 저장소 보관 상한
    pub max_alerts: usize,
    /// 규칙당 백엔드 쿼리 타임아웃 (초)
    pub rule_timeout_secs: u64,
    /// 쿼리 필드 매핑 적용 여부
    pub mapping_enabled: bool,
    /// 알림 조회 기본 페이지 크기
    pub alerts_per_page: usize,
    /// 타임라인 버킷 수 (현재 버킷 병합에는 미사용)
    pub timeline_buckets: usize,
    /// 상위 N 집계 기본 항목 수
    pub top_items_limit: usize,
}

impl Default for EngineConfig {
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

impl EngineConfig {
    /// core의 `DetectionConfig`에서 엔진 설정을 생성합니다.
    pub fn from_core(core: &ironwatch_core::config::DetectionConfig) -> Self {
        Self {
            rules_dir: core.rules_dir.clone(),
            max_alerts: core.max_alerts,
            rule_timeout_secs: core.rule_timeout_secs,
            mapping_enabled: core.mapping_enabled,
            alerts_per_page: core.alerts_per_page,
            timeline_buckets: core.timeline_buckets,
            top_items_limit: core.top_items_limit,
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), DetectionError> {
        const MAX_ALERTS_LIMIT: usize = 1_000_000;
        const MAX_RULE_TIMEOUT_SECS: u64 = 3600; // 1 hour

        if self.rules_dir.is_empty() {
            return Err(DetectionError::Config {
                field: "rules_dir".to_owned(),
                reason: "must not be empty".to_owned(),
            });
        }

        if self.max_alerts == 0 || self.max_alerts > MAX_ALERTS_LIMIT {
            return Err(DetectionError::Config {
                field: "max_alerts".to_owned(),
                reason: format!("must be 1-{MAX_ALERTS_LIMIT}"),
            });
        }

        if self.rule_timeout_secs == 0 || self.rule_timeout_secs > MAX_RULE_TIMEOUT_SECS {
            return Err(DetectionError::Config {
                field: "rule_timeout_secs".to_owned(),
                reason: format!("must be 1-{MAX_RULE_TIMEOUT_SECS}"),
            });
        }

        if self.alerts_per_page == 0 {
            return Err(DetectionError::Config {
                field: "alerts_per_page".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.top_items_limit == 0 {
            return Err(DetectionError::Config {
                field: "top_items_limit".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 엔진 설정 빌더
#[derive(Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 규칙 디렉토리를 설정합니다.
    pub fn rules_dir(mut self, dir: impl Into<String>) -> Self {
        self.config.rules_dir = dir.into();
        self
    }

    /// 알림 보관 상한을 설정합니다.
    pub fn max_alerts(mut self, max: usize) -> Self {
        self.config.max_alerts = max;
        self
    }

    /// 규칙당 타임아웃(초)을 설정합니다.
    pub fn rule_timeout_secs(mut self, secs: u64) -> Self {
        self.config.rule_timeout_secs = secs;
        self
    }

    /// 필드 매핑 적용 여부를 설정합니다.
    pub fn mapping_enabled(mut self, enabled: bool) -> Self {
        self.config.mapping_enabled = enabled;
        self
    }

    /// 알림 조회 페이지 크기를 설정합니다.
    pub fn alerts_per_page(mut self, per_page: usize) -> Self {
        self.config.alerts_per_page = per_page;
        self
    }

    /// 상위 N 집계 항목 수를 설정합니다.
    pub fn top_items_limit(mut self, limit: usize) -> Self {
        self.config.top_items_limit = limit;
        self
    }

    /// 설정을 검증하고 `EngineConfig`를 생성합니다.
    pub fn build(self) -> Result<EngineConfig, DetectionError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
