//! 탐지 엔진 -- 규칙 실행 오케스트레이션
//!
//! [`DetectionEngine`]은 탐지 규칙을 쿼리 백엔드에 대해 실행하고, 결과가
//! 있으면 경보를 생성하여 저장소에 적재합니다.
//!
//! 규칙 하나의 실행 흐름:
//!
//! ```text
//! Rule ──► FieldMapper(쿼리 변환) ──► QueryBackend::execute
//!                                          │
//!                              ┌───────────┴───────────┐
//!                              ▼                       ▼
//!                        결과 테이블               결과 없음/타임아웃
//!                              │                       │
//!                        행 있으면 경보 1건        실패로 집계
//!                        AlertStore에 적재         (배치는 계속)
//! ```
//!
//! 배치 실행([`DetectionEngine::execute_all`])은 규칙을 순차 실행하며,
//! 개별 규칙의 실패가 나머지 규칙 실행을 중단시키지 않습니다. 비활성
//! 규칙과 빈 쿼리 규칙은 백엔드 호출 없이 건너뛰되 실행 성공으로
//! 집계합니다.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use ironwatch_core::metrics as m;
use ironwatch_core::types::MatchedData;

use crate::backend::QueryBackend;
use crate::config::EngineConfig;
use crate::error::DetectionError;
use crate::fieldmap::FieldMapper;
use crate::rule::Rule;
use crate::store::AlertStore;

// --- 실행 요약 ---

/// 배치 실행 결과 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExecutionSummary {
    /// 배치에 포함된 규칙 수
    pub total_rules: usize,
    /// 실행에 성공한 규칙 수 (건너뛴 규칙 포함)
    pub executed: usize,
    /// 백엔드 실패 또는 타임아웃으로 실패한 규칙 수
    pub failed: usize,
    /// 이번 배치에서 생성된 경보 수
    pub alerts_generated: usize,
}

impl fmt::Display for ExecutionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "executed {}/{} rules ({} failed, {} alerts)",
            self.executed, self.total_rules, self.failed, self.alerts_generated
        )
    }
}

// --- 상태 보고 ---

/// 엔진 전체 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// 백엔드 연결 정상
    Healthy,
    /// 백엔드 연결 불가 -- 규칙 실행이 모두 실패하게 됩니다
    Degraded,
}

impl fmt::Display for HealthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Degraded => "degraded",
        };
        f.write_str(s)
    }
}

/// 엔진 상태 보고서
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// 종합 상태
    pub status: HealthState,
    /// 백엔드 ping 성공 여부
    pub backend_connected: bool,
    /// 현재 로드된 규칙 수
    pub rules_loaded: usize,
}

// --- 탐지 엔진 ---

/// 탐지 규칙 실행 엔진
///
/// 백엔드 `B`는 [`QueryBackend`] 구현이면 무엇이든 가능합니다. 엔진은
/// 경보 저장소를 `Arc<Mutex<_>>`로 소유하므로, [`DetectionEngine::store`]로
/// 핸들을 복제해 실행과 동시에 조회할 수 있습니다.
pub struct DetectionEngine<B> {
    backend: B,
    mapper: FieldMapper,
    store: Arc<Mutex<AlertStore>>,
    config: EngineConfig,
}

impl<B: QueryBackend> DetectionEngine<B> {
    /// 기본 필드 매퍼와 설정 기반 저장소로 엔진을 만듭니다.
    pub fn new(backend: B, config: EngineConfig) -> Self {
        Self {
            backend,
            mapper: FieldMapper::new(),
            store: Arc::new(Mutex::new(AlertStore::new(config.max_alerts))),
            config,
        }
    }

    /// 빌더를 반환합니다.
    pub fn builder() -> DetectionEngineBuilder<B> {
        DetectionEngineBuilder::new()
    }

    /// 경보 저장소 핸들을 복제합니다.
    pub fn store(&self) -> Arc<Mutex<AlertStore>> {
        Arc::clone(&self.store)
    }

    /// 쿼리 변환에 사용 중인 필드 매퍼
    pub fn mapper(&self) -> &FieldMapper {
        &self.mapper
    }

    /// 엔진 설정
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 규칙 하나를 실행하고 생성된 경보 수를 반환합니다.
    ///
    /// 실패(백엔드 무응답, 타임아웃)는 로그와 메트릭으로 기록하고 0을
    /// 반환합니다. 배치 집계가 필요하면 [`DetectionEngine::execute_all`]을
    /// 사용하세요.
    pub async fn execute_rule(&self, rule: &Rule) -> usize {
        metrics::counter!(m::RULE_EXECUTIONS_TOTAL).increment(1);
        match self.try_execute_rule(rule).await {
            Ok(alerts) => alerts,
            Err(e) => {
                metrics::counter!(m::RULE_EXECUTION_FAILURES_TOTAL).increment(1);
                error!(rule = %rule.name, error = %e, "rule execution failed");
                0
            }
        }
    }

    /// 규칙 목록을 순차 실행하고 요약을 반환합니다.
    ///
    /// 개별 규칙 실패는 해당 규칙만 실패로 집계하고 나머지는 계속
    /// 실행합니다.
    pub async fn execute_all(&self, rules: &[Rule]) -> ExecutionSummary {
        let mut summary = ExecutionSummary {
            total_rules: rules.len(),
            executed: 0,
            failed: 0,
            alerts_generated: 0,
        };

        for rule in rules {
            metrics::counter!(m::RULE_EXECUTIONS_TOTAL).increment(1);
            match self.try_execute_rule(rule).await {
                Ok(alerts) => {
                    summary.executed += 1;
                    summary.alerts_generated += alerts;
                }
                Err(e) => {
                    summary.failed += 1;
                    metrics::counter!(m::RULE_EXECUTION_FAILURES_TOTAL).increment(1);
                    error!(rule = %rule.name, error = %e, "rule execution failed");
                }
            }
        }

        info!(
            total = summary.total_rules,
            executed = summary.executed,
            failed = summary.failed,
            alerts = summary.alerts_generated,
            "rule batch finished"
        );
        summary
    }

    /// 활성 규칙만 골라 실행합니다.
    ///
    /// 요약의 `total_rules`는 필터링 후 규칙 수입니다.
    pub async fn execute_enabled(&self, rules: &[Rule]) -> ExecutionSummary {
        let enabled: Vec<Rule> = rules.iter().filter(|r| r.enabled).cloned().collect();
        self.execute_all(&enabled).await
    }

    /// 백엔드 연결 상태를 점검하여 보고서를 만듭니다.
    pub async fn health(&self, rules_loaded: usize) -> HealthReport {
        let backend_connected = self.backend.ping().await;
        let status = if backend_connected {
            HealthState::Healthy
        } else {
            HealthState::Degraded
        };
        HealthReport {
            status,
            backend_connected,
            rules_loaded,
        }
    }

    // 실행 1건의 실제 처리. 성공 시 생성된 경보 수를 반환합니다.
    async fn try_execute_rule(&self, rule: &Rule) -> Result<usize, DetectionError> {
        if !rule.enabled {
            debug!(rule = %rule.name, "rule disabled, skipping");
            return Ok(0);
        }
        if !rule.has_query() {
            warn!(rule = %rule.name, "rule has no query, skipping");
            return Ok(0);
        }

        let query = if self.config.mapping_enabled {
            let mapped = self.mapper.transform_direct(&rule.query);
            if mapped != rule.query {
                debug!(rule = %rule.name, query = %mapped, "query transformed for raw schema");
            }
            mapped
        } else {
            rule.query.clone()
        };

        let timeout = Duration::from_secs(self.config.rule_timeout_secs);
        let started = Instant::now();
        let outcome = tokio::time::timeout(timeout, self.backend.execute(&query)).await;
        metrics::histogram!(m::RULE_EXECUTION_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());

        let table = match outcome {
            Ok(Some(table)) => table,
            Ok(None) => {
                return Err(DetectionError::QueryExecution {
                    rule_name: rule.name.clone(),
                    reason: "backend returned no result".to_owned(),
                });
            }
            Err(_) => {
                return Err(DetectionError::QueryExecution {
                    rule_name: rule.name.clone(),
                    reason: format!("timed out after {}s", self.config.rule_timeout_secs),
                });
            }
        };

        let records = table.into_records();
        if records.is_empty() {
            debug!(rule = %rule.name, "no matches");
            return Ok(0);
        }

        let alert = {
            let mut store = self.store.lock().await;
            store.add(rule, MatchedData::Rows(records))
        };
        info!(
            rule = %rule.name,
            alert_id = %alert.id,
            log_count = alert.log_count,
            "rule matched, alert generated"
        );
        Ok(1)
    }
}

// --- 빌더 ---

/// [`DetectionEngine`] 빌더
///
/// 백엔드는 필수이며, 매퍼와 설정을 지정하지 않으면 기본값을 씁니다.
pub struct DetectionEngineBuilder<B> {
    backend: Option<B>,
    mapper: Option<FieldMapper>,
    config: EngineConfig,
}

impl<B: QueryBackend> DetectionEngineBuilder<B> {
    /// 빈 빌더를 만듭니다.
    pub fn new() -> Self {
        Self {
            backend: None,
            mapper: None,
            config: EngineConfig::default(),
        }
    }

    /// 쿼리 백엔드를 지정합니다. (필수)
    pub fn backend(mut self, backend: B) -> Self {
        self.backend = Some(backend);
        self
    }

    /// 필드 매퍼를 교체합니다. 기본값은 [`FieldMapper::new`]입니다.
    pub fn mapper(mut self, mapper: FieldMapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// 엔진 설정을 지정합니다.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// 설정을 검증하고 엔진을 조립합니다.
    pub fn build(self) -> Result<DetectionEngine<B>, DetectionError> {
        self.config.validate()?;
        let backend = self.backend.ok_or_else(|| DetectionError::Config {
            field: "backend".to_owned(),
            reason: "query backend is required".to_owned(),
        })?;
        Ok(DetectionEngine {
            backend,
            mapper: self.mapper.unwrap_or_default(),
            store: Arc::new(Mutex::new(AlertStore::new(self.config.max_alerts))),
            config: self.config,
        })
    }
}

impl<B: QueryBackend> Default for DetectionEngineBuilder<B> {
    fn default() -> Self {
        Self::new()
    }
}

// --- 테스트 ---
