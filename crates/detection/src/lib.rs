#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`rule`]: YAML 탐지 규칙 로딩, 저장소 조회, 일괄 활성/비활성 전환
//! - [`fieldmap`]: ECS 정규 필드명 -> 원시 winlog 필드명 쿼리 재작성
//! - [`engine`]: 규칙 실행 오케스트레이션 (실패 격리, 타임아웃, 요약)
//! - [`store`]: 용량 제한 경보 저장소와 통계/타임라인/차트 집계
//! - [`backend`]: 쿼리 백엔드 추상화 및 결과 테이블 변환
//! - [`diagnostics`]: 규칙 쿼리 정적 점검
//! - [`config`]: 엔진 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! rules/*.yml -> RuleRepository -> DetectionEngine -> AlertStore
//!                                      |
//!                              FieldMapper(쿼리 변환)
//!                                      |
//!                              QueryBackend(데이터 소스)
//! ```

pub mod backend;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod fieldmap;
pub mod rule;
pub mod store;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{
    DetectionEngine, DetectionEngineBuilder, ExecutionSummary, HealthReport, HealthState,
};

// 설정
pub use config::{EngineConfig, EngineConfigBuilder};

// 에러
pub use error::DetectionError;

// 규칙
pub use rule::{Rule, RuleFilter, RuleLoader, RuleRepository, RuleStatistics, ToggleSummary};

// 필드 매퍼
pub use fieldmap::FieldMapper;

// 백엔드
pub use backend::{ColumnSpec, QueryBackend, QueryTable};

// 경보 저장소
pub use store::{AlertFilter, AlertPage, AlertStatistics, AlertStore, ChartData};
