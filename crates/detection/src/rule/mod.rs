//! 탐지 규칙 관리 -- YAML 규칙 로딩, 조회, 일괄 토글
//!
//! 컴플라이언스 규칙 디렉토리(GDPR/NIST/PCI-DSS 하위 트리)에서 규칙을
//! 로드하고 조회 가능한 저장소로 제공합니다.
//!
//! # 규칙 형식
//! ```yaml
//! name: Multiple Failed Logons
//! type: esql
//! query: FROM logs-* | WHERE event.code == "4625"
//! severity: high
//! risk_score: 73
//! enabled: true
//! index:
//!   - winlogbeat-*
//! nist:
//!   - AC-7
//! ```
//!
//! # 아키텍처
//! - [`RuleRepository`]: 규칙 보관 및 조회/통계 코디네이터
//! - [`loader`]: YAML 파일 로딩 및 ID/분류 파생
//! - [`toggle`]: 규칙 파일 일괄 활성화/비활성화
//! - [`types`]: 규칙 데이터 구조 정의

pub mod loader;
pub mod repository;
pub mod toggle;
pub mod types;

pub use loader::RuleLoader;
pub use repository::{RuleFilter, RuleRepository, RuleStatistics};
pub use toggle::{ToggleSummary, set_all_enabled};
pub use types::{Rule, RuleFile, category_from_path, derive_rule_id};
