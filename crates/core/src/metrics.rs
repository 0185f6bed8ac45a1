//! Prometheus 메트릭 이름을 한곳에 모아둔 상수 모듈
//!
//! 방출 지점마다 문자열을 직접 쓰는 대신 여기 상수를 들고 가서
//! `metrics::counter!()` / `gauge!()` / `histogram!()`에 넘긴다.
//!
//! # 네이밍 컨벤션
//!
//! `ironwatch_` 접두어에, counter는 `_total`, 지연 히스토그램은
//! `_seconds`로 끝난다. gauge는 접미어 없음.
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(ironwatch_core::metrics::ALERTS_GENERATED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 ─────────────────────────────────────────────────────

/// 심각도 레이블 키 (low, medium, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 규칙 분류 레이블 키 (GDPR, NIST, PCI-DSS, unknown)
pub const LABEL_CATEGORY: &str = "category";

// ─── 규칙 저장소 메트릭 ─────────────────────────────────────────────

/// 로드된 규칙 수 (counter)
pub const RULES_LOADED_TOTAL: &str = "ironwatch_rules_loaded_total";

/// 건너뛴 규칙 파일 수 (counter)
pub const RULE_FILES_SKIPPED_TOTAL: &str = "ironwatch_rule_files_skipped_total";

/// 현재 저장소에 있는 규칙 수 (gauge)
pub const RULES_ACTIVE: &str = "ironwatch_rules_active";

// ─── 탐지 엔진 메트릭 ──────────────────────────────────────────────

/// 규칙 실행 수 (counter)
pub const RULE_EXECUTIONS_TOTAL: &str = "ironwatch_rule_executions_total";

/// 규칙 실행 실패 수 (counter)
pub const RULE_EXECUTION_FAILURES_TOTAL: &str = "ironwatch_rule_execution_failures_total";

/// 규칙 실행 소요 시간 (histogram, 초)
pub const RULE_EXECUTION_DURATION_SECONDS: &str = "ironwatch_rule_execution_duration_seconds";

// ─── 알림 저장소 메트릭 ─────────────────────────────────────────────

/// 생성된 알림 수 (counter, labels: severity, category)
pub const ALERTS_GENERATED_TOTAL: &str = "ironwatch_alerts_generated_total";

/// 저장소 상한으로 드롭된 알림 수 (counter)
pub const ALERTS_DROPPED_TOTAL: &str = "ironwatch_alerts_dropped_total";

/// 현재 저장소에 있는 알림 수 (gauge)
pub const ALERT_STORE_SIZE: &str = "ironwatch_alert_store_size";

// ─── 히스토그램 버킷 ───────────────────────────────────────────────

/// 규칙 실행 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 60s 범위 (백엔드 왕복 포함)
pub const EXECUTION_DURATION_BUCKETS: [f64; 10] =
    [0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 60.0];

// ─── HELP 텍스트 등록 ──────────────────────────────────────────────

/// 모든 메트릭의 Prometheus HELP 텍스트를 등록합니다.
///
/// 전역 레코더를 설치한 직후 한 번만 호출하면 된다. 레코더가 없으면
/// describe 매크로는 조용히 무시된다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    describe_counter!(
        RULES_LOADED_TOTAL,
        "Total number of detection rules loaded from disk"
    );
    describe_counter!(
        RULE_FILES_SKIPPED_TOTAL,
        "Total number of rule files skipped due to parse errors or limits"
    );
    describe_gauge!(
        RULES_ACTIVE,
        "Number of detection rules currently held by the repository"
    );
    describe_counter!(
        RULE_EXECUTIONS_TOTAL,
        "Total number of rule executions attempted"
    );
    describe_counter!(
        RULE_EXECUTION_FAILURES_TOTAL,
        "Total number of rule executions that failed at the query backend"
    );
    describe_histogram!(
        RULE_EXECUTION_DURATION_SECONDS,
        "Time to execute a single detection rule in seconds"
    );
    describe_counter!(
        ALERTS_GENERATED_TOTAL,
        "Total number of alerts generated by severity"
    );
    describe_counter!(
        ALERTS_DROPPED_TOTAL,
        "Total number of alerts evicted by the store capacity bound"
    );
    describe_gauge!(
        ALERT_STORE_SIZE,
        "Current number of alerts held by the alert store"
    );
}
