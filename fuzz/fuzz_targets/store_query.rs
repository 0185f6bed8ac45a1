#![no_main]

use std::path::Path;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use ironwatch_core::{MatchedData, Severity};
use ironwatch_detection::rule::RuleLoader;
use ironwatch_detection::{AlertFilter, AlertStore};

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    /// 저장소 용량
    max_alerts: u8,
    /// 추가할 알림 수
    alert_count: u8,
    /// 조회 페이지 파라미터
    page: usize,
    per_page: usize,
    /// 심각도 필터 적용 여부
    filter_high: bool,
    /// 집계 파라미터
    buckets: u8,
    limit: u8,
}

fuzz_target!(|input: FuzzInput| {
    let rule = match RuleLoader::parse_yaml(
        "name: Fuzz Rule\nquery: FROM logs-*\nseverity: high\nenabled: true\n",
        Path::new("fuzz/store.yml"),
    ) {
        Ok(r) => r,
        Err(_) => return,
    };

    let mut store = AlertStore::new(input.max_alerts as usize);
    for i in 0..input.alert_count {
        let mut row = serde_json::Map::new();
        row.insert(
            "host.name".to_owned(),
            serde_json::Value::String(format!("host-{i}")),
        );
        store.add(&rule, MatchedData::Rows(vec![row]));
    }

    let filter = AlertFilter {
        severity: input.filter_high.then_some(Severity::High),
        rule_id: None,
    };

    // 페이지/집계 파라미터가 어떤 값이어도 패닉 없이 동작해야 함
    let page = store.query(&filter, input.page, input.per_page);
    assert!(page.alerts.len() <= input.per_page.max(1));

    let _ = store.statistics();
    let _ = store.timeline(input.buckets as usize);
    let _ = store.top_sources(input.limit as usize);
    let _ = store.severity_chart();
});
