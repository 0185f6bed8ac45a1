//! 알림 저장소 -- 크기 제한이 있는 최신순 인메모리 알림 보관
//!
//! [`AlertStore`]는 탐지 엔진이 생성한 알림을 최신순(front)으로 보관하고,
//! 상한 초과 시 가장 오래된 알림부터 버립니다. 알림 ID(`alert_<n>`)의
//! 시퀀스 카운터는 프로세스 수명 동안 단조 증가하며 [`AlertStore::clear`]
//! 후에도 리셋되지 않습니다. 같은 프로세스 안에서 ID가 재사용되면 이미
//! 내보낸 알림 참조가 엉키기 때문입니다.

use std::collections::{BTreeMap, VecDeque};

use chrono::Utc;
use serde::Serialize;

use ironwatch_core::metrics as m;
use ironwatch_core::types::{Alert, MatchedData, Severity};

use crate::rule::Rule;

/// 알림 조회 필터 -- 모든 조건은 AND 결합입니다.
#[derive(Debug, Clone, Default)]
pub struct AlertFilter {
    /// 심각도
    pub severity: Option<Severity>,
    /// 트리거한 규칙 ID
    pub rule_id: Option<String>,
}

impl AlertFilter {
    /// 알림이 필터의 모든 조건을 만족하는지 확인합니다.
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(severity) = self.severity
            && alert.severity != severity
        {
            return false;
        }
        if let Some(rule_id) = &self.rule_id
            && alert.rule_id != *rule_id
        {
            return false;
        }
        true
    }
}

/// 페이지 단위 알림 조회 결과
#[derive(Debug, Clone, Serialize)]
pub struct AlertPage {
    /// 필터를 통과한 전체 알림 수 (페이지와 무관)
    pub total: usize,
    /// 1부터 시작하는 페이지 번호
    pub page: usize,
    /// 페이지당 알림 수
    pub per_page: usize,
    /// 이 페이지의 알림 (최신순)
    pub alerts: Vec<Alert>,
}

/// 알림 집계 통계
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertStatistics {
    /// 보관 중인 전체 알림 수
    pub total: usize,
    /// 심각도별 알림 수 (최신순 순회 기준 첫 등장 순)
    pub by_severity: Vec<(Severity, usize)>,
    /// 분류별 알림 수 (최신순 순회 기준 첫 등장 순)
    pub by_category: Vec<(String, usize)>,
    /// 발생 건수 상위 규칙 이름 (최대 10개, 동률은 먼저 등장한 쪽 우선)
    pub top_rules: Vec<(String, usize)>,
}

/// 분 단위 타임라인 버킷
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineBucket {
    /// 버킷 키 -- `YYYY-MM-DDTHH:MM`
    pub timestamp: String,
    /// 버킷에 속한 알림 수
    pub count: usize,
}

/// 출발지 주소별 발생 건수
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceCount {
    /// 출발지 주소
    pub source: String,
    /// 발생 건수
    pub count: usize,
}

/// 차트 렌더링용 레이블/값 쌍
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    /// 축 레이블
    pub labels: Vec<String>,
    /// 레이블과 같은 순서의 값
    pub values: Vec<usize>,
}

/// statistics의 top_rules 항목 수 상한
const TOP_RULES_LIMIT: usize = 10;

/// 알림 저장소
pub struct AlertStore {
    /// 알림 목록 -- front가 최신
    alerts: VecDeque<Alert>,
    /// 보관 상한
    max_alerts: usize,
    /// 단조 증가 ID 시퀀스 (clear 후에도 유지)
    counter: u64,
    /// 상한 초과로 버린 알림 수
    dropped: u64,
}

impl AlertStore {
    /// 주어진 상한으로 빈 저장소를 생성합니다.
    pub fn new(max_alerts: usize) -> Self {
        Self {
            alerts: VecDeque::new(),
            max_alerts,
            counter: 0,
            dropped: 0,
        }
    }

    /// 규칙과 매칭 데이터로 알림을 만들어 저장합니다.
    ///
    /// ID 카운터를 먼저 증가시키므로 첫 알림은 `alert_1`입니다. 생성된
    /// 알림을 front에 넣고 상한을 넘으면 뒤에서부터 버립니다. 생성된
    /// 알림의 복사본을 반환합니다.
    pub fn add(&mut self, rule: &Rule, matched: MatchedData) -> Alert {
        self.counter += 1;

        let alert = Alert {
            id: format!("alert_{}", self.counter),
            timestamp: Utc::now(),
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            severity: rule.severity,
            risk_score: rule.risk_score,
            category: rule.category.clone(),
            tags: rule.tags.clone(),
            description: rule.description.clone(),
            log_count: matched.log_count(),
            matched_logs: matched,
        };

        tracing::info!(
            alert_id = %alert.id,
            rule = %alert.rule_name,
            severity = %alert.severity,
            log_count = alert.log_count,
            "stored alert"
        );

        self.push(alert.clone());
        alert
    }

    /// 알림을 front에 넣고 상한을 적용합니다.
    fn push(&mut self, alert: Alert) {
        metrics::counter!(
            m::ALERTS_GENERATED_TOTAL,
            m::LABEL_SEVERITY => alert.severity.as_str(),
            m::LABEL_CATEGORY => alert.category.clone()
        )
        .increment(1);

        self.alerts.push_front(alert);

        while self.alerts.len() > self.max_alerts {
            self.alerts.pop_back();
            self.dropped += 1;
            metrics::counter!(m::ALERTS_DROPPED_TOTAL).increment(1);
        }

        metrics::gauge!(m::ALERT_STORE_SIZE).set(self.alerts.len() as f64);
    }

    /// 보관 중인 알림을 최신순으로 순회합니다.
    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.alerts.iter()
    }

    /// 보관 중인 알림 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    /// 알림이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// 보관 상한을 반환합니다.
    pub fn max_alerts(&self) -> usize {
        self.max_alerts
    }

    /// 상한 초과로 버린 알림 수를 반환합니다.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// ID로 알림을 조회합니다.
    pub fn get_by_id(&self, alert_id: &str) -> Option<&Alert> {
        self.alerts.iter().find(|a| a.id == alert_id)
    }

    /// 심각도별 알림을 조회합니다 (최신순).
    pub fn get_by_severity(&self, severity: Severity) -> Vec<&Alert> {
        self.alerts
            .iter()
            .filter(|a| a.severity == severity)
            .collect()
    }

    /// 규칙 ID별 알림을 조회합니다 (최신순).
    pub fn get_by_rule(&self, rule_id: &str) -> Vec<&Alert> {
        self.alerts.iter().filter(|a| a.rule_id == rule_id).collect()
    }

    /// 최신 알림 `limit`개를 조회합니다.
    pub fn recent(&self, limit: usize) -> Vec<&Alert> {
        self.alerts.iter().take(limit).collect()
    }

    /// 필터와 페이지네이션으로 알림을 조회합니다.
    ///
    /// `page`는 1부터 시작하며 0은 1로 취급합니다. `total`은 필터를 통과한
    /// 전체 수이므로 호출자가 페이지 수를 계산할 수 있습니다.
    pub fn query(&self, filter: &AlertFilter, page: usize, per_page: usize) -> AlertPage {
        let filtered: Vec<&Alert> = self.alerts.iter().filter(|a| filter.matches(a)).collect();
        let total = filtered.len();

        let page = page.max(1);
        let start = (page - 1).saturating_mul(per_page);
        let alerts = filtered
            .into_iter()
            .skip(start)
            .take(per_page)
            .cloned()
            .collect();

        AlertPage {
            total,
            page,
            per_page,
            alerts,
        }
    }

    /// 모든 알림을 비우고 제거한 수를 반환합니다.
    ///
    /// ID 시퀀스 카운터는 리셋하지 않습니다.
    pub fn clear(&mut self) -> usize {
        let removed = self.alerts.len();
        self.alerts.clear();
        metrics::gauge!(m::ALERT_STORE_SIZE).set(0.0);
        tracing::info!(removed, "cleared alert store");
        removed
    }

    /// 알림 통계를 집계합니다.
    ///
    /// 집계는 최신순으로 순회하며, 그룹 순서는 각 키의 첫 등장 순서입니다.
    /// `top_rules`는 건수 내림차순 안정 정렬 후 상위 10개입니다.
    pub fn statistics(&self) -> AlertStatistics {
        let mut by_severity: Vec<(Severity, usize)> = Vec::new();
        let mut by_category: Vec<(String, usize)> = Vec::new();
        let mut rule_counts: Vec<(String, usize)> = Vec::new();

        for alert in &self.alerts {
            match by_severity.iter_mut().find(|(s, _)| *s == alert.severity) {
                Some(entry) => entry.1 += 1,
                None => by_severity.push((alert.severity, 1)),
            }
            match by_category.iter_mut().find(|(c, _)| *c == alert.category) {
                Some(entry) => entry.1 += 1,
                None => by_category.push((alert.category.clone(), 1)),
            }
            match rule_counts.iter_mut().find(|(r, _)| *r == alert.rule_name) {
                Some(entry) => entry.1 += 1,
                None => rule_counts.push((alert.rule_name.clone(), 1)),
            }
        }

        let mut top_rules = rule_counts;
        top_rules.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        top_rules.truncate(TOP_RULES_LIMIT);

        AlertStatistics {
            total: self.alerts.len(),
            by_severity,
            by_category,
            top_rules,
        }
    }

    /// 분 단위 타임라인을 집계합니다.
    ///
    /// 각 알림의 타임스탬프를 분 단위(`YYYY-MM-DDTHH:MM`)로 잘라 버킷을
    /// 만들고, 버킷 키 오름차순으로 반환합니다. `_buckets` 파라미터는
    /// 호출 호환을 위해 받지만 현재는 버킷 병합에 쓰이지 않습니다.
    pub fn timeline(&self, _buckets: usize) -> Vec<TimelineBucket> {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for alert in &self.alerts {
            let key = alert.timestamp.format("%Y-%m-%dT%H:%M").to_string();
            *counts.entry(key).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(timestamp, count)| TimelineBucket { timestamp, count })
            .collect()
    }

    /// 매칭 로그에서 출발지 주소를 집계합니다.
    ///
    /// 각 매칭 행에서 `source.ip` 키를 먼저 보고, 값이 없거나 빈 문자열이면
    /// `source_ip` 표기로 폴백합니다. 문자열이 아닌 값은 건너뜁니다.
    /// 건수 내림차순 안정 정렬 후 상위 `limit`개를 반환합니다.
    pub fn top_sources(&self, limit: usize) -> Vec<SourceCount> {
        let mut counts: Vec<(String, usize)> = Vec::new();

        for alert in &self.alerts {
            let Some(rows) = alert.matched_logs.rows() else {
                continue;
            };
            for record in rows {
                let source = ["source.ip", "source_ip"]
                    .iter()
                    .filter_map(|key| record.get(*key))
                    .filter_map(|v| v.as_str())
                    .find(|s| !s.is_empty());
                let Some(source) = source else { continue };

                match counts.iter_mut().find(|(s, _)| s == source) {
                    Some(entry) => entry.1 += 1,
                    None => counts.push((source.to_owned(), 1)),
                }
            }
        }

        counts.sort_by_key(|(_, count)| std::cmp::Reverse(*count));
        counts.truncate(limit);

        counts
            .into_iter()
            .map(|(source, count)| SourceCount { source, count })
            .collect()
    }

    // --- 차트 셰이핑 ---

    /// 심각도별 알림 수 차트 데이터를 만듭니다.
    pub fn severity_chart(&self) -> ChartData {
        let stats = self.statistics();
        let (labels, values) = stats
            .by_severity
            .into_iter()
            .map(|(s, n)| (s.to_string(), n))
            .unzip();
        ChartData { labels, values }
    }

    /// 분류별 알림 수 차트 데이터를 만듭니다.
    pub fn category_chart(&self) -> ChartData {
        let stats = self.statistics();
        let (labels, values) = stats.by_category.into_iter().unzip();
        ChartData { labels, values }
    }

    /// 상위 규칙 차트 데이터를 만듭니다.
    pub fn top_rules_chart(&self) -> ChartData {
        let stats = self.statistics();
        let (labels, values) = stats.top_rules.into_iter().unzip();
        ChartData { labels, values }
    }

    /// 상위 출발지 차트 데이터를 만듭니다.
    pub fn top_sources_chart(&self, limit: usize) -> ChartData {
        let (labels, values) = self
            .top_sources(limit)
            .into_iter()
            .map(|s| (s.source, s.count))
            .unzip();
        ChartData { labels, values }
    }

    /// 타임라인 차트 데이터를 만듭니다.
    pub fn timeline_chart(&self) -> ChartData {
        let (labels, values) = self
            .timeline(0)
            .into_iter()
            .map(|b| (b.timestamp, b.count))
            .unzip();
        ChartData { labels, values }
    }
}
