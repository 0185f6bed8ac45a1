//! 쿼리 백엔드 추상화
//!
//! [`QueryBackend`] trait은 탐지 엔진이 쿼리를 실행할 데이터 소스를
//! 추상화합니다. 운영 환경에서는 검색 클러스터의 HTTP API 구현이 붙고,
//! 테스트에서는 `MockQueryBackend`가 준비된 응답을 돌려줍니다.
//!
//! 백엔드 응답은 컬럼 지향 테이블입니다: 컬럼 기술자 목록과, 컬럼 순서에
//! 정렬된 위치 기반 값 행 목록. [`QueryTable::into_records`]가 이를 행
//! 단위 레코드(컬럼명 → 값)로 변환합니다.

use std::future::Future;

use serde::{Deserialize, Serialize};

use ironwatch_core::types::LogRecord;

/// 쿼리 백엔드 인터페이스
///
/// 실패는 `None`으로 신호합니다. 개별 규칙 실행 실패가 전체 배치를
/// 중단시키지 않도록, 이 경계에서는 에러 타입 대신 부재로 표현합니다.
pub trait QueryBackend: Send + Sync + 'static {
    /// 백엔드 연결 상태를 확인합니다.
    fn ping(&self) -> impl Future<Output = bool> + Send;

    /// 쿼리를 실행하여 컬럼 지향 결과 테이블을 반환합니다.
    ///
    /// 연결 실패, 쿼리 오류 등 모든 실행 실패는 `None`입니다.
    fn execute(&self, query: &str) -> impl Future<Output = Option<QueryTable>> + Send;
}

/// 결과 테이블의 컬럼 기술자
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// 컬럼 이름 -- 없으면 위치 기반 이름(`col_<i>`)이 쓰입니다
    #[serde(default)]
    pub name: Option<String>,
    /// 백엔드가 보고한 컬럼 타입 (메타데이터로만 보존)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
}

impl ColumnSpec {
    /// 이름만 있는 컬럼 기술자를 만듭니다.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            column_type: None,
        }
    }
}

/// 컬럼 지향 쿼리 결과 테이블
///
/// ES|QL 스타일 응답은 행 배열을 `values`라는 키로 보내므로 역직렬화 시
/// 별칭으로 받아들입니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryTable {
    /// 컬럼 기술자 목록
    #[serde(default)]
    pub columns: Vec<ColumnSpec>,
    /// 값 행 목록 -- 각 행은 컬럼 순서에 정렬된 위치 기반 시퀀스
    #[serde(default, alias = "values")]
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl QueryTable {
    /// 행이 하나도 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 위치 기반 행을 컬럼명 키의 레코드로 변환합니다.
    ///
    /// - 이름 없는 컬럼 `i`는 `col_<i>` 키를 씁니다.
    /// - 컬럼 수보다 짧은 행은 뒤쪽 필드가 빠진 레코드가 됩니다.
    /// - 컬럼 수보다 긴 행의 초과 값은 버려집니다.
    pub fn into_records(self) -> Vec<LogRecord> {
        let names: Vec<String> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| c.name.clone().unwrap_or_else(|| format!("col_{i}")))
            .collect();

        let mut records = Vec::with_capacity(self.rows.len());
        for row in self.rows {
            let mut record = LogRecord::new();
            for (i, value) in row.into_iter().enumerate() {
                let Some(name) = names.get(i) else { break };
                record.insert(name.clone(), value);
            }
            records.push(record);
        }
        records
    }
}

/// 공유 백엔드를 위한 위임 구현
///
/// 하나의 백엔드 연결을 여러 소유자가 공유할 수 있도록 `Arc<B>`도
/// 백엔드로 사용할 수 있습니다.
impl<B: QueryBackend> QueryBackend for std::sync::Arc<B> {
    fn ping(&self) -> impl Future<Output = bool> + Send {
        (**self).ping()
    }

    fn execute(&self, query: &str) -> impl Future<Output = Option<QueryTable>> + Send {
        (**self).execute(query)
    }
}

/// 테스트용 Mock 쿼리 백엔드
///
/// 준비된 테이블(또는 실패)을 반환하고 수신한 쿼리를 기록합니다.
#[cfg(test)]
pub struct MockQueryBackend {
    table: Option<QueryTable>,
    ping_ok: bool,
    delay: Option<std::time::Duration>,
    calls: std::sync::atomic::AtomicUsize,
    queries: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockQueryBackend {
    /// 빈 결과(행 0개)를 반환하는 mock을 생성합니다.
    pub fn new() -> Self {
        Self {
            table: Some(QueryTable::default()),
            ping_ok: true,
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// 지정한 테이블을 반환하도록 설정합니다.
    pub fn with_table(mut self, table: QueryTable) -> Self {
        self.table = Some(table);
        self
    }

    /// 실행 실패(`None`)를 반환하도록 설정합니다.
    pub fn with_failure(mut self) -> Self {
        self.table = None;
        self
    }

    /// ping이 실패하도록 설정합니다.
    pub fn with_ping_failure(mut self) -> Self {
        self.ping_ok = false;
        self
    }

    /// 응답 전에 지연을 추가합니다 (타임아웃 테스트용).
    pub fn with_delay(mut self, delay: std::time::Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// execute가 호출된 횟수를 반환합니다.
    pub fn call_count(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }

    /// 수신한 쿼리 목록을 반환합니다.
    pub fn received_queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Default for MockQueryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
impl QueryBackend for MockQueryBackend {
    async fn ping(&self) -> bool {
        self.ping_ok
    }

    async fn execute(&self, query: &str) -> Option<QueryTable> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_owned());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_table() -> QueryTable {
        QueryTable {
            columns: vec![
                ColumnSpec::named("user.name"),
                ColumnSpec::named("event.code"),
            ],
            rows: vec![
                vec![json!("admin"), json!("4625")],
                vec![json!("guest"), json!("4624")],
            ],
        }
    }

    #[test]
    fn into_records_keys_by_column_name() {
        let records = sample_table().into_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("user.name"), Some(&json!("admin")));
        assert_eq!(records[0].get("event.code"), Some(&json!("4625")));
        assert_eq!(records[1].get("user.name"), Some(&json!("guest")));
    }

    #[test]
    fn into_records_names_unnamed_columns_by_position() {
        let table = QueryTable {
            columns: vec![
                ColumnSpec::default(),
                ColumnSpec::named("count"),
                ColumnSpec::default(),
            ],
            rows: vec![vec![json!(1), json!(2), json!(3)]],
        };
        let records = table.into_records();
        assert_eq!(records[0].get("col_0"), Some(&json!(1)));
        assert_eq!(records[0].get("count"), Some(&json!(2)));
        assert_eq!(records[0].get("col_2"), Some(&json!(3)));
    }

    #[test]
    fn into_records_short_row_omits_trailing_fields() {
        let table = QueryTable {
            columns: vec![ColumnSpec::named("a"), ColumnSpec::named("b")],
            rows: vec![vec![json!(1)]],
        };
        let records = table.into_records();
        assert_eq!(records[0].get("a"), Some(&json!(1)));
        assert!(!records[0].contains_key("b"));
    }

    #[test]
    fn into_records_long_row_drops_extra_values() {
        let table = QueryTable {
            columns: vec![ColumnSpec::named("a")],
            rows: vec![vec![json!(1), json!(2), json!(3)]],
        };
        let records = table.into_records();
        assert_eq!(records[0].len(), 1);
        assert_eq!(records[0].get("a"), Some(&json!(1)));
    }

    #[test]
    fn into_records_empty_table() {
        let table = QueryTable::default();
        assert!(table.is_empty());
        assert!(table.into_records().is_empty());
    }

    #[test]
    fn deserialize_accepts_values_alias() {
        let raw = r#"{
            "columns": [{"name": "user.name", "type": "keyword"}],
            "values": [["admin"]]
        }"#;
        let table: QueryTable = serde_json::from_str(raw).unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.columns[0].column_type.as_deref(),
            Some("keyword")
        );
    }

    #[test]
    fn deserialize_accepts_rows_key() {
        let raw = r#"{"columns": [{"name": "a"}], "rows": [[1]]}"#;
        let table: QueryTable = serde_json::from_str(raw).unwrap();
        assert_eq!(table.rows.len(), 1);
    }

    #[tokio::test]
    async fn mock_backend_returns_table_and_records_query() {
        let backend = MockQueryBackend::new().with_table(sample_table());
        let table = backend.execute("FROM logs-*").await.unwrap();
        assert_eq!(table.rows.len(), 2);
        assert_eq!(backend.call_count(), 1);
        assert_eq!(backend.received_queries(), vec!["FROM logs-*"]);
    }

    #[tokio::test]
    async fn mock_backend_failure_returns_none() {
        let backend = MockQueryBackend::new().with_failure();
        assert!(backend.execute("FROM logs-*").await.is_none());
    }

    #[tokio::test]
    async fn mock_backend_ping() {
        assert!(MockQueryBackend::new().ping().await);
        assert!(!MockQueryBackend::new().with_ping_failure().ping().await);
    }

    #[test]
    fn backend_impl_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<MockQueryBackend>();
    }
}
