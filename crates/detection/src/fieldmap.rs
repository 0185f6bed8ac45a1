//! 필드 매핑 -- 정규화 필드명을 원시 윈도우 이벤트 로그 필드명으로 치환
//!
//! 규칙은 ECS 스타일 정규화 필드명(`user.name`, `source.ip` 등)으로
//! 작성되고, 실제 데이터 소스는 `winlog.event_data.*` 원시 필드를
//! 사용합니다. [`FieldMapper`]는 쿼리 텍스트에서 정규화 필드명을 토큰
//! 단위로 찾아 원시 필드명으로 치환합니다.
//!
//! 이 치환은 쿼리 문법을 이해하지 않는 순수 텍스트 변환입니다. 문자열
//! 리터럴 안에 필드명과 같은 토큰이 있으면 함께 치환됩니다. 알려진
//! 제약이며 쿼리 파서가 생기기 전까지는 감수합니다.

use regex::{NoExpand, Regex};

/// 기본 매핑 테이블 -- 정규화 필드 → 원시 필드 별칭 (첫 번째가 기본 별칭)
///
/// 순서가 곧 치환 순서이므로 출력 결정성을 위해 순서를 바꾸면 안 됩니다.
const DEFAULT_MAPPINGS: &[(&str, &[&str])] = &[
    // 계정
    (
        "user.name",
        &[
            "winlog.event_data.TargetUserName",
            "winlog.event_data.SubjectUserName",
            "winlog.user.name",
        ],
    ),
    (
        "user.domain",
        &[
            "winlog.event_data.TargetDomainName",
            "winlog.event_data.SubjectDomainName",
            "winlog.user.domain",
        ],
    ),
    (
        "user.id",
        &[
            "winlog.event_data.TargetUserSid",
            "winlog.event_data.SubjectUserSid",
        ],
    ),
    ("user.target.name", &["winlog.event_data.TargetUserName"]),
    ("user.target.domain", &["winlog.event_data.TargetDomainName"]),
    ("user.target.id", &["winlog.event_data.TargetUserSid"]),
    ("user.subject.name", &["winlog.event_data.SubjectUserName"]),
    (
        "user.subject.domain",
        &["winlog.event_data.SubjectDomainName"],
    ),
    ("user.subject.id", &["winlog.event_data.SubjectUserSid"]),
    // 그룹
    (
        "group.name",
        &[
            "winlog.event_data.Group",
            "winlog.event_data.MemberName",
            "winlog.event_data.TargetUserName",
        ],
    ),
    ("group.id", &["winlog.event_data.MemberSid"]),
    // 출발지
    (
        "source.ip",
        &[
            "winlog.event_data.IpAddress",
            "winlog.event_data.SourceAddress",
        ],
    ),
    (
        "source.address",
        &[
            "winlog.event_data.WorkstationName",
            "winlog.event_data.Workstation",
        ],
    ),
    ("source.domain", &["winlog.event_data.SourceNetworkAddress"]),
    ("source.port", &["winlog.event_data.SourcePort"]),
    // 프로세스
    (
        "process.name",
        &[
            "winlog.event_data.NewProcessName",
            "winlog.event_data.ProcessName",
            "winlog.event_data.Image",
        ],
    ),
    (
        "process.executable",
        &[
            "winlog.event_data.NewProcessName",
            "winlog.event_data.ProcessName",
        ],
    ),
    ("process.command_line", &["winlog.event_data.CommandLine"]),
    (
        "process.parent.name",
        &[
            "winlog.event_data.ParentProcessName",
            "winlog.event_data.ParentImage",
        ],
    ),
    (
        "process.parent.command_line",
        &["winlog.event_data.ParentCommandLine"],
    ),
    (
        "process.pid",
        &[
            "winlog.event_data.ProcessId",
            "winlog.event_data.NewProcessId",
        ],
    ),
    ("process.parent.pid", &["winlog.event_data.ParentProcessId"]),
    ("process.target.name", &["winlog.event_data.TargetImage"]),
    (
        "process.working_directory",
        &["winlog.event_data.CurrentDirectory"],
    ),
    // 이벤트 메타 (이미 원시 필드와 동일)
    ("event.category", &["event.category"]),
    ("event.outcome", &["event.outcome"]),
    ("event.action", &["event.action"]),
    ("event.code", &["event.code"]),
    // 로그온
    ("winlog.logon.type", &["winlog.event_data.LogonType"]),
    (
        "winlog.logon.authentication_package",
        &["winlog.event_data.AuthenticationPackageName"],
    ),
    (
        "winlog.logon.logon_process",
        &["winlog.event_data.LogonProcessName"],
    ),
    (
        "winlog.logon.id",
        &[
            "winlog.event_data.TargetLogonId",
            "winlog.event_data.LogonId",
        ],
    ),
    // 파일
    (
        "file.path",
        &[
            "winlog.event_data.TargetFilename",
            "winlog.event_data.FileName",
        ],
    ),
    ("file.name", &["winlog.event_data.FileName"]),
    ("file.directory", &["winlog.event_data.TargetFilename"]),
    // 레지스트리
    ("registry.path", &["winlog.event_data.TargetObject"]),
    ("registry.key", &["winlog.event_data.TargetObject"]),
    ("registry.value", &["winlog.event_data.Details"]),
    // 목적지/네트워크
    (
        "destination.ip",
        &[
            "winlog.event_data.DestAddress",
            "winlog.event_data.DestinationIp",
        ],
    ),
    (
        "destination.port",
        &[
            "winlog.event_data.DestPort",
            "winlog.event_data.DestinationPort",
        ],
    ),
    ("network.protocol", &["winlog.event_data.Protocol"]),
    // 서비스
    ("service.name", &["winlog.event_data.ServiceName"]),
    ("service.type", &["winlog.event_data.ServiceType"]),
    // DNS
    ("dns.question.name", &["winlog.event_data.QueryName"]),
    ("dns.question.type", &["winlog.event_data.QueryType"]),
];

/// 단일 필드 매핑 항목
///
/// 토큰 경계 정규식은 항목 생성 시 한 번만 컴파일합니다.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    canonical: String,
    aliases: Vec<String>,
    pattern: Regex,
}

impl MappingEntry {
    /// 정규화 필드명을 반환합니다.
    pub fn canonical(&self) -> &str {
        &self.canonical
    }

    /// 원시 필드 별칭 목록을 반환합니다 (첫 번째가 기본 별칭).
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// 기본(첫 번째) 별칭을 반환합니다.
    pub fn primary_alias(&self) -> &str {
        &self.aliases[0]
    }

    /// 폴백 치환 표현식을 만듭니다.
    ///
    /// 별칭이 하나면 그대로, 여럿이면 `COALESCE(a, b, c)` 형태입니다.
    fn fallback_expression(&self) -> String {
        if self.aliases.len() == 1 {
            self.aliases[0].clone()
        } else {
            format!("COALESCE({})", self.aliases.join(", "))
        }
    }
}

/// 필드 매퍼
pub struct FieldMapper {
    entries: Vec<MappingEntry>,
}

impl FieldMapper {
    /// 기본 매핑 테이블을 가진 매퍼를 생성합니다.
    pub fn new() -> Self {
        let mut mapper = Self::empty();
        for (canonical, aliases) in DEFAULT_MAPPINGS {
            mapper.add_mapping(canonical, aliases.iter().copied());
        }
        mapper
    }

    /// 매핑이 하나도 없는 매퍼를 생성합니다.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// 등록된 매핑 항목을 테이블 순서대로 반환합니다.
    pub fn mappings(&self) -> &[MappingEntry] {
        &self.entries
    }

    /// 등록된 매핑 수를 반환합니다.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 매핑이 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 매핑을 추가하거나 교체합니다.
    ///
    /// 이미 등록된 필드는 테이블 내 위치를 유지한 채 별칭만 교체됩니다.
    /// 빈 별칭 목록은 경고 로그를 남기고 무시합니다.
    pub fn add_mapping<I, S>(&mut self, canonical: &str, aliases: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let aliases: Vec<String> = aliases.into_iter().map(Into::into).collect();
        if aliases.is_empty() {
            tracing::warn!(field = canonical, "empty alias list, ignoring mapping");
            return;
        }

        // regex::escape를 거치므로 컴파일은 사실상 실패하지 않지만,
        // 실패하더라도 매핑 하나를 버리는 것으로 끝낸다
        let pattern = match Regex::new(&format!(r"\b{}\b", regex::escape(canonical))) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(
                    field = canonical,
                    error = %e,
                    "failed to compile field pattern, ignoring mapping"
                );
                return;
            }
        };

        let entry = MappingEntry {
            canonical: canonical.to_owned(),
            aliases,
            pattern,
        };

        match self.entries.iter_mut().find(|e| e.canonical == canonical) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// 쿼리의 정규화 필드명을 기본 별칭으로 치환합니다.
    ///
    /// 테이블 순서대로, 토큰 경계(`\b`)로 구분되는 전체 일치만 치환합니다.
    /// `user.names`처럼 뒤에 단어 문자가 붙은 토큰은 건드리지 않습니다.
    pub fn transform_direct(&self, query: &str) -> String {
        let mut result = query.to_owned();
        for entry in &self.entries {
            if !result.contains(entry.canonical.as_str()) {
                continue;
            }
            result = entry
                .pattern
                .replace_all(&result, NoExpand(entry.primary_alias()))
                .into_owned();
        }
        result
    }

    /// 쿼리의 정규화 필드명을 폴백 표현식으로 치환합니다.
    ///
    /// 별칭이 여럿인 필드는 `COALESCE(...)`로 감싸 데이터 소스에 어떤
    /// 별칭이 실제로 존재하든 쿼리가 동작하도록 합니다.
    pub fn transform_with_fallback(&self, query: &str) -> String {
        let mut result = query.to_owned();
        for entry in &self.entries {
            if !result.contains(entry.canonical.as_str()) {
                continue;
            }
            let replacement = entry.fallback_expression();
            result = entry
                .pattern
                .replace_all(&result, NoExpand(&replacement))
                .into_owned();
        }
        result
    }

    /// 단일 필드의 폴백 표현식을 반환합니다.
    ///
    /// 등록되지 않은 필드는 그대로 돌려줍니다.
    pub fn coalesce_expression(&self, field: &str) -> String {
        match self.entries.iter().find(|e| e.canonical == field) {
            Some(entry) => entry.fallback_expression(),
            None => field.to_owned(),
        }
    }
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_complete() {
        let mapper = FieldMapper::new();
        assert_eq!(mapper.len(), 45);
        assert_eq!(mapper.mappings()[0].canonical(), "user.name");
        assert!(mapper.mappings().iter().all(|e| !e.aliases().is_empty()));
    }

    #[test]
    fn transform_direct_replaces_with_primary_alias() {
        let mapper = FieldMapper::new();
        let query = r#"FROM logs-* | WHERE user.name == "admin""#;
        assert_eq!(
            mapper.transform_direct(query),
            r#"FROM logs-* | WHERE winlog.event_data.TargetUserName == "admin""#
        );
    }

    #[test]
    fn transform_direct_replaces_all_occurrences() {
        let mapper = FieldMapper::new();
        let query = "WHERE source.ip == a OR source.ip == b";
        assert_eq!(
            mapper.transform_direct(query),
            "WHERE winlog.event_data.IpAddress == a OR winlog.event_data.IpAddress == b"
        );
    }

    #[test]
    fn transform_direct_handles_multiple_fields() {
        let mapper = FieldMapper::new();
        let query = "WHERE user.name == x AND source.ip == y";
        assert_eq!(
            mapper.transform_direct(query),
            "WHERE winlog.event_data.TargetUserName == x AND winlog.event_data.IpAddress == y"
        );
    }

    #[test]
    fn transform_direct_respects_token_boundaries() {
        let mapper = FieldMapper::new();
        // 앞뒤에 단어 문자가 붙은 토큰은 다른 식별자이므로 치환하지 않는다
        assert_eq!(
            mapper.transform_direct("WHERE xuser.name == 1"),
            "WHERE xuser.name == 1"
        );
        assert_eq!(
            mapper.transform_direct("WHERE user.names == 1"),
            "WHERE user.names == 1"
        );
    }

    #[test]
    fn transform_direct_handles_nested_field_names() {
        let mapper = FieldMapper::new();
        assert_eq!(
            mapper.transform_direct("WHERE user.target.name == x"),
            "WHERE winlog.event_data.TargetUserName == x"
        );
    }

    #[test]
    fn transform_direct_leaves_unknown_fields() {
        let mapper = FieldMapper::new();
        let query = "FROM logs-* | WHERE custom.field == 1";
        assert_eq!(mapper.transform_direct(query), query);
    }

    #[test]
    fn transform_direct_rewrites_inside_string_literals() {
        // 텍스트 변환의 알려진 제약: 문자열 리터럴 내부도 치환된다
        let mapper = FieldMapper::new();
        let query = r#"WHERE message == "check user.name here""#;
        assert_eq!(
            mapper.transform_direct(query),
            r#"WHERE message == "check winlog.event_data.TargetUserName here""#
        );
    }

    #[test]
    fn transform_direct_identity_for_event_fields() {
        let mapper = FieldMapper::new();
        let query = r#"WHERE event.code == "4625""#;
        assert_eq!(mapper.transform_direct(query), query);
    }

    #[test]
    fn transform_empty_query() {
        let mapper = FieldMapper::new();
        assert_eq!(mapper.transform_direct(""), "");
        assert_eq!(mapper.transform_with_fallback(""), "");
    }

    #[test]
    fn transform_with_fallback_uses_coalesce() {
        let mapper = FieldMapper::new();
        let query = "WHERE user.name == x";
        assert_eq!(
            mapper.transform_with_fallback(query),
            "WHERE COALESCE(winlog.event_data.TargetUserName, \
             winlog.event_data.SubjectUserName, winlog.user.name) == x"
        );
    }

    #[test]
    fn transform_with_fallback_single_alias_is_plain() {
        let mapper = FieldMapper::new();
        assert_eq!(
            mapper.transform_with_fallback("WHERE process.command_line == x"),
            "WHERE winlog.event_data.CommandLine == x"
        );
    }

    #[test]
    fn coalesce_expression_multi_alias() {
        let mapper = FieldMapper::new();
        assert_eq!(
            mapper.coalesce_expression("source.ip"),
            "COALESCE(winlog.event_data.IpAddress, winlog.event_data.SourceAddress)"
        );
    }

    #[test]
    fn coalesce_expression_single_alias() {
        let mapper = FieldMapper::new();
        assert_eq!(
            mapper.coalesce_expression("process.command_line"),
            "winlog.event_data.CommandLine"
        );
    }

    #[test]
    fn coalesce_expression_unknown_field_unchanged() {
        let mapper = FieldMapper::new();
        assert_eq!(mapper.coalesce_expression("no.such.field"), "no.such.field");
    }

    #[test]
    fn add_mapping_appends_new_entry() {
        let mut mapper = FieldMapper::empty();
        mapper.add_mapping("custom.field", ["raw.custom"]);
        assert_eq!(mapper.len(), 1);
        assert_eq!(
            mapper.transform_direct("WHERE custom.field == 1"),
            "WHERE raw.custom == 1"
        );
    }

    #[test]
    fn add_mapping_overwrites_in_place() {
        let mut mapper = FieldMapper::new();
        let before = mapper.len();
        mapper.add_mapping("user.name", ["custom.UserName"]);

        assert_eq!(mapper.len(), before);
        // 테이블 내 위치는 그대로다
        assert_eq!(mapper.mappings()[0].canonical(), "user.name");
        assert_eq!(mapper.mappings()[0].aliases(), ["custom.UserName"]);
        assert_eq!(
            mapper.transform_direct("WHERE user.name == x"),
            "WHERE custom.UserName == x"
        );
    }

    #[test]
    fn add_mapping_rejects_empty_alias_list() {
        let mut mapper = FieldMapper::new();
        let before = mapper.len();
        mapper.add_mapping("user.name", Vec::<String>::new());
        assert_eq!(mapper.len(), before);
        // 기존 매핑은 바뀌지 않는다
        assert_eq!(
            mapper.mappings()[0].primary_alias(),
            "winlog.event_data.TargetUserName"
        );
    }

    #[test]
    fn empty_mapper_is_identity() {
        let mapper = FieldMapper::empty();
        let query = "WHERE user.name == x";
        assert_eq!(mapper.transform_direct(query), query);
        assert_eq!(mapper.transform_with_fallback(query), query);
    }
}
