//! 규칙 파일 로더 -- YAML 규칙 파일을 디스크에서 로드합니다.
//!
//! 규칙 디렉토리를 재귀적으로 스캔하여 `.yml`/`.yaml` 파일을 파싱합니다.
//! 개별 파일 파싱 실패는 경고 로그를 남기고 건너뜁니다.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ironwatch_core::metrics as m;

use crate::error::DetectionError;

use super::types::{Rule, RuleFile};

/// 규칙 파일 로더 설정
const MAX_RULE_FILE_SIZE: u64 = 10 * 1024 * 1024; // 10MB
const MAX_RULES_COUNT: usize = 10_000;

/// 규칙 파일 로더
pub struct RuleLoader;

impl RuleLoader {
    /// 디렉토리 트리에서 모든 YAML 규칙 파일을 로드합니다.
    ///
    /// 하위 디렉토리까지 재귀적으로 내려가며 `.yml`/`.yaml` 확장자를 가진
    /// 파일만 처리합니다. 파일은 경로 순으로 정렬되어 중복 ID 발생 시
    /// 어느 쪽이 유지되는지(먼저 로드된 쪽)가 결정적입니다.
    /// 개별 파일 로딩 실패는 경고 로그를 남기고 건너뜁니다.
    ///
    /// 루트 디렉토리가 없으면 에러 로그만 남기고 빈 목록을 반환합니다.
    /// 규칙이 하나도 없는 상태는 정상 동작(알림 0건)이기 때문입니다.
    ///
    /// # Errors
    /// - 디렉토리 엔트리를 읽을 수 없는 경우
    /// - 규칙 수가 `MAX_RULES_COUNT`를 초과하는 경우
    pub async fn load_directory(dir: impl AsRef<Path>) -> Result<Vec<Rule>, DetectionError> {
        let dir = dir.as_ref();

        match tokio::fs::metadata(dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                tracing::error!(dir = %dir.display(), "rules path is not a directory");
                return Ok(Vec::new());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(dir = %dir.display(), "rules directory not found");
                return Ok(Vec::new());
            }
            Err(e) => return Err(DetectionError::Io(e)),
        }

        let files = Self::collect_yaml_files(dir).await?;

        let mut rules = Vec::new();
        let mut seen_ids = HashSet::new();
        let mut skipped = 0u64;

        for path in files {
            match Self::load_file(&path).await {
                Ok(rule) => {
                    // 중복 ID 검사 -- 먼저 로드된 규칙이 유지됩니다
                    if seen_ids.contains(&rule.id) {
                        tracing::warn!(
                            rule_id = %rule.id,
                            path = %path.display(),
                            "duplicate rule id, skipping"
                        );
                        skipped += 1;
                        continue;
                    }
                    seen_ids.insert(rule.id.clone());
                    rules.push(rule);
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "failed to load rule file, skipping"
                    );
                    skipped += 1;
                }
            }

            if rules.len() > MAX_RULES_COUNT {
                return Err(DetectionError::RuleParse {
                    path: dir.display().to_string(),
                    reason: format!("rule count exceeds the {MAX_RULES_COUNT} limit"),
                });
            }
        }

        metrics::counter!(m::RULES_LOADED_TOTAL).increment(rules.len() as u64);
        metrics::counter!(m::RULE_FILES_SKIPPED_TOTAL).increment(skipped);

        tracing::info!(
            dir = %dir.display(),
            count = rules.len(),
            skipped,
            "loaded detection rules"
        );

        Ok(rules)
    }

    /// 디렉토리 트리를 순회하며 YAML 파일 경로를 수집합니다.
    ///
    /// 재귀 호출 대신 명시적인 스택을 사용합니다 (async fn은 자기 자신을
    /// 직접 재귀 호출할 수 없음).
    pub(crate) async fn collect_yaml_files(root: &Path) -> Result<Vec<PathBuf>, DetectionError> {
        let mut files = Vec::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(current) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&current).await?;

            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let file_type = entry.file_type().await?;

                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                // .yml / .yaml 확장자만 처리
                let is_yaml = path
                    .extension()
                    .is_some_and(|ext| ext == "yml" || ext == "yaml");
                if is_yaml {
                    files.push(path);
                }
            }
        }

        files.sort();
        Ok(files)
    }

    /// 단일 YAML 파일에서 규칙을 로드합니다.
    pub async fn load_file(path: impl AsRef<Path>) -> Result<Rule, DetectionError> {
        let path = path.as_ref();

        // 파일 크기 검증
        let metadata = tokio::fs::metadata(path).await?;
        if metadata.len() > MAX_RULE_FILE_SIZE {
            return Err(DetectionError::RuleParse {
                path: path.display().to_string(),
                reason: format!(
                    "rule file is {} bytes, over the {MAX_RULE_FILE_SIZE} byte limit",
                    metadata.len()
                ),
            });
        }

        let content = tokio::fs::read_to_string(path).await?;

        Self::parse_yaml(&content, path)
    }

    /// YAML 문자열을 파싱하여 규칙을 생성합니다.
    ///
    /// 빈 파일(내용 없음, 주석만 있음, 빈 매핑)은 [`DetectionError::EmptyRuleFile`]로
    /// 구분됩니다. 호출자는 이를 건너뛰되 전체 로드를 실패시키지 않습니다.
    pub fn parse_yaml(yaml_str: &str, source: &Path) -> Result<Rule, DetectionError> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(yaml_str).map_err(|e| DetectionError::RuleParse {
                path: source.display().to_string(),
                reason: format!("YAML parse error: {e}"),
            })?;

        let is_empty = match &value {
            serde_yaml::Value::Null => true,
            serde_yaml::Value::Mapping(map) => map.is_empty(),
            _ => false,
        };
        if is_empty {
            return Err(DetectionError::EmptyRuleFile {
                path: source.display().to_string(),
            });
        }

        let file: RuleFile =
            serde_yaml::from_value(value).map_err(|e| DetectionError::RuleParse {
                path: source.display().to_string(),
                reason: format!("YAML parse error: {e}"),
            })?;

        Ok(Rule::from_file(file, source))
    }
}
