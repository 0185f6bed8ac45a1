//! 규칙 일괄 활성화/비활성화
//!
//! 규칙 파일의 `enabled:` 값을 텍스트 치환으로 일괄 변경합니다.
//! YAML을 재직렬화하지 않으므로 파일의 주석과 키 순서가 그대로 유지됩니다.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use super::loader::RuleLoader;
use crate::error::DetectionError;

/// 일괄 변경 결과 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleSummary {
    /// 검사한 규칙 파일 수
    pub total_files: usize,
    /// 실제로 수정된 파일 수
    pub modified: usize,
    /// 읽기/쓰기에 실패한 파일 수
    pub errors: usize,
}

impl fmt::Display for ToggleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "modified {}/{} rule files ({} errors)",
            self.modified, self.total_files, self.errors
        )
    }
}

/// 디렉토리 트리의 모든 규칙 파일을 활성화 또는 비활성화합니다.
///
/// `enabled: false` ↔ `enabled: true` 텍스트 치환만 수행하므로, `enabled`
/// 키가 없는 파일(기본값 비활성)은 수정 대상에서 제외됩니다. 이미 목표
/// 상태인 파일도 수정하지 않습니다. 개별 파일 실패는 경고 로그를 남기고
/// 계속 진행합니다.
///
/// 디렉토리가 없으면 경고 로그만 남기고 0건 요약을 반환합니다.
///
/// # Errors
/// 디렉토리 엔트리를 읽을 수 없는 경우
pub async fn set_all_enabled(
    dir: impl AsRef<Path>,
    enable: bool,
) -> Result<ToggleSummary, DetectionError> {
    let dir = dir.as_ref();

    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) | Err(_) => {
            tracing::warn!(dir = %dir.display(), "rules directory not found, nothing to toggle");
            return Ok(ToggleSummary {
                total_files: 0,
                modified: 0,
                errors: 0,
            });
        }
    }

    let (from, to) = if enable {
        ("enabled: false", "enabled: true")
    } else {
        ("enabled: true", "enabled: false")
    };

    let files = RuleLoader::collect_yaml_files(dir).await?;

    let mut modified = 0;
    let mut errors = 0;

    for path in &files {
        match toggle_file(path, from, to).await {
            Ok(true) => modified += 1,
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to toggle rule file"
                );
                errors += 1;
            }
        }
    }

    let summary = ToggleSummary {
        total_files: files.len(),
        modified,
        errors,
    };

    tracing::info!(
        dir = %dir.display(),
        enable,
        modified = summary.modified,
        total = summary.total_files,
        "toggled rule files"
    );

    Ok(summary)
}

/// 단일 파일의 `enabled:` 값을 치환합니다. 수정 여부를 반환합니다.
async fn toggle_file(path: &Path, from: &str, to: &str) -> Result<bool, DetectionError> {
    let content = tokio::fs::read_to_string(path).await?;
    if !content.contains(from) {
        return Ok(false);
    }

    let updated = content.replace(from, to);
    tokio::fs::write(path, updated).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn write_rule(dir: &Path, file: &str, enabled_line: Option<&str>) {
        let mut content = format!("name: {file}\nquery: FROM logs-*\n");
        if let Some(line) = enabled_line {
            content.push_str(line);
            content.push('\n');
        }
        tokio::fs::write(dir.join(file), content).await.unwrap();
    }

    #[tokio::test]
    async fn enable_flips_disabled_rules() {
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "off.yml", Some("enabled: false")).await;
        write_rule(dir.path(), "on.yml", Some("enabled: true")).await;

        let summary = set_all_enabled(dir.path(), true).await.unwrap();
        assert_eq!(summary.total_files, 2);
        assert_eq!(summary.modified, 1);
        assert_eq!(summary.errors, 0);

        let content = tokio::fs::read_to_string(dir.path().join("off.yml"))
            .await
            .unwrap();
        assert!(content.contains("enabled: true"));
        assert!(!content.contains("enabled: false"));
    }

    #[tokio::test]
    async fn disable_flips_enabled_rules() {
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "on.yml", Some("enabled: true")).await;

        let summary = set_all_enabled(dir.path(), false).await.unwrap();
        assert_eq!(summary.modified, 1);

        let content = tokio::fs::read_to_string(dir.path().join("on.yml"))
            .await
            .unwrap();
        assert!(content.contains("enabled: false"));
    }

    #[tokio::test]
    async fn file_without_enabled_key_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "bare.yml", None).await;
        let before = tokio::fs::read_to_string(dir.path().join("bare.yml"))
            .await
            .unwrap();

        let summary = set_all_enabled(dir.path(), true).await.unwrap();
        assert_eq!(summary.total_files, 1);
        assert_eq!(summary.modified, 0);

        let after = tokio::fs::read_to_string(dir.path().join("bare.yml"))
            .await
            .unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn toggle_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        write_rule(dir.path(), "off.yml", Some("enabled: false")).await;

        let first = set_all_enabled(dir.path(), true).await.unwrap();
        assert_eq!(first.modified, 1);

        let second = set_all_enabled(dir.path(), true).await.unwrap();
        assert_eq!(second.modified, 0);
    }

    #[tokio::test]
    async fn toggle_preserves_comments() {
        let dir = tempfile::tempdir().unwrap();
        let content = "# keep this comment\nname: Rule\nenabled: false\nquery: FROM logs-*\n";
        tokio::fs::write(dir.path().join("c.yml"), content)
            .await
            .unwrap();

        set_all_enabled(dir.path(), true).await.unwrap();

        let after = tokio::fs::read_to_string(dir.path().join("c.yml"))
            .await
            .unwrap();
        assert!(after.starts_with("# keep this comment\n"));
        assert!(after.contains("enabled: true"));
    }

    #[tokio::test]
    async fn missing_directory_is_a_noop() {
        let summary = set_all_enabled("/nonexistent/rules", true).await.unwrap();
        assert_eq!(summary.total_files, 0);
        assert_eq!(summary.modified, 0);
    }

    #[test]
    fn summary_display() {
        let summary = ToggleSummary {
            total_files: 10,
            modified: 4,
            errors: 1,
        };
        assert_eq!(summary.to_string(), "modified 4/10 rule files (1 errors)");
    }
}
