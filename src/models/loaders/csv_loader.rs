use crate::error::InputError;
use crate::models::target::AnalysisTarget;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::path::Path;
use tokio::fs;

/// 编辑列可接受的表头
const GROUP_HEADERS: &[&str] = &["group", "editor"];
const URL_HEADERS: &[&str] = &["url"];
const TITLE_HEADERS: &[&str] = &["title", "titulo", "título"];

/// 从 CSV 文件加载分析目标
pub async fn load_targets_from_path(path: &Path) -> Result<Vec<AnalysisTarget>, InputError> {
    let content = fs::read_to_string(path)
        .await
        .map_err(|source| InputError::Io {
            path: path.display().to_string(),
            source,
        })?;

    let targets = parse_targets(&content)?;
    tracing::info!(
        "成功加载 {} 个目标: {}",
        targets.len(),
        path.file_name().unwrap_or_default().to_string_lossy()
    );
    Ok(targets)
}

/// 解析带表头的 CSV 文本
///
/// 表头必须包含 `group`/`editor` 和 `url`，`title`/`titulo` 可选。
/// 空行跳过；空文件或没有数据行返回 [`InputError::Empty`]。
pub fn parse_targets(content: &str) -> Result<Vec<AnalysisTarget>, InputError> {
    if content.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|source| InputError::Csv { line: 1, source })?
        .clone();

    let group_idx = find_column(&headers, GROUP_HEADERS).ok_or_else(|| InputError::MissingColumn {
        column: "group".to_string(),
    })?;
    let url_idx = find_column(&headers, URL_HEADERS).ok_or_else(|| InputError::MissingColumn {
        column: "url".to_string(),
    })?;
    let title_idx = find_column(&headers, TITLE_HEADERS);

    let mut targets = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|source| InputError::Csv {
            line: source.position().map(|p| p.line()).unwrap_or_default(),
            source,
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let url = field(&record, url_idx).ok_or_else(|| InputError::MissingField {
            line,
            field: "url".to_string(),
        })?;
        let group = field(&record, group_idx).ok_or_else(|| InputError::MissingField {
            line,
            field: "group".to_string(),
        })?;
        let title = title_idx.and_then(|idx| field(&record, idx));

        targets.push(AnalysisTarget::new(group, url, title));
    }

    if targets.is_empty() {
        return Err(InputError::Empty);
    }

    Ok(targets)
}

fn find_column(headers: &StringRecord, names: &[&str]) -> Option<usize> {
    headers.iter().position(|header| {
        let header = header.trim_start_matches('\u{feff}').to_lowercase();
        names.contains(&header.as_str())
    })
}

fn field(record: &StringRecord, idx: usize) -> Option<String> {
    record
        .get(idx)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_editor_and_titulo_headers() {
        let csv = "editor,url,titulo\n\
                   Ana,https://example.com/a,Guía de SEO\n\
                   Luis,https://example.com/b,\n";
        let targets = parse_targets(csv).unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].group, "Ana");
        assert_eq!(targets[0].title.as_deref(), Some("Guía de SEO"));
        assert_eq!(targets[1].title, None);
        assert_eq!(targets[1].display_title(), "https://example.com/b");
    }

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        let csv = "group,url\nA,https://x.test/1\nB,https://x.test/2\nA,https://x.test/1\n";
        let targets = parse_targets(csv).unwrap();
        let urls: Vec<_> = targets.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://x.test/1", "https://x.test/2", "https://x.test/1"]
        );
    }

    #[test]
    fn test_parse_skips_blank_rows_and_trims() {
        let csv = "Group , URL , Title\n  Ana , https://x.test/1 , Hola \n,,\n";
        let targets = parse_targets(csv).unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].group, "Ana");
        assert_eq!(targets[0].url, "https://x.test/1");
        assert_eq!(targets[0].title.as_deref(), Some("Hola"));
    }

    #[test]
    fn test_empty_input_is_error() {
        assert!(matches!(parse_targets(""), Err(InputError::Empty)));
        assert!(matches!(parse_targets("   \n"), Err(InputError::Empty)));
        assert!(matches!(
            parse_targets("editor,url,titulo\n"),
            Err(InputError::Empty)
        ));
    }

    #[test]
    fn test_missing_column_is_error() {
        let err = parse_targets("editor,titulo\nAna,Hola\n").unwrap_err();
        assert!(matches!(err, InputError::MissingColumn { ref column } if column == "url"));
    }

    #[test]
    fn test_row_without_url_is_error() {
        let err = parse_targets("editor,url\nAna,https://x.test/1\nLuis,\n").unwrap_err();
        assert!(matches!(err, InputError::MissingField { line: 3, ref field } if field == "url"));
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = load_targets_from_path(Path::new("does/not/exist.csv"))
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::Io { .. }));
    }
}
