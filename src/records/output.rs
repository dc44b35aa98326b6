use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;
use url::Url;

use crate::discovery::types::{ResultRecord, SearchSlot, ERROR_SENTINEL};

/// Flat output row. Field order is the column order of both output files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultRow {
    pub name: String,
    pub method: String,
    pub method_link: String,
    pub openapi_link: String,
    pub search_method_name: String,
    pub search_method_link: String,
    pub ai_method_name: String,
    pub ai_method_link: String,
}

impl From<&ResultRecord> for ResultRow {
    fn from(result: &ResultRecord) -> Self {
        Self {
            name: result.method.name.clone(),
            method: result.method.method_label.clone(),
            method_link: sanitize_link(&result.method.method_link),
            openapi_link: sanitize_link(result.openapi_link()),
            search_method_name: sanitize_link(result.slot(SearchSlot::SearchMethodName)),
            search_method_link: sanitize_link(result.slot(SearchSlot::SearchMethodLink)),
            ai_method_name: sanitize_link(result.slot(SearchSlot::AiMethodName)),
            ai_method_link: sanitize_link(result.slot(SearchSlot::AiMethodLink)),
        }
    }
}

/// Empty and the error sentinel pass through; anything that is not an
/// absolute http(s) URL with a host becomes the error sentinel.
pub fn sanitize_link(value: &str) -> String {
    if value.is_empty() || value == ERROR_SENTINEL {
        return value.to_string();
    }
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => value.to_string(),
        _ => ERROR_SENTINEL.to_string(),
    }
}

/// Write `{base}.csv` and `{base}.json`, returning both paths.
pub fn save_results(results: &[ResultRecord], output_base: &str) -> Result<(PathBuf, PathBuf)> {
    let rows: Vec<ResultRow> = results.iter().map(ResultRow::from).collect();
    let csv_path = PathBuf::from(format!("{}.csv", output_base));
    let json_path = PathBuf::from(format!("{}.json", output_base));

    let csv_file = std::fs::File::create(&csv_path)
        .with_context(|| format!("Failed to create {}", csv_path.display()))?;
    write_csv(csv_file, &rows).with_context(|| format!("Failed to write {}", csv_path.display()))?;

    let json = to_json(&rows)?;
    std::fs::write(&json_path, json)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;

    info!(
        rows = rows.len(),
        csv = %csv_path.display(),
        json = %json_path.display(),
        "results saved"
    );
    Ok((csv_path, json_path))
}

pub fn write_csv<W: Write>(writer: W, rows: &[ResultRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if rows.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn to_json(rows: &[ResultRow]) -> Result<String> {
    serde_json::to_string_pretty(rows).context("serialize results")
}

const COLUMNS: [&str; 8] = [
    "name",
    "method",
    "method_link",
    "openapi_link",
    "search_method_name",
    "search_method_link",
    "ai_method_name",
    "ai_method_link",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::types::{MethodRecord, Resolution, SearchOutcome, SlotValue};

    fn bitrix() -> MethodRecord {
        MethodRecord::new(
            "bitrix24",
            "add user",
            "https://api.bitrix24.com/rest/user.add",
        )
    }

    fn searched() -> ResultRecord {
        ResultRecord::new(
            bitrix(),
            Resolution::Search(SearchOutcome {
                search_method_name: SlotValue::Link("https://dev.1c-bitrix.ru/rest_help/".into()),
                search_method_link: SlotValue::Error,
                ai_method_name: SlotValue::Link("javascript:alert(1)".into()),
                ai_method_link: SlotValue::Link(
                    "https://apidocs.bitrix24.com/api-reference/user/user-add.html".into(),
                ),
            }),
        )
    }

    #[test]
    fn test_sanitize_link() {
        assert_eq!(sanitize_link(""), "");
        assert_eq!(sanitize_link("error"), "error");
        assert_eq!(sanitize_link("https://a.example/x"), "https://a.example/x");
        assert_eq!(sanitize_link("ftp://a.example/x"), "error");
        assert_eq!(sanitize_link("/docs/openapi.json"), "error");
        assert_eq!(sanitize_link("not a url"), "error");
    }

    #[test]
    fn test_csv_columns_and_values() {
        let direct = ResultRecord::new(
            bitrix(),
            Resolution::OpenApi("https://api.bitrix24.com/openapi.json".into()),
        );
        let rows: Vec<ResultRow> = [direct, searched()].iter().map(ResultRow::from).collect();

        let mut buf = Vec::new();
        write_csv(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "bitrix24,add user,https://api.bitrix24.com/rest/user.add,https://api.bitrix24.com/openapi.json,,,,"
        );
        assert_eq!(
            lines[2],
            "bitrix24,add user,https://api.bitrix24.com/rest/user.add,,https://dev.1c-bitrix.ru/rest_help/,error,error,https://apidocs.bitrix24.com/api-reference/user/user-add.html"
        );
    }

    #[test]
    fn test_csv_header_without_rows() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn test_json_keeps_field_order() {
        let rows = vec![ResultRow::from(&searched())];
        let json = to_json(&rows).unwrap();

        let positions: Vec<usize> = COLUMNS
            .iter()
            .map(|c| json.find(&format!("\"{}\"", c)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed[0]["method"], "add user");
        assert_eq!(parsed[0]["openapi_link"], "");
        assert_eq!(parsed[0]["search_method_link"], "error");
    }
}
