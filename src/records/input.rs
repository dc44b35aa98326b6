use std::io::Read;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::discovery::types::MethodRecord;

const REQUIRED_FIELDS: [&str; 3] = ["name", "method", "method_link"];

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file not found: {0}")]
    NotFound(PathBuf),
    #[error("unsupported file format '{0}', only .csv and .json are supported")]
    UnsupportedFormat(String),
    #[error("CSV file is empty or has no header")]
    EmptyCsv,
    #[error("CSV file missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("JSON input must be an array of objects")]
    NotAnArray,
    #[error("error parsing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("error parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("error reading input: {0}")]
    Io(#[from] std::io::Error),
}

/// Load method records from a `.csv` or `.json` file. Rows missing a
/// required value are skipped with a warning.
pub fn load_records(path: &Path) -> Result<Vec<MethodRecord>, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()));
    }
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let records = match extension.as_str() {
        "csv" => parse_csv(std::fs::File::open(path)?)?,
        "json" => parse_json(&std::fs::read_to_string(path)?)?,
        other => return Err(InputError::UnsupportedFormat(format!(".{}", other))),
    };

    info!(path = %path.display(), count = records.len(), "input loaded");
    Ok(records)
}

pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<MethodRecord>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(InputError::EmptyCsv);
    }
    let columns: Vec<Option<usize>> = REQUIRED_FIELDS
        .iter()
        .map(|field| headers.iter().position(|h| h == *field))
        .collect();
    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .zip(&columns)
        .filter(|(_, idx)| idx.is_none())
        .map(|(field, _)| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(InputError::MissingColumns(missing));
    }

    let mut records = Vec::new();
    // header is row 1
    for (row, entry) in reader.records().enumerate().map(|(i, r)| (i + 2, r)) {
        let entry = entry?;
        let values: Vec<&str> = columns
            .iter()
            .map(|idx| idx.and_then(|i| entry.get(i)).unwrap_or("").trim())
            .collect();
        match record_from(&values) {
            Some(record) => records.push(record),
            None => warn!(
                row,
                missing = %missing_fields(&values).join(", "),
                "skipping CSV row with missing required fields"
            ),
        }
    }
    Ok(records)
}

pub fn parse_json(text: &str) -> Result<Vec<MethodRecord>, InputError> {
    let data: Value = serde_json::from_str(text)?;
    let items = data.as_array().ok_or(InputError::NotAnArray)?;

    let mut records = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let Some(object) = item.as_object() else {
            warn!(index, "skipping JSON item that is not an object");
            continue;
        };
        let owned: Vec<String> = REQUIRED_FIELDS
            .iter()
            .map(|field| object.get(*field).map(as_text).unwrap_or_default())
            .collect();
        let values: Vec<&str> = owned.iter().map(|v| v.trim()).collect();
        match record_from(&values) {
            Some(record) => records.push(record),
            None => warn!(
                index,
                missing = %missing_fields(&values).join(", "),
                "skipping JSON item with missing required fields"
            ),
        }
    }
    Ok(records)
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

/// `values` are in `REQUIRED_FIELDS` order.
fn record_from(values: &[&str]) -> Option<MethodRecord> {
    if values.iter().any(|v| v.is_empty()) {
        return None;
    }
    Some(MethodRecord::new(values[0], values[1], values[2]))
}

fn missing_fields(values: &[&str]) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .zip(values)
        .filter(|(_, v)| v.is_empty())
        .map(|(field, _)| *field)
        .collect()
}
