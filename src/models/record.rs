use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::errors::TissueError;

/// One desired issue, as read from the input file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct IssueRecord {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default)]
    pub custom_fields: BTreeMap<String, String>,
}

#[cfg(test)]
impl IssueRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            assignee: None,
            labels: Vec::new(),
            status: None,
            priority: None,
            custom_fields: BTreeMap::new(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum JsonRecords {
    List(Vec<IssueRecord>),
    Wrapped { issues: Vec<IssueRecord> },
}

#[derive(Deserialize)]
struct TomlRecords {
    #[serde(default)]
    issues: Vec<IssueRecord>,
}

/// Load and validate records from a `.json` or `.toml` file.
pub fn load_records(path: &Path) -> Result<Vec<IssueRecord>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read records from {}", path.display()))?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let records = match extension.as_str() {
        "json" => parse_json(&contents)?,
        "toml" => parse_toml(&contents)?,
        "csv" => parse_csv(&contents)?,
        other => {
            return Err(TissueError::RecordsInvalid(format!(
                "Unsupported file type '{}' (expected .json, .toml or .csv)",
                other
            ))
            .into())
        }
    };

    validate_records(records).map_err(Into::into)
}

pub fn parse_json(contents: &str) -> Result<Vec<IssueRecord>> {
    let parsed: JsonRecords =
        serde_json::from_str(contents).context("Failed to parse JSON records")?;

    Ok(match parsed {
        JsonRecords::List(records) => records,
        JsonRecords::Wrapped { issues } => issues,
    })
}

pub fn parse_toml(contents: &str) -> Result<Vec<IssueRecord>> {
    let parsed: TomlRecords = toml::from_str(contents).context("Failed to parse TOML records")?;
    Ok(parsed.issues)
}

/// One issue per row. `labels` is a comma-separated cell; columns other than
/// the known ones become custom fields, and empty cells are ignored.
pub fn parse_csv(contents: &str) -> Result<Vec<IssueRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(contents.as_bytes());

    reader
        .deserialize::<BTreeMap<String, String>>()
        .enumerate()
        .map(|(index, row)| {
            let row = row.with_context(|| format!("Failed to parse CSV row {}", index + 1))?;
            Ok(record_from_row(row))
        })
        .collect()
}

fn record_from_row(row: BTreeMap<String, String>) -> IssueRecord {
    let mut record = IssueRecord {
        title: String::new(),
        description: String::new(),
        assignee: None,
        labels: Vec::new(),
        status: None,
        priority: None,
        custom_fields: BTreeMap::new(),
    };

    for (column, value) in row {
        if value.is_empty() {
            continue;
        }
        match column.to_lowercase().as_str() {
            "title" => record.title = value,
            "description" | "body" => record.description = value,
            "assignee" => record.assignee = Some(value),
            "labels" => {
                record.labels = value
                    .split(',')
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect()
            }
            "status" => record.status = Some(value),
            "priority" => record.priority = Some(value),
            _ => {
                record.custom_fields.insert(column, value);
            }
        }
    }

    record
}

/// Trim titles and labels, rejecting records that can't become an issue.
pub fn validate_records(records: Vec<IssueRecord>) -> Result<Vec<IssueRecord>, TissueError> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, mut record)| {
            record.title = record.title.trim().to_string();
            if record.title.is_empty() {
                return Err(TissueError::RecordsInvalid(format!(
                    "Record {} has an empty title",
                    index + 1
                )));
            }

            let mut labels = Vec::with_capacity(record.labels.len());
            for label in &record.labels {
                let label = label.trim();
                if label.is_empty() {
                    return Err(TissueError::RecordsInvalid(format!(
                        "Record {} ('{}') has an empty label",
                        index + 1,
                        record.title
                    )));
                }
                labels.push(label.to_string());
            }
            record.labels = labels;

            record.assignee = record
                .assignee
                .take()
                .map(|a| a.trim().trim_start_matches('@').to_string())
                .filter(|a| !a.is_empty());

            Ok(record)
        })
        .collect()
}
