//! executeSql Response Types and Result Formatting
//!
//! This module defines the structured response of the Cloud SQL Admin
//! `executeSql` call and renders it for the primary output stream.
//!
//! # Output Contract
//! - JSON: the full response, pretty-printed, followed by a newline
//! - Text: per result set, a tab-separated table (header, dashes, rows) or
//!   the status message
//!
//! Execution metadata is never written to the primary output; it is handed
//! back as diagnostic lines for the log channel (text mode only).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::OutputFormat;
use crate::error::{ExecError, Result};

/// Response of an `executeSql` call
///
/// Fields this crate does not model are kept in `extra` so JSON output
/// re-emits the whole response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteSqlResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<Vec<SqlResult>>,

    /// Populated instead of `results` when the API is asked for JSON rows
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formatted_rows: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ExecutionMetadata>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One result set: a table, or a status message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<Column>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<Row>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Set by the API when the row limit truncated the result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial_result: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Empty names are omitted by the API
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub values: Vec<CellValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single cell, already stringified by the API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellValue {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_value: Option<bool>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Execution metadata reported alongside results
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_statement_execution_time: Option<String>,

    /// int64 values arrive as JSON strings from Google APIs; kept verbatim
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Formatter result: primary output plus diagnostic lines
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendered {
    /// Text for stdout
    pub output: String,

    /// Informational lines for the log channel, never for stdout
    pub diagnostics: Vec<String>,
}

/// Render `response` in the requested format
pub fn format(response: &ExecuteSqlResponse, format: OutputFormat) -> Result<Rendered> {
    match format {
        OutputFormat::Json => {
            let mut output = serde_json::to_string_pretty(response)
                .map_err(|e| ExecError::output(format!("Could not serialize response: {e}")))?;
            output.push('\n');
            Ok(Rendered { output, diagnostics: Vec::new() })
        }
        OutputFormat::Text => Ok(Rendered {
            output: format_text(response),
            diagnostics: metadata_lines(response.metadata.as_ref()),
        }),
    }
}

fn format_text(response: &ExecuteSqlResponse) -> String {
    let mut out = String::new();

    for result in response.results.iter().flatten() {
        match result {
            SqlResult { columns: Some(columns), rows: Some(rows), .. } => {
                let header =
                    columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join("\t");
                out.push_str(&header);
                out.push('\n');
                out.push_str(&"-".repeat(header.chars().count()));
                out.push('\n');

                for row in rows {
                    let line = row
                        .values
                        .iter()
                        .map(|v| v.value.as_deref().unwrap_or(""))
                        .collect::<Vec<_>>()
                        .join("\t");
                    out.push_str(&line);
                    out.push('\n');
                }
            }
            SqlResult { message: Some(message), .. } => {
                out.push_str(message);
                out.push('\n');
            }
            _ => {}
        }
    }

    out
}

fn metadata_lines(metadata: Option<&ExecutionMetadata>) -> Vec<String> {
    let Some(metadata) = metadata else {
        return Vec::new();
    };

    let mut lines = vec![format!(
        "Execution time: {}",
        metadata.sql_statement_execution_time.as_deref().unwrap_or("unknown")
    )];

    match &metadata.rows_affected {
        None | Some(Value::Null) => {}
        Some(Value::String(n)) => lines.push(format!("Rows affected: {n}")),
        Some(other) => lines.push(format!("Rows affected: {other}")),
    }

    lines
}
