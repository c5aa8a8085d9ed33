//! JSONL document ingestion.
//!
//! Each non-blank line is parsed on its own. Lines that are not valid JSON
//! objects are collected as errors and left out of the document set.

use std::path::Path;

use docpush_models::{Document, DocumentValue};
use serde::Serialize;

/// A line that could not be turned into a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JsonlLineError {
    /// 1-based line number
    pub line: usize,
    pub message: String,
}

/// Documents parsed from a JSONL source plus the rejected lines.
#[derive(Debug, Clone, Default)]
pub struct JsonlBatch {
    pub documents: Vec<Document>,
    pub errors: Vec<JsonlLineError>,
}

impl JsonlBatch {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Parse newline-delimited JSON objects.
pub fn parse_jsonl(input: &str) -> JsonlBatch {
    let mut batch = JsonlBatch::default();

    for (idx, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let error = |message: String| JsonlLineError {
            line: idx + 1,
            message,
        };

        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => match DocumentValue::document_from_json(value) {
                Some(doc) => batch.documents.push(doc),
                None => batch
                    .errors
                    .push(error("expected a JSON object".to_string())),
            },
            Err(e) => batch.errors.push(error(format!("invalid JSON: {}", e))),
        }
    }

    batch
}

/// Read a JSONL file and parse it.
pub async fn read_jsonl_file(path: impl AsRef<Path>) -> std::io::Result<JsonlBatch> {
    let contents = tokio::fs::read_to_string(path).await?;
    Ok(parse_jsonl(&contents))
}
