//! Turns an uploaded knowledge file into canonical JSON text.
//!
//! A file is either one JSON document or, failing that, JSON Lines: one
//! document per line. JSON Lines is only tried when a complete document
//! parses and more content follows it; any other syntax error is reported
//! as-is.

use crate::error::IngestionError;
use crate::models::KnowledgeText;
use crate::services::normalizer::normalize;
use log::{debug, info};
use serde::Deserialize;
use serde_json::Value;

/// How the leading document of the text parsed.
enum LeadingDocument {
    /// One value and nothing but whitespace after it.
    Complete(Value),
    /// A whole value followed by more non-whitespace content.
    TrailingContent,
    Malformed(String),
}

/// Normalizes and parses raw upload text. A leading UTF-8 byte order mark
/// is dropped first.
pub fn ingest(raw: &str) -> Result<KnowledgeText, IngestionError> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    parse(&normalize(raw))
}

/// Parses already-normalized text into canonical pretty JSON.
pub fn parse(normalized: &str) -> Result<KnowledgeText, IngestionError> {
    if normalized.trim().is_empty() {
        return Err(IngestionError::Empty);
    }

    match parse_leading_document(normalized) {
        LeadingDocument::Complete(value) => {
            debug!("Knowledge file parsed as a single JSON document");
            to_canonical(&value)
        }
        LeadingDocument::TrailingContent => {
            debug!("Content after the first JSON value, trying JSON Lines");
            parse_json_lines(normalized)
        }
        LeadingDocument::Malformed(detail) => Err(IngestionError::MalformedDocument { detail }),
    }
}

fn parse_leading_document(text: &str) -> LeadingDocument {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    match Value::deserialize(&mut deserializer) {
        Ok(value) => match deserializer.end() {
            Ok(()) => LeadingDocument::Complete(value),
            Err(_) => LeadingDocument::TrailingContent,
        },
        Err(err) => LeadingDocument::Malformed(err.to_string()),
    }
}

/// Line numbers in errors count records, so blank lines do not shift them.
fn parse_json_lines(text: &str) -> Result<KnowledgeText, IngestionError> {
    let mut records = Vec::new();

    let lines = text.split('\n').filter(|line| !line.trim().is_empty());
    for (index, line) in lines.enumerate() {
        let value = serde_json::from_str::<Value>(line).map_err(|err| {
            IngestionError::MalformedLine {
                line: index + 1,
                detail: err.to_string(),
            }
        })?;
        records.push(value);
    }

    if records.is_empty() {
        return Err(IngestionError::Empty);
    }

    info!("Knowledge file parsed as JSON Lines ({} records)", records.len());
    to_canonical(&Value::Array(records))
}

fn to_canonical(value: &Value) -> Result<KnowledgeText, IngestionError> {
    serde_json::to_string_pretty(value)
        .map(KnowledgeText::from_canonical)
        .map_err(|err| IngestionError::MalformedDocument {
            detail: err.to_string(),
        })
}
