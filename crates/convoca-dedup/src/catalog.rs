use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::warn;

use crate::error::{DedupError, Result};
use crate::models::ProgramRecord;

/// Key under which the catalogue file stores its program list.
const PROGRAM_LIST_KEY: &str = "programas";

/// Parse catalogue JSON: either a bare array of records or an object holding
/// the array under `programas`. Entries that are not valid records are
/// skipped with a warning.
pub fn parse_catalog(json: &str) -> Result<Vec<ProgramRecord>> {
    let value: Value = serde_json::from_str(json)?;
    let entries = match value {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove(PROGRAM_LIST_KEY) {
            Some(Value::Array(entries)) => entries,
            _ => {
                return Err(DedupError::MissingProgramList(format!(
                    "expected an array under \"{PROGRAM_LIST_KEY}\""
                )));
            }
        },
        _ => {
            return Err(DedupError::MissingProgramList(
                "expected a JSON array or object".to_string(),
            ));
        }
    };

    let mut records = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match serde_json::from_value::<ProgramRecord>(entry) {
            Ok(record) => records.push(record),
            Err(e) => warn!(index = idx, error = %e, "skipping invalid catalogue entry"),
        }
    }
    Ok(records)
}

/// Load every program record from a catalogue file.
pub fn load_catalog(path: &Path) -> Result<Vec<ProgramRecord>> {
    let contents = fs::read_to_string(path)?;
    parse_catalog(&contents)
}

/// Load a single record (the freshly extracted one) from a JSON file.
pub fn load_record(path: &Path) -> Result<ProgramRecord> {
    let contents = fs::read_to_string(path)?;
    let record: ProgramRecord = serde_json::from_str(&contents)?;
    Ok(record)
}
