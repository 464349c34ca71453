//! Single-resource commands outside the backup/restore flow: list or read
//! items, create, change and delete them from JSON files, and write starter
//! templates for those files.
//!
//! Every function returns the text the binary prints, so output can be
//! checked without a terminal.

use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

use crate::error::{BackupError, Result};
use crate::tracker::render_table;

pub mod change;
pub mod get;
pub mod templates;

/// How listed items are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Renders `items` as a table with `headers`, or as pretty JSON.
pub(crate) fn render_items<T: Serialize>(
    items: &[T],
    format: OutputFormat,
    headers: &[&str],
    row: impl Fn(&T) -> Vec<String>,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(items)?),
        OutputFormat::Table => {
            let rows: Vec<Vec<String>> = items.iter().map(row).collect();
            Ok(render_table(headers, &rows))
        }
    }
}

/// Reads a JSON document from `path`.
pub fn read_document(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| BackupError::io(path, e))?;
    let document: Value = serde_json::from_str(&text)?;
    if !document.is_object() {
        return Err(BackupError::InvalidInput(format!(
            "'{}' must hold a JSON object",
            path.display()
        )));
    }
    Ok(document)
}

/// The object under `key` in `{"<key>": {..}}`. A bare object without the
/// wrapper is taken as the entity itself.
pub(crate) fn entity(document: Value, key: &str) -> Value {
    match document {
        Value::Object(mut map) if map.get(key).is_some_and(Value::is_object) => {
            map.remove(key).unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Numeric `id` of an entity read from a file, required for updates.
pub(crate) fn required_id(entity: &Value, what: &str) -> Result<i64> {
    entity
        .get("id")
        .and_then(|id| id.as_i64().or_else(|| id.as_str().and_then(|s| s.parse().ok())))
        .ok_or_else(|| BackupError::InvalidInput(format!("the {what} file has no id")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_entity_unwraps_or_passes_through() {
        assert_eq!(entity(json!({"policy": {"name": "P"}}), "policy"), json!({"name": "P"}));
        assert_eq!(entity(json!({"name": "P"}), "policy"), json!({"name": "P"}));
        // A scalar under the key is not a wrapper.
        assert_eq!(entity(json!({"policy": 3}), "policy"), json!({"policy": 3}));
    }

    #[test]
    fn test_required_id_accepts_text_ids() {
        assert_eq!(required_id(&json!({"id": 12}), "policy").unwrap(), 12);
        assert_eq!(required_id(&json!({"id": "12"}), "policy").unwrap(), 12);
        assert!(matches!(
            required_id(&json!({"name": "x"}), "policy"),
            Err(BackupError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_read_document_rejects_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("policy.json");
        fs::write(&file, "[]").unwrap();
        assert!(matches!(read_document(&file), Err(BackupError::InvalidInput(_))));
    }
}
