//! Append-only store of saved snapshots.

use crate::statics;
use crate::value::format_cell;
use chrono::{SecondsFormat, Utc};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoding save records: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One saved snapshot: the raw document plus the rows selected for saving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveRecord {
    /// Millisecond timestamp at save time.
    pub id: i64,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    #[serde(default)]
    pub raw: Value,
    #[serde(default)]
    pub rows: Vec<Value>,
}

/// Tabular preview of a record's first rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowPreview {
    pub columns: Vec<String>,
    pub cells: Vec<Vec<String>>,
}

impl SaveRecord {
    pub fn new(raw: Value, rows: Vec<Value>) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis(),
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            raw,
            rows,
        }
    }

    /// Object rows among the first `limit` rows. Summary columns that occur come first in
    /// summary order, then any other keys sorted.
    pub fn preview(&self, limit: usize) -> RowPreview {
        let rows: Vec<_> = self
            .rows
            .iter()
            .take(limit)
            .filter_map(Value::as_object)
            .collect();

        let present: IndexSet<&str> = rows
            .iter()
            .flat_map(|row| row.keys().map(String::as_str))
            .collect();
        let mut extra: Vec<&str> = present
            .iter()
            .copied()
            .filter(|k| !statics::SUMMARY_COLUMNS.contains(k))
            .collect();
        extra.sort_unstable();

        let columns: Vec<String> = statics::SUMMARY_COLUMNS
            .into_iter()
            .filter(|c| present.contains(c))
            .chain(extra)
            .map(str::to_string)
            .collect();

        let cells = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|c| row.get(c).map(format_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        RowPreview { columns, cells }
    }
}

pub trait SaveStore {
    fn append(&self, raw: Value, rows: Vec<Value>) -> Result<SaveRecord, StoreError>;
    fn list(&self) -> Result<Vec<SaveRecord>, StoreError>;
}

/// Save records kept in one pretty-printed JSON array file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/saves.json`.
    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(statics::SAVES_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stored array, or empty when the file is missing or not an array.
    fn read_array(&self) -> Result<Vec<Value>, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) | Err(_) => {
                warn!(path = ?self.path, "save file is not a JSON array, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SaveStore for JsonFileStore {
    fn append(&self, raw: Value, rows: Vec<Value>) -> Result<SaveRecord, StoreError> {
        let mut items = self.read_array()?;
        let record = SaveRecord::new(raw, rows);
        items.push(serde_json::to_value(&record)?);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let text = serde_json::to_string_pretty(&items)?;
        fs::write(&self.path, text).map_err(|e| self.io_error(e))?;

        info!(
            id = record.id,
            rows = record.rows.len(),
            total = items.len(),
            "save record appended"
        );
        Ok(record)
    }

    fn list(&self) -> Result<Vec<SaveRecord>, StoreError> {
        let items = self.read_array()?;
        let mut out = Vec::with_capacity(items.len());
        for (i, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<SaveRecord>(item) {
                Ok(record) => out.push(record),
                Err(err) => warn!(index = i, error = %err, "skipping malformed save record"),
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(rows: Vec<Value>) -> SaveRecord {
        SaveRecord {
            id: 1,
            created_at: "2025-07-10T00:00:00.000Z".to_string(),
            raw: Value::Null,
            rows,
        }
    }

    #[test]
    fn preview_orders_summary_columns_first_then_sorted_extras() {
        let rec = record(vec![
            json!({"zeta": 1, "運賃": 500, "受注番号": "A"}),
            json!({"alpha": true, "ページ": 2}),
            json!("not a row"),
        ]);
        let preview = rec.preview(5);
        assert_eq!(
            preview.columns,
            vec!["ページ", "受注番号", "運賃", "alpha", "zeta"]
        );
        assert_eq!(
            preview.cells,
            vec![
                vec!["", "A", "500", "", "1"],
                vec!["2", "", "", "true", ""],
            ]
        );
    }

    #[test]
    fn preview_limits_rows() {
        let rows = (0..8).map(|i| json!({"受注番号": i})).collect();
        let preview = record(rows).preview(statics::PREVIEW_ROW_LIMIT);
        assert_eq!(preview.cells.len(), 5);
        assert_eq!(preview.cells[4], vec!["4"]);

        assert_eq!(record(Vec::new()).preview(5), RowPreview::default());
    }

    #[test]
    fn preview_limit_counts_non_object_rows() {
        let rows = vec![
            json!({"受注番号": "A"}),
            json!(null),
            json!("skip"),
            json!({"受注番号": "B"}),
            json!([1]),
            json!({"受注番号": "C"}),
        ];
        let preview = record(rows).preview(statics::PREVIEW_ROW_LIMIT);
        assert_eq!(preview.cells, vec![vec!["A"], vec!["B"]]);
    }

    #[test]
    fn new_record_timestamps() {
        let rec = SaveRecord::new(Value::Null, Vec::new());
        assert!(rec.id > 0);
        assert!(rec.created_at.ends_with('Z'));
        // e.g. 2025-07-10T01:02:03.456Z
        assert_eq!(rec.created_at.len(), 24);
    }

    #[test]
    fn record_serializes_with_created_at_key() {
        let v = serde_json::to_value(record(vec![json!({"受注番号": "A"})])).unwrap();
        assert_eq!(
            v,
            json!({
                "id": 1,
                "createdAt": "2025-07-10T00:00:00.000Z",
                "raw": null,
                "rows": [{"受注番号": "A"}],
            })
        );
    }
}
