//! Record file loading.
//!
//! The only module of this crate that touches the filesystem. Everything it
//! returns is fed unchanged into the pure builders.

use std::path::Path;

use finplan_core::error::{FinplanError, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::pipeline::SeriesInputs;

/// Keys under which a record array may be wrapped (`{"Items": [...]}`).
pub const WRAPPER_KEYS: &[&str] = &["Items", "items", "data"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Load the records of one file.
///
/// Accepted layouts:
/// * a JSON array of records;
/// * an object wrapping that array under one of [`WRAPPER_KEYS`];
/// * JSON Lines, one record per line (malformed lines are skipped).
///
/// Elements that are not objects are dropped. An empty file yields no
/// records.
pub fn load_records(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path).map_err(|source| FinplanError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;
    if content.trim().is_empty() {
        debug!("{} is empty", path.display());
        return Ok(Vec::new());
    }

    let raw = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Array(items)) => items,
        Ok(Value::Object(mut map)) => {
            let wrapper = WRAPPER_KEYS
                .iter()
                .find(|key| map.get(**key).is_some_and(Value::is_array));
            match wrapper.and_then(|key| map.remove(*key)) {
                Some(Value::Array(items)) => items,
                _ => vec![Value::Object(map)],
            }
        }
        Ok(_) => return Err(FinplanError::RecordLayout(path.to_path_buf())),
        Err(_) => parse_json_lines(path, &content)?,
    };

    let total = raw.len();
    let records: Vec<Value> = raw.into_iter().filter(Value::is_object).collect();
    if records.len() < total {
        warn!(
            "{}: dropped {} non-object elements",
            path.display(),
            total - records.len()
        );
    }
    debug!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Fall back to one JSON document per line. Fails with the first parse error
/// when no line parses at all.
fn parse_json_lines(path: &Path, content: &str) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    let mut first_error = None;

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<Value>(trimmed) {
            Ok(v) => values.push(v),
            Err(e) => {
                debug!("Failed to parse JSON line in {}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    match (values.is_empty(), first_error) {
        (true, Some(e)) => Err(e.into()),
        _ => Ok(values),
    }
}

// ── RecordSet ─────────────────────────────────────────────────────────────────

/// The four record arrays, owned.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub realized: Vec<Value>,
    pub allocations: Vec<Value>,
    pub adjustments: Vec<Value>,
    pub baseline: Vec<Value>,
}

impl RecordSet {
    /// Load each array from its file; a missing path means an empty array.
    pub fn load(
        realized: Option<&Path>,
        allocations: Option<&Path>,
        adjustments: Option<&Path>,
        baseline: Option<&Path>,
    ) -> Result<Self> {
        Ok(Self {
            realized: load_optional(realized)?,
            allocations: load_optional(allocations)?,
            adjustments: load_optional(adjustments)?,
            baseline: load_optional(baseline)?,
        })
    }

    /// Borrow the arrays as pipeline inputs.
    pub fn inputs(&self) -> SeriesInputs<'_> {
        SeriesInputs {
            realized: &self.realized,
            allocations: &self.allocations,
            adjustments: &self.adjustments,
            baseline: &self.baseline,
        }
    }
}

fn load_optional(path: Option<&Path>) -> Result<Vec<Value>> {
    path.map(load_records).transpose().map(Option::unwrap_or_default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    #[test]
    fn test_load_json_array() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "a.json", r#"[{"month": "2025-01"}, {"month": "2025-02"}]"#);
        assert_eq!(load_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_load_wrapped_items() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "scan.json",
            r#"{"Count": 1, "Items": [{"pk": "PROJECT#A"}]}"#,
        );
        let records = load_records(&path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["pk"], "PROJECT#A");
    }

    #[test]
    fn test_load_json_lines_skips_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            dir.path(),
            "r.jsonl",
            "{\"month\": \"2025-01\"}\n{not valid json{{\n\n{\"month\": \"2025-02\"}\n",
        );
        assert_eq!(load_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_non_objects_are_dropped() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "a.json", r#"[{"a": 1}, 3, "x", null, {"b": 2}]"#);
        assert_eq!(load_records(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_empty_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "empty.json", "  \n");
        assert!(load_records(&path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = load_records(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, FinplanError::FileRead { .. }));
    }

    #[test]
    fn test_scalar_document_is_a_layout_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "n.json", "42");
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, FinplanError::RecordLayout(_)));
    }

    #[test]
    fn test_garbage_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "g.json", "not json at all");
        let err = load_records(&path).unwrap_err();
        assert!(matches!(err, FinplanError::JsonParse(_)));
    }

    #[test]
    fn test_record_set_missing_paths_are_empty() {
        let dir = TempDir::new().unwrap();
        let realized = write_file(dir.path(), "r.json", r#"[{"month": "2025-01", "amount": 1}]"#);
        let set = RecordSet::load(Some(&realized), None, None, None).unwrap();
        let inputs = set.inputs();
        assert_eq!(inputs.realized.len(), 1);
        assert!(inputs.allocations.is_empty());
        assert!(inputs.adjustments.is_empty());
        assert!(inputs.baseline.is_empty());
    }
}
