// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Record source: loads and validates the input JSON
//!
//! ```json
//! {"servers": [{"id": 1, "location": "A", "uptime": 10, "load": 40.0}]}
//! ```
//!
//! Any failure here aborts the run before a stage is spawned.

use crate::error::{PipelineError, PipelineResult};
use crate::record::{Record, RecordFile};
use ahash::AHashSet;
use std::path::Path;
use tracing::{debug, info};

/// Load records from a JSON file, keeping file order
pub fn load_records(path: &Path) -> PipelineResult<Vec<Record>> {
    let text = std::fs::read_to_string(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = parse_records(&text)?;
    info!(
        "[PIPELINE] Loaded {} records from {}",
        records.len(),
        path.display()
    );
    Ok(records)
}

/// Parse and validate records from JSON text
pub fn parse_records(text: &str) -> PipelineResult<Vec<Record>> {
    let file: RecordFile = serde_json::from_str(text)?;

    if file.servers.is_empty() {
        return Err(PipelineError::Empty);
    }

    let mut seen = AHashSet::with_capacity(file.servers.len());
    for (index, record) in file.servers.iter().enumerate() {
        if record.uptime < 0 {
            return Err(PipelineError::InvalidRecord {
                index,
                reason: format!("negative uptime {}", record.uptime),
            });
        }
        if !record.load.is_finite() {
            return Err(PipelineError::InvalidRecord {
                index,
                reason: format!("non-finite load {}", record.load),
            });
        }
        if !seen.insert(record.id) {
            return Err(PipelineError::DuplicateId(record.id));
        }
    }

    debug!("[PIPELINE] {} records passed validation", file.servers.len());
    Ok(file.servers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_keeps_order() {
        let records = parse_records(
            r#"{"servers": [
                {"id": 3, "location": "C", "uptime": 20, "load": 60.0},
                {"id": 1, "location": "A", "uptime": 10, "load": 40.0}
            ]}"#,
        )
        .unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0], Record::new(3, "C", 20, 60.0));
        assert_eq!(records[1].id, 1);
    }

    #[test]
    fn test_empty_input_is_rejected() {
        assert!(matches!(
            parse_records(r#"{"servers": []}"#),
            Err(PipelineError::Empty)
        ));
    }

    #[test]
    fn test_duplicate_id_is_rejected() {
        let result = parse_records(
            r#"{"servers": [
                {"id": 1, "location": "A", "uptime": 10, "load": 40.0},
                {"id": 1, "location": "B", "uptime": 5, "load": 90.0}
            ]}"#,
        );
        assert!(matches!(result, Err(PipelineError::DuplicateId(1))));
    }

    #[test]
    fn test_negative_uptime_is_rejected() {
        let result =
            parse_records(r#"{"servers": [{"id": 1, "location": "A", "uptime": -1, "load": 1.0}]}"#);
        assert!(matches!(
            result,
            Err(PipelineError::InvalidRecord { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_field_is_json_error() {
        let result = parse_records(r#"{"servers": [{"id": 1, "location": "A", "load": 1.0}]}"#);
        assert!(matches!(result, Err(PipelineError::Json(_))));

        assert!(matches!(parse_records("not json"), Err(PipelineError::Json(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"servers": [{{"id": 9, "location": "Kaunas", "uptime": 100, "load": 12.5}}]}}"#
        )
        .unwrap();

        let records = load_records(file.path()).unwrap();
        assert_eq!(records, vec![Record::new(9, "Kaunas", 100, 12.5)]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_records(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }
}
