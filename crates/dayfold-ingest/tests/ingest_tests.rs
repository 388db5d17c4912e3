use std::fs;

use dayfold_core::{DEFAULT_UNCLASSIFIED_KEY, GroupingConfig, ObjectTree};
use dayfold_ingest::{IngestError, RecordFormat, WarningKind, load_records, parse_records};
use tempfile::TempDir;

#[test]
fn test_load_json_array_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("uploads.json");
    fs::write(
        &path,
        r#"[{"object_key": "a.jpg", "size_bytes": 1024, "taken_at_sec": 1693310400},
            {"object_key": "b.jpg", "size_bytes": 2048}]"#,
    )
    .unwrap();

    let report = load_records(&path, &GroupingConfig::default()).unwrap();
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[1].object_key, "b.jpg");
    assert!(report.records[1].taken_at_sec.is_none());
}

#[test]
fn test_load_json_lines_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("uploads.jsonl");
    fs::write(
        &path,
        "{\"object_key\": \"a.jpg\", \"size_bytes\": 1, \"taken_at_sec\": 0}\n\
         {\"object_key\": \"a.jpg\", \"size_bytes\": 2}\n",
    )
    .unwrap();

    let report = load_records(&path, &GroupingConfig::default()).unwrap();
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::DuplicateKey);
    assert_eq!(report.warnings[0].index, 1);
}

#[test]
fn test_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let err = load_records(temp_dir.path().join("absent.json"), &GroupingConfig::default()).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
}

#[test]
fn test_negative_size_is_malformed() {
    let err = parse_records(
        r#"[{"object_key": "a.jpg", "size_bytes": -1}]"#,
        RecordFormat::Json,
        &GroupingConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, IngestError::Malformed(_)));
}

#[test]
fn test_empty_inputs() {
    let config = GroupingConfig::default();
    assert!(parse_records("[]", RecordFormat::Json, &config).unwrap().records.is_empty());
    assert!(parse_records("\n\n", RecordFormat::JsonLines, &config).unwrap().records.is_empty());
}

#[test]
fn test_offset_out_of_range_warns_and_stays_undated() {
    let last = chrono::DateTime::<chrono::Utc>::MAX_UTC.timestamp();
    let content = format!(r#"[{{"object_key": "edge.jpg", "size_bytes": 1, "taken_at_sec": {last}}}]"#);
    let config = GroupingConfig::builder()
        .utc_offset_secs(86_399)
        .build()
        .unwrap();

    let report = parse_records(&content, RecordFormat::Json, &config).unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::InvalidTimestamp);

    let tree = ObjectTree::from_records(&report.records, &config);
    assert!(tree.find(&[DEFAULT_UNCLASSIFIED_KEY, "edge.jpg"]).is_some());
    assert_eq!(tree.root.child_count(), 1);
}
