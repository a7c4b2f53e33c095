//! Loading the reference tables from CSV fixtures.

use linegate_reference::{LoadError, ReferenceIndex, DEFAULT_COMPLIANCE, DEVICE_KEY_COLUMN};
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

const DEVICES_CSV: &str = "\
Device ID,Batch Id,Factory Id,Factory Location,Shift,Machine1,Machine1 Time
DEV001,B1,F7,Pune,Night,CNC-4,08:15
  DEV002  ,B2,F7,Pune,Day,,
,B9,F7,Pune,Day,,
DEV003,B1,F8,,,,
";

const BATCHES_CSV: &str = "\
Batch Id,Alcohol Content,Microbial Efficacy,RoHS,Quality Manager,EXPIRY DATE
B1,70%,99.9%,Safe,Asha,2027-01-01
B2,70%,,Not Safe,Asha,
B3,60%,,  ,Ravi,
";

fn write_fixture(name: &str, contents: &str, dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_load_builds_joined_index() {
    let dir = tempdir().unwrap();
    let devices = write_fixture("devices.csv", DEVICES_CSV, &dir);
    let batches = write_fixture("batches.csv", BATCHES_CSV, &dir);

    let index = ReferenceIndex::load(&devices, &batches).unwrap();

    // The empty-key device row is excluded.
    assert_eq!(index.device_count(), 3);
    assert_eq!(index.batch_count(), 3);

    // Keys are trimmed on load; queries are trimmed too.
    let dev2 = index.lookup("DEV002").unwrap();
    assert_eq!(dev2.batch_id.as_deref(), Some("B2"));
    assert!(index.lookup(" DEV001 ").is_some());

    // Empty cells load as missing, not as empty strings.
    let dev3 = index.lookup("DEV003").unwrap();
    assert_eq!(dev3.factory_location, None);
    assert_eq!(dev3.machine1, None);

    assert_eq!(index.compliance_of("B1"), "Safe");
    assert_eq!(index.compliance_of("B2"), "Not Safe");
    // Whitespace-only RoHS falls back to the fail-closed default.
    assert_eq!(index.compliance_of("B3"), DEFAULT_COMPLIANCE);
}

#[test]
fn test_missing_file_is_fatal() {
    let dir = tempdir().unwrap();
    let batches = write_fixture("batches.csv", BATCHES_CSV, &dir);

    let err = ReferenceIndex::load(&dir.path().join("nope.csv"), &batches).unwrap_err();
    assert!(matches!(err, LoadError::Open { .. }));
}

#[test]
fn test_missing_key_column_is_fatal() {
    let dir = tempdir().unwrap();
    let devices = write_fixture("devices.csv", "Serial,Batch Id\nX1,B1\n", &dir);
    let batches = write_fixture("batches.csv", BATCHES_CSV, &dir);

    let err = ReferenceIndex::load(&devices, &batches).unwrap_err();
    match err {
        LoadError::MissingColumn { column, .. } => assert_eq!(column, DEVICE_KEY_COLUMN),
        other => panic!("expected MissingColumn, got: {other}"),
    }
}

#[test]
fn test_short_rows_load_with_missing_fields() {
    let dir = tempdir().unwrap();
    let devices = write_fixture("devices.csv", "Device ID,Batch Id,Shift\nDEV010\n", &dir);
    let batches = write_fixture("batches.csv", BATCHES_CSV, &dir);

    let index = ReferenceIndex::load(&devices, &batches).unwrap();
    let device = index.lookup("DEV010").unwrap();
    assert_eq!(device.batch_id, None);
    assert_eq!(device.shift, None);
}
