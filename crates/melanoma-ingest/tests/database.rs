//! Tests for loading and reloading the patient database.

use std::fs;
use std::sync::Arc;

use melanoma_ingest::{DatabaseSource, IngestError, PatientDatabase};

const COHORT: &str = "NUMERO,BOR,EDAD\nP1,CR,54\nP2,PR,61\nP3,PR,47\n";

#[test]
fn open_names_dataset_after_file_stem() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("melanoma.csv");
    fs::write(&path, COHORT).unwrap();

    let database =
        PatientDatabase::open(DatabaseSource::new(&path).with_patient_id("NUMERO")).unwrap();
    let dataset = database.snapshot();

    assert_eq!(dataset.name(), Some("melanoma"));
    assert_eq!(dataset.height(), 3);
    assert_eq!(dataset.patient_ids(), vec!["P1", "P2", "P3"]);

    let info = database.file_info();
    assert_eq!(info.rows, 3);
    assert_eq!(info.columns, 3);
    assert_eq!(info.size_bytes, COHORT.len() as u64);
    assert!(info.modified.is_some());
}

#[test]
fn configured_name_wins() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("export-2024.csv");
    fs::write(&path, COHORT).unwrap();

    let database = PatientDatabase::open(DatabaseSource::new(&path).with_name("cohort")).unwrap();
    assert_eq!(database.snapshot().name(), Some("cohort"));
}

#[test]
fn missing_patient_id_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("melanoma.csv");
    fs::write(&path, COHORT).unwrap();

    let result = PatientDatabase::open(DatabaseSource::new(&path).with_patient_id("ID"));
    assert!(matches!(
        result,
        Err(IngestError::MissingPatientId { ref column, .. }) if column == "ID"
    ));
}

#[test]
fn missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = PatientDatabase::open(DatabaseSource::new(dir.path().join("absent.csv")));
    assert!(matches!(result, Err(IngestError::FileNotFound { .. })));
}

#[test]
fn reload_swaps_dataset_and_keeps_old_snapshots() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("melanoma.csv");
    fs::write(&path, COHORT).unwrap();

    let database = PatientDatabase::open(DatabaseSource::new(&path)).unwrap();
    let before = database.snapshot();

    fs::write(&path, "NUMERO,BOR,EDAD\nP1,CR,54\n").unwrap();
    let after = database.reload().unwrap();

    assert_eq!(before.height(), 3);
    assert_eq!(after.height(), 1);
    assert!(Arc::ptr_eq(&after, &database.snapshot()));
    assert_eq!(database.file_info().rows, 1);
    assert_eq!(database.dataframe().height(), 1);
}

#[test]
fn failed_reload_keeps_previous_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("melanoma.csv");
    fs::write(&path, COHORT).unwrap();

    let database = PatientDatabase::open(DatabaseSource::new(&path)).unwrap();
    fs::write(&path, "NUMERO,BOR,EDAD\n").unwrap();

    let result = database.reload();
    assert!(matches!(result, Err(IngestError::EmptyDataFrame { .. })));
    assert_eq!(database.snapshot().height(), 3);
}
