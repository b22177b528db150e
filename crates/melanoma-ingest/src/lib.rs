//! Patient database ingestion.
//!
//! Loads the cohort CSV into a named [`Dataset`] and keeps it behind a
//! [`PatientDatabase`] that supports snapshots, wholesale reload and row
//! filtering.
//!
//! # Example
//!
//! ```ignore
//! use melanoma_ingest::{DatabaseSource, PatientDatabase};
//!
//! let source = DatabaseSource::new("data/melanoma.csv").with_patient_id("NUMERO");
//! let database = PatientDatabase::open(source)?;
//! let dataset = database.snapshot();
//! println!("{} patients", dataset.height());
//! ```

mod database;
mod dataset;
mod error;
mod reader;

// === Error Types ===
pub use error::{IngestError, Result};

// === Datasets ===
pub use database::{
    DatabaseSource, DatabaseView, FileInfo, PatientDatabase, RowFilter, filter_dataset,
};
pub use dataset::Dataset;

// === CSV Reading ===
pub use reader::{
    MAX_CSV_FILE_SIZE, SCHEMA_INFERENCE_ROWS, check_file_size, check_file_size_with_limit,
    read_csv_frame, validate_dataframe_shape,
};
