//! The session's patient database.
//!
//! [`PatientDatabase`] owns the current [`Dataset`] as an `Arc` behind a
//! `RwLock`. Readers take a [`snapshot`](PatientDatabase::snapshot) and keep it
//! for the whole computation; [`reload`](PatientDatabase::reload) parses the
//! source into a fresh dataset first and only then swaps the `Arc`, so a failed
//! reload leaves the previous dataset in place.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::SystemTime;

use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};

use crate::dataset::Dataset;
use crate::error::{IngestError, Result};
use crate::reader::{check_file_size, read_csv_frame};

/// Where the patient table comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSource {
    /// CSV file path.
    pub path: PathBuf,
    /// Dataset name. Defaults to the file stem.
    #[serde(default)]
    pub name: Option<String>,
    /// Patient identifier column.
    #[serde(default)]
    pub patient_id: Option<String>,
}

impl DatabaseSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
            patient_id: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_patient_id(mut self, column: impl Into<String>) -> Self {
        self.patient_id = Some(column.into());
        self
    }

    /// Configured name, else the file stem.
    pub fn dataset_name(&self) -> Option<String> {
        self.name.clone().or_else(|| {
            self.path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
    }

    /// Read the source into a new dataset.
    pub fn load(&self) -> Result<(Dataset, FileInfo)> {
        let size_bytes = check_file_size(&self.path)?;
        let frame = read_csv_frame(&self.path)?;

        if let Some(column) = &self.patient_id
            && frame.column(column).is_err()
        {
            return Err(IngestError::MissingPatientId {
                column: column.clone(),
                path: self.path.clone(),
            });
        }

        let modified = std::fs::metadata(&self.path)
            .and_then(|metadata| metadata.modified())
            .ok();
        let info = FileInfo {
            path: self.path.clone(),
            size_bytes,
            modified,
            rows: frame.height(),
            columns: frame.width(),
        };

        let mut dataset = Dataset::new(frame).with_name(self.dataset_name());
        if let Some(column) = &self.patient_id {
            dataset = dataset.with_patient_id(column.clone());
        }
        Ok((dataset, info))
    }
}

/// Facts about the loaded source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    #[serde(skip)]
    pub modified: Option<SystemTime>,
    pub rows: usize,
    pub columns: usize,
}

impl FileInfo {
    /// Info for a dataset that was not read from disk.
    pub fn in_memory(frame: &DataFrame) -> Self {
        Self {
            path: PathBuf::new(),
            size_bytes: 0,
            modified: None,
            rows: frame.height(),
            columns: frame.width(),
        }
    }
}

/// A per-row predicate over a dataset.
///
/// Implementors return one flag per row; rows flagged `false` are dropped by
/// [`PatientDatabase::filter`].
pub trait RowFilter {
    fn mask(&self, dataset: &Dataset) -> melanoma_model::Result<Vec<bool>>;
}

/// A filtered dataset, sharing the schema and name of its source.
#[derive(Debug, Clone)]
pub struct DatabaseView {
    dataset: Dataset,
}

impl DatabaseView {
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn height(&self) -> usize {
        self.dataset.height()
    }

    pub fn patient_ids(&self) -> Vec<String> {
        self.dataset.patient_ids()
    }

    pub fn into_dataset(self) -> Dataset {
        self.dataset
    }
}

/// Apply every filter to `dataset` and keep the rows all of them accept.
pub fn filter_dataset(
    dataset: &Dataset,
    filters: &[&dyn RowFilter],
) -> melanoma_model::Result<DatabaseView> {
    let mut keep = vec![true; dataset.height()];
    for filter in filters {
        let mask = filter.mask(dataset)?;
        for (kept, accepted) in keep.iter_mut().zip(mask) {
            *kept &= accepted;
        }
    }
    let dataset = dataset
        .filter_rows(&keep)
        .map_err(|e| melanoma_model::Error::Data {
            id: dataset.name().unwrap_or("dataset").to_string(),
            message: e.to_string(),
        })?;
    Ok(DatabaseView { dataset })
}

#[derive(Debug)]
struct Loaded {
    dataset: Arc<Dataset>,
    info: FileInfo,
}

/// Session handle on the patient table.
#[derive(Debug)]
pub struct PatientDatabase {
    source: Option<DatabaseSource>,
    current: RwLock<Loaded>,
}

impl PatientDatabase {
    /// Load `source` for the first time.
    pub fn open(source: DatabaseSource) -> Result<Self> {
        let span = info_span!("database_open", path = %source.path.display());
        let _guard = span.enter();

        let (dataset, info) = source.load()?;
        info!(
            rows = info.rows,
            columns = info.columns,
            name = dataset.name().unwrap_or("<unnamed>"),
            "Loaded patient database"
        );
        Ok(Self {
            source: Some(source),
            current: RwLock::new(Loaded {
                dataset: Arc::new(dataset),
                info,
            }),
        })
    }

    /// Wrap an already built dataset. Such a database cannot be reloaded.
    pub fn from_dataset(dataset: Dataset) -> Self {
        let info = FileInfo::in_memory(dataset.frame());
        Self {
            source: None,
            current: RwLock::new(Loaded {
                dataset: Arc::new(dataset),
                info,
            }),
        }
    }

    pub fn source(&self) -> Option<&DatabaseSource> {
        self.source.as_ref()
    }

    /// The current dataset. The returned `Arc` stays valid across reloads.
    pub fn snapshot(&self) -> Arc<Dataset> {
        let loaded = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&loaded.dataset)
    }

    /// The current dataframe, as a snapshot.
    pub fn dataframe(&self) -> DataFrame {
        self.snapshot().frame().clone()
    }

    pub fn file_info(&self) -> FileInfo {
        let loaded = self.current.read().unwrap_or_else(PoisonError::into_inner);
        loaded.info.clone()
    }

    /// Re-read the source and replace the current dataset.
    ///
    /// The write lock is only taken once the new dataset is fully built.
    pub fn reload(&self) -> Result<Arc<Dataset>> {
        let Some(source) = &self.source else {
            return Ok(self.snapshot());
        };
        let span = info_span!("database_reload", path = %source.path.display());
        let _guard = span.enter();

        let (dataset, info) = source.load()?;
        let dataset = Arc::new(dataset);
        info!(rows = info.rows, columns = info.columns, "Reloaded patient database");

        let mut loaded = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *loaded = Loaded {
            dataset: Arc::clone(&dataset),
            info,
        };
        Ok(dataset)
    }

    /// Filter the current snapshot.
    pub fn filter(&self, filters: &[&dyn RowFilter]) -> melanoma_model::Result<DatabaseView> {
        filter_dataset(&self.snapshot(), filters)
    }

    /// Path of the loaded file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.source.as_ref().map(|source| source.path.as_path())
    }
}
