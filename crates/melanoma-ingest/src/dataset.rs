//! In-memory patient dataset.

use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::debug;

use melanoma_common::any_to_string_non_empty;

use crate::error::{IngestError, Result};

/// A loaded patient table plus its identity.
///
/// `name` qualifies variable unique ids (`<name>.<id>`); anonymous datasets
/// leave ids unqualified.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: Option<String>,
    frame: DataFrame,
    patient_id: Option<String>,
}

impl Dataset {
    pub fn new(frame: DataFrame) -> Self {
        Self {
            name: None,
            frame,
            patient_id: None,
        }
    }

    pub fn named(name: impl Into<String>, frame: DataFrame) -> Self {
        Self::new(frame).with_name(Some(name.into()))
    }

    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = name.filter(|name| !name.trim().is_empty());
        self
    }

    #[must_use]
    pub fn with_patient_id(mut self, column: impl Into<String>) -> Self {
        self.patient_id = Some(column.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Name of the patient identifier column, if configured.
    pub fn patient_id_column(&self) -> Option<&str> {
        self.patient_id.as_deref()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.width()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.column(name).is_ok()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.frame.column(name).ok()
    }

    /// Keep the rows where `mask` is true. Name and patient id column carry over.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Dataset> {
        if mask.len() != self.height() {
            return Err(IngestError::DataFrame {
                message: format!(
                    "row mask has {} entries, dataset has {} rows",
                    mask.len(),
                    self.height()
                ),
            });
        }
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        let frame = self.frame.filter(&mask)?;
        Ok(Self {
            name: self.name.clone(),
            frame,
            patient_id: self.patient_id.clone(),
        })
    }

    /// Write `columns` to `path` as CSV with a header row, every column when
    /// `columns` is empty. Returns the number of rows written.
    pub fn write_csv(&self, path: &Path, columns: &[&str]) -> Result<usize> {
        let mut frame = if columns.is_empty() {
            self.frame.clone()
        } else {
            self.frame.select(columns.iter().copied())?
        };
        let mut file = File::create(path).map_err(|source| IngestError::FileWrite {
            path: path.to_path_buf(),
            source,
        })?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .finish(&mut frame)?;
        debug!(
            path = %path.display(),
            rows = frame.height(),
            columns = frame.width(),
            "Wrote CSV export"
        );
        Ok(frame.height())
    }

    /// Patient identifiers in row order. Rows with a missing id are skipped.
    pub fn patient_ids(&self) -> Vec<String> {
        let Some(column) = self.patient_id.as_deref().and_then(|name| self.column(name)) else {
            return Vec::new();
        };
        (0..column.len())
            .filter_map(|idx| column.get(idx).ok().and_then(any_to_string_non_empty))
            .collect()
    }
}
