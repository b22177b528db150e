//! Per-patient time series over iterated measurements.
//!
//! Pairs an iterated time reference (`TIEMPO IT{N}`) with an iterated value
//! variable (`LDH IT{N}`) index by index. The resulting points are what a
//! chart renderer plots, one line per patient.

use serde::Serialize;
use tracing::debug;

use melanoma_ingest::Dataset;
use melanoma_model::{LookupError, Result, VariableKind};

use crate::values;
use crate::variable::Variable;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KineticsPoint {
    pub index: u32,
    pub time: f64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientKinetics {
    pub patient_id: String,
    /// Ascending by iteration index.
    pub points: Vec<KineticsPoint>,
}

fn require_scalar_iterations(variable: &Variable) -> std::result::Result<(), LookupError> {
    if variable.iteration_kind() == Some(VariableKind::Scalar) {
        Ok(())
    } else {
        Err(LookupError::WrongKind {
            id: variable.id().to_string(),
            expected: "iterated scalar".to_string(),
            found: variable.kind().to_string(),
        })
    }
}

/// Build the series of every patient in `dataset`, or only of `patients`.
///
/// Points exist for the indices where both variables have a value. Rows are
/// identified by the dataset's patient id column, else by row number.
pub fn patient_kinetics(
    dataset: &Dataset,
    time: &Variable,
    value: &Variable,
    patients: Option<&[String]>,
) -> Result<Vec<PatientKinetics>> {
    require_scalar_iterations(time)?;
    require_scalar_iterations(value)?;
    time.ensure_bound()?;
    value.ensure_bound()?;

    let mut columns = Vec::new();
    for it in time.iterations() {
        if let Some(measurement) = value.iteration(it.index) {
            let times = values::numeric_values(it.variable.get_series(dataset)?);
            let measured = values::numeric_values(measurement.get_series(dataset)?);
            columns.push((it.index, times, measured));
        }
    }
    debug!(
        time = time.id(),
        value = value.id(),
        shared_iterations = columns.len(),
        "Pairing kinetics iterations"
    );

    let ids = row_ids(dataset);
    let mut series = Vec::new();
    for (row, patient_id) in ids.into_iter().enumerate() {
        if let Some(selected) = patients
            && !selected.contains(&patient_id)
        {
            continue;
        }
        let points = columns
            .iter()
            .filter_map(|(index, times, measured)| {
                let time = times.get(row).copied().flatten()?;
                let value = measured.get(row).copied().flatten()?;
                Some(KineticsPoint {
                    index: *index,
                    time,
                    value,
                })
            })
            .collect();
        series.push(PatientKinetics { patient_id, points });
    }
    Ok(series)
}

fn row_ids(dataset: &Dataset) -> Vec<String> {
    let column = dataset
        .patient_id_column()
        .and_then(|name| dataset.column(name));
    match column {
        Some(column) => values::text_values(column)
            .into_iter()
            .enumerate()
            .map(|(row, id)| id.unwrap_or_else(|| format!("row {row}")))
            .collect(),
        None => (0..dataset.height()).map(|row| format!("row {row}")).collect(),
    }
}
