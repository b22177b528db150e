//! Row filters over the patient dataset.
//!
//! Both filters implement [`RowFilter`] so they can be combined in
//! [`PatientDatabase::filter`](melanoma_ingest::PatientDatabase::filter).

use std::collections::BTreeSet;

use melanoma_ingest::{Dataset, RowFilter};
use melanoma_model::{Error, LookupError, MISSING_LABEL, Result, VariableKind};

use crate::values;
use crate::variable::Variable;

const VALUE_TOLERANCE: f64 = 1e-9;

/// Keep rows whose display label is one of `selected`.
///
/// An empty selection keeps every row. Selecting [`MISSING_LABEL`] keeps rows
/// without a value.
#[derive(Debug, Clone)]
pub struct CategoricalFilter<'a> {
    variable: &'a Variable,
    selected: BTreeSet<String>,
}

impl<'a> CategoricalFilter<'a> {
    pub fn new<I, S>(variable: &'a Variable, selected: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !variable.kind().is_groupable() {
            return Err(LookupError::WrongKind {
                id: variable.id().to_string(),
                expected: "categorical or boolean".to_string(),
                found: variable.kind().to_string(),
            }
            .into());
        }
        Ok(Self {
            variable,
            selected: selected.into_iter().map(Into::into).collect(),
        })
    }

    pub fn variable(&self) -> &Variable {
        self.variable
    }

    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.selected.iter().map(String::as_str)
    }
}

impl RowFilter for CategoricalFilter<'_> {
    fn mask(&self, dataset: &Dataset) -> Result<Vec<bool>> {
        let labels = self.variable.group_labels(dataset)?;
        if self.selected.is_empty() {
            return Ok(vec![true; labels.len()]);
        }
        let keep_missing = self.selected.contains(MISSING_LABEL);
        Ok(labels
            .iter()
            .map(|label| match label {
                Some(label) => self.selected.contains(label),
                None => keep_missing,
            })
            .collect())
    }
}

/// How an iteration's reference value is matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationCriterion {
    /// At least one iteration with a value in `[low, high]`.
    Between { low: f64, high: f64 },
    /// At least one iteration with exactly this value.
    At(f64),
}

impl IterationCriterion {
    pub fn accepts(self, value: f64) -> bool {
        match self {
            IterationCriterion::Between { low, high } => value >= low && value <= high,
            IterationCriterion::At(target) => (value - target).abs() <= VALUE_TOLERANCE,
        }
    }
}

/// Keep rows where some iteration of a scalar iterated reference (such as the
/// extraction time `TIEMPO IT{N}`) satisfies a criterion.
#[derive(Debug, Clone)]
pub struct IterationFilter<'a> {
    reference: &'a Variable,
    criterion: IterationCriterion,
}

impl<'a> IterationFilter<'a> {
    pub fn new(reference: &'a Variable, criterion: IterationCriterion) -> Result<Self> {
        if reference.kind() != VariableKind::Iterated {
            return Err(LookupError::WrongKind {
                id: reference.id().to_string(),
                expected: VariableKind::Iterated.to_string(),
                found: reference.kind().to_string(),
            }
            .into());
        }
        if reference.iteration_kind() != Some(VariableKind::Scalar) {
            return Err(Error::Data {
                id: reference.id().to_string(),
                message: "iteration filters need scalar iterations".to_string(),
            });
        }
        Ok(Self {
            reference,
            criterion,
        })
    }

    /// Rows with at least one iteration valued in `[low, high]`.
    pub fn any_between(reference: &'a Variable, low: f64, high: f64) -> Result<Self> {
        let (low, high) = if low <= high { (low, high) } else { (high, low) };
        Self::new(reference, IterationCriterion::Between { low, high })
    }

    /// Rows with an iteration valued exactly `value`.
    pub fn at(reference: &'a Variable, value: f64) -> Result<Self> {
        Self::new(reference, IterationCriterion::At(value))
    }

    pub fn criterion(&self) -> IterationCriterion {
        self.criterion
    }

    /// Iteration indices matching the criterion, per row.
    pub fn matching_iterations(&self, dataset: &Dataset) -> Result<Vec<Vec<u32>>> {
        self.reference.ensure_bound()?;
        let mut matches = vec![Vec::new(); dataset.height()];
        for it in self.reference.iterations() {
            let column = it.variable.get_series(dataset)?;
            for (row, value) in values::numeric_values(column).into_iter().enumerate() {
                if value.is_some_and(|value| self.criterion.accepts(value)) {
                    matches[row].push(it.index);
                }
            }
        }
        Ok(matches)
    }
}

impl RowFilter for IterationFilter<'_> {
    fn mask(&self, dataset: &Dataset) -> Result<Vec<bool>> {
        Ok(self
            .matching_iterations(dataset)?
            .into_iter()
            .map(|indices| !indices.is_empty())
            .collect())
    }
}
