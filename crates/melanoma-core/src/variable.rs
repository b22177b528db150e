//! Typed variables bound to dataset columns.
//!
//! A [`Variable`] is created unbound from its [`VariableConfig`], then bound
//! with [`Variable::init_from_dataframe`], which validates its column (or
//! resolves its iterations) and fixes its `unique_id`. Every series or
//! statistics access before that fails with [`Error::NotInitialized`].
//!
//! Kind-specific behaviour is dispatched by matching on [`VariableData`].

use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

use polars::prelude::Column;
use rapidfuzz::distance::jaro_winkler;
use serde::Serialize;
use tracing::{debug, warn};

use melanoma_ingest::Dataset;
use melanoma_model::{
    ALL_COLUMN, BooleanOptions, CategoricalOptions, ConfigurationError, DatetimeOptions, Error,
    IteratedOptions, KindOptions, LookupError, Result, ScalarOptions, StatValue,
    StatisticsOptions, StatisticsTable, ValidationError, VariableConfig, VariableKind,
};
use melanoma_report::{FormattedTable, StatisticsFormatter};

use crate::iteration::IterationResolver;
use crate::statistics::{
    GROUP_SEPARATOR, Partition, datetime_table, frequency_table, frequency_table_with_missing,
    group_partitions, has_missing, scalar_table,
};
use crate::values;

/// Prefix of the per-iteration column labels in iterated statistics.
pub const ITERATION_COLUMN_PREFIX: &str = "IT";

/// Similar columns listed in a validation error.
const MAX_SIMILAR_COLUMNS: usize = 3;
const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Back-reference from a sub-variable to its iterated parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParentRef {
    pub parent_id: String,
    /// Position in the parent's iteration sequence.
    pub position: usize,
    /// Iteration index of the sub-variable.
    pub index: u32,
}

/// One resolved iteration of an iterated variable.
#[derive(Debug, Clone)]
pub struct Iteration {
    pub index: u32,
    pub variable: Variable,
}

#[derive(Debug, Clone)]
pub struct IteratedData {
    pub options: IteratedOptions,
    /// Strictly increasing by index once bound.
    pub iterations: Vec<Iteration>,
}

/// Kind tag plus kind state.
#[derive(Debug, Clone)]
pub enum VariableData {
    Scalar(ScalarOptions),
    Categorical(CategoricalOptions),
    Boolean(BooleanOptions),
    Datetime(DatetimeOptions),
    Iterated(IteratedData),
}

impl VariableData {
    pub fn kind(&self) -> VariableKind {
        match self {
            VariableData::Scalar(_) => VariableKind::Scalar,
            VariableData::Categorical(_) => VariableKind::Categorical,
            VariableData::Boolean(_) => VariableKind::Boolean,
            VariableData::Datetime(_) => VariableKind::Datetime,
            VariableData::Iterated(_) => VariableKind::Iterated,
        }
    }
}

impl From<KindOptions> for VariableData {
    fn from(options: KindOptions) -> Self {
        match options {
            KindOptions::Scalar(options) => VariableData::Scalar(options),
            KindOptions::Categorical(options) => VariableData::Categorical(options),
            KindOptions::Boolean(options) => VariableData::Boolean(options),
            KindOptions::Datetime(options) => VariableData::Datetime(options),
            KindOptions::Iterated(options) => VariableData::Iterated(IteratedData {
                options,
                iterations: Vec::new(),
            }),
        }
    }
}

/// Per-iteration aggregate used by kinetics views.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IterationSummary {
    pub index: u32,
    pub column: String,
    /// Non-missing values.
    pub count: usize,
    /// Mean of the values, for scalar iterations.
    pub mean: Option<f64>,
}

/// A typed binding between a declared field and a dataset column.
///
/// Equality and hashing use `id` only.
#[derive(Debug, Clone)]
pub struct Variable {
    id: String,
    name: String,
    selectable: bool,
    data: VariableData,
    unique_id: Option<String>,
    parent: Option<ParentRef>,
}

impl PartialEq for Variable {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Variable {}

impl Hash for Variable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Variable {
    /// Build an unbound variable, checking the descriptor first.
    pub fn new(config: VariableConfig) -> std::result::Result<Self, ConfigurationError> {
        config.validate()?;
        Ok(Self {
            id: config.id,
            name: config.name,
            selectable: config.selectable,
            data: config.options.into(),
            unique_id: None,
            parent: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display label, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    pub fn selectable(&self) -> bool {
        self.selectable
    }

    pub fn kind(&self) -> VariableKind {
        self.data.kind()
    }

    pub fn data(&self) -> &VariableData {
        &self.data
    }

    /// `<dataset name>.<id>`, or `id` for anonymous datasets. `None` until bound.
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    pub fn is_bound(&self) -> bool {
        self.unique_id.is_some()
    }

    /// Set for sub-variables of an iterated variable.
    pub fn parent(&self) -> Option<&ParentRef> {
        self.parent.as_ref()
    }

    /// Kind of the sub-variables, for iterated variables.
    pub fn iteration_kind(&self) -> Option<VariableKind> {
        match &self.data {
            VariableData::Iterated(data) => Some(data.options.iteration_kind),
            _ => None,
        }
    }

    /// Resolved iterations; empty for non-iterated or unbound variables.
    pub fn iterations(&self) -> &[Iteration] {
        match &self.data {
            VariableData::Iterated(data) => &data.iterations,
            _ => &[],
        }
    }

    pub fn iteration_indices(&self) -> Vec<u32> {
        self.iterations().iter().map(|it| it.index).collect()
    }

    pub fn iteration(&self, index: u32) -> Option<&Variable> {
        self.iterations()
            .iter()
            .find(|it| it.index == index)
            .map(|it| &it.variable)
    }

    /// Columns this variable reads from.
    pub fn columns(&self) -> Vec<&str> {
        match &self.data {
            VariableData::Iterated(data) => data
                .iterations
                .iter()
                .map(|it| it.variable.id.as_str())
                .collect(),
            _ => vec![self.id.as_str()],
        }
    }

    /// Validate against `dataset` and fix `unique_id`. Re-binding recomputes
    /// everything, so binding twice to the same dataset is a no-op.
    pub fn init_from_dataframe(&mut self, dataset: &Dataset) -> Result<()> {
        let unique_id = qualified_id(dataset, &self.id);
        let display_name = self.display_name().to_string();

        match &mut self.data {
            VariableData::Iterated(data) => {
                let resolver = IterationResolver::new(&self.id)?;
                let columns = dataset.column_names();
                let resolved = resolver.resolve(columns.iter().map(String::as_str))?;
                let element = data.options.element_options(&self.id)?;

                let mut iterations = Vec::with_capacity(resolved.len());
                for (position, (index, column)) in resolved.into_iter().enumerate() {
                    let mut variable = Variable {
                        id: column,
                        name: format!("{display_name} ({ITERATION_COLUMN_PREFIX}{index})"),
                        selectable: false,
                        data: element.clone().into(),
                        unique_id: None,
                        parent: Some(ParentRef {
                            parent_id: self.id.clone(),
                            position,
                            index,
                        }),
                    };
                    variable.init_from_dataframe(dataset)?;
                    iterations.push(Iteration { index, variable });
                }

                if iterations.is_empty() {
                    warn!(variable = %self.id, "No columns match iteration pattern");
                }
                debug!(
                    variable = %unique_id,
                    iterations = iterations.len(),
                    "Resolved iterated variable"
                );
                data.iterations = iterations;
            }
            _ => {
                self.check_valid_id(dataset)?;
                debug!(variable = %unique_id, kind = %self.data.kind(), "Bound variable");
            }
        }

        self.unique_id = Some(unique_id);
        Ok(())
    }

    /// Check that the variable's column exists in `dataset`.
    pub fn check_valid_id(&self, dataset: &Dataset) -> std::result::Result<(), ValidationError> {
        if dataset.has_column(&self.id) {
            return Ok(());
        }
        let columns = dataset.column_names();
        Err(ValidationError::missing_column(&self.id, dataset.name())
            .with_similar(similar_columns(&self.id, &columns)))
    }

    pub(crate) fn ensure_bound(&self) -> Result<()> {
        if self.is_bound() {
            Ok(())
        } else {
            Err(Error::NotInitialized {
                id: self.id.clone(),
            })
        }
    }

    /// The variable's column, unmodified.
    ///
    /// Iterated variables span several columns and return a lookup error;
    /// use [`iterations`](Self::iterations) instead.
    pub fn get_series<'d>(&self, dataset: &'d Dataset) -> Result<&'d Column> {
        self.ensure_bound()?;
        if let VariableData::Iterated(_) = self.data {
            return Err(LookupError::MissingColumn {
                column: self.id.clone(),
            }
            .into());
        }
        dataset.column(&self.id).ok_or_else(|| {
            LookupError::MissingColumn {
                column: self.id.clone(),
            }
            .into()
        })
    }

    /// Numeric cell values, for scalar variables.
    pub fn numeric_values(&self, dataset: &Dataset) -> Result<Vec<Option<f64>>> {
        match &self.data {
            VariableData::Scalar(_) => Ok(values::numeric_values(self.get_series(dataset)?)),
            _ => Err(self.wrong_kind("scalar")),
        }
    }

    /// Display labels used to group rows, for categorical and boolean variables.
    pub fn group_labels(&self, dataset: &Dataset) -> Result<Vec<Option<String>>> {
        match &self.data {
            VariableData::Categorical(options) => Ok(values::category_values(
                self.get_series(dataset)?,
                options,
            )),
            VariableData::Boolean(options) => {
                Ok(values::bool_labels(self.get_series(dataset)?, options))
            }
            _ => Err(self.wrong_kind("categorical or boolean")),
        }
    }

    fn wrong_kind(&self, expected: &str) -> Error {
        LookupError::WrongKind {
            id: self.id.clone(),
            expected: expected.to_string(),
            found: self.kind().to_string(),
        }
        .into()
    }

    /// Kind-specific descriptive statistics over `dataset`.
    ///
    /// `group_by` variables must be categorical or boolean; each observed
    /// combination of their labels yields one column.
    pub fn descriptive_statistics(
        &self,
        dataset: &Dataset,
        group_by: &[&Variable],
        options: StatisticsOptions,
    ) -> Result<StatisticsTable> {
        self.ensure_bound()?;
        if let VariableData::Iterated(data) = &self.data {
            let per_iteration = match data.options.iteration_kind {
                VariableKind::Categorical | VariableKind::Boolean => {
                    self.iteration_frequencies(data, dataset, group_by, options)?
                }
                _ => self.iteration_statistics(dataset, group_by, options)?,
            };
            return Ok(self.combine_iterations(per_iteration));
        }

        let partitions = partitions_of(dataset, group_by)?;

        let table = match &self.data {
            VariableData::Scalar(scalar) => scalar_table(
                &self.id,
                &self.numeric_values(dataset)?,
                &partitions,
                scalar.decimals.unwrap_or(StatisticsTable::DEFAULT_DECIMALS),
            ),
            VariableData::Categorical(categorical) => {
                let labels = values::category_values(self.get_series(dataset)?, categorical);
                let categories = category_order(observed_labels(&labels, &partitions), categorical);
                frequency_table(
                    &self.id,
                    &labels,
                    &partitions,
                    &categories,
                    options.percentage_base,
                )
            }
            VariableData::Boolean(boolean) => {
                let labels = values::bool_labels(self.get_series(dataset)?, boolean);
                frequency_table(
                    &self.id,
                    &labels,
                    &partitions,
                    &boolean_categories(),
                    options.percentage_base,
                )
            }
            VariableData::Datetime(datetime) => datetime_table(
                &self.id,
                &values::datetime_values(self.get_series(dataset)?, datetime),
                &partitions,
                options.include_span,
            ),
            VariableData::Iterated(_) => StatisticsTable::ungrouped(&self.id),
        };
        Ok(table)
    }

    /// Statistics of every iteration, keyed by iteration index.
    pub fn iteration_statistics(
        &self,
        dataset: &Dataset,
        group_by: &[&Variable],
        options: StatisticsOptions,
    ) -> Result<BTreeMap<u32, StatisticsTable>> {
        self.ensure_bound()?;
        let VariableData::Iterated(data) = &self.data else {
            return Err(self.wrong_kind("iterated"));
        };
        data.iterations
            .iter()
            .map(|it| {
                it.variable
                    .descriptive_statistics(dataset, group_by, options)
                    .map(|table| (it.index, table))
            })
            .collect()
    }

    /// Frequency tables of every iteration over one set of categories, with
    /// a `Missing` row in all of them when any iteration has missing values.
    fn iteration_frequencies(
        &self,
        data: &IteratedData,
        dataset: &Dataset,
        group_by: &[&Variable],
        options: StatisticsOptions,
    ) -> Result<BTreeMap<u32, StatisticsTable>> {
        let partitions = partitions_of(dataset, group_by)?;
        let mut labelled = Vec::with_capacity(data.iterations.len());
        for it in &data.iterations {
            let labels = match &it.variable.data {
                VariableData::Categorical(categorical) => {
                    values::category_values(it.variable.get_series(dataset)?, categorical)
                }
                VariableData::Boolean(boolean) => {
                    values::bool_labels(it.variable.get_series(dataset)?, boolean)
                }
                _ => return Err(it.variable.wrong_kind("categorical or boolean")),
            };
            labelled.push((it, labels));
        }

        let categories = match data.options.iteration_kind {
            VariableKind::Boolean => boolean_categories(),
            _ => {
                let observed: BTreeSet<&str> = labelled
                    .iter()
                    .flat_map(|(_, labels)| observed_labels(labels, &partitions))
                    .collect();
                let mapping = CategoricalOptions {
                    categories: data.options.categories.clone(),
                };
                category_order(observed, &mapping)
            }
        };
        let missing_row = labelled
            .iter()
            .any(|(_, labels)| has_missing(labels, &partitions));
        debug!(
            variable = %self.id,
            categories = categories.len(),
            missing_row,
            "Sharing categories across iterations"
        );

        Ok(labelled
            .into_iter()
            .map(|(it, labels)| {
                let table = frequency_table_with_missing(
                    &it.variable.id,
                    &labels,
                    &partitions,
                    &categories,
                    options.percentage_base,
                    missing_row,
                );
                (it.index, table)
            })
            .collect())
    }

    fn combine_iterations(&self, per_iteration: BTreeMap<u32, StatisticsTable>) -> StatisticsTable {
        let mut columns = Vec::new();
        let mut row_labels: Vec<String> = Vec::new();
        for (index, table) in &per_iteration {
            for column in &table.columns {
                columns.push(if column == ALL_COLUMN {
                    format!("{ITERATION_COLUMN_PREFIX}{index}")
                } else {
                    format!("{ITERATION_COLUMN_PREFIX}{index}{GROUP_SEPARATOR}{column}")
                });
            }
            for row in &table.rows {
                if !row_labels.contains(&row.label) {
                    row_labels.push(row.label.clone());
                }
            }
        }

        let decimals = per_iteration
            .values()
            .next()
            .map_or(StatisticsTable::DEFAULT_DECIMALS, |table| table.decimals);
        let mut combined = StatisticsTable::new(&self.id, columns).with_decimals(decimals);
        for label in row_labels {
            let mut cells = Vec::new();
            for table in per_iteration.values() {
                match table.row(&label) {
                    Some(row) => cells.extend(row.values.iter().cloned()),
                    None => cells.extend(std::iter::repeat_n(StatValue::Empty, table.columns.len())),
                }
            }
            combined.push_row(label, cells);
        }
        combined
    }

    /// Per-iteration count and mean, in index order.
    pub fn longitudinal_summary(&self, dataset: &Dataset) -> Result<Vec<IterationSummary>> {
        self.ensure_bound()?;
        let VariableData::Iterated(data) = &self.data else {
            return Err(self.wrong_kind("iterated"));
        };
        let mut summaries = Vec::with_capacity(data.iterations.len());
        for it in &data.iterations {
            let column = it.variable.get_series(dataset)?;
            let (count, mean) = match &it.variable.data {
                VariableData::Scalar(_) => {
                    let present: Vec<f64> = values::numeric_values(column)
                        .into_iter()
                        .flatten()
                        .collect();
                    let mean = (!present.is_empty())
                        .then(|| present.iter().sum::<f64>() / present.len() as f64);
                    (present.len(), mean)
                }
                _ => {
                    let present = values::text_values(column).into_iter().flatten().count();
                    (present, None)
                }
            };
            summaries.push(IterationSummary {
                index: it.index,
                column: it.variable.id.clone(),
                count,
                mean,
            });
        }
        Ok(summaries)
    }

    /// Ungrouped statistics with default options, formatted for display.
    pub fn format_descriptive_statistics(&self, dataset: &Dataset) -> Result<FormattedTable> {
        self.format_descriptive_statistics_with(
            dataset,
            &[],
            StatisticsOptions::default(),
            &StatisticsFormatter::default(),
        )
    }

    pub fn format_descriptive_statistics_with(
        &self,
        dataset: &Dataset,
        group_by: &[&Variable],
        options: StatisticsOptions,
        formatter: &StatisticsFormatter,
    ) -> Result<FormattedTable> {
        let table = self.descriptive_statistics(dataset, group_by, options)?;
        Ok(formatter.format(self.display_name(), &table))
    }
}

/// `<dataset name>.<id>`, or `id` when the dataset is anonymous.
pub fn qualified_id(dataset: &Dataset, id: &str) -> String {
    match dataset.name() {
        Some(name) => format!("{name}.{id}"),
        None => id.to_string(),
    }
}

/// Partitions of `dataset` by the labels of the `group_by` variables.
fn partitions_of(dataset: &Dataset, group_by: &[&Variable]) -> Result<Vec<Partition>> {
    let keys = group_by
        .iter()
        .map(|group| group.group_labels(dataset))
        .collect::<Result<Vec<_>>>()?;
    Ok(group_partitions(dataset.height(), &keys))
}

fn boolean_categories() -> Vec<String> {
    vec![
        values::TRUE_LABEL.to_string(),
        values::FALSE_LABEL.to_string(),
    ]
}

/// Labels present in the partitioned rows.
fn observed_labels<'a>(labels: &'a [Option<String>], partitions: &[Partition]) -> BTreeSet<&'a str> {
    partitions
        .iter()
        .flat_map(|partition| partition.rows.iter())
        .filter_map(|row| labels.get(*row).and_then(Option::as_deref))
        .collect()
}

/// Mapped labels in configuration order, then the other observed labels
/// sorted. Only observed labels are kept.
fn category_order(observed: BTreeSet<&str>, options: &CategoricalOptions) -> Vec<String> {
    let mut ordered: Vec<String> = Vec::new();
    for category in &options.categories {
        if observed.contains(category.label.as_str()) && !ordered.contains(&category.label) {
            ordered.push(category.label.clone());
        }
    }
    for label in observed {
        if !ordered.iter().any(|known| known == label) {
            ordered.push(label.to_string());
        }
    }
    ordered
}

fn normalize_column(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Columns whose name resembles `id`, best match first.
pub fn similar_columns(id: &str, columns: &[String]) -> Vec<String> {
    let target = normalize_column(id);
    let mut scored: Vec<(f64, &String)> = columns
        .iter()
        .map(|column| {
            let score = jaro_winkler::similarity(target.chars(), normalize_column(column).chars());
            (score, column)
        })
        .filter(|(score, _)| *score >= SIMILARITY_THRESHOLD)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored
        .into_iter()
        .take(MAX_SIMILAR_COLUMNS)
        .map(|(_, column)| column.clone())
        .collect()
}
