//! Raw descriptive statistics tables.
//!
//! A [`StatisticsTable`] is the kind-independent result of a variable's
//! `descriptive_statistics`: ordered rows (one per statistic or category),
//! ordered columns (one per group, or a single [`ALL_COLUMN`]). Values stay
//! typed here; turning them into display strings is the formatter's job.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Column label used when statistics are not grouped.
pub const ALL_COLUMN: &str = "All";

/// Row label of the explicit missing-value bucket.
pub const MISSING_LABEL: &str = "Missing";

/// Row labels produced for scalar variables, in display order.
pub const SCALAR_STATISTICS: [&str; 8] = [
    "count", "mean", "std", "min", "25%", "50%", "75%", "max",
];

/// Row labels produced for datetime variables, in display order.
pub const DATETIME_STATISTICS: [&str; 4] = ["count", "missing", "min", "max"];

/// Row label of the optional datetime span.
pub const SPAN_STATISTIC: &str = "span (days)";

/// Denominator used for categorical percentages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PercentageBase {
    /// Percentages over non-missing values; the missing bucket has none.
    #[default]
    NonMissing,
    /// Percentages over all rows, missing bucket included.
    Total,
}

/// Knobs accepted by `descriptive_statistics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsOptions {
    pub percentage_base: PercentageBase,
    /// Add the max - min span row to datetime statistics.
    pub include_span: bool,
}

impl StatisticsOptions {
    #[must_use]
    pub fn with_percentage_base(mut self, base: PercentageBase) -> Self {
        self.percentage_base = base;
        self
    }

    #[must_use]
    pub fn with_span(mut self, include: bool) -> Self {
        self.include_span = include;
        self
    }
}

/// One typed statistics cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StatValue {
    /// No value (std of a single observation, category absent from a group).
    Empty,
    Count(usize),
    Number(f64),
    /// Category frequency with its percentage (absent for the missing bucket
    /// under [`PercentageBase::NonMissing`]).
    Frequency {
        count: usize,
        percentage: Option<f64>,
    },
    DateTime(NaiveDateTime),
    Days(i64),
}

impl StatValue {
    pub fn as_count(&self) -> Option<usize> {
        match self {
            StatValue::Count(count) | StatValue::Frequency { count, .. } => Some(*count),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            StatValue::Number(value) => Some(*value),
            StatValue::Count(count) => Some(*count as f64),
            StatValue::Days(days) => Some(*days as f64),
            _ => None,
        }
    }

    pub fn as_percentage(&self) -> Option<f64> {
        match self {
            StatValue::Frequency { percentage, .. } => *percentage,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRow {
    pub label: String,
    pub values: Vec<StatValue>,
}

/// Statistics of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsTable {
    /// Id of the variable the table describes.
    pub variable_id: String,
    pub columns: Vec<String>,
    pub rows: Vec<StatisticsRow>,
    /// Decimal places for numbers when displayed.
    pub decimals: usize,
}

impl StatisticsTable {
    pub const DEFAULT_DECIMALS: usize = 2;

    pub fn new(variable_id: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            variable_id: variable_id.into(),
            columns,
            rows: Vec::new(),
            decimals: Self::DEFAULT_DECIMALS,
        }
    }

    /// Single-column table for ungrouped statistics.
    pub fn ungrouped(variable_id: impl Into<String>) -> Self {
        Self::new(variable_id, vec![ALL_COLUMN.to_string()])
    }

    #[must_use]
    pub fn with_decimals(mut self, decimals: usize) -> Self {
        self.decimals = decimals;
        self
    }

    /// Append a row. Missing trailing cells are padded with [`StatValue::Empty`].
    pub fn push_row(&mut self, label: impl Into<String>, mut values: Vec<StatValue>) {
        values.resize(self.columns.len(), StatValue::Empty);
        self.rows.push(StatisticsRow {
            label: label.into(),
            values,
        });
    }

    pub fn row(&self, label: &str) -> Option<&StatisticsRow> {
        self.rows.iter().find(|row| row.label == label)
    }

    pub fn row_labels(&self) -> Vec<&str> {
        self.rows.iter().map(|row| row.label.as_str()).collect()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|candidate| candidate == column)
    }

    pub fn value(&self, row: &str, column: &str) -> Option<&StatValue> {
        let index = self.column_index(column)?;
        self.row(row).and_then(|row| row.values.get(index))
    }

    /// Value in the first column, convenient for ungrouped tables.
    pub fn first(&self, row: &str) -> Option<&StatValue> {
        self.row(row).and_then(|row| row.values.first())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
