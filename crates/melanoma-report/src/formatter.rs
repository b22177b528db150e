//! Statistics tables to display strings.

use chrono::NaiveTime;
use serde::Serialize;

use melanoma_common::format_fixed;
use melanoma_model::{StatValue, StatisticsTable};

/// Header of the variable label column.
pub const VARIABLE_HEADER: &str = "Variable";
/// Header of the statistic label column.
pub const STATISTIC_HEADER: &str = "Statistic";

/// Ordered header plus ordered rows of display strings.
///
/// Every renderer consumes this same value, so cell text never depends on the
/// output format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormattedTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl FormattedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn width(&self) -> usize {
        self.header.len()
    }

    /// Cell at `row`, looked up by header label.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.header.iter().position(|label| label == column)?;
        self.rows.get(row)?.get(index).map(String::as_str)
    }
}

/// One variable's statistics handed to the formatter.
#[derive(Debug, Clone, Copy)]
pub struct NamedStatistics<'a> {
    pub name: &'a str,
    pub table: &'a StatisticsTable,
}

impl<'a> NamedStatistics<'a> {
    pub fn new(name: &'a str, table: &'a StatisticsTable) -> Self {
        Self { name, table }
    }
}

/// Turns typed statistics into a [`FormattedTable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatisticsFormatter {
    empty: String,
    percentage_decimals: usize,
}

impl Default for StatisticsFormatter {
    fn default() -> Self {
        Self {
            empty: "-".to_string(),
            percentage_decimals: 1,
        }
    }
}

impl StatisticsFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text used for [`StatValue::Empty`] cells.
    #[must_use]
    pub fn with_empty(mut self, empty: impl Into<String>) -> Self {
        self.empty = empty.into();
        self
    }

    #[must_use]
    pub fn with_percentage_decimals(mut self, decimals: usize) -> Self {
        self.percentage_decimals = decimals;
        self
    }

    /// Format a single variable's statistics.
    pub fn format(&self, name: &str, table: &StatisticsTable) -> FormattedTable {
        self.format_all(&[NamedStatistics::new(name, table)])
    }

    /// Format several variables into one table.
    ///
    /// Columns are `Variable`, `Statistic`, then the union of the statistics
    /// columns in first-seen order. A variable's name is written on its first
    /// row only; columns a variable lacks are filled with the empty marker.
    pub fn format_all(&self, entries: &[NamedStatistics<'_>]) -> FormattedTable {
        let mut columns: Vec<&str> = Vec::new();
        for entry in entries {
            for column in &entry.table.columns {
                if !columns.contains(&column.as_str()) {
                    columns.push(column);
                }
            }
        }

        let mut header = vec![VARIABLE_HEADER.to_string(), STATISTIC_HEADER.to_string()];
        header.extend(columns.iter().map(|column| (*column).to_string()));

        let mut rows = Vec::new();
        for entry in entries {
            let positions: Vec<Option<usize>> = columns
                .iter()
                .map(|column| entry.table.column_index(column))
                .collect();
            for (row_idx, row) in entry.table.rows.iter().enumerate() {
                let mut cells = Vec::with_capacity(header.len());
                cells.push(if row_idx == 0 {
                    entry.name.to_string()
                } else {
                    String::new()
                });
                cells.push(row.label.clone());
                for position in &positions {
                    let cell = position
                        .and_then(|idx| row.values.get(idx))
                        .map_or_else(
                            || self.empty.clone(),
                            |value| self.format_value(value, entry.table.decimals),
                        );
                    cells.push(cell);
                }
                rows.push(cells);
            }
        }

        FormattedTable { header, rows }
    }

    /// Display text of one cell.
    pub fn format_value(&self, value: &StatValue, decimals: usize) -> String {
        match value {
            StatValue::Empty => self.empty.clone(),
            StatValue::Count(count) => count.to_string(),
            StatValue::Number(number) => format_fixed(*number, decimals),
            StatValue::Frequency {
                count,
                percentage: Some(percentage),
            } => format!(
                "{count} ({}%)",
                format_fixed(*percentage, self.percentage_decimals)
            ),
            StatValue::Frequency {
                count,
                percentage: None,
            } => count.to_string(),
            StatValue::DateTime(datetime) => {
                if datetime.time() == NaiveTime::MIN {
                    datetime.format("%Y-%m-%d").to_string()
                } else {
                    datetime.format("%Y-%m-%d %H:%M:%S").to_string()
                }
            }
            StatValue::Days(days) => days.to_string(),
        }
    }
}
