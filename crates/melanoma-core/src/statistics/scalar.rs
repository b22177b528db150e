use polars::prelude::*;

use melanoma_model::{SCALAR_STATISTICS, StatValue, StatisticsTable};

use super::{Partition, column_labels};

/// Linear-interpolated quantile of the values.
pub fn quantile(values: &Float64Chunked, q: f64) -> Option<f64> {
    values
        .quantile(q.clamp(0.0, 1.0), QuantileMethod::Linear)
        .ok()
        .flatten()
}

/// count, mean, std (n - 1), min, 25%, 50%, 75%, max of the given values.
pub fn describe(values: &[f64]) -> Vec<StatValue> {
    let column = Float64Chunked::from_slice("values".into(), values);
    let count = values.len();
    let number = |value: Option<f64>| value.map_or(StatValue::Empty, StatValue::Number);
    let std = column.std(1).filter(|_| count > 1);

    vec![
        StatValue::Count(count),
        number(column.mean()),
        number(std),
        number(column.min()),
        number(quantile(&column, 0.25)),
        number(quantile(&column, 0.5)),
        number(quantile(&column, 0.75)),
        number(column.max()),
    ]
}

pub fn scalar_table(
    variable_id: &str,
    values: &[Option<f64>],
    partitions: &[Partition],
    decimals: usize,
) -> StatisticsTable {
    let columns: Vec<Vec<StatValue>> = partitions
        .iter()
        .map(|partition| {
            let present: Vec<f64> = partition
                .rows
                .iter()
                .filter_map(|row| values.get(*row).copied().flatten())
                .collect();
            describe(&present)
        })
        .collect();

    let mut table =
        StatisticsTable::new(variable_id, column_labels(partitions)).with_decimals(decimals);
    for (stat_idx, label) in SCALAR_STATISTICS.iter().enumerate() {
        let row = columns
            .iter()
            .map(|column| column[stat_idx].clone())
            .collect();
        table.push_row(*label, row);
    }
    table
}
