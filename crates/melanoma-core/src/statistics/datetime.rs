use chrono::NaiveDateTime;

use melanoma_model::{DATETIME_STATISTICS, SPAN_STATISTIC, StatValue, StatisticsTable};

use super::{Partition, column_labels};

pub fn datetime_table(
    variable_id: &str,
    values: &[Option<NaiveDateTime>],
    partitions: &[Partition],
    include_span: bool,
) -> StatisticsTable {
    let columns: Vec<[StatValue; 5]> = partitions
        .iter()
        .map(|partition| {
            let present: Vec<NaiveDateTime> = partition
                .rows
                .iter()
                .filter_map(|row| values.get(*row).copied().flatten())
                .collect();
            let min = present.iter().min().copied();
            let max = present.iter().max().copied();
            let span = min
                .zip(max)
                .map_or(StatValue::Empty, |(min, max)| {
                    StatValue::Days((max - min).num_days())
                });
            [
                StatValue::Count(present.len()),
                StatValue::Count(partition.rows.len() - present.len()),
                min.map_or(StatValue::Empty, StatValue::DateTime),
                max.map_or(StatValue::Empty, StatValue::DateTime),
                span,
            ]
        })
        .collect();

    let mut table = StatisticsTable::new(variable_id, column_labels(partitions));
    let mut labels: Vec<&str> = DATETIME_STATISTICS.to_vec();
    if include_span {
        labels.push(SPAN_STATISTIC);
    }
    for (stat_idx, label) in labels.into_iter().enumerate() {
        let row = columns
            .iter()
            .map(|column| column[stat_idx].clone())
            .collect();
        table.push_row(label, row);
    }
    table
}
