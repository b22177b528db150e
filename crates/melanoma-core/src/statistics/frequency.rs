use std::collections::HashMap;

use melanoma_model::{MISSING_LABEL, PercentageBase, StatValue, StatisticsTable};

use super::{Partition, column_labels};

/// Count and percentage per category, column by column.
///
/// `categories` fixes the row order. Labels observed in the data but absent
/// from `categories` are ignored, so callers pass every label they want shown.
/// A `Missing` row is added when any row of any partition is missing.
pub fn frequency_table(
    variable_id: &str,
    values: &[Option<String>],
    partitions: &[Partition],
    categories: &[String],
    base: PercentageBase,
) -> StatisticsTable {
    let missing_row = has_missing(values, partitions);
    frequency_table_with_missing(variable_id, values, partitions, categories, base, missing_row)
}

/// Whether any row of any partition lacks a value.
pub fn has_missing(values: &[Option<String>], partitions: &[Partition]) -> bool {
    partitions.iter().any(|partition| {
        partition
            .rows
            .iter()
            .any(|row| values.get(*row).is_none_or(Option::is_none))
    })
}

/// [`frequency_table`] with the `Missing` row forced on or off, so tables
/// merged side by side share their rows.
pub fn frequency_table_with_missing(
    variable_id: &str,
    values: &[Option<String>],
    partitions: &[Partition],
    categories: &[String],
    base: PercentageBase,
    missing_row: bool,
) -> StatisticsTable {
    let mut counts: Vec<(HashMap<&str, usize>, usize, usize)> = Vec::with_capacity(partitions.len());
    for partition in partitions {
        let mut per_category: HashMap<&str, usize> = HashMap::new();
        let mut missing = 0usize;
        for row in &partition.rows {
            match values.get(*row).and_then(Option::as_deref) {
                Some(label) => *per_category.entry(label).or_default() += 1,
                None => missing += 1,
            }
        }
        let present = partition.rows.len() - missing;
        counts.push((per_category, present, missing));
    }

    let percentage = |count: usize, present: usize, missing: usize| {
        let denominator = match base {
            PercentageBase::NonMissing => present,
            PercentageBase::Total => present + missing,
        };
        (denominator > 0).then(|| count as f64 * 100.0 / denominator as f64)
    };

    let mut table = StatisticsTable::new(variable_id, column_labels(partitions));
    for category in categories {
        let row = counts
            .iter()
            .map(|(per_category, present, missing)| {
                let count = per_category.get(category.as_str()).copied().unwrap_or(0);
                StatValue::Frequency {
                    count,
                    percentage: percentage(count, *present, *missing),
                }
            })
            .collect();
        table.push_row(category.clone(), row);
    }

    if missing_row {
        let row = counts
            .iter()
            .map(|(_, present, missing)| StatValue::Frequency {
                count: *missing,
                percentage: match base {
                    PercentageBase::NonMissing => None,
                    PercentageBase::Total => percentage(*missing, *present, *missing),
                },
            })
            .collect();
        table.push_row(MISSING_LABEL, row);
    }
    table
}
