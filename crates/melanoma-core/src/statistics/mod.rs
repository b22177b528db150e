//! Kind-specific statistics algorithms.
//!
//! Every algorithm works on already decoded per-row values plus a list of
//! [`Partition`]s: one partition for ungrouped statistics, one per observed
//! group combination otherwise. Each partition becomes one table column.

mod datetime;
mod frequency;
mod scalar;

pub use datetime::datetime_table;
pub use frequency::{frequency_table, frequency_table_with_missing, has_missing};
pub use scalar::{describe, quantile, scalar_table};

use std::collections::BTreeMap;

use melanoma_model::ALL_COLUMN;

/// Separator between group labels of a multi-variable group key.
pub const GROUP_SEPARATOR: &str = " / ";

/// Rows feeding one statistics column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub label: String,
    pub rows: Vec<usize>,
}

impl Partition {
    /// Every row, labelled [`ALL_COLUMN`].
    pub fn all(height: usize) -> Self {
        Self {
            label: ALL_COLUMN.to_string(),
            rows: (0..height).collect(),
        }
    }
}

/// Split rows by the combination of their group labels.
///
/// `keys` holds one label vector per group variable, each the dataset height
/// long. Rows with a missing label in any group variable are skipped.
/// Partitions come out sorted by group label.
pub fn group_partitions(height: usize, keys: &[Vec<Option<String>>]) -> Vec<Partition> {
    if keys.is_empty() {
        return vec![Partition::all(height)];
    }
    let mut groups: BTreeMap<Vec<&str>, Vec<usize>> = BTreeMap::new();
    'rows: for row in 0..height {
        let mut key = Vec::with_capacity(keys.len());
        for labels in keys {
            match labels.get(row).and_then(Option::as_deref) {
                Some(label) => key.push(label),
                None => continue 'rows,
            }
        }
        groups.entry(key).or_default().push(row);
    }
    groups
        .into_iter()
        .map(|(key, rows)| Partition {
            label: key.join(GROUP_SEPARATOR),
            rows,
        })
        .collect()
}

pub(crate) fn column_labels(partitions: &[Partition]) -> Vec<String> {
    partitions
        .iter()
        .map(|partition| partition.label.clone())
        .collect()
}
