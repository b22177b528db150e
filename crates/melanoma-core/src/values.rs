//! Per-kind cell decoding.
//!
//! Each decoder reads a column row by row and yields `None` for cells that
//! count as missing (nulls, blanks, NaN, unparseable text).

use chrono::{NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, Column};

use melanoma_common::{any_to_bool, any_to_datetime, any_to_f64, any_to_string_non_empty};
use melanoma_model::{BooleanOptions, CategoricalOptions, DatetimeOptions};

/// Tokens read as `true` when a boolean variable configures none.
pub const DEFAULT_TRUE_TOKENS: [&str; 6] = ["true", "yes", "si", "sí", "1", "y"];
/// Tokens read as `false` when a boolean variable configures none.
pub const DEFAULT_FALSE_TOKENS: [&str; 4] = ["false", "no", "0", "n"];

/// Formats tried for text datetime cells when a variable configures none.
pub const DEFAULT_DATETIME_FORMATS: [&str; 4] =
    ["%Y-%m-%d", "%d/%m/%Y", "%Y-%m-%d %H:%M:%S", "%d/%m/%Y %H:%M"];

/// Row labels of boolean statistics.
pub const TRUE_LABEL: &str = "True";
pub const FALSE_LABEL: &str = "False";

fn cell(column: &Column, idx: usize) -> AnyValue<'_> {
    column.get(idx).unwrap_or(AnyValue::Null)
}

pub fn numeric_values(column: &Column) -> Vec<Option<f64>> {
    (0..column.len())
        .map(|idx| any_to_f64(cell(column, idx)))
        .collect()
}

pub fn text_values(column: &Column) -> Vec<Option<String>> {
    (0..column.len())
        .map(|idx| any_to_string_non_empty(cell(column, idx)))
        .collect()
}

/// Raw values mapped to their display label.
pub fn category_values(column: &Column, options: &CategoricalOptions) -> Vec<Option<String>> {
    text_values(column)
        .into_iter()
        .map(|value| value.map(|raw| category_label(&raw, options)))
        .collect()
}

pub fn category_label(raw: &str, options: &CategoricalOptions) -> String {
    options
        .categories
        .iter()
        .find(|category| category.value == raw)
        .map_or_else(|| raw.to_string(), |category| category.label.clone())
}

pub fn bool_values(column: &Column, options: &BooleanOptions) -> Vec<Option<bool>> {
    (0..column.len())
        .map(|idx| {
            let value = cell(column, idx);
            if let Some(flag) = any_to_bool(value.clone()) {
                return Some(flag);
            }
            any_to_string_non_empty(value).and_then(|text| parse_bool_token(&text, options))
        })
        .collect()
}

/// Boolean values rendered as `True` / `False` labels.
pub fn bool_labels(column: &Column, options: &BooleanOptions) -> Vec<Option<String>> {
    bool_values(column, options)
        .into_iter()
        .map(|value| value.map(|flag| bool_label(flag).to_string()))
        .collect()
}

pub fn bool_label(flag: bool) -> &'static str {
    if flag { TRUE_LABEL } else { FALSE_LABEL }
}

pub fn parse_bool_token(text: &str, options: &BooleanOptions) -> Option<bool> {
    let token = text.trim().to_lowercase();
    let matches = |configured: &[String], defaults: &[&str]| {
        if configured.is_empty() {
            defaults.iter().any(|candidate| *candidate == token)
        } else {
            configured
                .iter()
                .any(|candidate| candidate.trim().to_lowercase() == token)
        }
    };
    if matches(&options.true_values, &DEFAULT_TRUE_TOKENS) {
        Some(true)
    } else if matches(&options.false_values, &DEFAULT_FALSE_TOKENS) {
        Some(false)
    } else {
        None
    }
}

pub fn datetime_values(column: &Column, options: &DatetimeOptions) -> Vec<Option<NaiveDateTime>> {
    (0..column.len())
        .map(|idx| {
            let value = cell(column, idx);
            if let Some(datetime) = any_to_datetime(value.clone()) {
                return Some(datetime);
            }
            any_to_string_non_empty(value).and_then(|text| parse_datetime(&text, options))
        })
        .collect()
}

pub fn parse_datetime(text: &str, options: &DatetimeOptions) -> Option<NaiveDateTime> {
    let text = text.trim();
    let try_format = |format: &str| {
        NaiveDateTime::parse_from_str(text, format).ok().or_else(|| {
            NaiveDate::parse_from_str(text, format)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
    };
    if options.formats.is_empty() {
        DEFAULT_DATETIME_FORMATS.iter().find_map(|format| try_format(format))
    } else {
        options.formats.iter().find_map(|format| try_format(format))
    }
}
