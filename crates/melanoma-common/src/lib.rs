//! Shared utilities for the melanoma cohort crates.
//!
//! This crate provides common utilities used across the workspace,
//! including Polars `AnyValue` conversion helpers.

pub mod polars;

// Re-export commonly used functions at crate root for convenience
pub use polars::{
    any_to_bool, any_to_datetime, any_to_f64, any_to_i64, any_to_string,
    any_to_string_non_empty, format_fixed, format_numeric, parse_f64, parse_i64,
};
