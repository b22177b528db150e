//! Descriptive statistics reporting.
//!
//! [`StatisticsFormatter`] turns typed [`StatisticsTable`](melanoma_model::StatisticsTable)s
//! into a [`FormattedTable`] of display strings; the renderers in this crate
//! write that one table as CSV, Markdown or a styled terminal table.

pub mod formatter;
pub mod render;

pub use formatter::{
    FormattedTable, NamedStatistics, STATISTIC_HEADER, StatisticsFormatter, VARIABLE_HEADER,
};
pub use render::{OutputFormat, RenderError, terminal_table, to_csv, to_markdown};
