//! CSV, Markdown and terminal renderers over a [`FormattedTable`].

use std::fmt;
use std::str::FromStr;

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::formatter::FormattedTable;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("failed to flush CSV writer: {0}")]
    Flush(#[from] std::io::Error),
}

/// Output format for statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [Self::Table, Self::Csv, Self::Markdown];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Csv => "csv",
            Self::Markdown => "markdown",
        }
    }

    /// Render `table` in this format.
    pub fn render(self, table: &FormattedTable) -> Result<String, RenderError> {
        match self {
            Self::Table => Ok(terminal_table(table).to_string()),
            Self::Csv => to_csv(table),
            Self::Markdown => Ok(to_markdown(table)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "table" | "terminal" => Ok(Self::Table),
            "csv" => Ok(Self::Csv),
            "markdown" | "md" => Ok(Self::Markdown),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// CSV with a header record.
pub fn to_csv(table: &FormattedTable) -> Result<String, RenderError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(&table.header)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    let bytes = writer
        .into_inner()
        .map_err(|e| RenderError::Flush(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// GitHub-flavored Markdown table.
pub fn to_markdown(table: &FormattedTable) -> String {
    let mut out = String::new();
    push_markdown_row(&mut out, &table.header);
    let separator: Vec<String> = table
        .header
        .iter()
        .enumerate()
        .map(|(idx, _)| if idx < 2 { "---" } else { "---:" }.to_string())
        .collect();
    push_markdown_row(&mut out, &separator);
    for row in &table.rows {
        push_markdown_row(&mut out, row);
    }
    out
}

fn push_markdown_row(out: &mut String, cells: &[String]) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&cell.replace('|', "\\|"));
        out.push_str(" |");
    }
    out.push('\n');
}

/// Styled terminal table.
pub fn terminal_table(table: &FormattedTable) -> Table {
    let mut rendered = Table::new();
    rendered.set_header(table.header.iter().map(|label| header_cell(label)));
    apply_table_style(&mut rendered);
    for row in &table.rows {
        rendered.add_row(row.iter().enumerate().map(|(idx, cell)| match idx {
            0 => Cell::new(cell).add_attribute(Attribute::Bold),
            _ if cell == "-" => dim_cell(cell),
            _ => Cell::new(cell),
        }));
    }
    for index in 2..table.width() {
        align_column(&mut rendered, index, CellAlignment::Right);
    }
    rendered
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell(value: &str) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
