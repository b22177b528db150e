use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use melanoma_core::{Variable, VariableSelection};
use melanoma_ingest::{Dataset, FileInfo};

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell(value: impl Into<String>) -> Cell {
    Cell::new(value.into()).fg(Color::DarkGrey)
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

pub fn info_table(info: &FileInfo, dataset: &Dataset) -> Table {
    let mut table = Table::new();
    apply_table_style(&mut table);
    let path = if info.path.as_os_str().is_empty() {
        "<memory>".to_string()
    } else {
        info.path.display().to_string()
    };
    let rows = [
        ("Path", path),
        ("Dataset", dataset.name().unwrap_or("-").to_string()),
        (
            "Patient id",
            dataset.patient_id_column().unwrap_or("-").to_string(),
        ),
        ("Rows", info.rows.to_string()),
        ("Columns", info.columns.to_string()),
        ("Size (bytes)", info.size_bytes.to_string()),
    ];
    for (label, value) in rows {
        table.add_row(vec![header_cell(label), Cell::new(value)]);
    }
    table
}

pub fn variables_table<'a>(variables: impl IntoIterator<Item = &'a Variable>) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Id"),
        header_cell("Name"),
        header_cell("Kind"),
        header_cell("Unique id"),
        header_cell("Iterations"),
        header_cell("Selectable"),
    ]);
    apply_table_style(&mut table);
    for variable in variables {
        let iterations = match variable.iteration_kind() {
            Some(kind) => Cell::new(format!(
                "{} x {kind}",
                variable.iteration_indices().len()
            )),
            None => dim_cell("-"),
        };
        let selectable = if variable.selectable() {
            Cell::new("yes")
        } else {
            dim_cell("no")
        };
        table.add_row(vec![
            Cell::new(variable.id()),
            Cell::new(variable.name()),
            Cell::new(variable.kind().as_str()),
            Cell::new(variable.unique_id().unwrap_or("-")),
            iterations,
            selectable,
        ]);
    }
    align_column(&mut table, 4, CellAlignment::Right);
    align_column(&mut table, 5, CellAlignment::Center);
    table
}

pub fn selections_table(selections: &[VariableSelection]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Selection"), header_cell("Variables")]);
    apply_table_style(&mut table);
    for selection in selections {
        table.add_row(vec![
            Cell::new(&selection.name),
            Cell::new(selection.variable_ids.join(", ")),
        ]);
    }
    table
}
