//! Cross-renderer tests over formatted statistics.

use chrono::NaiveDate;
use melanoma_model::{StatValue, StatisticsTable};
use melanoma_report::{
    NamedStatistics, StatisticsFormatter, terminal_table, to_csv, to_markdown,
};

fn response_table() -> StatisticsTable {
    let mut table = StatisticsTable::ungrouped("BOR");
    table.push_row(
        "CR",
        vec![StatValue::Frequency {
            count: 1,
            percentage: Some(100.0 / 3.0),
        }],
    );
    table.push_row(
        "PR",
        vec![StatValue::Frequency {
            count: 2,
            percentage: Some(200.0 / 3.0),
        }],
    );
    table.push_row(
        "Missing",
        vec![StatValue::Frequency {
            count: 1,
            percentage: None,
        }],
    );
    table
}

fn diagnosis_table() -> StatisticsTable {
    let first = NaiveDate::from_ymd_opt(2019, 3, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let mut table = StatisticsTable::ungrouped("FECHA DX");
    table.push_row("count", vec![StatValue::Count(2)]);
    table.push_row("min", vec![StatValue::DateTime(first)]);
    table.push_row("span (days)", vec![StatValue::Days(31)]);
    table
}

#[test]
fn csv_and_terminal_cells_are_identical() {
    let responses = response_table();
    let diagnosis = diagnosis_table();
    let formatted = StatisticsFormatter::new().format_all(&[
        NamedStatistics::new("Best overall response", &responses),
        NamedStatistics::new("Diagnosis date", &diagnosis),
    ]);

    let csv = to_csv(&formatted).unwrap();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(csv.as_bytes());
    let header: Vec<String> = reader
        .headers()
        .unwrap()
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(header, formatted.header);
    let csv_rows: Vec<Vec<String>> = reader
        .records()
        .map(|record| record.unwrap().iter().map(str::to_string).collect())
        .collect();
    assert_eq!(csv_rows, formatted.rows);

    let terminal = terminal_table(&formatted);
    let terminal_rows: Vec<Vec<String>> = terminal
        .row_iter()
        .map(|row| row.cell_iter().map(|cell| cell.content()).collect())
        .collect();
    assert_eq!(terminal_rows, formatted.rows);
}

#[test]
fn markdown_layout() {
    let responses = response_table();
    let formatted = StatisticsFormatter::new().format("Best overall response", &responses);
    insta::assert_snapshot!(to_markdown(&formatted), @r"
    | Variable | Statistic | All |
    | --- | --- | ---: |
    | Best overall response | CR | 1 (33.3%) |
    |  | PR | 2 (66.7%) |
    |  | Missing | 1 |
    ");
}

#[test]
fn datetime_cells() {
    let diagnosis = diagnosis_table();
    let formatted = StatisticsFormatter::new().format("Diagnosis date", &diagnosis);
    assert_eq!(formatted.cell(1, "All"), Some("2019-03-02"));
    assert_eq!(formatted.cell(2, "All"), Some("31"));
}
