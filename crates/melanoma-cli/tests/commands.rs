//! End-to-end command runs over a CSV cohort written to a temp directory.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use tempfile::TempDir;

use melanoma_cli::cli::Cli;
use melanoma_cli::commands::{Session, execute, kinetics_table};
use melanoma_core::{KineticsPoint, PatientKinetics};

const COHORT_CSV: &str = "\
NUMERO,BOR,EDAD,EXITUS,FECHA DX,TIEMPO IT1,TIEMPO IT2,TIEMPO IT5,LDH IT1,LDH IT2,LDH IT5
P1,CR,50,SI,2019-03-02,0,3,9,200,210,220
P2,PR,60,NO,2019-04-02,0,3,,250,,
P3,PR,,no,,0,,,300,,
P4,,70,,02/05/2019,0,6,12,180,190,170
";

const APP_CONFIG: &str = r#"
catalogs = ["repeated.toml"]
selections = "selections"

[database]
path = "cohort.csv"
name = "melanoma"
patient_id = "NUMERO"

[[variables]]
kind = "categorical"
id = "BOR"
name = "Best overall response"

[[variables]]
kind = "scalar"
id = "EDAD"
name = "Age"

[[variables]]
kind = "boolean"
id = "EXITUS"
name = "Deceased"
"#;

const REPEATED_CATALOG: &str = r#"
[[variables]]
kind = "datetime"
id = "FECHA DX"
name = "Diagnosis date"

[[variables]]
kind = "iterated"
id = "TIEMPO IT{N}"
name = "Extraction time"
iteration_kind = "scalar"

[[variables]]
kind = "iterated"
id = "LDH IT{N}"
name = "LDH"
iteration_kind = "scalar"
"#;

struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("cohort.csv"), COHORT_CSV).unwrap();
        fs::write(dir.path().join("melanoma.toml"), APP_CONFIG).unwrap();
        fs::write(dir.path().join("repeated.toml"), REPEATED_CATALOG).unwrap();
        fs::create_dir(dir.path().join("selections")).unwrap();
        Self { dir }
    }

    fn config(&self) -> PathBuf {
        self.dir.path().join("melanoma.toml")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn run(&self, args: &[&str]) -> anyhow::Result<String> {
        let config = self.config();
        let mut argv = vec!["melanoma", "--config", config.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv)?;
        let mut out = Vec::new();
        execute(&cli, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }
}

fn csv_rows(output: &str) -> Vec<Vec<String>> {
    csv_lines(output)
        .map(|line| line.split(',').map(str::to_string).collect())
        .collect()
}

fn csv_lines(output: &str) -> impl Iterator<Item = &str> {
    output.lines().filter(|line| !line.is_empty())
}

#[test]
fn session_binds_inline_and_catalog_variables() {
    let fixture = Fixture::new();
    let session = Session::open(&fixture.config(), None).unwrap();
    assert_eq!(session.registry.len(), 6);
    let ldh = session.registry.get("LDH IT{N}").unwrap();
    assert_eq!(ldh.iteration_indices(), vec![1, 2, 5]);
    assert_eq!(
        session.registry.get("BOR").unwrap().unique_id(),
        Some("melanoma.BOR")
    );
    assert_eq!(
        session.selections.as_deref(),
        Some(fixture.path("selections").as_path())
    );
}

#[test]
fn variables_lists_iterations() {
    let fixture = Fixture::new();
    let output = fixture.run(&["variables", "--kind", "iterated"]).unwrap();
    assert!(output.contains("LDH IT{N}"));
    assert!(output.contains("TIEMPO IT{N}"));
    assert!(output.contains("3 x scalar"));
    assert!(!output.contains("Best overall response"));
}

#[test]
fn variables_rejects_unknown_kind() {
    let fixture = Fixture::new();
    let err = fixture.run(&["variables", "--kind", "text"]).unwrap_err();
    assert!(err.to_string().contains("Unknown variable kind"));
}

#[test]
fn stats_csv_reports_frequencies() {
    let fixture = Fixture::new();
    let output = fixture.run(&["stats", "BOR", "--format", "csv"]).unwrap();
    let rows = csv_rows(&output);
    assert_eq!(rows[0], vec!["Variable", "Statistic", "All"]);
    assert_eq!(rows[1], vec!["Best overall response", "CR", "1 (33.3%)"]);
    assert_eq!(rows[2], vec!["", "PR", "2 (66.7%)"]);
    assert_eq!(rows[3], vec!["", "Missing", "1"]);
}

#[test]
fn stats_total_base_counts_missing_rows() {
    let fixture = Fixture::new();
    let output = fixture
        .run(&["stats", "BOR", "--format", "csv", "--percentages", "total"])
        .unwrap();
    let rows = csv_rows(&output);
    assert_eq!(rows[1][2], "1 (25.0%)");
    assert_eq!(rows[2][2], "2 (50.0%)");
}

#[test]
fn stats_group_by_adds_columns() {
    let fixture = Fixture::new();
    let output = fixture
        .run(&["stats", "EXITUS", "--group-by", "BOR", "--format", "csv"])
        .unwrap();
    let rows = csv_rows(&output);
    assert_eq!(rows[0], vec!["Variable", "Statistic", "CR", "PR"]);
}

#[test]
fn stats_unknown_variable_fails() {
    let fixture = Fixture::new();
    let err = fixture.run(&["stats", "NOPE"]).unwrap_err();
    assert!(format!("{err:#}").contains("NOPE"));
}

#[test]
fn saved_selection_is_listed_and_reused() {
    let fixture = Fixture::new();
    let saved = fixture.path("selections").join("baseline.json");
    fixture
        .run(&[
            "stats",
            "BOR",
            "EDAD",
            "--format",
            "csv",
            "--save-selection",
            saved.to_str().unwrap(),
        ])
        .unwrap();
    assert!(saved.exists());

    let listing = fixture.run(&["selections"]).unwrap();
    assert!(listing.contains("baseline"));
    assert!(listing.contains("BOR, EDAD"));

    let output = fixture
        .run(&["stats", "--selection", "baseline.json", "--format", "csv"])
        .unwrap();
    assert!(output.contains("Best overall response"));
    assert!(output.contains("Age"));
}

#[test]
fn filter_by_category() {
    let fixture = Fixture::new();
    let output = fixture.run(&["filter", "--where", "BOR=PR", "--list"]).unwrap();
    let lines: Vec<&str> = csv_lines(&output).collect();
    assert_eq!(lines, vec!["2 of 4 patients", "P2", "P3"]);
}

#[test]
fn filter_by_iteration_range() {
    let fixture = Fixture::new();
    let output = fixture
        .run(&["filter", "--between", "TIEMPO IT{N}:5:10", "--list"])
        .unwrap();
    let lines: Vec<&str> = csv_lines(&output).collect();
    assert_eq!(lines, vec!["2 of 4 patients", "P1", "P4"]);
}

#[test]
fn filters_combine() {
    let fixture = Fixture::new();
    let output = fixture
        .run(&[
            "filter",
            "--where",
            "BOR=CR,PR",
            "--at",
            "TIEMPO IT{N}:3",
        ])
        .unwrap();
    assert_eq!(output.trim(), "2 of 4 patients");
}

#[test]
fn filter_exports_selected_columns() {
    let fixture = Fixture::new();
    let export = fixture.path("partial.csv");
    let output = fixture
        .run(&[
            "filter",
            "--where",
            "BOR=PR",
            "--columns",
            "EDAD",
            "--columns",
            "LDH IT{N}",
            "--output",
            export.to_str().unwrap(),
        ])
        .unwrap();
    assert_eq!(output.trim(), "2 of 4 patients");

    let written = fs::read_to_string(&export).unwrap();
    let rows = csv_rows(&written);
    assert_eq!(rows[0], vec!["NUMERO", "EDAD", "LDH IT1", "LDH IT2", "LDH IT5"]);
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][0], "P2");
    assert_eq!(rows[2][0], "P3");
}

#[test]
fn filter_exports_every_column_by_default() {
    let fixture = Fixture::new();
    let export = fixture.path("all.csv");
    fixture
        .run(&["filter", "--output", export.to_str().unwrap()])
        .unwrap();
    let written = fs::read_to_string(&export).unwrap();
    let header = csv_lines(&written).next().unwrap();
    assert_eq!(header, csv_lines(COHORT_CSV).next().unwrap());
    assert_eq!(csv_lines(&written).count(), 5);
}

#[test]
fn export_of_unknown_variable_fails() {
    let fixture = Fixture::new();
    let export = fixture.path("nope.csv");
    let err = fixture
        .run(&["filter", "--columns", "NOPE", "--output", export.to_str().unwrap()])
        .unwrap_err();
    assert!(format!("{err:#}").contains("NOPE"));
    assert!(!export.exists());
}

#[test]
fn categorical_filter_on_scalar_fails() {
    let fixture = Fixture::new();
    assert!(fixture.run(&["filter", "--where", "EDAD=50"]).is_err());
}

#[test]
fn kinetics_json_follows_iterations() {
    let fixture = Fixture::new();
    let output = fixture
        .run(&[
            "kinetics",
            "--value",
            "LDH IT{N}",
            "--patient",
            "P1",
            "--format",
            "json",
        ])
        .unwrap();
    let series: serde_json::Value = serde_json::from_str(&output).unwrap();
    let series = series.as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["patient_id"], "P1");
    let indices: Vec<u64> = series[0]["points"]
        .as_array()
        .unwrap()
        .iter()
        .map(|point| point["index"].as_u64().unwrap())
        .collect();
    assert_eq!(indices, vec![1, 2, 5]);
    assert_eq!(series[0]["points"][2]["value"], 220.0);
}

#[test]
fn kinetics_csv_has_one_row_per_point() {
    let fixture = Fixture::new();
    let output = fixture
        .run(&["kinetics", "--value", "LDH IT{N}", "--format", "csv"])
        .unwrap();
    let rows = csv_rows(&output);
    assert_eq!(rows[0], vec!["Patient", "Iteration", "Time", "Value"]);
    // P1: 3 points, P2: 1, P3: 1, P4: 3.
    assert_eq!(rows.len(), 1 + 8);
}

#[test]
fn kinetics_table_keeps_patients_without_points() {
    let series = vec![
        PatientKinetics {
            patient_id: "P1".to_string(),
            points: vec![KineticsPoint {
                index: 1,
                time: 0.0,
                value: 200.0,
            }],
        },
        PatientKinetics {
            patient_id: "P9".to_string(),
            points: Vec::new(),
        },
    ];
    let table = kinetics_table(&series);
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[1], vec!["P9", "", "", ""]);
}

#[test]
fn data_flag_overrides_configured_csv() {
    let fixture = Fixture::new();
    let other = fixture.path("other.csv");
    let trimmed: String = COHORT_CSV.lines().take(3).map(|line| format!("{line}\n")).collect();
    fs::write(&other, trimmed).unwrap();
    let output = fixture
        .run(&["--data", other.to_str().unwrap(), "filter"])
        .unwrap();
    assert_eq!(output.trim(), "2 of 2 patients");
}

#[test]
fn missing_config_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = Session::open(&path, None).err().unwrap();
    assert!(format!("{err:#}").contains("absent.toml"));
}

#[test]
fn missing_columns_fail_binding() {
    let fixture = Fixture::new();
    let path: &Path = &fixture.path("cohort.csv");
    fs::write(path, "NUMERO,BOR\nP1,CR\n").unwrap();
    let err = Session::open(&fixture.config(), None).err().unwrap();
    let message = format!("{err:#}");
    assert!(message.contains("EDAD"));
    assert!(message.contains("EXITUS"));
}
