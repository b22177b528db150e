//! Shared cohort fixture.
#![allow(dead_code)]

use melanoma_core::VariableRegistry;
use melanoma_ingest::Dataset;
use melanoma_model::{VariableConfig, VariableKind};
use polars::prelude::*;

fn text(name: &str, values: &[Option<&str>]) -> Column {
    Series::new(name.into(), values).into_column()
}

fn number(name: &str, values: &[Option<f64>]) -> Column {
    Series::new(name.into(), values).into_column()
}

/// Four patients with responses, ages, vital status, diagnosis dates and
/// three extraction iterations (1, 2 and 5).
pub fn cohort_frame() -> DataFrame {
    DataFrame::new(vec![
        text("NUMERO", &[Some("P1"), Some("P2"), Some("P3"), Some("P4")]),
        text("BOR", &[Some("CR"), Some("PR"), Some("PR"), None]),
        number("EDAD", &[Some(50.0), Some(60.0), None, Some(70.0)]),
        text("EXITUS", &[Some("SI"), Some("NO"), Some("no"), None]),
        text(
            "FECHA DX",
            &[Some("2019-03-02"), Some("2019-04-02"), None, Some("02/05/2019")],
        ),
        number("TIEMPO IT1", &[Some(0.0), Some(0.0), Some(0.0), Some(0.0)]),
        number("TIEMPO IT2", &[Some(3.0), Some(3.0), None, Some(6.0)]),
        number("TIEMPO IT5", &[Some(9.0), None, None, Some(12.0)]),
        number("LDH IT1", &[Some(200.0), Some(250.0), Some(300.0), Some(180.0)]),
        number("LDH IT2", &[Some(210.0), None, None, Some(190.0)]),
        number("LDH IT5", &[Some(220.0), None, None, Some(170.0)]),
        number("VALOR", &[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]),
    ])
    .unwrap()
}

pub fn cohort() -> Dataset {
    Dataset::named("melanoma", cohort_frame()).with_patient_id("NUMERO")
}

pub fn configs() -> Vec<VariableConfig> {
    vec![
        VariableConfig::categorical("BOR", "Best overall response"),
        VariableConfig::scalar("EDAD", "Age"),
        VariableConfig::boolean("EXITUS", "Deceased"),
        VariableConfig::datetime("FECHA DX", "Diagnosis date"),
        VariableConfig::iterated("TIEMPO IT{N}", "Extraction time", VariableKind::Scalar),
        VariableConfig::iterated("LDH IT{N}", "LDH", VariableKind::Scalar),
        VariableConfig::scalar("VALOR", "Value").with_selectable(false),
    ]
}

pub fn bound_registry(dataset: &Dataset) -> VariableRegistry {
    let mut registry = VariableRegistry::new(configs()).unwrap();
    registry.init_from_dataframe(dataset).unwrap();
    registry
}
