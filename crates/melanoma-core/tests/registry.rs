//! Registry construction, binding and lookups.

mod common;

use common::{bound_registry, cohort, cohort_frame, configs};
use melanoma_core::VariableRegistry;
use melanoma_ingest::Dataset;
use melanoma_model::{
    ConfigurationError, Error, LookupError, VariableCatalog, VariableConfig, VariableKind,
};
use polars::prelude::*;

#[test]
fn duplicate_ids_are_all_reported() {
    let result = VariableRegistry::new(vec![
        VariableConfig::categorical("BOR", "Response"),
        VariableConfig::scalar("EDAD", "Age"),
        VariableConfig::scalar("BOR", "Response again"),
        VariableConfig::scalar("EDAD", "Age again"),
        VariableConfig::scalar("VALOR", "Value"),
    ]);
    let Err(Error::Configuration(ConfigurationError::DuplicateIds { ids })) = result else {
        panic!("expected duplicate ids");
    };
    assert_eq!(ids, vec!["BOR", "EDAD"]);
}

#[test]
fn every_missing_column_is_reported() {
    let mut configs = configs();
    configs.push(VariableConfig::scalar("LDH BASAL", "Baseline LDH"));
    configs.push(VariableConfig::categorical("ECOG", "ECOG"));
    let mut registry = VariableRegistry::new(configs).unwrap();

    let Err(Error::Validation(errors)) = registry.init_from_dataframe(&cohort()) else {
        panic!("expected validation errors");
    };
    assert_eq!(errors.ids(), vec!["LDH BASAL", "ECOG"]);
    assert!(errors.iter().all(|e| e.dataset.as_deref() == Some("melanoma")));
    assert!(errors.to_string().contains("2 variable(s) failed validation"));
}

#[test]
fn failed_binding_leaves_registry_unbound() {
    let mut registry = VariableRegistry::new(vec![
        VariableConfig::categorical("BOR", "Response"),
        VariableConfig::scalar("NOPE", "Absent"),
        VariableConfig::iterated("LDH IT{N}", "LDH", VariableKind::Scalar),
    ])
    .unwrap();
    assert!(registry.init_from_dataframe(&cohort()).is_err());
    assert!(registry.iter().all(|variable| !variable.is_bound()));
    assert!(registry.get("LDH IT{N}").unwrap().iterations().is_empty());
}

#[test]
fn failed_rebinding_keeps_previous_bindings() {
    let dataset = cohort();
    let mut registry = bound_registry(&dataset);
    let frame = DataFrame::new(vec![
        Series::new("BOR".into(), [Some("CR")]).into_column(),
    ])
    .unwrap();
    assert!(registry.init_from_dataframe(&Dataset::named("other", frame)).is_err());

    let bor = registry.get("BOR").unwrap();
    assert_eq!(bor.unique_id(), Some("melanoma.BOR"));
    assert_eq!(registry.get("LDH IT{N}").unwrap().iteration_indices(), vec![1, 2, 5]);
}

#[test]
fn duplicate_iteration_index() {
    let mut columns = cohort_frame().get_columns().to_vec();
    columns.push(Series::new("TIEMPO IT02".into(), [1.0f64, 2.0, 3.0, 4.0]).into_column());
    let dataset = Dataset::named("melanoma", DataFrame::new(columns).unwrap());

    let mut registry = VariableRegistry::new(configs()).unwrap();
    let result = registry.init_from_dataframe(&dataset);
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::DuplicateIteration { index: 2, .. }))
    ));
}

#[test]
fn overlapping_patterns() {
    let frame = DataFrame::new(vec![
        Series::new("LDH IT12".into(), [1.0f64]).into_column(),
    ])
    .unwrap();
    let dataset = Dataset::new(frame);
    let mut registry = VariableRegistry::new(vec![
        VariableConfig::iterated("LDH IT{N}", "LDH", VariableKind::Scalar),
        VariableConfig::iterated("LDH IT1{N}", "LDH tens", VariableKind::Scalar),
    ])
    .unwrap();

    let Err(Error::Configuration(ConfigurationError::OverlappingPatterns { column, patterns })) =
        registry.init_from_dataframe(&dataset)
    else {
        panic!("expected overlapping patterns");
    };
    assert_eq!(column, "LDH IT12");
    assert_eq!(patterns, vec!["LDH IT{N}", "LDH IT1{N}"]);
}

#[test]
fn malformed_pattern_fails_at_construction() {
    let result = VariableRegistry::new(vec![VariableConfig::iterated(
        "LDH",
        "LDH",
        VariableKind::Scalar,
    )]);
    assert!(matches!(
        result,
        Err(Error::Configuration(ConfigurationError::MalformedPattern { .. }))
    ));
}

#[test]
fn lookups() {
    let dataset = cohort();
    let registry = bound_registry(&dataset);

    assert_eq!(registry.len(), 7);
    assert!(registry.contains("BOR"));
    assert!(matches!(
        registry.get("ECOG"),
        Err(LookupError::UnknownVariable { .. })
    ));

    let ids = |variables: Vec<&melanoma_core::Variable>| -> Vec<String> {
        variables.iter().map(|v| v.id().to_string()).collect()
    };
    assert_eq!(
        ids(registry.by_kinds(&[VariableKind::Scalar, VariableKind::Boolean])),
        vec!["EDAD", "EXITUS", "VALOR"]
    );
    assert_eq!(ids(registry.by_kind(VariableKind::Datetime)), vec!["FECHA DX"]);
    assert_eq!(registry.selectable().len(), 6);
    assert_eq!(
        ids(registry.selectable_by_kinds(&[VariableKind::Scalar])),
        vec!["EDAD"]
    );
}

#[test]
fn iteration_lookup() {
    let dataset = cohort();
    let registry = bound_registry(&dataset);

    let iterations = registry.iterations_of("TIEMPO IT{N}").unwrap();
    assert_eq!(iterations.len(), 3);
    assert_eq!(iterations[1].variable.id(), "TIEMPO IT2");

    assert!(matches!(
        registry.iterations_of("BOR"),
        Err(LookupError::WrongKind { .. })
    ));

    let mut empty = VariableRegistry::new(vec![VariableConfig::iterated(
        "CEA IT{N}",
        "CEA",
        VariableKind::Scalar,
    )])
    .unwrap();
    empty.init_from_dataframe(&dataset).unwrap();
    assert!(matches!(
        empty.iterations_of("CEA IT{N}"),
        Err(LookupError::NoIterations { .. })
    ));
}

#[test]
fn registry_from_catalog() {
    let catalog = VariableCatalog::from_toml_str(
        r#"
[[variables]]
kind = "categorical"
id = "BOR"
name = "Best overall response"

[[variables]]
kind = "iterated"
iteration_kind = "scalar"
id = "LDH IT{N}"
"#,
        std::path::Path::new("variables.toml"),
    )
    .unwrap();
    let mut registry = VariableRegistry::from_catalog(catalog).unwrap();
    registry.init_from_dataframe(&cohort()).unwrap();
    assert_eq!(
        registry.get("LDH IT{N}").unwrap().iteration_indices(),
        vec![1, 2, 5]
    );
}
