//! Application configuration file.
//!
//! ```toml
//! catalogs = ["variables/biomarkers.toml"]
//! selections = "selections"
//!
//! [database]
//! path = "data/melanoma.csv"
//! name = "melanoma"
//! patient_id = "NUMERO"
//!
//! [[variables]]
//! kind = "categorical"
//! id = "BOR"
//! name = "Best overall response"
//! ```
//!
//! Relative paths are resolved against the directory of the config file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use melanoma_ingest::DatabaseSource;
use melanoma_model::{ConfigError, VariableCatalog, VariableConfig};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseSource,
    /// Additional catalog files, read in order after the inline variables.
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
    /// Directory of saved variable selections.
    #[serde(default)]
    pub selections: Option<PathBuf>,
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_toml_str(&contents, path, base)
    }

    /// Parse `contents`; `origin` names the file in errors and `base` anchors
    /// relative paths.
    pub fn from_toml_str(contents: &str, origin: &Path, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        for variable in &config.variables {
            variable.validate()?;
        }
        config.database.path = resolve(base, &config.database.path);
        config.catalogs = config
            .catalogs
            .iter()
            .map(|catalog| resolve(base, catalog))
            .collect();
        config.selections = config.selections.map(|dir| resolve(base, &dir));
        Ok(config)
    }

    /// Inline variables followed by every catalog's variables.
    pub fn variable_catalog(&self) -> Result<VariableCatalog, ConfigError> {
        let mut catalog = VariableCatalog::new(self.variables.clone());
        for path in &self.catalogs {
            let extra = VariableCatalog::load(path)?;
            debug!(path = %path.display(), variables = extra.len(), "Loaded variable catalog");
            catalog.extend(extra);
        }
        Ok(catalog)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use melanoma_model::VariableKind;

    const CONFIG: &str = r#"
catalogs = ["extra.toml"]

[database]
path = "data/melanoma.csv"
patient_id = "NUMERO"

[[variables]]
kind = "categorical"
id = "BOR"
name = "Best overall response"

[[variables]]
kind = "scalar"
id = "EDAD"
name = "Age"
"#;

    #[test]
    fn resolves_paths_against_config_dir() {
        let config =
            AppConfig::from_toml_str(CONFIG, Path::new("conf/app.toml"), Path::new("conf"))
                .expect("parse config");
        assert_eq!(config.database.path, Path::new("conf/data/melanoma.csv"));
        assert_eq!(config.database.patient_id.as_deref(), Some("NUMERO"));
        assert_eq!(config.catalogs, vec![PathBuf::from("conf/extra.toml")]);
        assert!(config.selections.is_none());
        assert_eq!(config.variables.len(), 2);
        assert_eq!(config.variables[0].kind(), VariableKind::Categorical);
    }

    #[test]
    fn parse_errors_name_the_file() {
        let err = AppConfig::from_toml_str("[database", Path::new("bad.toml"), Path::new(""))
            .expect_err("invalid TOML");
        assert!(matches!(err, ConfigError::Toml { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn missing_database_section_is_rejected() {
        let err = AppConfig::from_toml_str("variables = []", Path::new("app.toml"), Path::new(""))
            .expect_err("no database");
        assert!(err.to_string().contains("database"));
    }
}
