//! TOML variable catalogs.
//!
//! A catalog is a list of `[[variables]]` tables:
//!
//! ```toml
//! [[variables]]
//! kind = "categorical"
//! id = "BOR"
//! name = "Best overall response"
//!
//! [[variables]]
//! kind = "iterated"
//! iteration_kind = "scalar"
//! id = "TIEMPO IT{N}"
//! name = "Extraction time (months)"
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::VariableConfig;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VariableCatalog {
    #[serde(default)]
    pub variables: Vec<VariableConfig>,
}

impl VariableCatalog {
    pub fn new(variables: Vec<VariableConfig>) -> Self {
        Self { variables }
    }

    /// Parse a catalog from TOML text. `origin` is only used in error messages.
    pub fn from_toml_str(contents: &str, origin: &Path) -> Result<Self, ConfigError> {
        let catalog: Self = toml::from_str(contents).map_err(|source| ConfigError::Toml {
            path: origin.to_path_buf(),
            source,
        })?;
        for config in &catalog.variables {
            config.validate()?;
        }
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Self::from_toml_str(&contents, path)
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn extend(&mut self, other: VariableCatalog) {
        self.variables.extend(other.variables);
    }
}

impl IntoIterator for VariableCatalog {
    type Item = VariableConfig;
    type IntoIter = std::vec::IntoIter<VariableConfig>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.into_iter()
    }
}
