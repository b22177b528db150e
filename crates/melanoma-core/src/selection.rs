//! Named variable selections stored as JSON files.
//!
//! ```json
//! {"name": "Baseline", "variables": ["EDAD", "BOR"]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use melanoma_model::LookupError;

use crate::registry::VariableRegistry;
use crate::variable::Variable;

#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse selection {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableSelection {
    pub name: String,
    #[serde(rename = "variables")]
    pub variable_ids: Vec<String>,
}

impl VariableSelection {
    pub fn new<I, S>(name: impl Into<String>, variable_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            variable_ids: variable_ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_variables<'a>(
        name: impl Into<String>,
        variables: impl IntoIterator<Item = &'a Variable>,
    ) -> Self {
        Self::new(name, variables.into_iter().map(|v| v.id().to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, SelectionError> {
        let contents = fs::read_to_string(path).map_err(|source| SelectionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| SelectionError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), SelectionError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| SelectionError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| SelectionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), variables = self.variable_ids.len(), "Saved selection");
        Ok(())
    }

    /// Registry variables in selection order.
    pub fn resolve<'r>(
        &self,
        registry: &'r VariableRegistry,
    ) -> Result<Vec<&'r Variable>, LookupError> {
        self.variable_ids
            .iter()
            .map(|id| registry.get(id))
            .collect()
    }
}

/// `*.json` files in `dir`, sorted by path.
pub fn list_selections(dir: &Path) -> Result<Vec<PathBuf>, SelectionError> {
    let entries = fs::read_dir(dir).map_err(|source| SelectionError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
        })
        .collect();
    paths.sort();
    Ok(paths)
}
