//! Error taxonomy for variable binding and lookup.

use std::path::PathBuf;

use thiserror::Error;

/// A variable that could not be bound to a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "'{id}' not present in dataset {} (expected column '{expected}'{})",
    dataset_label(.dataset),
    similar_suffix(.similar)
)]
pub struct ValidationError {
    /// Offending variable id.
    pub id: String,
    /// Name of the dataset the variable was checked against, if it has one.
    pub dataset: Option<String>,
    /// Column the variable expected to find.
    pub expected: String,
    /// Columns of the dataset that look similar to the expected one.
    pub similar: Vec<String>,
}

impl ValidationError {
    pub fn missing_column(id: impl Into<String>, dataset: Option<&str>) -> Self {
        let id = id.into();
        Self {
            expected: id.clone(),
            id,
            dataset: dataset.map(str::to_string),
            similar: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_similar(mut self, similar: Vec<String>) -> Self {
        self.similar = similar;
        self
    }
}

fn dataset_label(dataset: &Option<String>) -> &str {
    dataset.as_deref().unwrap_or("<unnamed>")
}

fn similar_suffix(similar: &[String]) -> String {
    if similar.is_empty() {
        String::new()
    } else {
        format!(", similar: {}", similar.join(", "))
    }
}

/// Every validation failure found while binding a registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} variable(s) failed validation{}", .0.len(), error_list(.0))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl ValidationErrors {
    pub fn ids(&self) -> Vec<&str> {
        self.0.iter().map(|error| error.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }
}

fn error_list(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| format!("\n  - {error}"))
        .collect()
}

/// Inconsistent variable configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("duplicate variable ids: {}", ids.join(", "))]
    DuplicateIds { ids: Vec<String> },

    #[error("iteration {index} of '{id}' is provided by several columns: {}", columns.join(", "))]
    DuplicateIteration {
        id: String,
        index: u32,
        columns: Vec<String>,
    },

    #[error("malformed iteration pattern '{id}': {message}")]
    MalformedPattern { id: String, message: String },

    #[error("column '{column}' matches several iteration patterns: {}", patterns.join(", "))]
    OverlappingPatterns {
        column: String,
        patterns: Vec<String>,
    },

    #[error("invalid option for '{id}': {message}")]
    InvalidOption { id: String, message: String },
}

/// A requested variable, kind or column does not exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("unknown variable '{id}'")]
    UnknownVariable { id: String },

    #[error("column '{column}' not found in dataset")]
    MissingColumn { column: String },

    #[error("variable '{id}' has no iterations available")]
    NoIterations { id: String },

    #[error("variable '{id}' is a {found} variable, expected {expected}")]
    WrongKind {
        id: String,
        expected: String,
        found: String,
    },
}

/// Errors raised by the variable layer.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("variable '{id}' has not been initialized against a dataset")]
    NotInitialized { id: String },

    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    #[error("data error in '{id}': {message}")]
    Data { id: String, message: String },
}

impl From<ValidationError> for Error {
    fn from(error: ValidationError) -> Self {
        Self::Validation(ValidationErrors(vec![error]))
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures reading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ConfigurationError),
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
