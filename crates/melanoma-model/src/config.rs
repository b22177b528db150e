//! Declarative variable descriptors.
//!
//! A [`VariableConfig`] names a dataframe column (or, for iterated variables,
//! a column pattern), gives it a display label and carries the options of its
//! kind. Configs are immutable once built and hold no dataframe state.

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::kind::VariableKind;

/// Placeholder standing for the iteration number in an iterated variable id.
pub const ITERATION_PLACEHOLDER: &str = "{N}";

fn default_selectable() -> bool {
    true
}

/// Immutable descriptor of one variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableConfig {
    /// Dataframe column key (or column pattern for iterated variables).
    pub id: String,
    /// Display label. Falls back to `id` when empty.
    #[serde(default)]
    pub name: String,
    /// Whether the variable is offered for selection.
    #[serde(default = "default_selectable")]
    pub selectable: bool,
    /// Kind tag plus kind-specific options.
    #[serde(flatten)]
    pub options: KindOptions,
}

/// Kind-specific options, tagged by `kind` in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum KindOptions {
    Scalar(ScalarOptions),
    Categorical(CategoricalOptions),
    Boolean(BooleanOptions),
    Datetime(DatetimeOptions),
    Iterated(IteratedOptions),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarOptions {
    /// Decimal places used when displaying aggregates.
    pub decimals: Option<usize>,
}

/// Mapping of one raw cell value to its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub value: String,
    pub label: String,
}

impl CategoryLabel {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoricalOptions {
    /// Ordered value-to-label mapping. Observed values without an entry are
    /// shown verbatim after the mapped ones.
    pub categories: Vec<CategoryLabel>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BooleanOptions {
    /// Text tokens read as `true` (case-insensitive). Empty means the built-in set.
    pub true_values: Vec<String>,
    /// Text tokens read as `false` (case-insensitive). Empty means the built-in set.
    pub false_values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatetimeOptions {
    /// `chrono` format strings tried in order for text cells. Empty means the
    /// built-in set.
    pub formats: Vec<String>,
}

/// Options of an iterated variable: the kind of its sub-variables plus the
/// options of that kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IteratedOptions {
    pub iteration_kind: VariableKind,
    #[serde(default)]
    pub decimals: Option<usize>,
    #[serde(default)]
    pub categories: Vec<CategoryLabel>,
    #[serde(default)]
    pub true_values: Vec<String>,
    #[serde(default)]
    pub false_values: Vec<String>,
    #[serde(default)]
    pub formats: Vec<String>,
}

impl IteratedOptions {
    pub fn new(iteration_kind: VariableKind) -> Self {
        Self {
            iteration_kind,
            decimals: None,
            categories: Vec::new(),
            true_values: Vec::new(),
            false_values: Vec::new(),
            formats: Vec::new(),
        }
    }

    /// Options handed to every sub-variable.
    pub fn element_options(&self, id: &str) -> Result<KindOptions, ConfigurationError> {
        match self.iteration_kind {
            VariableKind::Scalar => Ok(KindOptions::Scalar(ScalarOptions {
                decimals: self.decimals,
            })),
            VariableKind::Categorical => Ok(KindOptions::Categorical(CategoricalOptions {
                categories: self.categories.clone(),
            })),
            VariableKind::Boolean => Ok(KindOptions::Boolean(BooleanOptions {
                true_values: self.true_values.clone(),
                false_values: self.false_values.clone(),
            })),
            VariableKind::Datetime => Ok(KindOptions::Datetime(DatetimeOptions {
                formats: self.formats.clone(),
            })),
            VariableKind::Iterated => Err(ConfigurationError::InvalidOption {
                id: id.to_string(),
                message: "iteration_kind cannot itself be iterated".to_string(),
            }),
        }
    }
}

impl KindOptions {
    pub fn kind(&self) -> VariableKind {
        match self {
            KindOptions::Scalar(_) => VariableKind::Scalar,
            KindOptions::Categorical(_) => VariableKind::Categorical,
            KindOptions::Boolean(_) => VariableKind::Boolean,
            KindOptions::Datetime(_) => VariableKind::Datetime,
            KindOptions::Iterated(_) => VariableKind::Iterated,
        }
    }
}

impl VariableConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, options: KindOptions) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            selectable: true,
            options,
        }
    }

    pub fn scalar(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, KindOptions::Scalar(ScalarOptions::default()))
    }

    pub fn categorical(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, KindOptions::Categorical(CategoricalOptions::default()))
    }

    pub fn boolean(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, KindOptions::Boolean(BooleanOptions::default()))
    }

    pub fn datetime(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(id, name, KindOptions::Datetime(DatetimeOptions::default()))
    }

    pub fn iterated(
        id: impl Into<String>,
        name: impl Into<String>,
        iteration_kind: VariableKind,
    ) -> Self {
        Self::new(
            id,
            name,
            KindOptions::Iterated(IteratedOptions::new(iteration_kind)),
        )
    }

    #[must_use]
    pub fn with_selectable(mut self, selectable: bool) -> Self {
        self.selectable = selectable;
        self
    }

    /// Attach a category mapping (categorical, or iterated over categorical).
    #[must_use]
    pub fn with_categories(mut self, categories: Vec<CategoryLabel>) -> Self {
        match &mut self.options {
            KindOptions::Categorical(options) => options.categories = categories,
            KindOptions::Iterated(options) => options.categories = categories,
            _ => {}
        }
        self
    }

    pub fn kind(&self) -> VariableKind {
        self.options.kind()
    }

    /// Display label, falling back to the id.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.id
        } else {
            &self.name
        }
    }

    /// Check the descriptor on its own, before any dataframe is involved.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.id.trim().is_empty() {
            return Err(ConfigurationError::InvalidOption {
                id: self.id.clone(),
                message: "variable id must not be empty".to_string(),
            });
        }
        if let KindOptions::Iterated(options) = &self.options {
            options.element_options(&self.id)?;
            let placeholders = self.id.matches(ITERATION_PLACEHOLDER).count();
            if placeholders != 1 {
                return Err(ConfigurationError::MalformedPattern {
                    id: self.id.clone(),
                    message: format!(
                        "expected exactly one '{ITERATION_PLACEHOLDER}' placeholder, found {placeholders}"
                    ),
                });
            }
        }
        Ok(())
    }
}
