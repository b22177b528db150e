//! Owning collection of every variable declared for a dataset.

use std::collections::{BTreeMap, HashMap};

use tracing::{info, info_span};

use melanoma_ingest::Dataset;
use melanoma_model::{
    ConfigurationError, Error, LookupError, Result, ValidationErrors, VariableCatalog,
    VariableConfig, VariableKind,
};

use crate::variable::{Iteration, Variable};

#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    variables: Vec<Variable>,
    index: HashMap<String, usize>,
}

impl VariableRegistry {
    /// Build unbound variables from `configs`.
    ///
    /// Every duplicated id is reported in a single
    /// [`ConfigurationError::DuplicateIds`].
    pub fn new(configs: Vec<VariableConfig>) -> Result<Self> {
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for config in &configs {
            *counts.entry(config.id.as_str()).or_default() += 1;
        }
        let duplicates: Vec<String> = counts
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(id, _)| id.to_string())
            .collect();
        if !duplicates.is_empty() {
            return Err(ConfigurationError::DuplicateIds { ids: duplicates }.into());
        }

        let mut variables = Vec::with_capacity(configs.len());
        let mut index = HashMap::with_capacity(configs.len());
        for config in configs {
            index.insert(config.id.clone(), variables.len());
            variables.push(Variable::new(config)?);
        }
        Ok(Self { variables, index })
    }

    pub fn from_catalog(catalog: VariableCatalog) -> Result<Self> {
        Self::new(catalog.variables)
    }

    /// Bind every variable to `dataset`.
    ///
    /// Missing columns are collected and reported together. Configuration
    /// problems (duplicate iterations, a column claimed by two patterns) fail
    /// immediately. On any error the registry keeps its previous bindings.
    pub fn init_from_dataframe(&mut self, dataset: &Dataset) -> Result<()> {
        let span = info_span!(
            "registry_init",
            dataset = dataset.name().unwrap_or("<unnamed>"),
            variables = self.variables.len()
        );
        let _guard = span.enter();

        let mut bound = self.variables.clone();
        let mut failures = Vec::new();
        for variable in &mut bound {
            match variable.init_from_dataframe(dataset) {
                Ok(()) => {}
                Err(Error::Validation(errors)) => failures.extend(errors.0),
                Err(other) => return Err(other),
            }
        }
        if !failures.is_empty() {
            return Err(ValidationErrors(failures).into());
        }

        check_overlapping_patterns(&bound)?;
        self.variables = bound;

        let iterated = self
            .variables
            .iter()
            .filter(|v| v.kind() == VariableKind::Iterated)
            .count();
        info!(
            bound = self.variables.len(),
            iterated,
            selectable = self.selectable().len(),
            "Initialized variable registry"
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Variable> {
        self.variables.iter()
    }

    pub fn get(&self, id: &str) -> std::result::Result<&Variable, LookupError> {
        self.index
            .get(id)
            .map(|idx| &self.variables[*idx])
            .ok_or_else(|| LookupError::UnknownVariable { id: id.to_string() })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Variables of any of `kinds`, in registry order.
    pub fn by_kinds(&self, kinds: &[VariableKind]) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|v| kinds.contains(&v.kind()))
            .collect()
    }

    pub fn by_kind(&self, kind: VariableKind) -> Vec<&Variable> {
        self.by_kinds(&[kind])
    }

    pub fn selectable(&self) -> Vec<&Variable> {
        self.variables.iter().filter(|v| v.selectable()).collect()
    }

    pub fn selectable_by_kinds(&self, kinds: &[VariableKind]) -> Vec<&Variable> {
        self.variables
            .iter()
            .filter(|v| v.selectable() && kinds.contains(&v.kind()))
            .collect()
    }

    /// Resolved iterations of the iterated variable `reference_id`.
    pub fn iterations_of(&self, reference_id: &str) -> std::result::Result<&[Iteration], LookupError> {
        let variable = self.get(reference_id)?;
        if variable.kind() != VariableKind::Iterated {
            return Err(LookupError::WrongKind {
                id: reference_id.to_string(),
                expected: VariableKind::Iterated.to_string(),
                found: variable.kind().to_string(),
            });
        }
        let iterations = variable.iterations();
        if iterations.is_empty() {
            return Err(LookupError::NoIterations {
                id: reference_id.to_string(),
            });
        }
        Ok(iterations)
    }
}

impl<'a> IntoIterator for &'a VariableRegistry {
    type Item = &'a Variable;
    type IntoIter = std::slice::Iter<'a, Variable>;

    fn into_iter(self) -> Self::IntoIter {
        self.variables.iter()
    }
}

/// Fails when one column is claimed as an iteration by two iterated variables.
fn check_overlapping_patterns(variables: &[Variable]) -> Result<()> {
    let mut claims: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for variable in variables {
        for it in variable.iterations() {
            claims
                .entry(it.variable.id())
                .or_default()
                .push(variable.id().to_string());
        }
    }
    if let Some((column, patterns)) = claims.into_iter().find(|(_, p)| p.len() > 1) {
        return Err(ConfigurationError::OverlappingPatterns {
            column: column.to_string(),
            patterns,
        }
        .into());
    }
    Ok(())
}
