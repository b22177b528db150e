//! Parsing of `--where`, `--between` and `--at` filter arguments.

use anyhow::{Context, Result, anyhow, bail};

use melanoma_core::{CategoricalFilter, IterationFilter, VariableRegistry};
use melanoma_ingest::RowFilter;

use crate::cli::FilterOptions;

/// One parsed filter argument.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    Categorical { id: String, values: Vec<String> },
    Between { reference: String, low: f64, high: f64 },
    At { reference: String, value: f64 },
}

impl FilterSpec {
    /// `ID=VALUE[,VALUE...]`
    pub fn parse_categorical(arg: &str) -> Result<Self> {
        let (id, values) = arg
            .split_once('=')
            .ok_or_else(|| anyhow!("expected ID=VALUES, got `{arg}`"))?;
        let id = id.trim();
        if id.is_empty() {
            bail!("missing variable id in `{arg}`");
        }
        let values = values
            .split(',')
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(String::from)
            .collect();
        Ok(Self::Categorical {
            id: id.to_string(),
            values,
        })
    }

    /// `REFERENCE:LOW:HIGH`. The reference may itself contain colons.
    pub fn parse_between(arg: &str) -> Result<Self> {
        let mut parts = arg.rsplitn(3, ':');
        let (Some(high), Some(low), Some(reference)) = (parts.next(), parts.next(), parts.next())
        else {
            bail!("expected REFERENCE:LOW:HIGH, got `{arg}`");
        };
        Ok(Self::Between {
            reference: reference_id(reference, arg)?,
            low: parse_number(low, arg)?,
            high: parse_number(high, arg)?,
        })
    }

    /// `REFERENCE:VALUE`
    pub fn parse_at(arg: &str) -> Result<Self> {
        let (reference, value) = arg
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("expected REFERENCE:VALUE, got `{arg}`"))?;
        Ok(Self::At {
            reference: reference_id(reference, arg)?,
            value: parse_number(value, arg)?,
        })
    }

    /// Every filter of `options`, categorical ones first.
    pub fn from_options(options: &FilterOptions) -> Result<Vec<Self>> {
        let categorical = options
            .categorical
            .iter()
            .map(|arg| Self::parse_categorical(arg));
        let between = options.between.iter().map(|arg| Self::parse_between(arg));
        let at = options.at.iter().map(|arg| Self::parse_at(arg));
        categorical.chain(between).chain(at).collect()
    }

    /// Build the row filter over the registry's variables.
    pub fn build<'r>(&self, registry: &'r VariableRegistry) -> Result<Box<dyn RowFilter + 'r>> {
        let filter: Box<dyn RowFilter + 'r> = match self {
            Self::Categorical { id, values } => {
                let variable = registry.get(id)?;
                Box::new(
                    CategoricalFilter::new(variable, values.iter().cloned())
                        .with_context(|| format!("filter on {id}"))?,
                )
            }
            Self::Between {
                reference,
                low,
                high,
            } => {
                let variable = registry.get(reference)?;
                Box::new(
                    IterationFilter::any_between(variable, *low, *high)
                        .with_context(|| format!("filter on {reference}"))?,
                )
            }
            Self::At { reference, value } => {
                let variable = registry.get(reference)?;
                Box::new(
                    IterationFilter::at(variable, *value)
                        .with_context(|| format!("filter on {reference}"))?,
                )
            }
        };
        Ok(filter)
    }
}

/// Parse and build every filter of `options`.
pub fn build_filters<'r>(
    registry: &'r VariableRegistry,
    options: &FilterOptions,
) -> Result<Vec<Box<dyn RowFilter + 'r>>> {
    FilterSpec::from_options(options)?
        .iter()
        .map(|spec| spec.build(registry))
        .collect()
}

fn reference_id(reference: &str, arg: &str) -> Result<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        bail!("missing reference variable in `{arg}`");
    }
    Ok(reference.to_string())
}

fn parse_number(value: &str, arg: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .with_context(|| format!("invalid number `{value}` in `{arg}`"))
}
