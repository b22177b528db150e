//! Typed variable layer over the melanoma patient database.
//!
//! - [`Variable`]: binding of a declared field to a dataset column, with
//!   kind-specific statistics
//! - [`IterationResolver`]: groups repeated-measurement columns (`LDH IT1`,
//!   `LDH IT2`, ...) under one iterated variable
//! - [`VariableRegistry`]: every variable of a dataset, uniquely identified
//! - [`CategoricalFilter`] and [`IterationFilter`]: row filters
//! - [`patient_kinetics`]: per-patient series over iterations
//! - [`VariableSelection`]: named variable lists stored as JSON
//!
//! # Example
//!
//! ```ignore
//! use melanoma_core::VariableRegistry;
//! use melanoma_model::{StatisticsOptions, VariableConfig};
//!
//! let mut registry = VariableRegistry::new(vec![
//!     VariableConfig::categorical("BOR", "Best overall response"),
//!     VariableConfig::scalar("EDAD", "Age"),
//! ])?;
//! registry.init_from_dataframe(&dataset)?;
//!
//! let age = registry.get("EDAD")?;
//! let bor = registry.get("BOR")?;
//! let table = age.descriptive_statistics(&dataset, &[bor], StatisticsOptions::default())?;
//! ```

pub mod filter;
pub mod iteration;
pub mod kinetics;
pub mod registry;
pub mod selection;
pub mod statistics;
pub mod values;
pub mod variable;

pub use filter::{CategoricalFilter, IterationCriterion, IterationFilter};
pub use iteration::IterationResolver;
pub use kinetics::{KineticsPoint, PatientKinetics, patient_kinetics};
pub use registry::VariableRegistry;
pub use selection::{SelectionError, VariableSelection, list_selections};
pub use variable::{
    ITERATION_COLUMN_PREFIX, IteratedData, Iteration, IterationSummary, ParentRef, Variable,
    VariableData, qualified_id, similar_columns,
};
