pub mod catalog;
pub mod config;
pub mod error;
pub mod kind;
pub mod statistics;

pub use catalog::VariableCatalog;
pub use config::{
    BooleanOptions, CategoricalOptions, CategoryLabel, DatetimeOptions, ITERATION_PLACEHOLDER,
    IteratedOptions, KindOptions, ScalarOptions, VariableConfig,
};
pub use error::{
    ConfigError, ConfigurationError, Error, LookupError, Result, ValidationError,
    ValidationErrors,
};
pub use kind::VariableKind;
pub use statistics::{
    ALL_COLUMN, DATETIME_STATISTICS, MISSING_LABEL, PercentageBase, SCALAR_STATISTICS,
    SPAN_STATISTIC, StatValue, StatisticsOptions, StatisticsRow, StatisticsTable,
};
