use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic kind of a variable. Fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    /// Continuous numeric measurement (age, LDH, months to progression).
    Scalar,
    /// Finite set of labelled values (BOR, treatment group).
    Categorical,
    /// Yes/no flag, the two(+missing) category special case of categorical.
    Boolean,
    /// Calendar date or timestamp.
    Datetime,
    /// Repeated measurement spread over one column per iteration.
    Iterated,
}

impl VariableKind {
    pub const ALL: [VariableKind; 5] = [
        VariableKind::Scalar,
        VariableKind::Categorical,
        VariableKind::Boolean,
        VariableKind::Datetime,
        VariableKind::Iterated,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::Scalar => "scalar",
            VariableKind::Categorical => "categorical",
            VariableKind::Boolean => "boolean",
            VariableKind::Datetime => "datetime",
            VariableKind::Iterated => "iterated",
        }
    }

    /// Returns true for kinds whose values can partition a dataset (used by `group_by`).
    pub fn is_groupable(&self) -> bool {
        matches!(self, VariableKind::Categorical | VariableKind::Boolean)
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VariableKind {
    type Err = String;

    /// Parse a kind name, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "scalar" => Ok(VariableKind::Scalar),
            "categorical" => Ok(VariableKind::Categorical),
            "boolean" | "bool" => Ok(VariableKind::Boolean),
            "datetime" | "date" => Ok(VariableKind::Datetime),
            "iterated" | "iteration" => Ok(VariableKind::Iterated),
            _ => Err(format!("Unknown variable kind: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        assert_eq!("Bool".parse::<VariableKind>(), Ok(VariableKind::Boolean));
        assert_eq!(" date ".parse::<VariableKind>(), Ok(VariableKind::Datetime));
        assert!("matrix".parse::<VariableKind>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for kind in VariableKind::ALL {
            assert_eq!(kind.to_string().parse::<VariableKind>(), Ok(kind));
        }
    }
}
