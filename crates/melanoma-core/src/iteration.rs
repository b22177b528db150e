//! Resolution of repeated-measurement columns.
//!
//! An iterated variable id such as `TIEMPO IT{N}` stands for the columns
//! `TIEMPO IT1`, `TIEMPO IT2`, ... of a dataset. [`IterationResolver`] compiles
//! the id into an anchored regex and maps matching columns to their iteration
//! index.

use std::collections::BTreeMap;

use regex::Regex;
use tracing::debug;

use melanoma_model::{ConfigurationError, ITERATION_PLACEHOLDER};

#[derive(Debug, Clone)]
pub struct IterationResolver {
    pattern: String,
    prefix: String,
    suffix: String,
    regex: Regex,
}

impl IterationResolver {
    /// Compile `pattern`, which must contain exactly one `{N}` placeholder.
    pub fn new(pattern: &str) -> Result<Self, ConfigurationError> {
        let malformed = |message: String| ConfigurationError::MalformedPattern {
            id: pattern.to_string(),
            message,
        };

        let placeholders = pattern.matches(ITERATION_PLACEHOLDER).count();
        if placeholders != 1 {
            return Err(malformed(format!(
                "expected exactly one '{ITERATION_PLACEHOLDER}' placeholder, found {placeholders}"
            )));
        }
        let Some((prefix, suffix)) = pattern.split_once(ITERATION_PLACEHOLDER) else {
            return Err(malformed("placeholder not found".to_string()));
        };
        let regex = Regex::new(&format!(
            "^{}(\\d+){}$",
            regex::escape(prefix),
            regex::escape(suffix)
        ))
        .map_err(|e| malformed(e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            prefix: prefix.to_string(),
            suffix: suffix.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Iteration index encoded in `column`, if it matches the pattern.
    pub fn match_column(&self, column: &str) -> Option<u32> {
        let captures = self.regex.captures(column)?;
        let digits = captures.get(1)?.as_str();
        match digits.parse::<u32>() {
            Ok(index) => Some(index),
            Err(_) => {
                debug!(column, pattern = %self.pattern, "Iteration index out of range");
                None
            }
        }
    }

    /// Canonical column name for `index`.
    pub fn column_for(&self, index: u32) -> String {
        format!("{}{index}{}", self.prefix, self.suffix)
    }

    /// Matching columns as `(index, column)` pairs, ascending by index.
    ///
    /// Two columns resolving to the same index (`IT3` and `IT03`) are a
    /// configuration error.
    pub fn resolve<'a, I>(&self, columns: I) -> Result<Vec<(u32, String)>, ConfigurationError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut by_index: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for column in columns {
            if let Some(index) = self.match_column(column) {
                by_index.entry(index).or_default().push(column.to_string());
            }
        }

        let mut resolved = Vec::with_capacity(by_index.len());
        for (index, mut columns) in by_index {
            if columns.len() > 1 {
                columns.sort();
                return Err(ConfigurationError::DuplicateIteration {
                    id: self.pattern.clone(),
                    index,
                    columns,
                });
            }
            if let Some(column) = columns.pop() {
                resolved.push((index, column));
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn resolves_sorted_indices_and_skips_others() {
        let resolver = IterationResolver::new("TIEMPO IT{N}").unwrap();
        let resolved = resolver
            .resolve(["TIEMPO IT5", "VALOR", "TIEMPO IT1", "TIEMPO IT2"])
            .unwrap();
        let indices: Vec<u32> = resolved.iter().map(|(index, _)| *index).collect();
        assert_eq!(indices, vec![1, 2, 5]);
        assert_eq!(resolved[2].1, "TIEMPO IT5");
    }

    #[test]
    fn anchored_and_escaped() {
        let resolver = IterationResolver::new("LDH (U/L) IT{N}").unwrap();
        assert_eq!(resolver.match_column("LDH (U/L) IT3"), Some(3));
        assert_eq!(resolver.match_column("LDH (U/L) IT3 BIS"), None);
        assert_eq!(resolver.match_column("PRE LDH (U/L) IT3"), None);
        assert_eq!(resolver.match_column("LDH (U/L) ITx"), None);
        assert_eq!(resolver.column_for(4), "LDH (U/L) IT4");
    }

    #[test]
    fn suffix_after_placeholder() {
        let resolver = IterationResolver::new("IT{N} LDH").unwrap();
        assert_eq!(resolver.match_column("IT12 LDH"), Some(12));
        assert_eq!(resolver.match_column("IT12 LDHX"), None);
    }

    #[test]
    fn duplicate_index_is_rejected() {
        let resolver = IterationResolver::new("TIEMPO IT{N}").unwrap();
        let err = resolver
            .resolve(["TIEMPO IT3", "TIEMPO IT03"])
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateIteration {
                id: "TIEMPO IT{N}".to_string(),
                index: 3,
                columns: vec!["TIEMPO IT03".to_string(), "TIEMPO IT3".to_string()],
            }
        );
    }

    #[test]
    fn no_matches_is_empty() {
        let resolver = IterationResolver::new("TIEMPO IT{N}").unwrap();
        assert!(resolver.resolve(["VALOR", "BOR"]).unwrap().is_empty());
    }

    #[test]
    fn placeholder_count_is_checked() {
        assert!(matches!(
            IterationResolver::new("TIEMPO"),
            Err(ConfigurationError::MalformedPattern { .. })
        ));
        assert!(matches!(
            IterationResolver::new("{N}-{N}"),
            Err(ConfigurationError::MalformedPattern { .. })
        ));
    }

    proptest! {
        #[test]
        fn resolved_indices_are_strictly_increasing(
            indices in proptest::collection::btree_set(0u32..500, 0..20),
            noise in proptest::collection::vec("[A-Z]{1,6}", 0..5),
        ) {
            let resolver = IterationResolver::new("LDH IT{N}").unwrap();
            let mut columns: Vec<String> = indices.iter().rev().map(|i| resolver.column_for(*i)).collect();
            columns.extend(noise);
            let resolved = resolver.resolve(columns.iter().map(String::as_str)).unwrap();
            let found: Vec<u32> = resolved.iter().map(|(index, _)| *index).collect();
            let expected: Vec<u32> = indices.into_iter().collect();
            prop_assert_eq!(found, expected);
        }
    }
}
