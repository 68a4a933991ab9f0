//! Column selection and resolution against the table header

use crate::table::cell;
use crate::{Error, Result};

/// Columns chosen as word sources plus the minimum word count
///
/// Name order is meaningful: it is the order of the words handed to the
/// scorer and of the columns in the on-screen results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSelection {
    names: Vec<String>,
    min_word_count: usize,
}

impl ColumnSelection {
    pub fn new(names: Vec<String>, min_word_count: usize) -> Result<Self> {
        if names.is_empty() {
            return Err(Error::InputValidation(
                "No columns selected. Please select at least one column.".to_string(),
            ));
        }
        if min_word_count == 0 {
            return Err(Error::InputValidation(
                "Minimum word count must be at least 1.".to_string(),
            ));
        }
        Ok(Self {
            names,
            min_word_count,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn min_word_count(&self) -> usize {
        self.min_word_count
    }
}

/// Map column names to header positions (first match wins)
///
/// Fails on the first name missing from the header; there is no partial
/// resolution.
pub fn resolve_columns<S: AsRef<str>>(header: &[String], names: &[S]) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            header
                .iter()
                .position(|column| column == name)
                .ok_or_else(|| Error::ColumnResolution(name.to_string()))
        })
        .collect()
}

/// Cells at `indices`, absent positions rendered empty
pub fn project(row: &[String], indices: &[usize]) -> Vec<String> {
    indices
        .iter()
        .map(|&index| cell(row, index).unwrap_or_default().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header() -> Vec<String> {
        ["w1", "w2", "w3", "w2"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_resolve_preserves_requested_order() {
        let indices = resolve_columns(&header(), &["w3", "w1"]).unwrap();
        assert_eq!(indices, vec![2, 0]);
    }

    #[test]
    fn test_resolve_duplicate_name_uses_first_occurrence() {
        let indices = resolve_columns(&header(), &["w2"]).unwrap();
        assert_eq!(indices, vec![1]);
    }

    #[test]
    fn test_resolve_reports_first_unknown_column() {
        let err = resolve_columns(&header(), &["w1", "nope", "also_missing"]).unwrap_err();
        match err {
            Error::ColumnResolution(name) => assert_eq!(name, "nope"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_is_case_sensitive() {
        assert!(resolve_columns(&header(), &["W1"]).is_err());
    }

    #[test]
    fn test_selection_requires_columns() {
        let err = ColumnSelection::new(Vec::new(), 7).unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
    }

    #[test]
    fn test_selection_requires_positive_min_word_count() {
        let err = ColumnSelection::new(vec!["w1".to_string()], 0).unwrap_err();
        assert!(matches!(err, Error::InputValidation(_)));
    }

    #[test]
    fn test_project_fills_absent_cells() {
        let row = vec!["a".to_string(), "b".to_string()];
        assert_eq!(project(&row, &[1, 5, 0]), vec!["b", "", "a"]);
    }
}
