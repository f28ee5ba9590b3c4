//! Instance filter scope.

use std::path::Path;

use patchgrid_core::config::InventoryConfig;

use crate::error::InventoryError;

/// gcloud filter terms, OR-ed together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    terms: Vec<String>,
}

impl Scope {
    pub fn new<I, S>(terms: I) -> Result<Self, InventoryError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let terms: Vec<String> = terms
            .into_iter()
            .map(|term| {
                let term: String = term.into();
                term.trim().to_string()
            })
            .filter(|t| !t.is_empty())
            .collect();
        if terms.is_empty() {
            return Err(InventoryError::EmptyScope);
        }
        Ok(Self { terms })
    }

    /// Whitespace-separated terms from a scope file.
    pub fn from_file(path: &Path) -> Result<Self, InventoryError> {
        let content =
            std::fs::read_to_string(path).map_err(|source| InventoryError::ScopeFile {
                path: path.to_path_buf(),
                source,
            })?;
        Self::new(content.split_whitespace())
    }

    /// Inline `[inventory].scope` wins over the scope file.
    pub fn from_config(config: &InventoryConfig) -> Result<Self, InventoryError> {
        match &config.scope {
            Some(terms) => Self::new(terms.iter().map(String::as_str)),
            None => Self::from_file(&config.scope_file),
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// `(<t1> OR <t2>) AND NOT status:TERMINATED`
    pub fn filter_expression(&self) -> String {
        format!("({}) AND NOT status:TERMINATED", self.terms.join(" OR "))
    }
}
