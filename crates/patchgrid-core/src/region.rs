//! GCP region names.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A region in the GCP form `<geography>-<region><number>`, e.g. `us-central1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Region(String);

#[derive(Debug, Error)]
pub enum RegionError {
    #[error(
        "invalid region format: {0}\n\
         Region should be in the format: <geography>-<region><number>\n\
         Example: us-central1"
    )]
    InvalidFormat(String),
    #[error("region pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl Region {
    /// Validates the leading `<geography>-<region><number>` shape.
    ///
    /// Only the prefix is checked, so zone-qualified names such as
    /// `us-central1-a` are accepted as-is.
    pub fn parse(name: &str) -> Result<Self, RegionError> {
        let pattern = Regex::new(r"^[a-z]+-[a-z]+\d+")?;
        if !pattern.is_match(name) {
            return Err(RegionError::InvalidFormat(name.to_string()));
        }
        Ok(Region(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Region {
    type Err = RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Region::parse(s)
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
