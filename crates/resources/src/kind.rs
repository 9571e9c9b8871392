//! Parsing and display for [`ResourceKind`].

use crate::object::ResourceKind;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Returned when a configured resource kind is not in the supported set.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported resource kind: {0}")]
pub struct UnknownResourceKind(pub String);

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = UnknownResourceKind;

    /// Accepts the singular name in any case (`ConfigMap`, `configmap`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ResourceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == wanted)
            .ok_or_else(|| UnknownResourceKind(s.to_string()))
    }
}

impl Default for ResourceKind {
    fn default() -> Self {
        ResourceKind::ConfigMap
    }
}
