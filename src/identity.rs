//! Opaque identity handed over by the authentication collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Resolved identity of the signed-in user. The engine never inspects it
/// beyond scoping store calls and deriving category id suffixes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short lowercase alphanumeric tag used to scope derived identifiers.
    pub fn scope_suffix(&self) -> String {
        self.0
            .chars()
            .filter(|ch| ch.is_ascii_alphanumeric())
            .take(8)
            .map(|ch| ch.to_ascii_lowercase())
            .collect()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}
