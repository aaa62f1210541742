//! Entity type identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a tracked record kind, e.g. `App\User`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityType(String);

impl EntityType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(normalize(&name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Qualify this type with a namespace prefix: `App\Models` + `User`
    /// gives `App\Models\User`.
    pub fn qualify(&self, namespace: &str) -> Self {
        let namespace = normalize(namespace);
        let namespace = namespace.trim_end_matches('\\');
        if namespace.is_empty() {
            return self.clone();
        }
        Self(format!("{}\\{}", namespace, self.0.trim_start_matches('\\')))
    }

    /// The last path segment, e.g. `User` for `App\User`.
    pub fn short_name(&self) -> &str {
        self.0.rsplit('\\').next().unwrap_or(&self.0)
    }
}

/// Accept `/` as a namespace separator.
fn normalize(name: &str) -> String {
    name.replace('/', "\\")
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for EntityType {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
