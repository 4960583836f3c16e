//! Namespaces separate independent machines declared on one record type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Environment variable overriding the name of the default namespace.
pub const NAMESPACE_ENV: &str = "STATEBOUND_NAMESPACE";

const FALLBACK_NAMESPACE: &str = "default";

/// Name of the default namespace, read from the environment on first use.
fn default_name() -> &'static str {
    static DEFAULT: OnceLock<String> = OnceLock::new();
    DEFAULT.get_or_init(|| match std::env::var(NAMESPACE_ENV) {
        Ok(name) if !name.is_empty() => name,
        _ => FALLBACK_NAMESPACE.to_string(),
    })
}

/// Identifier of one machine on a record type.
///
/// The default namespace is read from `STATEBOUND_NAMESPACE` once per
/// process, falling back to `"default"`. Names declared in the default namespace are used bare;
/// names in any other namespace are prefixed with it.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(String);

impl Namespace {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_default(&self) -> bool {
        self.0 == default_name()
    }

    /// Qualify a rule or alias name the way hosts expose it.
    ///
    /// ```rust
    /// use statebound::core::Namespace;
    ///
    /// assert_eq!(Namespace::default().qualify("activate"), "activate");
    /// assert_eq!(Namespace::new("house").qualify("cleanup"), "house_cleanup");
    /// ```
    pub fn qualify(&self, name: &str) -> String {
        if self.is_default() {
            name.to_string()
        } else {
            format!("{}_{}", self.0, name)
        }
    }
}

impl Default for Namespace {
    fn default() -> Self {
        Self(default_name().to_string())
    }
}

impl From<&str> for Namespace {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
