//! Path rewrite strategies applied before forwarding.

use serde::Serialize;

use crate::config::schema::RewriteConfig;

/// A deterministic path transformation.
///
/// Serializes the way the config file spells it: `"identity"` or
/// `{ "strip_prefix": "/api" }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RewriteStrategy {
    /// Forward the path as-is.
    #[default]
    Identity,
    /// Remove a leading prefix if present.
    StripPrefix(String),
}

impl RewriteStrategy {
    /// Apply the rewrite. The result always starts with `/`.
    pub fn apply(&self, path: &str) -> String {
        let rewritten = match self {
            Self::Identity => path,
            Self::StripPrefix(prefix) => path.strip_prefix(prefix.as_str()).unwrap_or(path),
        };

        if rewritten.starts_with('/') {
            rewritten.to_string()
        } else {
            format!("/{}", rewritten)
        }
    }
}

impl From<Option<&RewriteConfig>> for RewriteStrategy {
    fn from(config: Option<&RewriteConfig>) -> Self {
        match config {
            Some(RewriteConfig::StripPrefix(prefix)) => Self::StripPrefix(prefix.clone()),
            None => Self::Identity,
        }
    }
}
