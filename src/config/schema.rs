//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the development proxy.
///
/// A file that omits `rules` parses with an empty rule list, which
/// validation rejects. The built-in rules only apply when no file is given.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Proxy rules, evaluated literal-prefix first, then regex.
    pub rules: Vec<RuleConfig>,

    /// What to do with requests no rule matches.
    pub fallback: FallbackConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Default settings with the built-in rule set.
    pub fn builtin() -> Self {
        Self {
            rules: default_rules(),
            ..Self::default()
        }
    }
}

/// The built-in rule set: two backend services plus a catch-all API server.
pub fn default_rules() -> Vec<RuleConfig> {
    vec![
        RuleConfig::prefix("/api/dataset", "http://localhost:8080").strip_prefix("/api"),
        RuleConfig::prefix("/api/experiments", "http://localhost:8081").strip_prefix("/api"),
        RuleConfig::regex("^/api/.*", "http://localhost:3000").strip_prefix("/api"),
    ]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:5173").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5173".to_string(),
        }
    }
}

/// A single proxy rule as written in the config file.
///
/// Exactly one of `prefix` or `regex` must be set; validation and table
/// construction both reject anything else.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RuleConfig {
    /// Identifier for logging/metrics. Defaults to the pattern text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Literal path prefix to match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Regular expression to match against the path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,

    /// Upstream base URL (scheme + host + port).
    pub target: String,

    /// Rewrite the Host header to the target's authority.
    #[serde(default = "default_change_origin")]
    pub change_origin: bool,

    /// Path rewrite applied before forwarding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<RewriteConfig>,
}

fn default_change_origin() -> bool {
    true
}

impl RuleConfig {
    /// A literal-prefix rule with no rewrite.
    pub fn prefix(prefix: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: None,
            prefix: Some(prefix.into()),
            regex: None,
            target: target.into(),
            change_origin: default_change_origin(),
            rewrite: None,
        }
    }

    /// A regular-expression rule with no rewrite.
    pub fn regex(pattern: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: None,
            prefix: None,
            regex: Some(pattern.into()),
            target: target.into(),
            change_origin: default_change_origin(),
            rewrite: None,
        }
    }

    pub fn strip_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.rewrite = Some(RewriteConfig::StripPrefix(prefix.into()));
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn change_origin(mut self, change_origin: bool) -> Self {
        self.change_origin = change_origin;
        self
    }

    /// Name used in logs: the explicit name, else the pattern text.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.prefix.as_deref())
            .or(self.regex.as_deref())
            .unwrap_or("<unnamed>")
    }
}

/// Rewrite strategies recognized in the config file.
///
/// ```toml
/// rewrite = { strip_prefix = "/api" }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RewriteConfig {
    /// Remove the given leading prefix from the path.
    StripPrefix(String),
}

/// Policy for requests no rule matches.
///
/// ```toml
/// fallback = "not_found"
/// fallback = { pass_through = "http://localhost:5173" }
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FallbackConfig {
    /// Answer 404 Not Found.
    #[default]
    NotFound,

    /// Forward the request unchanged to a default application server.
    PassThrough(String),
}

/// Timeout configuration for upstream forwarding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Compact,
    Pretty,
    Full,
}
