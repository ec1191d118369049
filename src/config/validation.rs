//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Compile every rule pattern and target up front
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Require at least one rule
//! - Detect literal rules shadowed by an earlier literal rule
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{FallbackConfig, ProxyConfig, RewriteConfig};
use crate::routing::{ProxyRule, RoutingError, Upstream};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("no rules configured")]
    NoRules,

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("rules[{index}]: {source}")]
    Rule { index: usize, source: RoutingError },

    #[error("rules[{index}]: rewrite strip_prefix is empty")]
    EmptyRewritePrefix { index: usize },

    #[error("rules[{index}] (`{prefix}`) is shadowed by rules[{by}] (`{by_prefix}`)")]
    Shadowed {
        index: usize,
        prefix: String,
        by: usize,
        by_prefix: String,
    },

    #[error("fallback: {0}")]
    Fallback(RoutingError),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if config.rules.is_empty() {
        errors.push(ValidationError::NoRules);
    }

    for (index, rule) in config.rules.iter().enumerate() {
        if let Err(source) = ProxyRule::from_config(rule) {
            errors.push(ValidationError::Rule { index, source });
        }
        if matches!(&rule.rewrite, Some(RewriteConfig::StripPrefix(p)) if p.is_empty()) {
            errors.push(ValidationError::EmptyRewritePrefix { index });
        }
    }

    errors.extend(shadowed_literals(config));

    if let FallbackConfig::PassThrough(target) = &config.fallback {
        if let Err(e) = Upstream::parse(target) {
            errors.push(ValidationError::Fallback(e));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Literal rules are tried in config order, so a later prefix that extends
/// an earlier one can never be reached.
fn shadowed_literals(config: &ProxyConfig) -> Vec<ValidationError> {
    let literals: Vec<(usize, &str)> = config
        .rules
        .iter()
        .enumerate()
        .filter_map(|(i, r)| match (&r.prefix, &r.regex) {
            (Some(p), None) if !p.is_empty() => Some((i, p.as_str())),
            _ => None,
        })
        .collect();

    let mut errors = Vec::new();
    for (pos, &(index, prefix)) in literals.iter().enumerate() {
        if let Some(&(by, by_prefix)) = literals[..pos]
            .iter()
            .find(|(_, earlier)| prefix.starts_with(earlier))
        {
            errors.push(ValidationError::Shadowed {
                index,
                prefix: prefix.to_string(),
                by,
                by_prefix: by_prefix.to_string(),
            });
        }
    }
    errors
}
