//! Rule table construction and path resolution.
//!
//! # Responsibilities
//! - Compile configured rules into an immutable, priority-ordered table
//! - Resolve a path to (target, rewritten path, change_origin)
//! - Return an explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Literal-prefix rules are always evaluated before regex rules; within
//!   each class, configuration order is kept
//! - First match wins
//! - Immutable after construction (thread-safe without locks)

use serde::Serialize;
use url::{Position, Url};

use crate::config::schema::RuleConfig;
use crate::routing::matcher::PathMatcher;
use crate::routing::rewrite::RewriteStrategy;
use crate::routing::RoutingError;

/// Upstream base URL, parsed once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Upstream {
    /// Base URL without a trailing slash, e.g. `http://localhost:8080`.
    base: String,
    /// `host[:port]`, used for the Host header when changing origin.
    authority: String,
}

impl Upstream {
    pub fn parse(target: &str) -> Result<Self, RoutingError> {
        let invalid = |reason: String| RoutingError::InvalidTarget {
            target: target.to_string(),
            reason,
        };

        let url = Url::parse(target).map_err(|e| invalid(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(invalid(format!("unsupported scheme `{}`", url.scheme())));
        }
        if url.host_str().is_none() {
            return Err(invalid("missing host".into()));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(invalid("query and fragment are not allowed".into()));
        }

        Ok(Self {
            base: url[..Position::AfterPath].trim_end_matches('/').to_string(),
            authority: url[Position::BeforeHost..Position::AfterPort].to_string(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }
}

/// A compiled proxy rule.
#[derive(Debug, Clone)]
pub struct ProxyRule {
    pub name: String,
    pub matcher: PathMatcher,
    pub upstream: Upstream,
    pub change_origin: bool,
    pub rewrite: RewriteStrategy,
}

impl ProxyRule {
    /// Compile a rule from its configuration.
    pub fn from_config(config: &RuleConfig) -> Result<Self, RoutingError> {
        let matcher = match (config.prefix.as_deref(), config.regex.as_deref()) {
            (Some(prefix), None) => PathMatcher::literal(prefix)?,
            (None, Some(pattern)) => PathMatcher::regex(pattern)?,
            (Some(prefix), Some(pattern)) => {
                return Err(RoutingError::InvalidRulePattern {
                    pattern: format!("{} | {}", prefix, pattern),
                    reason: "rule sets both `prefix` and `regex`".into(),
                });
            }
            (None, None) => {
                return Err(RoutingError::InvalidRulePattern {
                    pattern: String::new(),
                    reason: "rule sets neither `prefix` nor `regex`".into(),
                });
            }
        };

        Ok(Self {
            name: config.display_name().to_string(),
            matcher,
            upstream: Upstream::parse(&config.target)?,
            change_origin: config.change_origin,
            rewrite: RewriteStrategy::from(config.rewrite.as_ref()),
        })
    }
}

/// Where a request goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub rule: String,
    pub target: String,
    pub authority: String,
    pub path: String,
    pub change_origin: bool,
}

impl Resolution {
    /// Forward a path unchanged to `upstream`, keeping the client's Host.
    pub fn pass_through(upstream: &Upstream, path: &str) -> Self {
        Self {
            rule: "fallback".to_string(),
            target: upstream.base().to_string(),
            authority: upstream.authority().to_string(),
            path: path.to_string(),
            change_origin: false,
        }
    }

    /// Full upstream URI for this resolution, re-appending the client's query.
    pub fn upstream_uri(&self, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}{}?{}", self.target, self.path, q),
            _ => format!("{}{}", self.target, self.path),
        }
    }
}

/// Priority-ordered, immutable set of proxy rules.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<ProxyRule>,
}

impl RuleTable {
    /// Compile rules from configuration. Fails on the first invalid rule.
    pub fn from_config(configs: &[RuleConfig]) -> Result<Self, RoutingError> {
        let rules = configs
            .iter()
            .map(ProxyRule::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_rules(rules))
    }

    /// Order compiled rules: literal prefixes first, then regexes.
    pub fn from_rules(rules: Vec<ProxyRule>) -> Self {
        let (mut ordered, regexes): (Vec<_>, Vec<_>) =
            rules.into_iter().partition(|r| r.matcher.is_literal());
        ordered.extend(regexes);
        Self { rules: ordered }
    }

    /// Resolve a path to its upstream. Pure: no I/O, no state.
    pub fn resolve(&self, path: &str) -> Result<Resolution, RoutingError> {
        self.rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map(|rule| Resolution {
                rule: rule.name.clone(),
                target: rule.upstream.base().to_string(),
                authority: rule.upstream.authority().to_string(),
                path: rule.rewrite.apply(path),
                change_origin: rule.change_origin,
            })
            .ok_or_else(|| RoutingError::NoMatchingRoute {
                path: path.to_string(),
            })
    }

    /// Rules in evaluation order.
    pub fn rules(&self) -> &[ProxyRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::default_rules;

    fn default_table() -> RuleTable {
        RuleTable::from_config(&default_rules()).unwrap()
    }

    #[test]
    fn test_resolve_dataset() {
        let res = default_table().resolve("/api/dataset/list").unwrap();
        assert_eq!(res.target, "http://localhost:8080");
        assert_eq!(res.path, "/dataset/list");
        assert_eq!(res.authority, "localhost:8080");
        assert!(res.change_origin);
    }

    #[test]
    fn test_resolve_experiments() {
        let res = default_table().resolve("/api/experiments/42/results").unwrap();
        assert_eq!(res.target, "http://localhost:8081");
        assert_eq!(res.path, "/experiments/42/results");
    }

    #[test]
    fn test_resolve_catch_all() {
        let res = default_table().resolve("/api/unknown/thing").unwrap();
        assert_eq!(res.target, "http://localhost:3000");
        assert_eq!(res.path, "/unknown/thing");
        assert_eq!(res.rule, "^/api/.*");
    }

    #[test]
    fn test_no_match() {
        match default_table().resolve("/health") {
            Err(RoutingError::NoMatchingRoute { path }) => assert_eq!(path, "/health"),
            other => panic!("expected NoMatchingRoute, got {:?}", other),
        }
        // `/api` alone matches neither literal nor `^/api/.*`
        assert!(default_table().resolve("/api").is_err());
    }

    #[test]
    fn test_literal_rules_win_over_earlier_regex() {
        let table = RuleTable::from_config(&[
            RuleConfig::regex("^/api/.*", "http://localhost:3000"),
            RuleConfig::prefix("/api/dataset", "http://localhost:8080"),
        ])
        .unwrap();

        assert!(table.rules()[0].matcher.is_literal());
        assert_eq!(
            table.resolve("/api/dataset/x").unwrap().target,
            "http://localhost:8080"
        );
        assert_eq!(
            table.resolve("/api/other").unwrap().target,
            "http://localhost:3000"
        );
    }

    #[test]
    fn test_config_order_kept_within_class() {
        let table = RuleTable::from_config(&[
            RuleConfig::regex("^/api/v1/.*", "http://localhost:1001"),
            RuleConfig::prefix("/x", "http://localhost:2001"),
            RuleConfig::regex("^/api/.*", "http://localhost:1002"),
            RuleConfig::prefix("/y", "http://localhost:2002"),
        ])
        .unwrap();

        let order: Vec<&str> = table.rules().iter().map(|r| r.matcher.as_str()).collect();
        assert_eq!(order, vec!["/x", "/y", "^/api/v1/.*", "^/api/.*"]);
        assert_eq!(
            table.resolve("/api/v1/x").unwrap().target,
            "http://localhost:1001"
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let table = default_table();
        for path in ["/api/dataset/list", "/api/experiments/1", "/api/x", "/health"] {
            assert_eq!(table.resolve(path), table.resolve(path));
        }
    }

    #[test]
    fn test_invalid_rules_fail_fast() {
        let empty = RuleTable::from_config(&[RuleConfig::prefix("", "http://localhost:1")]);
        assert!(matches!(empty, Err(RoutingError::InvalidRulePattern { .. })));

        let bad_regex = RuleTable::from_config(&[
            RuleConfig::prefix("/ok", "http://localhost:1"),
            RuleConfig::regex("^/api/[", "http://localhost:1"),
        ]);
        assert!(matches!(bad_regex, Err(RoutingError::InvalidRulePattern { .. })));

        let mut both = RuleConfig::prefix("/a", "http://localhost:1");
        both.regex = Some("^/a".into());
        assert!(matches!(
            RuleTable::from_config(&[both]),
            Err(RoutingError::InvalidRulePattern { .. })
        ));
    }

    #[test]
    fn test_upstream_parsing() {
        let up = Upstream::parse("http://localhost:8080/").unwrap();
        assert_eq!(up.base(), "http://localhost:8080");
        assert_eq!(up.authority(), "localhost:8080");

        let up = Upstream::parse("http://backend.internal/v2/").unwrap();
        assert_eq!(up.base(), "http://backend.internal/v2");
        assert_eq!(up.authority(), "backend.internal");

        assert!(matches!(
            Upstream::parse("localhost:8080"),
            Err(RoutingError::InvalidTarget { .. })
        ));
        assert!(matches!(
            Upstream::parse("https://localhost:8443"),
            Err(RoutingError::InvalidTarget { .. })
        ));
    }

    #[test]
    fn test_upstream_uri() {
        let res = default_table().resolve("/api/dataset/list").unwrap();
        assert_eq!(res.upstream_uri(None), "http://localhost:8080/dataset/list");
        assert_eq!(
            res.upstream_uri(Some("page=2")),
            "http://localhost:8080/dataset/list?page=2"
        );
        assert_eq!(res.upstream_uri(Some("")), "http://localhost:8080/dataset/list");
    }
}
