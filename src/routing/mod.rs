//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → router.rs (snapshot of the live table)
//!     → table.rs (priority-ordered lookup)
//!     → matcher.rs (evaluate literal prefix / regex)
//!     → rewrite.rs (strip prefix)
//!     → observer.rs (notify collaborators)
//!     → Return: Resolution or NoMatchingRoute
//!
//! Table Compilation (at startup and on reload):
//!     RuleConfig[]
//!     → Compile matchers, parse targets
//!     → Order: literal prefixes, then regexes
//!     → Freeze as immutable RuleTable
//! ```
//!
//! # Design Decisions
//! - Tables compiled up front, immutable at runtime
//! - Deterministic: same input always resolves to the same upstream
//! - First match wins

pub mod matcher;
pub mod observer;
pub mod rewrite;
pub mod router;
pub mod table;

use thiserror::Error;

pub use matcher::PathMatcher;
pub use observer::{MetricsObserver, ResolutionEvent, ResolutionObserver, TracingObserver};
pub use rewrite::RewriteStrategy;
pub use router::Router;
pub use table::{ProxyRule, Resolution, RuleTable, Upstream};

/// Errors raised while building or querying a rule table.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoutingError {
    /// No rule matches the path. The caller picks the fallback.
    #[error("no proxy rule matches `{path}`")]
    NoMatchingRoute { path: String },

    /// Empty or malformed pattern found while building the table.
    #[error("invalid rule pattern `{pattern}`: {reason}")]
    InvalidRulePattern { pattern: String, reason: String },

    /// Target is not a usable http base URL.
    #[error("invalid target `{target}`: {reason}")]
    InvalidTarget { target: String, reason: String },
}
