//! Development reverse proxy.
//!
//! Forwards API calls to backend services according to an ordered rule
//! table: literal path prefixes first, then regular expressions, first
//! match wins. Matched paths are rewritten (e.g. `/api` stripped) before
//! forwarding.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Resolution, RoutingError, RuleTable};
