//! Resolution observers.
//!
//! Collaborators notified after every successful resolution. They see the
//! decision; they cannot change it.

use axum::http::Method;

use crate::observability::metrics;
use crate::routing::Resolution;

/// One resolution decision.
#[derive(Debug, Clone, Copy)]
pub struct ResolutionEvent<'a> {
    pub method: &'a Method,
    pub original_path: &'a str,
    pub resolution: &'a Resolution,
}

impl ResolutionEvent<'_> {
    pub fn resolved_path(&self) -> &str {
        &self.resolution.path
    }

    pub fn target(&self) -> &str {
        &self.resolution.target
    }
}

pub trait ResolutionObserver: Send + Sync {
    fn on_resolved(&self, event: &ResolutionEvent<'_>);
}

/// Logs each decision as a structured event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ResolutionObserver for TracingObserver {
    fn on_resolved(&self, event: &ResolutionEvent<'_>) {
        tracing::debug!(
            method = %event.method,
            path = %event.original_path,
            upstream_path = %event.resolved_path(),
            target = %event.target(),
            rule = %event.resolution.rule,
            "Resolved proxy rule"
        );
    }
}

/// Counts resolutions per rule and target.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver;

impl ResolutionObserver for MetricsObserver {
    fn on_resolved(&self, event: &ResolutionEvent<'_>) {
        metrics::record_resolution(&event.resolution.rule, event.target());
    }
}
