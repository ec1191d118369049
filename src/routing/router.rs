//! Shared handle to the live rule table.
//!
//! # Responsibilities
//! - Hold the current RuleTable for concurrent readers
//! - Resolve requests and notify observers
//! - Swap in a rebuilt table on config reload
//!
//! # Design Decisions
//! - ArcSwap: readers take a lock-free snapshot, a reload replaces the
//!   whole table in one store
//! - A table is never mutated in place

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;

use crate::routing::observer::{ResolutionEvent, ResolutionObserver};
use crate::routing::{Resolution, RoutingError, RuleTable};

pub struct Router {
    table: ArcSwap<RuleTable>,
    observers: Vec<Arc<dyn ResolutionObserver>>,
}

impl Router {
    pub fn new(table: RuleTable) -> Self {
        Self {
            table: ArcSwap::from_pointee(table),
            observers: Vec::new(),
        }
    }

    /// Register a collaborator notified on every successful resolution.
    pub fn with_observer(mut self, observer: Arc<dyn ResolutionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Resolve against the current table.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<Resolution, RoutingError> {
        let table = self.table.load();
        match table.resolve(path) {
            Ok(resolution) => {
                let event = ResolutionEvent {
                    method,
                    original_path: path,
                    resolution: &resolution,
                };
                for observer in &self.observers {
                    observer.on_resolved(&event);
                }
                Ok(resolution)
            }
            Err(e) => {
                tracing::debug!(method = %method, path = %path, "No proxy rule matched");
                Err(e)
            }
        }
    }

    /// Replace the live table.
    pub fn reload(&self, table: RuleTable) {
        tracing::info!(rules = table.len(), "Proxy rule table reloaded");
        self.table.store(Arc::new(table));
    }

    /// Snapshot of the current table.
    pub fn table(&self) -> Arc<RuleTable> {
        self.table.load_full()
    }
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("rules", &self.table.load().len())
            .field("observers", &self.observers.len())
            .finish()
    }
}
