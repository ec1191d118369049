//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (metrics, timeout, request ID, tracing)
//! - Resolve each request through the rule table
//! - Apply the fallback policy to unmatched requests
//! - Apply rule updates from the config watcher
//! - Serve until shutdown

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{FallbackConfig, ProxyConfig};
use crate::http::forward::{forward, UpstreamClient};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::lifecycle::shutdown::wait as shutdown_signal;
use crate::observability::metrics;
use crate::routing::{
    MetricsObserver, Resolution, Router as ProxyRouter, RoutingError, RuleTable, TracingObserver,
    Upstream,
};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<ProxyRouter>,
    pub client: UpstreamClient,
    /// Pass-through target for unmatched requests; `None` answers 404.
    pub fallback: Option<Upstream>,
}

/// HTTP server for the development proxy.
pub struct HttpServer {
    app: Router,
    config: ProxyConfig,
    proxy_router: Arc<ProxyRouter>,
}

impl HttpServer {
    /// Build the server. Fails if the rules or fallback target are invalid.
    pub fn new(config: ProxyConfig) -> Result<Self, RoutingError> {
        let table = RuleTable::from_config(&config.rules)?;
        let proxy_router = Arc::new(
            ProxyRouter::new(table)
                .with_observer(Arc::new(TracingObserver))
                .with_observer(Arc::new(MetricsObserver)),
        );

        let fallback = match &config.fallback {
            FallbackConfig::NotFound => None,
            FallbackConfig::PassThrough(target) => Some(Upstream::parse(target)?),
        };

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            router: proxy_router.clone(),
            client,
            fallback,
        };

        let app = Self::build_router(&config, state);
        Ok(Self {
            app,
            config,
            proxy_router,
        })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Request metrics sit outside the timeout so timed-out requests are
    /// counted too.
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .with_state(state)
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(middleware::from_fn(track_requests))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Serve on `listener` until `shutdown` fires.
    ///
    /// Configs arriving on `config_updates` replace the rule table. Other
    /// settings take effect on restart only.
    pub async fn run(
        self,
        listener: TcpListener,
        config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            rules = self.proxy_router.table().len(),
            "HTTP server starting"
        );

        tokio::spawn(apply_config_updates(
            self.proxy_router.clone(),
            config_updates,
            shutdown.resubscribe(),
        ));

        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal(shutdown))
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Shared handle to the live rule table.
    pub fn router(&self) -> Arc<ProxyRouter> {
        self.proxy_router.clone()
    }
}

async fn apply_config_updates(
    router: Arc<ProxyRouter>,
    mut updates: mpsc::UnboundedReceiver<ProxyConfig>,
    mut shutdown: broadcast::Receiver<()>,
) {
    loop {
        tokio::select! {
            update = updates.recv() => match update {
                Some(config) => match RuleTable::from_config(&config.rules) {
                    Ok(table) => router.reload(table),
                    Err(e) => tracing::error!(error = %e, "Rejected rule update, keeping current rules"),
                },
                None => break,
            },
            _ = shutdown.recv() => break,
        }
    }
}

/// Upstream label attached to responses by `proxy_handler`.
#[derive(Debug, Clone)]
struct UpstreamTarget(String);

fn target_label(response: &Response) -> &str {
    response
        .extensions()
        .get::<UpstreamTarget>()
        .map_or("none", |target| target.0.as_str())
}

/// Record every response, including ones produced by the timeout layer.
async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let response = next.run(request).await;
    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        target_label(&response),
        start,
    );
    response
}

/// Main proxy handler.
/// Resolves the path, then forwards to the matched upstream.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request_id(&request).to_string();

    let resolution = match state.router.resolve(&method, &path) {
        Ok(resolution) => resolution,
        Err(e) => match &state.fallback {
            Some(upstream) => Resolution::pass_through(upstream, &path),
            None => {
                tracing::warn!(request_id = %request_id, path = %path, error = %e, "Unmatched request");
                return (StatusCode::NOT_FOUND, "No matching proxy rule").into_response();
            }
        },
    };

    let mut response = match forward(&state.client, request, &resolution).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                target = %resolution.target,
                error = %e,
                "Upstream error"
            );
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    };
    response
        .extensions_mut()
        .insert(UpstreamTarget(resolution.target));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_label_defaults_to_none() {
        let timed_out = StatusCode::REQUEST_TIMEOUT.into_response();
        assert_eq!(target_label(&timed_out), "none");

        let mut forwarded = StatusCode::OK.into_response();
        forwarded
            .extensions_mut()
            .insert(UpstreamTarget("http://localhost:8080".into()));
        assert_eq!(target_label(&forwarded), "http://localhost:8080");
    }
}
