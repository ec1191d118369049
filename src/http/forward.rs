//! Upstream forwarding.
//!
//! # Responsibilities
//! - Build the upstream request from a client request and its Resolution
//! - Apply change-origin Host rewriting
//! - Stream the body to the upstream and the response back
//!
//! # Design Decisions
//! - Bodies are streamed, never buffered
//! - Upstream requests are always HTTP/1.1
//! - No retries: a failed upstream call is reported as-is

use axum::body::Body;
use axum::http::header::{HeaderValue, InvalidHeaderValue, HOST};
use axum::http::uri::InvalidUri;
use axum::http::{Request, Response, Uri, Version};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use thiserror::Error;

use crate::http::response::strip_hop_by_hop;
use crate::routing::Resolution;

pub type UpstreamClient = Client<HttpConnector, Body>;

#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("invalid upstream uri: {0}")]
    Uri(#[from] InvalidUri),

    #[error("invalid upstream host header: {0}")]
    Host(#[from] InvalidHeaderValue),

    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Rewrite a client request so it can be sent to `resolution`'s target.
pub fn build_upstream_request(
    request: Request<Body>,
    resolution: &Resolution,
) -> Result<Request<Body>, ForwardError> {
    let (mut parts, body) = request.into_parts();

    parts.uri = resolution
        .upstream_uri(parts.uri.query())
        .parse::<Uri>()?;
    parts.version = Version::HTTP_11;

    strip_hop_by_hop(&mut parts.headers);
    if resolution.change_origin {
        parts
            .headers
            .insert(HOST, HeaderValue::from_str(&resolution.authority)?);
    }

    Ok(Request::from_parts(parts, body))
}

/// Forward a request and hand back the upstream response.
pub async fn forward(
    client: &UpstreamClient,
    request: Request<Body>,
    resolution: &Resolution,
) -> Result<Response<Body>, ForwardError> {
    let upstream_request = build_upstream_request(request, resolution)?;
    let response = client.request(upstream_request).await?;

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Ok(Response::from_parts(parts, Body::new(body)))
}
