//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → routing::Router (rule resolution)
//!     → forward.rs (rewrite URI and Host, send upstream)
//!     → response.rs (strip hop-by-hop headers)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{ForwardError, UpstreamClient};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
