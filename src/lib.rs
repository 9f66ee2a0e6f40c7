//! In-process mock HTTP/HTTPS server for test suites.
//!
//! Register expected request/response pairs, issue real network calls
//! against the server, then assert on status/headers/body and on the
//! requests actually received.
//!
//! # Architecture Overview
//!
//! ```text
//! Client request
//!     → server::engine (accept loop, one task per socket)
//!     → net (connection tracking, optional TLS handshake)
//!     → http::recorder (append to request log)
//!     → http::decode (JSON / text / urlencoded / multipart, best effort)
//!     → routing::registry (newest-first handler match)
//!     → http::response (status/body resolution, header merge, delay)
//!     → fallback 404 when nothing matched
//! ```
//!
//! The [`MockServer`] facade composes an HTTP and/or an HTTPS engine behind
//! one API; an unconfigured protocol behaves as a uniform no-op.
//!
//! # Example
//!
//! ```no_run
//! use mock_http_server::{Handler, HttpConfig, MockServer, Reply};
//!
//! # async fn example() -> Result<(), mock_http_server::ServerError> {
//! let server = MockServer::http(HttpConfig::new("localhost", 0));
//! server.start().await?;
//!
//! server.on(
//!     Handler::new("/resource").reply(
//!         Reply::new()
//!             .status(200)
//!             .body(r#"{"hello":"world"}"#),
//!     ),
//! );
//!
//! // ... issue real requests against server.http_port() ...
//!
//! server.stop().await;
//! # Ok(())
//! # }
//! ```

// Core subsystems
pub mod config;
pub mod http;
pub mod net;
pub mod routing;
pub mod server;

pub use config::{HttpConfig, HttpsConfig};
pub use http::request::{RecordedRequest, RequestBody, RequestFilter, UploadedFile};
pub use net::connection::{ConnectionId, ConnectionInfo};
pub use net::ServerError;
pub use routing::handler::{Handler, Reply, ReplyBody};
pub use server::{MockServer, Server};
