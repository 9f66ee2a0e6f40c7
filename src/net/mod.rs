//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bind, accept)
//!     → tls.rs (optional TLS handshake)
//!     → connection.rs (lifecycle tracking, forced close, drain)
//!     → Hand off to the HTTP pipeline
//! ```
//!
//! # Design Decisions
//! - Every accepted socket is tracked until its close event
//! - Forced close is signalled per connection through a watch channel
//! - Drain completion is observed through the live-connection count

pub mod connection;
pub mod listener;
pub mod tls;

use thiserror::Error;

/// Errors surfaced by server start-up.
///
/// Bind and TLS failures are reported from `start` instead of stalling the
/// caller, so a port conflict or bad key material fails the test early.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound (port in use, bad host, ...).
    #[error("failed to bind listening socket: {0}")]
    Bind(#[source] std::io::Error),

    /// The supplied PEM material could not be read.
    #[error("failed to read TLS key material: {0}")]
    TlsMaterial(#[source] std::io::Error),

    /// The TLS configuration could not be built from the supplied material.
    #[error("failed to build TLS configuration: {0}")]
    Tls(#[source] tokio_rustls::rustls::Error),
}
