//! Listening-socket setup.
//!
//! # Responsibilities
//! - Bind the configured host/port
//! - Report the OS-assigned address (port 0 configs)
//! - Surface bind failures to the caller instead of stalling

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::net::ServerError;

/// Bind a listening socket on the configured host and port.
///
/// Returns the listener together with its bound address so that a port
/// configured as `0` yields the OS-assigned port.
pub(crate) async fn bind(host: &str, port: u16) -> Result<(TcpListener, SocketAddr), ServerError> {
    let listener = TcpListener::bind((host, port))
        .await
        .map_err(ServerError::Bind)?;

    let local_addr = listener.local_addr().map_err(ServerError::Bind)?;

    tracing::debug!(address = %local_addr, "listener bound");

    Ok((listener, local_addr))
}
