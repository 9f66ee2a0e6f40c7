//! Dual-protocol facade.
//!
//! Composes an HTTP and/or an HTTPS engine behind one API. A protocol
//! without configuration is a disabled slot whose operations are uniform
//! no-ops, so callers never branch on which protocols exist.

use crate::config::{HttpConfig, HttpsConfig};
use crate::http::request::{RecordedRequest, RequestFilter};
use crate::net::connection::ConnectionInfo;
use crate::net::ServerError;
use crate::routing::handler::Handler;
use crate::server::engine::Server;

/// One protocol slot: a live engine, or a uniform no-op stand-in.
enum ServerSlot {
    Active(Server),
    Disabled,
}

impl ServerSlot {
    async fn start(&self) -> Result<(), ServerError> {
        match self {
            ServerSlot::Active(server) => server.start().await,
            ServerSlot::Disabled => Ok(()),
        }
    }

    async fn stop(&self) {
        if let ServerSlot::Active(server) = self {
            server.stop().await;
        }
    }

    fn on(&self, handler: Handler) {
        if let ServerSlot::Active(server) = self {
            server.on(handler);
        }
    }

    fn requests_matching(&self, filter: &RequestFilter) -> Vec<RecordedRequest> {
        match self {
            ServerSlot::Active(server) => server.requests_matching(filter),
            ServerSlot::Disabled => Vec::new(),
        }
    }

    fn connections(&self) -> Vec<ConnectionInfo> {
        match self {
            ServerSlot::Active(server) => server.connections(),
            ServerSlot::Disabled => Vec::new(),
        }
    }

    fn port(&self) -> Option<u16> {
        match self {
            ServerSlot::Active(server) => server.port(),
            ServerSlot::Disabled => None,
        }
    }

    fn reset_handlers(&self) {
        if let ServerSlot::Active(server) = self {
            server.reset_handlers();
        }
    }

    fn reset_requests(&self) {
        if let ServerSlot::Active(server) = self {
            server.reset_requests();
        }
    }
}

/// The public mock server: HTTP and/or HTTPS engines behind one API.
pub struct MockServer {
    http: ServerSlot,
    https: ServerSlot,
}

impl MockServer {
    /// Compose a server from optional HTTP and HTTPS configurations.
    pub fn new(http: Option<HttpConfig>, https: Option<HttpsConfig>) -> Self {
        Self {
            http: match http {
                Some(config) => ServerSlot::Active(Server::new(config)),
                None => ServerSlot::Disabled,
            },
            https: match https {
                Some(config) => ServerSlot::Active(Server::with_tls(config)),
                None => ServerSlot::Disabled,
            },
        }
    }

    /// An HTTP-only server.
    pub fn http(config: HttpConfig) -> Self {
        Self::new(Some(config), None)
    }

    /// An HTTPS-only server.
    pub fn https(config: HttpsConfig) -> Self {
        Self::new(None, Some(config))
    }

    /// Start HTTP, then HTTPS. The first failure is returned immediately.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.http.start().await?;
        self.https.start().await
    }

    /// Stop HTTP, then HTTPS, waiting for each drain to complete.
    pub async fn stop(&self) {
        self.http.stop().await;
        self.https.stop().await;
    }

    /// Register a handler on both engines. Chainable.
    pub fn on(&self, handler: Handler) -> &Self {
        self.http.on(handler.clone());
        self.https.on(handler);
        self
    }

    /// Every recorded request: HTTP entries first, then HTTPS.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests_matching(&RequestFilter::default())
    }

    /// Recorded requests matching the filter: HTTP first, then HTTPS.
    pub fn requests_matching(&self, filter: &RequestFilter) -> Vec<RecordedRequest> {
        let mut requests = self.http.requests_matching(filter);
        requests.extend(self.https.requests_matching(filter));
        requests
    }

    /// Live sockets: HTTP connections first, then HTTPS.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        let mut connections = self.http.connections();
        connections.extend(self.https.connections());
        connections
    }

    /// The HTTP port while listening, `None` otherwise.
    pub fn http_port(&self) -> Option<u16> {
        self.http.port()
    }

    /// The HTTPS port while listening, `None` otherwise.
    pub fn https_port(&self) -> Option<u16> {
        self.https.port()
    }

    /// Clear handlers and recorded requests on both engines.
    pub fn reset(&self) {
        self.reset_handlers();
        self.reset_requests();
    }

    /// Clear registered handlers on both engines.
    pub fn reset_handlers(&self) {
        self.http.reset_handlers();
        self.https.reset_handlers();
    }

    /// Clear recorded requests on both engines.
    pub fn reset_requests(&self) {
        self.http.reset_requests();
        self.https.reset_requests();
    }
}
