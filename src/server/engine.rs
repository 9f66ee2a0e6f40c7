//! Single-protocol mock server engine.
//!
//! # Responsibilities
//! - Bind the listening socket and run the accept loop
//! - Track every accepted socket for enumeration and forced close
//! - Run the fixed request pipeline: record → decode → match → reply → 404
//! - Drain on stop: listening socket closed and every connection gone
//!   before handlers and the request log are cleared

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http_body_util::BodyExt;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_rustls::TlsAcceptor;

use crate::config::{HttpConfig, HttpsConfig};
use crate::http::decode;
use crate::http::recorder::RequestRecorder;
use crate::http::request::{RecordedRequest, RequestFilter};
use crate::http::response::{self, ResponseBody};
use crate::net::connection::{ConnectionGuard, ConnectionInfo, ConnectionTracker};
use crate::net::tls::TlsMaterial;
use crate::net::{listener, tls, ServerError};
use crate::routing::handler::Handler;
use crate::routing::registry::HandlerRegistry;

/// One listening mock server (HTTP or HTTPS).
///
/// Created in the stopped state; [`start`](Server::start) binds and begins
/// accepting, [`stop`](Server::stop) force-closes every socket, waits for
/// the drain to complete and clears handlers and the request log. The
/// server may be restarted afterwards.
pub struct Server {
    host: String,
    port: u16,
    tls: Option<TlsMaterial>,
    state: Arc<EngineState>,
    accept: Mutex<Option<AcceptTask>>,
}

struct AcceptTask {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

struct EngineState {
    handlers: HandlerRegistry,
    recorder: RequestRecorder,
    connections: ConnectionTracker,
    bound: Mutex<Option<SocketAddr>>,
}

impl Server {
    /// Create a plain-HTTP server (stopped).
    pub fn new(config: HttpConfig) -> Self {
        Self::build(config.host, config.port, None)
    }

    /// Create an HTTPS server from PEM key material (stopped).
    pub fn with_tls(config: HttpsConfig) -> Self {
        Self::build(
            config.host,
            config.port,
            Some(TlsMaterial {
                key: config.key,
                cert: config.cert,
            }),
        )
    }

    fn build(host: String, port: u16, tls: Option<TlsMaterial>) -> Self {
        Self {
            host,
            port,
            tls,
            state: Arc::new(EngineState {
                handlers: HandlerRegistry::new(),
                recorder: RequestRecorder::new(),
                connections: ConnectionTracker::new(),
                bound: Mutex::new(None),
            }),
            accept: Mutex::new(None),
        }
    }

    /// Bind and start accepting connections.
    ///
    /// Returns once the socket is bound, so [`port`](Server::port) is known
    /// when this resolves. Bind and TLS-material failures are returned as
    /// errors. Calling `start` on a listening server is a no-op.
    pub async fn start(&self) -> Result<(), ServerError> {
        if self.accept.lock().expect("accept task mutex poisoned").is_some() {
            return Ok(());
        }

        let acceptor = match &self.tls {
            Some(material) => Some(tls::build_acceptor(material)?),
            None => None,
        };

        let (tcp_listener, local_addr) = listener::bind(&self.host, self.port).await?;
        *self.state.bound.lock().expect("bound address mutex poisoned") = Some(local_addr);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(accept_loop(
            tcp_listener,
            acceptor,
            Arc::clone(&self.state),
            shutdown_rx,
        ));

        *self.accept.lock().expect("accept task mutex poisoned") =
            Some(AcceptTask { shutdown_tx, handle });

        tracing::info!(
            address = %local_addr,
            protocol = if self.tls.is_some() { "https" } else { "http" },
            "mock server listening"
        );

        Ok(())
    }

    /// Stop the server and release its state.
    ///
    /// Force-closes every tracked connection, waits for the listening
    /// socket to close and for the connection set to drain, then clears
    /// handlers and the request log. A stopped server is a no-op.
    pub async fn stop(&self) {
        let task = self.accept.lock().expect("accept task mutex poisoned").take();
        let Some(task) = task else {
            return;
        };

        let _ = task.shutdown_tx.send(true);
        self.state.connections.close_all();

        // The accept task owns the listening socket; its completion is the
        // socket's close event.
        let _ = task.handle.await;
        // A socket accepted while the shutdown raced the accept loop missed
        // the first signal; the loop has exited now, so this one is final.
        self.state.connections.close_all();
        self.state.connections.drained().await;

        self.state.handlers.clear();
        self.state.recorder.clear();
        *self.state.bound.lock().expect("bound address mutex poisoned") = None;

        tracing::info!("mock server stopped");
    }

    /// Register a handler. Newest registrations shadow older ones.
    pub fn on(&self, handler: Handler) -> &Self {
        self.state.handlers.register(handler);
        self
    }

    /// Every recorded request, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.recorder.snapshot(&RequestFilter::default())
    }

    /// Recorded requests matching the filter exactly, in arrival order.
    pub fn requests_matching(&self, filter: &RequestFilter) -> Vec<RecordedRequest> {
        self.state.recorder.snapshot(filter)
    }

    /// The currently live sockets.
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        self.state.connections.connections()
    }

    /// The bound port while listening, `None` while stopped.
    pub fn port(&self) -> Option<u16> {
        self.state
            .bound
            .lock()
            .expect("bound address mutex poisoned")
            .map(|addr| addr.port())
    }

    /// Clear handlers and the request log.
    pub fn reset(&self) {
        self.reset_handlers();
        self.reset_requests();
    }

    /// Clear registered handlers only.
    pub fn reset_handlers(&self) {
        self.state.handlers.clear();
    }

    /// Clear the request log only.
    pub fn reset_requests(&self) {
        self.state.recorder.clear();
    }
}

async fn accept_loop(
    tcp_listener: tokio::net::TcpListener,
    acceptor: Option<TlsAcceptor>,
    state: Arc<EngineState>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown_rx.changed() => break,
            accepted = tcp_listener.accept() => {
                match accepted {
                    Ok((stream, peer_addr)) => {
                        let guard = state.connections.register(peer_addr);
                        tokio::spawn(serve_connection(
                            stream,
                            peer_addr,
                            acceptor.clone(),
                            Arc::clone(&state),
                            guard,
                        ));
                    }
                    Err(error) => {
                        tracing::warn!(%error, "failed to accept connection");
                    }
                }
            }
        }
    }
    // Dropping the listener here is the listening socket's close event.
}

async fn serve_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    acceptor: Option<TlsAcceptor>,
    state: Arc<EngineState>,
    mut guard: ConnectionGuard,
) {
    let service = service_fn(move |request: Request<Incoming>| {
        let state = Arc::clone(&state);
        async move { Ok::<_, Infallible>(dispatch(state, request).await) }
    });

    match acceptor {
        Some(acceptor) => {
            let tls_stream = tokio::select! {
                _ = guard.closed() => return,
                handshake = acceptor.accept(stream) => match handshake {
                    Ok(tls_stream) => tls_stream,
                    Err(error) => {
                        tracing::warn!(peer = %peer_addr, %error, "TLS handshake failed");
                        return;
                    }
                },
            };
            let connection = http1::Builder::new().serve_connection(TokioIo::new(tls_stream), service);
            drive(connection, &mut guard).await;
        }
        None => {
            let connection = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
            drive(connection, &mut guard).await;
        }
    }
}

/// Race the serving future against the forced-close signal; losing the
/// race drops the connection, closing the socket.
async fn drive<C>(connection: C, guard: &mut ConnectionGuard)
where
    C: Future<Output = hyper::Result<()>>,
{
    tokio::pin!(connection);
    tokio::select! {
        result = &mut connection => {
            if let Err(error) = result {
                tracing::debug!(connection = %guard.id(), %error, "connection ended with error");
            }
        }
        _ = guard.closed() => {
            tracing::debug!(connection = %guard.id(), "connection forcibly closed");
        }
    }
}

/// The fixed-order request pipeline.
async fn dispatch(state: Arc<EngineState>, request: Request<Incoming>) -> Response<ResponseBody> {
    let (parts, body) = request.into_parts();

    // Record before decoding: the log and the pipeline share this object.
    let shared = state.recorder.record(RecordedRequest::from_parts(&parts));

    let raw = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(error) => {
            tracing::debug!(%error, "failed to read request body");
            Bytes::new()
        }
    };
    decode::decode_body(&shared, &raw);

    let matched_at = Instant::now();
    let matched = {
        let request = shared.lock().expect("recorded request mutex poisoned");
        state.handlers.find_match(&request)
    };

    match matched {
        Some(handler) => response::synthesize(&handler, &shared, matched_at).await,
        None => {
            let request = shared.lock().expect("recorded request mutex poisoned");
            tracing::debug!(method = %request.method, path = %request.pathname, "no handler matched");
            response::fallback_response()
        }
    }
}
