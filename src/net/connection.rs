//! Connection lifecycle tracking.
//!
//! # Responsibilities
//! - Track every live socket of one listening server
//! - Generate unique connection IDs for tracing
//! - Deliver a forced-close signal to each connection task
//! - Report drain completion once every tracked socket has closed

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Global atomic counter for connection IDs.
/// Relaxed ordering is sufficient since we only need uniqueness.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a tracked connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    fn next() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A live socket as observed through [`connections()`](crate::MockServer::connections).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Identifier of the connection.
    pub id: ConnectionId,
    /// Peer address of the socket.
    pub peer_addr: SocketAddr,
}

struct TrackedConnection {
    peer_addr: SocketAddr,
    close_tx: watch::Sender<bool>,
}

struct TrackerInner {
    live: Mutex<HashMap<ConnectionId, TrackedConnection>>,
    count_tx: watch::Sender<usize>,
    count_rx: watch::Receiver<usize>,
}

/// Tracks the live sockets of one listening server.
///
/// Each accepted socket registers itself and holds the returned guard for
/// its lifetime; dropping the guard deregisters the socket and updates the
/// live count that [`drained`](ConnectionTracker::drained) observes.
#[derive(Clone)]
pub(crate) struct ConnectionTracker {
    inner: Arc<TrackerInner>,
}

impl ConnectionTracker {
    pub(crate) fn new() -> Self {
        let (count_tx, count_rx) = watch::channel(0);
        Self {
            inner: Arc::new(TrackerInner {
                live: Mutex::new(HashMap::new()),
                count_tx,
                count_rx,
            }),
        }
    }

    /// Record a new live socket. The guard deregisters it on drop.
    pub(crate) fn register(&self, peer_addr: SocketAddr) -> ConnectionGuard {
        let id = ConnectionId::next();
        let (close_tx, close_rx) = watch::channel(false);

        let mut live = self.inner.live.lock().expect("connection tracker mutex poisoned");
        live.insert(id, TrackedConnection { peer_addr, close_tx });
        self.inner.count_tx.send_replace(live.len());
        drop(live);

        tracing::trace!(connection = %id, peer = %peer_addr, "connection tracked");

        ConnectionGuard {
            inner: Arc::clone(&self.inner),
            id,
            close_rx,
        }
    }

    /// Enumerate the currently live sockets, oldest ID first.
    pub(crate) fn connections(&self) -> Vec<ConnectionInfo> {
        let live = self.inner.live.lock().expect("connection tracker mutex poisoned");
        let mut infos: Vec<ConnectionInfo> = live
            .iter()
            .map(|(id, conn)| ConnectionInfo {
                id: *id,
                peer_addr: conn.peer_addr,
            })
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Signal every tracked connection to close immediately.
    ///
    /// In-flight responses are abandoned mid-flight; this is test-teardown
    /// behavior, not graceful completion.
    pub(crate) fn close_all(&self) {
        let live = self.inner.live.lock().expect("connection tracker mutex poisoned");
        for (id, conn) in live.iter() {
            tracing::trace!(connection = %id, "forcing connection closed");
            conn.close_tx.send_replace(true);
        }
    }

    /// Wait until every tracked connection has deregistered.
    pub(crate) async fn drained(&self) {
        let mut rx = self.inner.count_rx.clone();
        let _ = rx.wait_for(|count| *count == 0).await;
    }

    #[cfg(test)]
    pub(crate) fn count(&self) -> usize {
        self.inner.live.lock().expect("connection tracker mutex poisoned").len()
    }
}

/// Guard representing one tracked socket's lifetime.
pub(crate) struct ConnectionGuard {
    inner: Arc<TrackerInner>,
    id: ConnectionId,
    close_rx: watch::Receiver<bool>,
}

impl ConnectionGuard {
    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    /// Resolves when the tracker forces this connection closed.
    pub(crate) async fn closed(&mut self) {
        let _ = self.close_rx.wait_for(|closed| *closed).await;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        let mut live = self.inner.live.lock().expect("connection tracker mutex poisoned");
        live.remove(&self.id);
        self.inner.count_tx.send_replace(live.len());
        drop(live);

        tracing::trace!(connection = %self.id, "connection closed");
    }
}
