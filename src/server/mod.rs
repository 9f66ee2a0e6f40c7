//! Server subsystem.
//!
//! # Data Flow
//! ```text
//! MockServer (facade: HTTP and/or HTTPS, uniform no-op when unconfigured)
//!     → engine.rs (one listening server per protocol)
//!         accept loop → net::connection (tracking)
//!                     → net::tls (HTTPS handshake)
//!                     → pipeline: record → decode → match → synthesize → 404
//! ```
//!
//! # Design Decisions
//! - `start` surfaces bind/TLS failures instead of stalling the caller
//! - `stop` force-closes sockets and waits for both the listening socket
//!   and every tracked connection before clearing state
//! - The facade registers handlers on both engines and concatenates query
//!   results HTTP first

pub mod engine;
pub mod facade;

pub use engine::Server;
pub use facade::MockServer;
