//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! caller-built (or deserialized) HttpConfig / HttpsConfig
//!     → schema.rs (shape & defaults)
//!     → server::MockServer (one engine per configured protocol)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a server is constructed
//! - Port 0 requests an OS-assigned port, readable after start
//! - TLS key/cert are PEM literals supplied by the caller, never file paths

pub mod schema;

pub use schema::HttpConfig;
pub use schema::HttpsConfig;
