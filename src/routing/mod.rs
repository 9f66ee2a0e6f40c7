//! Handler registration and matching subsystem.
//!
//! # Data Flow
//! ```text
//! on(handler)
//!     → handler.rs (builder, defaults applied at registration)
//!     → registry.rs (newest-first ordered list)
//!
//! per request:
//!     registry.find_match(request)
//!     → first handler whose method/path/filter all accept the request
//! ```
//!
//! # Design Decisions
//! - Newest registrations shadow older ones with equal criteria (LIFO)
//! - `"*"` is the wildcard for method and path; paths otherwise match exactly
//! - Method comparison is case-insensitive, path comparison is case-sensitive

pub mod handler;
pub mod registry;

pub use handler::{Handler, Reply, ReplyBody};
