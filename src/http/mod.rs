//! HTTP pipeline subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → recorder.rs (append to log, before any decoding)
//!     → decode.rs (+ multipart.rs) populate body/files, best effort
//!     → [routing registry picks a handler]
//!     → response.rs (resolve status/body, merge headers, delay, write)
//!     → fallback 404 when nothing matched
//! ```
//!
//! # Design Decisions
//! - The log and the pipeline share one request object, so decoding
//!   mutations are visible through the log
//! - Decoding failures never fail the request
//! - `content-length` is recomputed from the final body unless overridden

pub mod decode;
pub mod multipart;
pub mod recorder;
pub mod request;
pub mod response;

pub use request::{RecordedRequest, RequestBody, RequestFilter, UploadedFile};
