//! Inbound request representation.
//!
//! A [`RecordedRequest`] is created per dispatch, before body decoding, and
//! appended to the request log at that point. The log and the pipeline hold
//! the same object behind `Arc<Mutex<_>>`, so fields populated later by the
//! decoding stage are visible through the log.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use hyper::http::request::Parts;

/// Shared handle to one recorded request.
pub(crate) type SharedRequest = Arc<Mutex<RecordedRequest>>;

/// A logged inbound request, including post-decoding mutations.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    /// Request method, uppercase (`GET`, `PUT`, ...).
    pub method: String,

    /// Raw request target as sent by the client (path plus query).
    pub target: String,

    /// Path component of the target.
    pub pathname: String,

    /// Query parameters, urldecoded.
    pub query: HashMap<String, String>,

    /// Request headers; names lowercased, values lossily UTF-8 decoded.
    pub headers: HashMap<String, String>,

    /// Decoded request body; [`RequestBody::Empty`] until decoding ran.
    pub body: RequestBody,

    /// Multipart file uploads by field name.
    pub files: HashMap<String, UploadedFile>,
}

impl RecordedRequest {
    /// Build a record from the request head; pathname and query are parsed
    /// once here.
    pub(crate) fn from_parts(parts: &Parts) -> Self {
        let pathname = parts.uri.path().to_string();
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| pathname.clone());
        let query = parts
            .uri
            .query()
            .map(|q| {
                url::form_urlencoded::parse(q.as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        let headers = parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        Self {
            method: parts.method.as_str().to_string(),
            target,
            pathname,
            query,
            headers,
            body: RequestBody::Empty,
            files: HashMap::new(),
        }
    }

    /// Look up a header by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }

    /// The `content-type` without parameters, lowercased (`"text/plain"`
    /// from `"Text/Plain; charset=utf-8"`).
    pub(crate) fn media_type(&self) -> Option<String> {
        self.header("content-type")
            .and_then(|ct| ct.split(';').next())
            .map(|mt| mt.trim().to_lowercase())
    }

    #[cfg(test)]
    pub(crate) fn for_tests(method: &str, pathname: &str) -> Self {
        Self {
            method: method.to_string(),
            target: pathname.to_string(),
            pathname: pathname.to_string(),
            query: HashMap::new(),
            headers: HashMap::new(),
            body: RequestBody::Empty,
            files: HashMap::new(),
        }
    }
}

/// Decoded request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    /// No body, or decoding has not run.
    #[default]
    Empty,
    /// Plain text (also the fallback for unrecognized media types).
    Text(String),
    /// Parsed `application/json` payload.
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` or multipart fields.
    Form(HashMap<String, String>),
}

impl RequestBody {
    /// Text payload, if this body is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RequestBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// JSON payload, if this body parsed as JSON.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            RequestBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Form fields, if this body decoded as a form.
    pub fn as_form(&self) -> Option<&HashMap<String, String>> {
        match self {
            RequestBody::Form(fields) => Some(fields),
            _ => None,
        }
    }
}

/// A multipart file upload attached to a recorded request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Client-supplied file name, if any.
    pub filename: Option<String>,
    /// Part content type, if declared.
    pub content_type: Option<String>,
    /// Raw file bytes.
    pub data: Bytes,
}

/// Criteria for [`requests_matching`](crate::MockServer::requests_matching).
///
/// Both fields match exactly: the method verbatim, the pathname
/// case-sensitively. No wildcard support at query time, unlike handler
/// registration.
#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    /// Method to match exactly, if set.
    pub method: Option<String>,
    /// Pathname to match exactly, if set.
    pub path: Option<String>,
}

impl RequestFilter {
    /// A filter accepting every request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict to an exact method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Restrict to an exact pathname.
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub(crate) fn accepts(&self, request: &RecordedRequest) -> bool {
        let method_ok = self
            .method
            .as_ref()
            .map(|m| *m == request.method)
            .unwrap_or(true);
        let path_ok = self
            .path
            .as_ref()
            .map(|p| *p == request.pathname)
            .unwrap_or(true);
        method_ok && path_ok
    }
}
