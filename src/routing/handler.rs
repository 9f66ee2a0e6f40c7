//! Handler and reply definitions.
//!
//! A [`Handler`] pairs match criteria (method, path, optional filter
//! predicate) with a [`Reply`] describing the response to synthesize.
//! Status and body are tagged variants: a literal value, a synchronous
//! function of the request, or (for the body) an asynchronous function
//! returning a future.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;

use crate::http::request::RecordedRequest;

/// Wildcard accepted for method and path match criteria.
pub const WILDCARD: &str = "*";

type FilterFn = Arc<dyn Fn(&RecordedRequest) -> bool + Send + Sync>;
type StatusFn = Arc<dyn Fn(&RecordedRequest) -> u16 + Send + Sync>;
type BodyFn = Arc<dyn Fn(&RecordedRequest) -> ReplyBody + Send + Sync>;
type AsyncBodyFn = Arc<dyn Fn(RecordedRequest) -> BoxFuture<'static, ReplyBody> + Send + Sync>;

/// Response body payload.
///
/// Content length is the byte length either way; text is measured UTF-8
/// encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    /// UTF-8 text payload.
    Text(String),
    /// Raw binary payload.
    Binary(Bytes),
}

impl ReplyBody {
    /// Byte length of the payload.
    pub fn len(&self) -> usize {
        match self {
            ReplyBody::Text(text) => text.len(),
            ReplyBody::Binary(bytes) => bytes.len(),
        }
    }

    /// True when the payload has no bytes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn into_bytes(self) -> Bytes {
        match self {
            ReplyBody::Text(text) => Bytes::from(text),
            ReplyBody::Binary(bytes) => bytes,
        }
    }
}

impl Default for ReplyBody {
    fn default() -> Self {
        ReplyBody::Text(String::new())
    }
}

impl From<String> for ReplyBody {
    fn from(text: String) -> Self {
        ReplyBody::Text(text)
    }
}

impl From<&str> for ReplyBody {
    fn from(text: &str) -> Self {
        ReplyBody::Text(text.to_string())
    }
}

impl From<Vec<u8>> for ReplyBody {
    fn from(bytes: Vec<u8>) -> Self {
        ReplyBody::Binary(Bytes::from(bytes))
    }
}

impl From<Bytes> for ReplyBody {
    fn from(bytes: Bytes) -> Self {
        ReplyBody::Binary(bytes)
    }
}

/// How the response status is produced.
#[derive(Clone)]
pub(crate) enum StatusSource {
    Static(u16),
    Sync(StatusFn),
}

/// How the response body is produced.
#[derive(Clone)]
pub(crate) enum BodySource {
    Static(ReplyBody),
    Sync(BodyFn),
    Async(AsyncBodyFn),
}

/// The status/headers/body/end description attached to a handler.
#[derive(Clone)]
pub struct Reply {
    pub(crate) status: StatusSource,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) headers_overrides: Vec<(String, Option<String>)>,
    pub(crate) body: BodySource,
    pub(crate) end: bool,
}

impl Default for Reply {
    fn default() -> Self {
        Self {
            status: StatusSource::Static(200),
            headers: Vec::new(),
            headers_overrides: Vec::new(),
            body: BodySource::Static(ReplyBody::default()),
            end: true,
        }
    }
}

impl Reply {
    /// A reply with status 200, an empty body, and no declared headers.
    ///
    /// `content-type: application/json` is merged underneath the declared
    /// headers at registration; declared values win.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a literal response status.
    pub fn status(mut self, status: u16) -> Self {
        self.status = StatusSource::Static(status);
        self
    }

    /// Compute the response status from the request.
    pub fn status_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&RecordedRequest) -> u16 + Send + Sync + 'static,
    {
        self.status = StatusSource::Sync(Arc::new(f));
        self
    }

    /// Set a literal response body.
    pub fn body(mut self, body: impl Into<ReplyBody>) -> Self {
        self.body = BodySource::Static(body.into());
        self
    }

    /// Compute the response body from the request.
    pub fn body_fn<F, B>(mut self, f: F) -> Self
    where
        F: Fn(&RecordedRequest) -> B + Send + Sync + 'static,
        B: Into<ReplyBody>,
    {
        self.body = BodySource::Sync(Arc::new(move |request| f(request).into()));
        self
    }

    /// Compute the response body asynchronously.
    ///
    /// The function receives a snapshot of the recorded request and returns
    /// a future; synthesis suspends until it resolves.
    pub fn body_async<F, Fut, B>(mut self, f: F) -> Self
    where
        F: Fn(RecordedRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = B> + Send + 'static,
        B: Into<ReplyBody>,
    {
        self.body = BodySource::Async(Arc::new(move |request| {
            let fut = f(request);
            Box::pin(async move { fut.await.into() })
        }));
        self
    }

    /// Declare a response header. Names are normalized to lowercase.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        upsert(&mut self.headers, name.into().to_lowercase(), value.into());
        self
    }

    /// Override a header after `content-length` has been computed.
    ///
    /// Overrides win over declared headers and over the computed
    /// `content-length`.
    pub fn override_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers_overrides
            .push((name.into().to_lowercase(), Some(value.into())));
        self
    }

    /// Remove a header from the final response, even if declared or
    /// computed (the way to suppress `content-length`).
    pub fn remove_header(mut self, name: impl Into<String>) -> Self {
        self.headers_overrides.push((name.into().to_lowercase(), None));
        self
    }

    /// Keep the response connection open after the body bytes are written.
    ///
    /// Useful to test client-side read timeouts after a partial response.
    pub fn keep_open(mut self) -> Self {
        self.end = false;
        self
    }
}

fn upsert(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers.iter_mut().find(|(existing, _)| *existing == name) {
        Some((_, existing_value)) => *existing_value = value,
        None => headers.push((name, value)),
    }
}

/// A registered method/path/filter/reply rule.
#[derive(Clone)]
pub struct Handler {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) filter: Option<FilterFn>,
    pub(crate) reply: Reply,
    pub(crate) delay: Duration,
}

impl Handler {
    /// A handler matching `GET` on the given path with a default reply.
    ///
    /// The path is either an exact string or [`WILDCARD`].
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            method: "GET".to_string(),
            path: path.into(),
            filter: None,
            reply: Reply::default(),
            delay: Duration::ZERO,
        }
    }

    /// Set the method to match: a verb (case-insensitive) or [`WILDCARD`].
    pub fn method(mut self, method: impl Into<String>) -> Self {
        let method = method.into();
        self.method = if method == WILDCARD {
            method
        } else {
            method.to_uppercase()
        };
        self
    }

    /// Restrict the handler with a predicate over the recorded request.
    pub fn filter<F>(mut self, f: F) -> Self
    where
        F: Fn(&RecordedRequest) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(f));
        self
    }

    /// Attach the reply to synthesize on match.
    pub fn reply(mut self, reply: Reply) -> Self {
        self.reply = reply;
        self
    }

    /// Delay the response, measured from match time.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// True when method, path and filter all accept the request.
    pub(crate) fn matches(&self, request: &RecordedRequest) -> bool {
        if self.method != WILDCARD && request.method != self.method {
            return false;
        }
        if self.path != WILDCARD && request.pathname != self.path {
            return false;
        }
        match &self.filter {
            Some(filter) => filter(request),
            None => true,
        }
    }

    /// Apply registration-time defaults: `content-type: application/json`
    /// is merged underneath declared headers.
    pub(crate) fn normalize(mut self) -> Self {
        let has_content_type = self
            .reply
            .headers
            .iter()
            .any(|(name, _)| name == "content-type");
        if !has_content_type {
            self.reply
                .headers
                .insert(0, ("content-type".to_string(), "application/json".to_string()));
        }
        self
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("filter", &self.filter.is_some())
            .field("delay", &self.delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::request::RecordedRequest;

    fn request(method: &str, pathname: &str) -> RecordedRequest {
        RecordedRequest::for_tests(method, pathname)
    }

    #[test]
    fn matches_exact_method_and_path() {
        let handler = Handler::new("/dog").method("put");
        assert!(handler.matches(&request("PUT", "/dog")));
        assert!(!handler.matches(&request("GET", "/dog")));
        assert!(!handler.matches(&request("PUT", "/cat")));
    }

    #[test]
    fn wildcard_method_and_path_match_anything() {
        let handler = Handler::new(WILDCARD).method(WILDCARD);
        assert!(handler.matches(&request("DELETE", "/whatever")));
    }

    #[test]
    fn filter_rejects_requests() {
        let handler = Handler::new("/dog").filter(|req| req.query.contains_key("id"));
        assert!(!handler.matches(&request("GET", "/dog")));
    }

    #[test]
    fn normalize_injects_json_content_type() {
        let handler = Handler::new("/dog").normalize();
        assert_eq!(
            handler.reply.headers,
            vec![("content-type".to_string(), "application/json".to_string())]
        );
    }

    #[test]
    fn normalize_keeps_caller_content_type() {
        let handler = Handler::new("/dog")
            .reply(Reply::new().header("Content-Type", "text/html"))
            .normalize();
        assert_eq!(
            handler.reply.headers,
            vec![("content-type".to_string(), "text/html".to_string())]
        );
    }

    #[test]
    fn reply_header_names_are_lowercased_and_deduplicated() {
        let reply = Reply::new()
            .header("X-Token", "a")
            .header("x-token", "b");
        assert_eq!(reply.headers, vec![("x-token".to_string(), "b".to_string())]);
    }

    #[test]
    fn reply_body_lengths_are_byte_lengths() {
        assert_eq!(ReplyBody::from("héllo").len(), 6);
        assert_eq!(ReplyBody::from(vec![1u8, 2, 3]).len(), 3);
    }
}
