//! Response synthesis for matched handlers.
//!
//! # Responsibilities
//! - Resolve status and body (literal, sync fn, async fn)
//! - Merge headers: declared → computed content-length → overrides
//! - Honor the artificial delay, measured from match time
//! - Omit the body for HEAD; keep the connection open when asked to

use std::convert::Infallible;

use bytes::Bytes;
use futures_util::stream;
use futures_util::StreamExt;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::Frame;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{Response, StatusCode};
use tokio::time::Instant;

use crate::http::request::SharedRequest;
use crate::routing::handler::{BodySource, Handler, ReplyBody, StatusSource};

pub(crate) type ResponseBody = BoxBody<Bytes, Infallible>;

/// Synthesize the response for a matched handler.
///
/// `matched_at` anchors the artificial delay: the response is written no
/// earlier than `matched_at + delay`, regardless of how long body
/// resolution took.
pub(crate) async fn synthesize(
    handler: &Handler,
    request: &SharedRequest,
    matched_at: Instant,
) -> Response<ResponseBody> {
    let body = resolve_body(handler, request).await;
    let status_raw = resolve_status(handler, request);

    let status = StatusCode::from_u16(status_raw).unwrap_or_else(|_| {
        tracing::warn!(status = status_raw, "handler produced an unwritable status, sending 500");
        StatusCode::INTERNAL_SERVER_ERROR
    });

    let content = body.into_bytes();
    let headers = merge_headers(handler, content.len());
    let content_length_suppressed = !headers.iter().any(|(name, _)| name == "content-length");

    tokio::time::sleep_until(matched_at + handler.delay).await;

    let is_head = {
        let request = request.lock().expect("recorded request mutex poisoned");
        request.method == "HEAD"
    };

    let body = if !handler.reply.end {
        // Keep-open wins over HEAD: headers go out, nothing ends.
        keep_open_body(if is_head { Bytes::new() } else { content })
    } else if is_head {
        Empty::new().boxed()
    } else if content_length_suppressed {
        // A body with an exact size hint would let hyper re-add the header;
        // an unsized stream keeps it suppressed (chunked transfer).
        unsized_body(content)
    } else {
        Full::new(content).boxed()
    };

    let mut builder = Response::builder().status(status);
    if let Some(header_map) = builder.headers_mut() {
        for (name, value) in &headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    header_map.append(name, value);
                }
                _ => tracing::warn!(header = %name, "skipping header that cannot be written"),
            }
        }
    }

    builder.body(body).expect("response head is valid")
}

/// The fixed response for requests no handler matched.
pub(crate) fn fallback_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header("content-type", "plain/text")
        .header("content-length", "9")
        .body(Full::new(Bytes::from_static(b"Not Found")).boxed())
        .expect("fallback response head is valid")
}

async fn resolve_body(handler: &Handler, request: &SharedRequest) -> ReplyBody {
    match &handler.reply.body {
        BodySource::Static(body) => body.clone(),
        BodySource::Sync(f) => {
            let request = request.lock().expect("recorded request mutex poisoned");
            f(&request)
        }
        BodySource::Async(f) => {
            let snapshot = request
                .lock()
                .expect("recorded request mutex poisoned")
                .clone();
            f(snapshot).await
        }
    }
}

fn resolve_status(handler: &Handler, request: &SharedRequest) -> u16 {
    match &handler.reply.status {
        StatusSource::Static(status) => *status,
        StatusSource::Sync(f) => {
            let request = request.lock().expect("recorded request mutex poisoned");
            f(&request)
        }
    }
}

/// Merge headers lowest to highest precedence: declared headers, computed
/// content-length, overrides. An override of `None` removes the header
/// entirely.
fn merge_headers(handler: &Handler, content_length: usize) -> Vec<(String, String)> {
    let mut headers = handler.reply.headers.clone();
    upsert(&mut headers, "content-length", content_length.to_string());

    for (name, value) in &handler.reply.headers_overrides {
        match value {
            Some(value) => upsert(&mut headers, name, value.clone()),
            None => headers.retain(|(existing, _)| existing != name),
        }
    }

    headers
}

fn upsert(headers: &mut Vec<(String, String)>, name: &str, value: String) {
    match headers.iter_mut().find(|(existing, _)| existing == name) {
        Some((_, existing_value)) => *existing_value = value,
        None => headers.push((name.to_string(), value)),
    }
}

/// The body bytes, then pending forever: the connection stays open.
/// An empty frame is never emitted; it would read as a chunked terminator.
fn keep_open_body(content: Bytes) -> ResponseBody {
    let frames: Vec<Result<Frame<Bytes>, Infallible>> = if content.is_empty() {
        Vec::new()
    } else {
        vec![Ok(Frame::data(content))]
    };
    BodyExt::boxed(StreamBody::new(stream::iter(frames).chain(stream::pending())))
}

/// One data frame with no exact size hint, then end of stream.
fn unsized_body(content: Bytes) -> ResponseBody {
    let frames = stream::iter(vec![Ok::<_, Infallible>(Frame::data(content))]);
    BodyExt::boxed(StreamBody::new(frames))
}
