//! Best-effort body decoding stage.
//!
//! Mirrors the classic middleware chain: multipart (POST/PUT only), then
//! JSON, then urlencoded, then a catch-all text decoder. Decoding failures
//! never fail the request; the record keeps empty (or textual) fields and
//! the pipeline continues.

use bytes::Bytes;

use crate::http::multipart;
use crate::http::request::{RequestBody, SharedRequest};

/// Populate `body`/`files` on the shared request from the raw body bytes.
pub(crate) fn decode_body(request: &SharedRequest, raw: &Bytes) {
    let mut request = request.lock().expect("recorded request mutex poisoned");

    if raw.is_empty() {
        return;
    }

    let media_type = request.media_type();
    match media_type.as_deref() {
        Some("multipart/form-data") if request.method == "POST" || request.method == "PUT" => {
            let parsed = request
                .header("content-type")
                .ok_or(multipart::MultipartError::MissingBoundary)
                .and_then(|ct| multipart::boundary(ct))
                .and_then(|b| multipart::parse(&b, raw));

            match parsed {
                Ok(form) => {
                    request.body = RequestBody::Form(form.fields);
                    request.files = form.files;
                }
                Err(error) => {
                    tracing::debug!(%error, "multipart decoding failed, continuing with empty fields");
                    request.body = RequestBody::Form(Default::default());
                    request.files = Default::default();
                }
            }
        }
        Some("application/json") => match serde_json::from_slice(raw) {
            Ok(value) => request.body = RequestBody::Json(value),
            Err(error) => {
                tracing::debug!(%error, "JSON decoding failed, keeping body as text");
                request.body = RequestBody::Text(String::from_utf8_lossy(raw).into_owned());
            }
        },
        Some("application/x-www-form-urlencoded") => {
            let fields = url::form_urlencoded::parse(raw).into_owned().collect();
            request.body = RequestBody::Form(fields);
        }
        _ => {
            request.body = RequestBody::Text(String::from_utf8_lossy(raw).into_owned());
        }
    }
}
