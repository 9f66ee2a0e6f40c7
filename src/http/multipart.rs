//! Minimal `multipart/form-data` parser.
//!
//! Parses an already-buffered body into text fields and file uploads.
//! Parts without a filename become fields; parts with one become files.
//!
//! ```text
//! --boundary\r\n
//! Content-Disposition: form-data; name="field1"\r\n
//! \r\n
//! value1\r\n
//! --boundary\r\n
//! Content-Disposition: form-data; name="file"; filename="example.txt"\r\n
//! Content-Type: text/plain\r\n
//! \r\n
//! file contents...\r\n
//! --boundary--\r\n
//! ```

use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;

use crate::http::request::UploadedFile;

/// Errors raised while parsing a multipart body.
///
/// The decoding stage swallows these; they exist so tests can assert on
/// the failure mode.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum MultipartError {
    #[error("missing boundary in multipart content-type")]
    MissingBoundary,
    #[error("body does not start with the boundary delimiter")]
    MissingDelimiter,
    #[error("part is missing its header section")]
    MissingHeaders,
    #[error("part is missing a content-disposition name")]
    MissingName,
}

/// Parsed multipart form: text fields and file uploads by field name.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct MultipartForm {
    pub fields: HashMap<String, String>,
    pub files: HashMap<String, UploadedFile>,
}

/// Extract the boundary parameter from a `multipart/form-data` content type.
pub(crate) fn boundary(content_type: &str) -> Result<String, MultipartError> {
    content_type
        .split(';')
        .skip(1)
        .filter_map(|param| param.trim().strip_prefix("boundary="))
        .map(|value| value.trim_matches('"').to_string())
        .next()
        .ok_or(MultipartError::MissingBoundary)
}

/// Parse a buffered multipart body.
pub(crate) fn parse(boundary: &str, data: &[u8]) -> Result<MultipartForm, MultipartError> {
    let delimiter = format!("--{boundary}");
    let delimiter = delimiter.as_bytes();

    if !data.starts_with(delimiter) {
        return Err(MultipartError::MissingDelimiter);
    }

    let mut form = MultipartForm::default();
    let mut offset = delimiter.len();

    loop {
        // "--" after the delimiter marks the closing boundary.
        if data[offset..].starts_with(b"--") {
            break;
        }
        let part_start = match find(&data[offset..], b"\r\n") {
            Some(i) => offset + i + 2,
            None => break,
        };
        let part_end = match find(&data[part_start..], delimiter) {
            Some(i) => part_start + i,
            None => break,
        };

        // Trailing \r\n before the next delimiter belongs to the framing.
        let part = &data[part_start..part_end];
        let part = part.strip_suffix(b"\r\n").unwrap_or(part);
        parse_part(part, &mut form)?;

        offset = part_end + delimiter.len();
    }

    Ok(form)
}

fn parse_part(part: &[u8], form: &mut MultipartForm) -> Result<(), MultipartError> {
    let header_end = find(part, b"\r\n\r\n").ok_or(MultipartError::MissingHeaders)?;
    let headers = String::from_utf8_lossy(&part[..header_end]);
    let body = &part[header_end + 4..];

    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in headers.lines() {
        let Some((header, value)) = line.split_once(':') else {
            continue;
        };
        match header.trim().to_lowercase().as_str() {
            "content-disposition" => {
                name = disposition_param(value, "name");
                filename = disposition_param(value, "filename");
            }
            "content-type" => content_type = Some(value.trim().to_string()),
            _ => {}
        }
    }

    let name = name.ok_or(MultipartError::MissingName)?;

    match filename {
        Some(filename) => {
            form.files.insert(
                name,
                UploadedFile {
                    filename: Some(filename),
                    content_type,
                    data: Bytes::copy_from_slice(body),
                },
            );
        }
        None => {
            form.fields
                .insert(name, String::from_utf8_lossy(body).into_owned());
        }
    }

    Ok(())
}

fn disposition_param(disposition: &str, param: &str) -> Option<String> {
    disposition
        .split(';')
        .filter_map(|piece| piece.trim().strip_prefix(&format!("{param}=")))
        .map(|value| value.trim_matches('"').to_string())
        .next()
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
