//! `multipart/form-data` serialization

use bytes::{BufMut, BytesMut};
use memchr::memmem;

use super::errors::EncodingError;
use super::types::{EncodedMultipart, MultipartPart};
use crate::crypto::generate_boundary;

/// Hard cap on a serialized body; uploads are buffered in memory
pub const MAX_MULTIPART_SIZE: usize = 100 * 1024 * 1024;

/// Fresh boundaries tried before giving up on a colliding payload
pub const BOUNDARY_ATTEMPTS: usize = 8;

const CRLF: &[u8] = b"\r\n";

/// Multipart encoder with a configurable size limit
#[derive(Debug, Clone, Copy)]
pub struct MultipartEncoder {
    max_size: usize,
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self { max_size: MAX_MULTIPART_SIZE }
    }
}

/// Encode `parts` with the default size limit
///
/// # Errors
///
/// See [`MultipartEncoder::encode`].
pub fn encode(parts: &[MultipartPart]) -> Result<EncodedMultipart, EncodingError> {
    MultipartEncoder::default().encode(parts)
}

impl MultipartEncoder {
    pub fn with_max_size(max_size: usize) -> Self {
        Self { max_size }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Serialize `parts` in order under a freshly generated boundary
    ///
    /// Payload bytes are copied verbatim.
    ///
    /// # Errors
    ///
    /// - `Empty` for an empty part list
    /// - `InvalidName` / `InvalidFilename` for header values that would break framing
    /// - `TooLarge` when the serialized body would exceed the limit
    /// - `BoundaryCollision` when every generated boundary occurs in the content
    pub fn encode(&self, parts: &[MultipartPart]) -> Result<EncodedMultipart, EncodingError> {
        if parts.is_empty() {
            return Err(EncodingError::Empty);
        }
        for (index, part) in parts.iter().enumerate() {
            validate_part(index, part)?;
        }

        // Every generated boundary has the same length, so the size is known
        // before scanning the payload for collisions.
        let candidate = generate_boundary();
        let size = encoded_len(parts, &candidate);
        if size > self.max_size {
            tracing::warn!(
                target: "tether::multipart",
                size,
                limit = self.max_size,
                "Multipart body exceeds size limit - rejecting"
            );
            return Err(EncodingError::TooLarge { size, limit: self.max_size });
        }
        let boundary = pick_boundary(candidate, parts)?;

        let mut body = BytesMut::with_capacity(size);
        for part in parts {
            body.put_slice(b"--");
            body.put_slice(boundary.as_bytes());
            body.put_slice(CRLF);
            body.put_slice(disposition(part).as_bytes());
            body.put_slice(CRLF);
            body.put_slice(b"Content-Type: ");
            body.put_slice(part.content_type.as_ref().as_bytes());
            body.put_slice(CRLF);
            body.put_slice(CRLF);
            body.put_slice(&part.data);
            body.put_slice(CRLF);
        }
        body.put_slice(b"--");
        body.put_slice(boundary.as_bytes());
        body.put_slice(b"--");
        body.put_slice(CRLF);
        debug_assert_eq!(body.len(), size);

        tracing::debug!(
            target: "tether::multipart",
            parts = parts.len(),
            bytes = body.len(),
            "Encoded multipart body"
        );

        Ok(EncodedMultipart {
            body: body.freeze(),
            content_type: format!("multipart/form-data; boundary={boundary}"),
            boundary,
        })
    }
}

fn is_header_safe(value: &str) -> bool {
    !value.bytes().any(|b| matches!(b, b'\r' | b'\n' | b'"' | 0))
}

fn validate_part(index: usize, part: &MultipartPart) -> Result<(), EncodingError> {
    if part.name.is_empty() || !is_header_safe(&part.name) {
        return Err(EncodingError::InvalidName { index, name: part.name.clone() });
    }
    match &part.file_name {
        Some(file_name) if file_name.is_empty() || !is_header_safe(file_name) => {
            Err(EncodingError::InvalidFilename { index, file_name: file_name.clone() })
        }
        _ => Ok(()),
    }
}

fn disposition(part: &MultipartPart) -> String {
    match &part.file_name {
        Some(file_name) => format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"",
            part.name, file_name
        ),
        None => format!("Content-Disposition: form-data; name=\"{}\"", part.name),
    }
}

fn collides(boundary: &str, parts: &[MultipartPart]) -> bool {
    let finder = memmem::Finder::new(boundary.as_bytes());
    parts.iter().any(|part| {
        finder.find(&part.data).is_some()
            || finder.find(part.name.as_bytes()).is_some()
            || part.file_name.as_ref().is_some_and(|f| finder.find(f.as_bytes()).is_some())
    })
}

fn pick_boundary(first: String, parts: &[MultipartPart]) -> Result<String, EncodingError> {
    let mut boundary = first;
    for attempt in 1..=BOUNDARY_ATTEMPTS {
        if !collides(&boundary, parts) {
            return Ok(boundary);
        }
        tracing::debug!(target: "tether::multipart", attempt, "Boundary found in payload, regenerating");
        boundary = generate_boundary();
    }
    Err(EncodingError::BoundaryCollision { attempts: BOUNDARY_ATTEMPTS })
}

fn encoded_len(parts: &[MultipartPart], boundary: &str) -> usize {
    let delimiter = 2 + boundary.len() + CRLF.len();
    let framing: usize = parts
        .iter()
        .map(|part| {
            delimiter
                + disposition(part).len()
                + CRLF.len()
                + "Content-Type: ".len()
                + part.content_type.as_ref().len()
                + 2 * CRLF.len()
                + part.data.len()
                + CRLF.len()
        })
        .sum();
    framing + 2 + boundary.len() + 2 + CRLF.len()
}
