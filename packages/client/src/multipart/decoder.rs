//! `multipart/form-data` parsing
//!
//! Tolerates a preamble before the first delimiter and an epilogue after the
//! last one. Header names match case-insensitively.

use bytes::Bytes;
use memchr::memmem;
use mime::Mime;

use super::errors::EncodingError;
use super::types::MultipartPart;

/// Split a multipart body produced with `boundary` back into parts
///
/// # Errors
///
/// `Malformed` when the framing, a part header or the content disposition
/// cannot be parsed; `InvalidContentType` for an unparsable part content type.
pub fn decode(body: &[u8], boundary: &str) -> Result<Vec<MultipartPart>, EncodingError> {
    if boundary.is_empty() {
        return Err(malformed("empty boundary"));
    }
    let delimiter = format!("--{boundary}");
    let inner_delimiter = format!("\r\n--{boundary}");
    let inner = memmem::Finder::new(inner_delimiter.as_bytes());

    let mut pos = match memmem::find(body, delimiter.as_bytes()) {
        Some(0) => delimiter.len(),
        Some(_) => match inner.find(body) {
            Some(start) => start + inner_delimiter.len(),
            None => return Err(malformed("opening delimiter not at line start")),
        },
        None => return Err(malformed("opening delimiter not found")),
    };

    let mut parts = Vec::new();
    loop {
        let rest = &body[pos..];
        if rest.starts_with(b"--") {
            break;
        }
        let Some(rest) = rest.strip_prefix(b"\r\n") else {
            return Err(malformed("delimiter not followed by CRLF"));
        };
        pos = body.len() - rest.len();

        let Some(header_end) = memmem::find(rest, b"\r\n\r\n") else {
            return Err(malformed("part headers not terminated"));
        };
        let part_headers = std::str::from_utf8(&rest[..header_end])
            .map_err(|_| malformed("part headers are not UTF-8"))?;
        let content_start = pos + header_end + 4;

        let Some(content_len) = inner.find(&body[content_start..]) else {
            return Err(malformed("closing delimiter not found"));
        };
        let data = Bytes::copy_from_slice(&body[content_start..content_start + content_len]);
        parts.push(parse_part(part_headers, data)?);

        pos = content_start + content_len + inner_delimiter.len();
    }

    if parts.is_empty() {
        return Err(EncodingError::Empty);
    }
    Ok(parts)
}

fn malformed(detail: &str) -> EncodingError {
    EncodingError::Malformed(detail.to_owned())
}

fn parse_part(headers: &str, data: Bytes) -> Result<MultipartPart, EncodingError> {
    let mut disposition = None;
    let mut content_type = None;

    for line in headers.split("\r\n") {
        let Some((name, value)) = line.split_once(':') else {
            return Err(malformed("part header line without a colon"));
        };
        let value = value.trim();
        if name.eq_ignore_ascii_case("content-disposition") {
            disposition = Some(parse_disposition(value)?);
        } else if name.eq_ignore_ascii_case("content-type") {
            let parsed = value.parse::<Mime>().map_err(|e| EncodingError::InvalidContentType {
                value: value.to_owned(),
                reason: e.to_string(),
            })?;
            content_type = Some(parsed);
        }
    }

    let Some((name, file_name)) = disposition else {
        return Err(malformed("part has no Content-Disposition"));
    };
    Ok(MultipartPart {
        name,
        file_name,
        // RFC 7578 default for parts without a Content-Type
        content_type: content_type.unwrap_or(mime::TEXT_PLAIN),
        data,
    })
}

/// `form-data; name="x"; filename="y"` into `(name, filename)`
fn parse_disposition(value: &str) -> Result<(String, Option<String>), EncodingError> {
    let mut rest = value;
    let kind = take_token(&mut rest);
    if !kind.eq_ignore_ascii_case("form-data") {
        return Err(malformed("Content-Disposition is not form-data"));
    }

    let mut name = None;
    let mut file_name = None;
    loop {
        rest = rest.trim_start();
        let Some(after) = rest.strip_prefix(';') else {
            break;
        };
        rest = after.trim_start();
        let key = take_token(&mut rest).to_ascii_lowercase();
        let Some(after) = rest.strip_prefix('=') else {
            return Err(malformed("disposition parameter without a value"));
        };
        rest = after;
        let value = take_value(&mut rest)?;
        match key.as_str() {
            "name" => name = Some(value),
            "filename" => file_name = Some(value),
            _ => {}
        }
    }

    if !rest.trim().is_empty() {
        return Err(malformed("trailing bytes in Content-Disposition"));
    }
    match name {
        Some(name) => Ok((name, file_name)),
        None => Err(malformed("Content-Disposition has no name")),
    }
}

fn take_token<'a>(rest: &mut &'a str) -> &'a str {
    let end = rest.find([';', '=', ' ', '\t']).unwrap_or(rest.len());
    let (token, tail) = rest.split_at(end);
    *rest = tail;
    token
}

fn take_value(rest: &mut &str) -> Result<String, EncodingError> {
    let Some(quoted) = rest.strip_prefix('"') else {
        return Ok(take_token(rest).to_owned());
    };
    // form-data producers do not backslash-escape; a quote always ends the value
    let Some(end) = quoted.find('"') else {
        return Err(malformed("unterminated quoted string"));
    };
    *rest = &quoted[end + 1..];
    Ok(quoted[..end].to_owned())
}
