//! Multipart parts and encoded bodies

use bytes::Bytes;
use mime::Mime;

use super::errors::EncodingError;
use crate::crypto::random_alphanumeric;

/// Field name the backend expects image uploads under
pub const MEDIA_FIELD: &str = "media";

/// One field of a `multipart/form-data` body
#[derive(Debug, Clone, PartialEq)]
pub struct MultipartPart {
    pub(crate) name: String,
    pub(crate) file_name: Option<String>,
    pub(crate) content_type: Mime,
    pub(crate) data: Bytes,
}

impl MultipartPart {
    /// Binary field, `application/octet-stream` until told otherwise
    pub fn bytes(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: mime::APPLICATION_OCTET_STREAM,
            data: data.into(),
        }
    }

    /// UTF-8 text field
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            file_name: None,
            content_type: mime::TEXT_PLAIN_UTF_8,
            data: Bytes::from(value.into()),
        }
    }

    /// Already-compressed JPEG under the `media` field
    ///
    /// The filename is random so uploads never collide server-side.
    pub fn media_jpeg(data: impl Into<Bytes>) -> Self {
        Self::bytes(MEDIA_FIELD, data)
            .file_name(format!("{}.jpg", random_alphanumeric(20)))
            .mime(mime::IMAGE_JPEG)
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn mime(mut self, content_type: Mime) -> Self {
        self.content_type = content_type;
        self
    }

    /// Parse and set the content type
    ///
    /// # Errors
    ///
    /// `InvalidContentType` if `content_type` is not a MIME type.
    pub fn mime_str(self, content_type: &str) -> Result<Self, EncodingError> {
        let parsed = content_type.parse::<Mime>().map_err(|e| {
            EncodingError::InvalidContentType { value: content_type.to_owned(), reason: e.to_string() }
        })?;
        Ok(self.mime(parsed))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn filename(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn content_type(&self) -> &Mime {
        &self.content_type
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }
}

/// Serialized body ready to hand to a request
#[derive(Debug, Clone)]
pub struct EncodedMultipart {
    pub body: Bytes,
    pub content_type: String,
    pub boundary: String,
}
