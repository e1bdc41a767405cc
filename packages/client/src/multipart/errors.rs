//! Errors raised while building or parsing multipart bodies

/// Multipart body could not be produced; raised before any I/O
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    #[error("multipart body needs at least one part")]
    Empty,
    #[error("part {index} has an invalid field name {name:?}")]
    InvalidName { index: usize, name: String },
    #[error("part {index} has an invalid filename {file_name:?}")]
    InvalidFilename { index: usize, file_name: String },
    #[error("invalid content type {value:?}: {reason}")]
    InvalidContentType { value: String, reason: String },
    #[error("no boundary absent from the payload found after {attempts} attempts")]
    BoundaryCollision { attempts: usize },
    #[error("multipart body of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: usize },
    #[error("malformed multipart body: {0}")]
    Malformed(String),
    #[error("image encoding failed: {0}")]
    Image(String),
}
