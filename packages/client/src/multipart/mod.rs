//! `multipart/form-data` bodies for image uploads

pub mod decoder;
pub mod encoder;
pub mod errors;
pub mod media;
pub mod types;

pub use decoder::decode;
pub use encoder::{BOUNDARY_ATTEMPTS, MAX_MULTIPART_SIZE, MultipartEncoder, encode};
pub use errors::EncodingError;
pub use media::{DEFAULT_JPEG_QUALITY, jpeg_from_bytes, jpeg_from_file, jpeg_from_image};
pub use types::{EncodedMultipart, MEDIA_FIELD, MultipartPart};
