//! Request description, construction and buffered responses

pub mod builder;
pub mod request;
pub mod response;

pub use builder::{RequestBuilder, default_headers};
pub use request::{Method, RequestBody, RequestSpec};
pub use response::ApiResponse;
