//! Configuration validation shared by the client layers

pub mod validation;

pub use validation::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
