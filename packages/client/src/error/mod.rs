pub mod classification;
pub mod constructors;
pub mod conversions;
pub mod helpers;
pub mod types;

pub use constructors::*;
pub use helpers::OperationCancelled;
pub use types::{Error, Inner, Kind, Result};
