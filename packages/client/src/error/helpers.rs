use std::fmt;

/// A marker type to indicate that an operation was cancelled.
#[derive(Debug)]
pub struct OperationCancelled;

impl fmt::Display for OperationCancelled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("operation cancelled")
    }
}

impl std::error::Error for OperationCancelled {}
