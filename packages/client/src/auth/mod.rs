pub mod bearer;

pub use bearer::{AuthContext, AuthProvider, BearerToken};
