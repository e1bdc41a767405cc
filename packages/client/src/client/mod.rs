//! Request execution over the shared TLS session

pub mod core;
pub mod stats;
pub mod transport;

pub use self::core::HttpClient;

pub use stats::{ClientStats, ClientStatsSnapshot};
pub use transport::{HyperTransport, Transport};
