//! Randomness for boundaries and generated names

pub mod random;

pub use random::*;
