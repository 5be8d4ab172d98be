//! Core types and ports for the ophaling waste collection client.

/// Domain models and identifiers shared by all lookup backends.
pub mod model;
/// Traits describing the lookup interfaces and their error type.
pub mod ports;

pub use model::*;
pub use ports::*;
