//! Client for the upstream game metadata API.

/// Request builder and typed endpoint wrappers.
pub mod client;
/// Ordered query parameters.
pub mod query;
/// HTTP transport port and its reqwest implementation.
pub mod transport;

pub use client::CatalogClient;
pub use query::Query;
pub use transport::{HttpTransport, Transport, TransportResponse};
