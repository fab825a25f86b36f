//! HTTP boundary to the Trove backend.

pub mod api_types;
pub mod client;
pub mod types;
