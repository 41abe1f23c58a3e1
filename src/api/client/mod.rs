//! Client module
//!
//! This module provides the Fizzy API client: the `FizzyApi` trait, its HTTP
//! implementation and the `Location` header parsers used by creation calls.

mod http;
pub mod location;
mod trait_def;

#[cfg(test)]
pub(crate) mod recording;

// Re-export the trait and types
pub use http::{ensure_secure_url, ClientConfig, ClientError, HttpClient};
pub use trait_def::FizzyApi;
