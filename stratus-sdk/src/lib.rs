//! Stratus SDK
//!
//! REST client bindings for the Stratus Cloud APIs: request construction,
//! query-parameter marshaling and JSON unmarshaling into typed structs.
//! One client per vendor service, all sharing `ApiClient` for transport,
//! authentication and error mapping.

pub mod client;
pub mod containers;
pub mod error;
pub mod functions;
pub mod security_events;

pub use client::ApiClient;
pub use error::{ApiError, Result};
