//! Payment gateway adapter.
//!
//! A thin HTTP client over the gateway's form-encoded REST API. Methods map
//! parameters and decode responses; no billing decisions are made here, and
//! gateway errors pass through to callers unchanged.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod client;
pub mod error;
pub mod types;

pub use client::GatewayClient;
pub use error::GatewayError;
pub use types::*;
