//! Campus HTTP API Service.
//!
//! This crate provides the HTTP API for the campus platform, including:
//!
//! - Tenant registration and branding
//! - Billing tiers, subscriptions, and seats
//! - Curriculum content management
//! - Learner progress, notes, highlights, and bookmarks
//! - Payment-gateway webhooks
//!
//! # Authentication
//!
//! Requests carry an HS256 JWT whose claims name the user, the tenant, and
//! the caller's role. Tenant registration only requires the user claim.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Some handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
