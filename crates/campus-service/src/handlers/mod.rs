//! HTTP request handlers.

pub mod billing;
pub mod content;
pub mod health;
pub mod progress;
pub mod tenants;
pub mod webhooks;
