//! Middleware and request extractors.

pub mod auth;
pub mod error;
pub mod throttle;
