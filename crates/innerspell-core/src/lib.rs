//! # InnerSpell Core
//!
//! The domain layer of the InnerSpell backend: tarot readings, blog posts,
//! caller tiers, and the ports that infrastructure implements.
//! This crate contains pure business logic with zero infrastructure dependencies.

pub mod clock;
pub mod domain;
pub mod error;
pub mod ports;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use error::DomainError;
