//! Repository implementations.

mod memory;

pub use memory::{InMemoryGuidelineRepository, InMemoryPostRepository};
