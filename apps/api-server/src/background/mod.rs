//! Background maintenance.

#[cfg(feature = "scheduler")]
pub mod scheduler;
pub mod sweeper;
