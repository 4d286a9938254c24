//! Utility functions shared across the codebase

pub mod concurrency;
pub mod math;

pub use concurrency::join_bounded;
pub use math::{ratio, round_to};
