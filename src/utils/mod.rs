//! Numeric helpers shared across the crate.

mod half;

pub use half::Half;
