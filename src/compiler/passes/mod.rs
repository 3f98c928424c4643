//! Lowering passes.

mod algebraic;

pub use algebraic::{AlgebraOptions, AlgebraTransformPass};
