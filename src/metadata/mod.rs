//! Shader stage metadata consumed by the lowering passes.
//!
//! - [`ShaderStage`] identifies the pipeline stage a module implements
//! - [`ResourceUsage`] carries what earlier stages recorded about it
//! - [`FloatControls`] is the precision policy inside that record

mod stage;
mod usage;

pub use stage::ShaderStage;
pub use usage::{FloatControls, FloatWidths, ResourceUsage};
