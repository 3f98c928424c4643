//! Shared state for a lowering run.
//!
//! The [`LowerContext`] holds what passes read but do not own: per-stage resource
//! usage recorded by earlier stages, and the event log every pass appends to.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::{
    compiler::events::EventLog,
    metadata::{FloatControls, ResourceUsage, ShaderStage},
};

/// Context shared by all passes of a lowering run.
///
/// All fields use thread-safe types so modules of different stages can be lowered in
/// parallel against one context.
///
/// # Examples
///
/// ```rust
/// use shadelower::compiler::LowerContext;
/// use shadelower::metadata::{FloatControls, ResourceUsage, ShaderStage};
///
/// let ctx = LowerContext::new();
/// ctx.set_resource_usage(
///     ShaderStage::Fragment,
///     ResourceUsage::with_float_controls(FloatControls::flush_all()),
/// );
///
/// assert_eq!(ctx.float_controls(ShaderStage::Fragment), FloatControls::flush_all());
/// assert_eq!(ctx.float_controls(ShaderStage::Vertex), FloatControls::relaxed());
/// ```
pub struct LowerContext {
    /// Resource usage per shader stage.
    resource_usage: DashMap<ShaderStage, ResourceUsage>,

    /// Accumulated events from all passes.
    pub events: EventLog,

    /// When the run started.
    start_time: Instant,
}

impl Default for LowerContext {
    fn default() -> Self {
        Self::new()
    }
}

impl LowerContext {
    /// Creates an empty context.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resource_usage: DashMap::new(),
            events: EventLog::new(),
            start_time: Instant::now(),
        }
    }

    /// Returns the elapsed time since the context was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    // ── Resource usage ──────────────────────────────────────────────────

    /// Records the resource usage of a stage, replacing any previous record.
    pub fn set_resource_usage(&self, stage: ShaderStage, usage: ResourceUsage) {
        self.resource_usage.insert(stage, usage);
    }

    /// Returns a copy of the resource usage of a stage.
    ///
    /// Stages nothing was recorded for report the default (relaxed) usage.
    #[must_use]
    pub fn resource_usage(&self, stage: ShaderStage) -> ResourceUsage {
        self.resource_usage
            .get(&stage)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Returns the float controls of a stage.
    #[must_use]
    pub fn float_controls(&self, stage: ShaderStage) -> FloatControls {
        self.resource_usage
            .get(&stage)
            .map(|entry| entry.float_controls)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::FloatWidths;

    #[test]
    fn test_usage_is_per_stage() {
        let ctx = LowerContext::default();
        let controls = FloatControls {
            denorm_flush_to_zero: FloatWidths::BIT32,
            signed_zero_inf_nan_preserve: FloatWidths::BIT16,
        };
        ctx.set_resource_usage(ShaderStage::Compute, ResourceUsage::with_float_controls(controls));

        assert_eq!(ctx.float_controls(ShaderStage::Compute), controls);
        assert_eq!(ctx.resource_usage(ShaderStage::Geometry), ResourceUsage::default());
        assert!(ctx.events.is_empty());
    }
}
