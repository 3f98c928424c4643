//! Floating-point algebra transform pass.
//!
//! This pass applies the floating-point rewrites that depend on the precision policy
//! a shader requested:
//!
//! ## Constant folding (entry point only)
//! Runs when folding is enabled and the policy flushes denormals of at least one
//! width. Dead instructions are removed, floating-point constant expressions are
//! folded, and folded denormals of a flushed width become `+0.0`. Calls to
//! `unpackHalf2x16` with a constant argument are evaluated with their denormal
//! inputs flushed.
//!
//! ## Operator rewrites (every function)
//! Runs when float optimization is enabled:
//! - `fadd` with `contract` gets `reassoc` and `contract` set together, both cleared if
//!   its first-operand chain contains an operator that refuses contraction
//! - zero identities (`x + 0`, `x * 0`, `0 / x`, `x - 0`), only when the policy
//!   neither flushes denormals nor preserves signed zero, infinities and NaN
//! - every remaining `fdiv` is lowered to a call of the mangled library `fdiv`
//!
//! Running the pass twice with the same policy changes nothing the second time.

mod contract;
mod folding;
mod simplify;

use crate::{
    compiler::{pass::ModulePass, EventLog, LowerContext},
    ir::Module,
    metadata::FloatControls,
    Error, Result,
};

pub(crate) const PASS_NAME: &str = "algebra-transform";

/// Options selecting which parts of the algebra transform run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgebraOptions {
    /// Fold constant expressions in the entry point when denormals are flushed.
    pub enable_const_folding: bool,
    /// Apply the per-operator floating-point rewrites.
    pub enable_float_opt: bool,
}

impl Default for AlgebraOptions {
    fn default() -> Self {
        Self {
            enable_const_folding: true,
            enable_float_opt: true,
        }
    }
}

impl AlgebraOptions {
    /// Disables everything; the pass becomes a no-op.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enable_const_folding: false,
            enable_float_opt: false,
        }
    }

    /// Only constant folding.
    #[must_use]
    pub fn folding_only() -> Self {
        Self {
            enable_const_folding: true,
            enable_float_opt: false,
        }
    }

    /// Only the per-operator rewrites.
    #[must_use]
    pub fn float_opt_only() -> Self {
        Self {
            enable_const_folding: false,
            enable_float_opt: true,
        }
    }
}

/// Floating-point algebra transform over a whole module.
///
/// # Examples
///
/// ```rust
/// use shadelower::compiler::{AlgebraOptions, AlgebraTransformPass};
/// use shadelower::ir::{FunctionBuilder, IrType, Module, Value};
/// use shadelower::metadata::{FloatControls, ShaderStage};
///
/// let mut b = FunctionBuilder::new("main", &[IrType::F32, IrType::F32], IrType::VOID);
/// let quotient = b.fdiv(Value::Arg(0), Value::Arg(1))?;
/// b.store_output(0, quotient)?;
/// b.ret(None)?;
///
/// let mut module = Module::new("shader", ShaderStage::Fragment);
/// module.set_entry_point(b.finish());
///
/// let pass = AlgebraTransformPass::new(AlgebraOptions::default());
/// assert!(pass.run(&mut module, &FloatControls::relaxed()));
/// assert!(module.declarations.get("_Z4fdivff").is_some());
/// assert!(!pass.run(&mut module, &FloatControls::relaxed()));
/// # Ok::<(), shadelower::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct AlgebraTransformPass {
    options: AlgebraOptions,
}

impl AlgebraTransformPass {
    /// Creates the pass.
    #[must_use]
    pub fn new(options: AlgebraOptions) -> Self {
        Self { options }
    }

    /// Returns the options the pass was created with.
    #[must_use]
    pub fn options(&self) -> AlgebraOptions {
        self.options
    }

    /// Runs the pass over `module` under `controls`.
    ///
    /// Returns `true` if any instruction was added, replaced or removed.
    pub fn run(&self, module: &mut Module, controls: &FloatControls) -> bool {
        self.run_with_events(module, controls, &EventLog::new())
    }

    /// Runs the pass, recording every rewrite in `events`.
    ///
    /// Returns `true` if any instruction was added, replaced or removed.
    pub fn run_with_events(
        &self,
        module: &mut Module,
        controls: &FloatControls,
        events: &EventLog,
    ) -> bool {
        log::debug!("run the pass {PASS_NAME} on {}", module.name);
        let mut changed = false;

        let Module {
            functions,
            declarations,
            entry_point,
            ..
        } = module;

        if self.options.enable_const_folding && controls.requires_flush() {
            match (*entry_point).and_then(|index| functions.get_mut(index)) {
                Some(entry) => {
                    changed |= folding::fold_constants(entry, declarations, controls, events);
                }
                None => log::warn!("{PASS_NAME}: no entry point, skipping constant folding"),
            }
        }

        if self.options.enable_float_opt {
            for function in functions.iter_mut() {
                changed |= simplify::simplify_function(function, declarations, controls, events);
            }
        }

        for function in functions.iter_mut() {
            function.compact();
        }
        changed
    }
}

impl ModulePass for AlgebraTransformPass {
    fn name(&self) -> &'static str {
        PASS_NAME
    }

    fn description(&self) -> &'static str {
        "Fold float constants under the denormal policy, eliminate zero identities, lower fdiv"
    }

    fn should_run(&self, _module: &Module, _ctx: &LowerContext) -> bool {
        self.options.enable_const_folding || self.options.enable_float_opt
    }

    fn run_on_module(&self, module: &mut Module, ctx: &LowerContext) -> Result<bool> {
        if module.entry_point.is_none() {
            return Err(Error::MissingEntryPoint);
        }
        let controls = ctx.float_controls(module.stage);

        let changes = EventLog::new();
        let changed = self.run_with_events(module, &controls, &changes);

        if !changes.is_empty() {
            ctx.events.merge(&changes);
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        compiler::EventKind,
        ir::{FunctionBuilder, IrType, Value},
        metadata::{ResourceUsage, ShaderStage},
    };

    fn module_with(b: FunctionBuilder) -> Module {
        let mut module = Module::new("test", ShaderStage::Fragment);
        module.set_entry_point(b.finish());
        module
    }

    #[test]
    fn test_option_presets() {
        assert_eq!(AlgebraOptions::default(), AlgebraOptions {
            enable_const_folding: true,
            enable_float_opt: true,
        });
        assert!(!AlgebraOptions::folding_only().enable_float_opt);
        assert!(!AlgebraOptions::float_opt_only().enable_const_folding);
        assert!(!AlgebraTransformPass::new(AlgebraOptions::disabled())
            .should_run(&Module::new("m", ShaderStage::Vertex), &LowerContext::new()));
    }

    #[test]
    fn test_folding_needs_flush_policy() -> Result<()> {
        let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
        let sum = b.fadd(Value::f32(1.0), Value::f32(2.0))?;
        b.store_output(0, sum)?;
        let mut module = module_with(b);

        let pass = AlgebraTransformPass::new(AlgebraOptions::folding_only());
        assert!(!pass.run(&mut module, &FloatControls::relaxed()));
        assert!(pass.run(&mut module, &FloatControls::flush_all()));
        assert_eq!(module.entry()?.instruction_count(), 1);
        Ok(())
    }

    #[test]
    fn test_run_on_module_uses_stage_controls() -> Result<()> {
        let mut b = FunctionBuilder::new("main", &[IrType::F32], IrType::VOID);
        let sum = b.fadd(Value::Arg(0), Value::f32(0.0))?;
        b.store_output(0, sum)?;
        let mut module = module_with(b);

        let ctx = LowerContext::new();
        ctx.set_resource_usage(
            ShaderStage::Fragment,
            ResourceUsage::with_float_controls(FloatControls::strict()),
        );
        let pass = AlgebraTransformPass::default();
        assert!(!pass.run_on_module(&mut module, &ctx)?);

        ctx.set_resource_usage(ShaderStage::Fragment, ResourceUsage::default());
        assert!(pass.run_on_module(&mut module, &ctx)?);
        assert_eq!(ctx.events.count_kind(EventKind::AlgebraicSimplified), 1);
        Ok(())
    }

    #[test]
    fn test_missing_entry_point() {
        let mut module = Module::new("empty", ShaderStage::Compute);
        let result = AlgebraTransformPass::default().run_on_module(&mut module, &LowerContext::new());
        assert!(matches!(result, Err(Error::MissingEntryPoint)));
    }
}
