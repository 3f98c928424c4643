//! Pass manager for running an explicit list of module passes.
//!
//! The caller decides which passes run and in which order by adding them to a
//! [`PassManager`]; nothing is registered globally. The list can be repeated until
//! no pass reports a change, bounded by an iteration limit.

use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;

use crate::{
    compiler::{pass::ModulePass, EventKind, LowerContext},
    ir::Module,
    Result,
};

/// Runs module passes in a fixed order.
///
/// # Examples
///
/// ```rust
/// use shadelower::compiler::{AlgebraOptions, AlgebraTransformPass, LowerContext, PassManager};
/// use shadelower::ir::{FunctionBuilder, IrType, Module, Value};
/// use shadelower::metadata::ShaderStage;
///
/// let mut b = FunctionBuilder::new("main", &[IrType::F32], IrType::VOID);
/// let sum = b.fadd(Value::Arg(0), Value::f32(0.0))?;
/// b.store_output(0, sum)?;
/// b.ret(None)?;
///
/// let mut module = Module::new("shader", ShaderStage::Fragment);
/// module.set_entry_point(b.finish());
///
/// let mut manager = PassManager::default();
/// manager.add(AlgebraTransformPass::new(AlgebraOptions::default()));
///
/// let ctx = LowerContext::new();
/// assert!(manager.run(&mut module, &ctx)?);
/// assert_eq!(module.entry()?.instruction_count(), 2);
/// # Ok::<(), shadelower::Error>(())
/// ```
pub struct PassManager {
    /// Maximum number of times the whole list is run.
    max_iterations: usize,
    passes: Vec<Box<dyn ModulePass>>,
}

impl Default for PassManager {
    fn default() -> Self {
        Self::new(1)
    }
}

impl PassManager {
    /// Creates an empty manager that repeats its pass list up to `max_iterations`
    /// times, stopping early once an iteration changes nothing.
    #[must_use]
    pub fn new(max_iterations: usize) -> Self {
        Self {
            max_iterations: max_iterations.max(1),
            passes: Vec::new(),
        }
    }

    /// Appends a pass to the list.
    pub fn add(&mut self, pass: impl ModulePass + 'static) -> &mut Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Returns the number of passes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// Returns `true` if no passes were added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Returns the pass names in run order.
    #[must_use]
    pub fn pass_names(&self) -> Vec<&'static str> {
        self.passes.iter().map(|pass| pass.name()).collect()
    }

    /// Runs every pass once over one module, in order.
    fn run_passes_once(
        passes: &[Box<dyn ModulePass>],
        module: &mut Module,
        ctx: &LowerContext,
    ) -> Result<bool> {
        let mut changed = false;
        for pass in passes {
            if !pass.should_run(module, ctx) {
                continue;
            }
            ctx.events
                .record(EventKind::PassStarted)
                .pass(pass.name())
                .message(format!("{} on {}", pass.name(), module.name));

            let pass_changed = pass.run_on_module(module, ctx)?;
            log::debug!(
                "{} on {}: {}",
                pass.name(),
                module.name,
                if pass_changed { "changed" } else { "unchanged" }
            );

            ctx.events
                .record(EventKind::PassCompleted)
                .pass(pass.name())
                .message(format!(
                    "{} on {}: {}",
                    pass.name(),
                    module.name,
                    if pass_changed { "changed" } else { "unchanged" }
                ));
            changed |= pass_changed;
        }
        Ok(changed)
    }

    /// Runs the pass list over one module until it is stable or the iteration limit
    /// is reached.
    fn run_to_fixpoint(
        passes: &[Box<dyn ModulePass>],
        max_iterations: usize,
        module: &mut Module,
        ctx: &LowerContext,
    ) -> Result<bool> {
        let mut any_changed = false;
        for _ in 0..max_iterations {
            if !Self::run_passes_once(passes, module, ctx)? {
                break;
            }
            any_changed = true;
        }
        Ok(any_changed)
    }

    /// Runs the pipeline over one module.
    ///
    /// Returns `true` if any pass changed the module.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by a pass or its initialization.
    pub fn run(&mut self, module: &mut Module, ctx: &LowerContext) -> Result<bool> {
        for pass in &mut self.passes {
            pass.initialize(ctx)?;
        }
        let changed = Self::run_to_fixpoint(&self.passes, self.max_iterations, module, ctx)?;
        for pass in &mut self.passes {
            pass.finalize(ctx)?;
        }
        Ok(changed)
    }

    /// Runs the pipeline over independent modules in parallel.
    ///
    /// Each module is processed by one thread at a time; passes never see two modules
    /// at once through the same invocation. Returns `true` if any module changed.
    ///
    /// # Errors
    ///
    /// Returns an error if any module fails. Other modules may have been transformed
    /// already.
    pub fn run_modules(&mut self, modules: &mut [Module], ctx: &LowerContext) -> Result<bool> {
        for pass in &mut self.passes {
            pass.initialize(ctx)?;
        }

        let any_changed = AtomicBool::new(false);
        let passes = &self.passes;
        let max_iterations = self.max_iterations;
        modules.par_iter_mut().try_for_each(|module| {
            if Self::run_to_fixpoint(passes, max_iterations, module, ctx)? {
                any_changed.store(true, Ordering::Relaxed);
            }
            Ok::<(), crate::Error>(())
        })?;

        for pass in &mut self.passes {
            pass.finalize(ctx)?;
        }
        Ok(any_changed.load(Ordering::Relaxed))
    }
}
