//! The pass trait.

use crate::{compiler::LowerContext, ir::Module, Result};

/// A lowering pass that transforms a whole module.
///
/// All passes must be thread-safe (Send + Sync) so the [`crate::compiler::PassManager`]
/// can run one pass over several independent modules in parallel. Each invocation
/// gets exclusive access to its module and shared access to the context.
pub trait ModulePass: Send + Sync {
    /// Unique name for logging and debugging.
    fn name(&self) -> &'static str;

    /// Should this pass run on a specific module?
    ///
    /// Called before `run_on_module`. Override to skip modules that
    /// don't need this pass.
    fn should_run(&self, _module: &Module, _ctx: &LowerContext) -> bool {
        true
    }

    /// Run the pass on a module.
    ///
    /// Returns `true` if any instruction was added, replaced or removed.
    /// Events should be recorded to `ctx.events`.
    ///
    /// # Errors
    ///
    /// Returns an error if the module cannot be processed at all, such as a module
    /// without an entry point for a pass that needs one.
    fn run_on_module(&self, module: &mut Module, ctx: &LowerContext) -> Result<bool>;

    /// Called once before the pass runs.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    fn initialize(&mut self, _ctx: &LowerContext) -> Result<()> {
        Ok(())
    }

    /// Called once after the pass completes.
    ///
    /// # Errors
    ///
    /// Returns an error if finalization fails.
    fn finalize(&mut self, _ctx: &LowerContext) -> Result<()> {
        Ok(())
    }

    /// Get a description of what this pass does.
    fn description(&self) -> &'static str {
        "No description available"
    }
}
