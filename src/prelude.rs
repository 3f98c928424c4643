//! # shadelower Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the shadelower library. Import this module to build a module, describe the
//! precision policy of its stage and run the algebra transform over it.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all shadelower operations
pub use crate::Error;

/// The result type used throughout shadelower
pub use crate::Result;

// ================================================================================================
// Intermediate Representation
// ================================================================================================

/// Module, function and instruction graph
pub use crate::ir::{
    BinaryOp, CastOp, ConstValue, Declarations, FastMathFlags, Function, FunctionAttrs,
    FunctionBuilder, FunctionDecl, InstId, IrType, Module, Op, ScalarType, Value,
};

// ================================================================================================
// Precision Policy
// ================================================================================================

/// Per-stage float controls
pub use crate::metadata::{FloatControls, FloatWidths, ResourceUsage, ShaderStage};

// ================================================================================================
// Passes and Pipeline
// ================================================================================================

/// Lowering passes and the pass manager
pub use crate::compiler::{
    AlgebraOptions, AlgebraTransformPass, EventKind, EventLog, LowerContext, ModulePass,
    PassManager,
};
