// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(clippy::too_many_arguments)]

//! # shadelower
//!
//! Floating-point algebra lowering for shader intermediate representation.
//!
//! Shader languages let each stage choose its own floating-point precision policy:
//! whether denormals of a given width are flushed to zero, and whether signed zero,
//! infinities and NaN must be preserved. `shadelower` applies the algebraic rewrites
//! that are only legal under that policy, over a small SSA instruction graph.
//!
//! ## Features
//!
//! - **🧮 Policy-aware constant folding** - Folded denormals are flushed exactly as the hardware would
//! - **✂️ Zero identity elimination** - `x + 0`, `x * 0`, `0 / x` and `x - 0` under a relaxed policy
//! - **🔗 Contraction flags** - `reassoc` follows `contract` on additions
//! - **➗ Division lowering** - `fdiv` becomes a call to a mangled library builtin
//! - **⚡ Parallel pipelines** - Independent modules run through the pass manager concurrently
//! - **📋 Change tracking** - Every rewrite is recorded in a lock-free event log
//!
//! ## Quick Start
//!
//! ```rust
//! use shadelower::prelude::*;
//!
//! let mut b = FunctionBuilder::new("main", &[IrType::F32, IrType::F32], IrType::VOID);
//! let sum = b.fadd(Value::Arg(0), Value::f32(0.0))?;
//! let quotient = b.fdiv(sum, Value::Arg(1))?;
//! b.store_output(0, quotient)?;
//! b.ret(None)?;
//!
//! let mut module = Module::new("shader", ShaderStage::Fragment);
//! module.set_entry_point(b.finish());
//!
//! let ctx = LowerContext::new();
//! ctx.set_resource_usage(ShaderStage::Fragment, ResourceUsage::default());
//!
//! let mut manager = PassManager::default();
//! manager.add(AlgebraTransformPass::new(AlgebraOptions::default()));
//! assert!(manager.run(&mut module, &ctx)?);
//!
//! assert!(module.declarations.get("_Z4fdivff").is_some());
//! println!("{}", ctx.events.summary());
//! # Ok::<(), shadelower::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`] with [`Error`] as the error type. The
//! transformations themselves never fail; errors come from building an invalid graph
//! or from running a pass over a module without an entry point.
//!
//! ## Logging
//!
//! Rewrites are logged through the [`log`](https://docs.rs/log) facade at `debug`
//! level; install any logger to see them.

#[macro_use]
pub(crate) mod error;

/// Shared helpers that do not belong to the IR itself.
///
/// - [`utils::Half`] - IEEE 754 binary16 storage with exact widening and round-to-nearest narrowing
pub mod utils;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use shadelower::prelude::*;
///
/// let mut b = FunctionBuilder::new("main", &[IrType::F32], IrType::F32);
/// let doubled = b.fmul(Value::Arg(0), Value::f32(2.0))?;
/// b.ret(Some(doubled))?;
/// assert_eq!(b.finish().instruction_count(), 2);
/// # Ok::<(), shadelower::Error>(())
/// ```
pub mod prelude;

/// The SSA instruction graph the passes operate on.
///
/// # Key Types
///
/// - [`ir::Module`] - One shader stage: functions, entry point and declarations
/// - [`ir::Function`] - Arena of instructions with stable ids and use lists
/// - [`ir::FunctionBuilder`] - Type-checked construction of functions
/// - [`ir::ConstFolder`] - Evaluation of operations over constant operands
pub mod ir;

/// Shader stages and the per-stage float controls the passes consult.
///
/// # Key Types
///
/// - [`metadata::ShaderStage`] - Pipeline stage of a module
/// - [`metadata::FloatControls`] - Denormal flush and signed zero/inf/NaN preserve masks
/// - [`metadata::ResourceUsage`] - Everything recorded about a stage
pub mod metadata;

/// Library builtins: name mangling and call emission.
///
/// # Examples
///
/// ```rust
/// use shadelower::{builtins::mangle_builtin, ir::IrType};
///
/// assert_eq!(mangle_builtin("fdiv", &[IrType::F32, IrType::F32]), "_Z4fdivff");
/// ```
pub mod builtins;

/// Passes, the pass manager, the shared lowering context and change tracking.
pub mod compiler;

/// `shadelower` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `shadelower` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;
