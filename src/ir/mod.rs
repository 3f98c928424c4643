//! Shader intermediate representation.
//!
//! The IR is a conventional SSA instruction graph: a [`Module`] holds [`Function`]s,
//! a function holds [`Block`]s of [`Instruction`]s, and each instruction consumes
//! [`Value`]s (other instructions, constants, or arguments).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         Shader IR                                │
//! ├──────────────────────────────────────────────────────────────────┤
//! │                                                                  │
//! │  Module                      One shader stage                    │
//! │    ├─ Function[]             Definitions, one is the entry point │
//! │    └─ Declarations           Callee signatures and attributes    │
//! │                                                                  │
//! │  Function                    Arena of instructions               │
//! │    ├─ Node[InstId]           Instruction + use list + tombstone  │
//! │    └─ Block[]                Program order as InstId lists       │
//! │                                                                  │
//! │  Instruction = Op + IrType   Tagged operation, result type       │
//! │  Value                       Inst | Const | Arg                  │
//! │  ConstValue                  Scalars, vectors, aggregate zero    │
//! │                                                                  │
//! │  FunctionBuilder             Type-checked construction           │
//! │  ConstFolder                 Evaluation of constant operations   │
//! │                                                                  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Mutation Model
//!
//! Instruction ids are stable for the lifetime of a function. Erasing an instruction
//! leaves a tombstone, so a pass can iterate over a snapshot of ids, mutate freely,
//! and skip ids that died along the way. [`Function::compact`] drops tombstones from
//! the block order once a pass is done.

mod block;
mod builder;
mod flags;
mod fold;
mod function;
mod instruction;
mod module;
mod ops;
mod types;
mod value;

pub use block::{Block, BlockId};
pub use builder::FunctionBuilder;
pub use flags::FastMathFlags;
pub use fold::ConstFolder;
pub use function::Function;
pub use instruction::{InstId, Instruction};
pub use module::{Declarations, FunctionAttrs, FunctionDecl, Module};
pub use ops::{BinaryOp, CastOp, Op};
pub use types::{FloatWidth, IrType, ScalarType};
pub use value::{ConstValue, FpClass, Value};
