//! Instruction operations.
//!
//! [`Op`] is a tagged union over the operation kinds the lowering passes see. Passes
//! dispatch with `match` rather than through a visitor hierarchy.
//!
//! # Field Documentation
//!
//! - `lhs`, `rhs`: Binary operands (left and right hand side)
//! - `operand`: Unary operand
//! - `flags`: Fast-math flags of a floating-point operation
//! - `callee`: Symbol name of the called function
//! - `location`: Shader interface location of an input or output

#![allow(missing_docs)]

use std::fmt;

use crate::ir::{FastMathFlags, Value};

/// A two-operand arithmetic or bitwise operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// Floating-point addition
    FAdd,
    /// Floating-point subtraction
    FSub,
    /// Floating-point multiplication
    FMul,
    /// Floating-point division
    FDiv,
    /// Floating-point remainder (truncated, like C `fmod`)
    FRem,
    /// Wrapping integer addition
    Add,
    /// Wrapping integer subtraction
    Sub,
    /// Wrapping integer multiplication
    Mul,
    /// Bitwise and
    And,
    /// Bitwise or
    Or,
    /// Bitwise exclusive or
    Xor,
    /// Shift left
    Shl,
    /// Logical shift right
    LShr,
}

impl BinaryOp {
    /// Returns `true` for the floating-point operators.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(
            self,
            Self::FAdd | Self::FSub | Self::FMul | Self::FDiv | Self::FRem
        )
    }

    /// Returns the textual mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::FAdd => "fadd",
            Self::FSub => "fsub",
            Self::FMul => "fmul",
            Self::FDiv => "fdiv",
            Self::FRem => "frem",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::And => "and",
            Self::Or => "or",
            Self::Xor => "xor",
            Self::Shl => "shl",
            Self::LShr => "lshr",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// A type conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CastOp {
    /// Widen a float
    FPExt,
    /// Narrow a float (round to nearest even)
    FPTrunc,
    /// Signed integer to float
    SIToFP,
    /// Unsigned integer to float
    UIToFP,
    /// Float to signed integer (truncating)
    FPToSI,
    /// Float to unsigned integer (truncating)
    FPToUI,
}

impl CastOp {
    /// Returns the textual mnemonic.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::FPExt => "fpext",
            Self::FPTrunc => "fptrunc",
            Self::SIToFP => "sitofp",
            Self::UIToFP => "uitofp",
            Self::FPToSI => "fptosi",
            Self::FPToUI => "fptoui",
        }
    }
}

/// An operation with its operands.
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    /// `dest = lhs <op> rhs`
    Binary {
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        flags: FastMathFlags,
    },

    /// `dest = -operand`
    FNeg { operand: Value, flags: FastMathFlags },

    /// `dest = (type)operand`
    Cast { op: CastOp, operand: Value },

    /// `dest = vector[index]`
    ExtractElement { vector: Value, index: u32 },

    /// `dest = callee(args...)`
    Call { callee: String, args: Vec<Value> },

    /// `dest = input[location]`
    LoadInput { location: u32 },

    /// `output[location] = value`
    StoreOutput { location: u32, value: Value },

    /// Return from the function.
    Return { value: Option<Value> },
}

impl Op {
    /// Returns the operands in order.
    #[must_use]
    pub fn operands(&self) -> Vec<&Value> {
        match self {
            Self::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            Self::FNeg { operand, .. } | Self::Cast { operand, .. } => vec![operand],
            Self::ExtractElement { vector, .. } => vec![vector],
            Self::Call { args, .. } => args.iter().collect(),
            Self::LoadInput { .. } => Vec::new(),
            Self::StoreOutput { value, .. } => vec![value],
            Self::Return { value } => value.iter().collect(),
        }
    }

    /// Returns mutable references to the operands in order.
    pub fn operands_mut(&mut self) -> Vec<&mut Value> {
        match self {
            Self::Binary { lhs, rhs, .. } => vec![lhs, rhs],
            Self::FNeg { operand, .. } | Self::Cast { operand, .. } => vec![operand],
            Self::ExtractElement { vector, .. } => vec![vector],
            Self::Call { args, .. } => args.iter_mut().collect(),
            Self::LoadInput { .. } => Vec::new(),
            Self::StoreOutput { value, .. } => vec![value],
            Self::Return { value } => value.iter_mut().collect(),
        }
    }

    /// Returns the operand at `index`.
    #[must_use]
    pub fn operand(&self, index: usize) -> Option<&Value> {
        self.operands().into_iter().nth(index)
    }

    /// Returns the number of operands.
    #[must_use]
    pub fn num_operands(&self) -> usize {
        self.operands().len()
    }

    /// Returns the fast-math flags of a floating-point operation.
    ///
    /// Integer operators and non-arithmetic operations have none.
    #[must_use]
    pub fn fast_math_flags(&self) -> Option<FastMathFlags> {
        match self {
            Self::Binary { op, flags, .. } if op.is_float() => Some(*flags),
            Self::FNeg { flags, .. } => Some(*flags),
            _ => None,
        }
    }

    /// Returns `true` for a binary operator of any kind.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self, Self::Binary { .. })
    }

    /// Returns `true` for a floating-point binary operator.
    #[must_use]
    pub const fn is_fp_binary(&self) -> bool {
        matches!(self, Self::Binary { op, .. } if op.is_float())
    }

    /// Returns `true` if the operation ends its block.
    #[must_use]
    pub const fn is_terminator(&self) -> bool {
        matches!(self, Self::Return { .. })
    }

    /// Returns the callee of a call.
    #[must_use]
    pub fn callee(&self) -> Option<&str> {
        match self {
            Self::Call { callee, .. } => Some(callee),
            _ => None,
        }
    }

    /// Returns the textual mnemonic.
    #[must_use]
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Self::Binary { op, .. } => op.mnemonic(),
            Self::FNeg { .. } => "fneg",
            Self::Cast { op, .. } => op.mnemonic(),
            Self::ExtractElement { .. } => "extractelement",
            Self::Call { .. } => "call",
            Self::LoadInput { .. } => "load.input",
            Self::StoreOutput { .. } => "store.output",
            Self::Return { .. } => "ret",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())?;
        if let Some(flags) = self.fast_math_flags() {
            if !flags.is_empty() {
                write!(f, " {flags}")?;
            }
        }
        match self {
            Self::Call { callee, args } => {
                write!(f, " @{callee}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::ExtractElement { vector, index } => write!(f, " {vector}, {index}"),
            Self::LoadInput { location } => write!(f, " {location}"),
            Self::StoreOutput { location, value } => write!(f, " {location}, {value}"),
            _ => {
                for (i, operand) in self.operands().iter().enumerate() {
                    f.write_str(if i == 0 { " " } else { ", " })?;
                    write!(f, "{operand}")?;
                }
                Ok(())
            }
        }
    }
}
