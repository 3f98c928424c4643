//! Instructions and their stable identifiers.
//!
//! An [`Instruction`] is an [`Op`] plus its result type. Instructions live in the arena
//! of their [`crate::ir::Function`] and are addressed by [`InstId`]; an id stays valid
//! (and is never reused) after the instruction it named is erased, so passes can hold
//! ids across mutations and simply re-check liveness.

use std::fmt;

use crate::ir::{FastMathFlags, IrType, Op};

/// Stable identifier of an instruction within its function.
///
/// # Examples
///
/// ```rust
/// use shadelower::ir::InstId;
///
/// let id = InstId::new(7);
/// assert_eq!(id.index(), 7);
/// assert_eq!(id.to_string(), "%7");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(usize);

impl InstId {
    /// Creates an identifier from an arena index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// An operation together with the type of the value it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    op: Op,
    ty: IrType,
}

impl Instruction {
    /// Creates an instruction.
    ///
    /// Use [`IrType::VOID`] for operations that produce no value.
    #[must_use]
    pub const fn new(op: Op, ty: IrType) -> Self {
        Self { op, ty }
    }

    /// Returns the operation.
    #[must_use]
    pub const fn op(&self) -> &Op {
        &self.op
    }

    /// Returns the result type.
    #[must_use]
    pub const fn ty(&self) -> IrType {
        self.ty
    }

    /// Returns the fast-math flags, if this is a floating-point math operation.
    #[must_use]
    pub fn fast_math_flags(&self) -> Option<FastMathFlags> {
        self.op.fast_math_flags()
    }

    /// Replaces the fast-math flags of a floating-point math operation.
    ///
    /// Returns `false` (and changes nothing) for operations that carry no flags.
    pub fn set_fast_math_flags(&mut self, new_flags: FastMathFlags) -> bool {
        match &mut self.op {
            Op::Binary { op, flags, .. } if op.is_float() => {
                *flags = new_flags;
                true
            }
            Op::FNeg { flags, .. } => {
                *flags = new_flags;
                true
            }
            _ => false,
        }
    }

    /// Mutable access for the owning function, which keeps use lists in sync.
    pub(crate) fn op_mut(&mut self) -> &mut Op {
        &mut self.op
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ty {
            IrType::Void => write!(f, "{}", self.op),
            ty => write!(f, "{ty} {}", self.op),
        }
    }
}
