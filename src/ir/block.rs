//! Basic blocks.
//!
//! A block only records the program order of its instructions; the instructions
//! themselves live in the function arena. Erased instructions may linger in the order
//! list as tombstones until [`crate::ir::Function::compact`] runs, so readers go through
//! the function, which filters them out.

use std::fmt;

use crate::ir::InstId;

/// Identifier of a block within its function.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(usize);

impl BlockId {
    /// Creates a block identifier from its index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the block index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bb{}", self.0)
    }
}

/// An ordered list of instructions with a label.
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    label: String,
    order: Vec<InstId>,
}

impl Block {
    pub(crate) fn new(id: BlockId, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
            order: Vec::new(),
        }
    }

    /// Returns the block identifier.
    #[must_use]
    pub const fn id(&self) -> BlockId {
        self.id
    }

    /// Returns the block label.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Program order, possibly including tombstones.
    pub(crate) fn order(&self) -> &[InstId] {
        &self.order
    }

    pub(crate) fn order_mut(&mut self) -> &mut Vec<InstId> {
        &mut self.order
    }
}
