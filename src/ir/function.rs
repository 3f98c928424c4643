//! Functions: an arena of instructions with use lists.
//!
//! A [`Function`] owns every instruction it contains in a flat arena indexed by
//! [`InstId`], plus one order list per block. Each arena node also records the
//! instructions that use its result, so "replace all uses" and "is this dead" are local
//! operations.
//!
//! # Structure
//!
//! ```text
//! Function
//! ├── params: Vec<IrType>        // argument types, referenced by Value::Arg(i)
//! ├── nodes: Vec<Node>           // arena; erased nodes stay as tombstones
//! │     └── Node { inst, block, users, erased }
//! └── blocks: Vec<Block>         // program order per block (ids into the arena)
//! ```
//!
//! # Mutation During Traversal
//!
//! Erasing marks the node as a tombstone and leaves its id in the block order until
//! [`Function::compact`] runs. A pass takes a snapshot with
//! [`Function::instruction_ids`], walks it, and skips ids that are no longer live;
//! nothing it does can invalidate the snapshot.

use std::{collections::HashSet, fmt};

use crate::{
    ir::{Block, BlockId, Declarations, FastMathFlags, InstId, Instruction, IrType, Op, Value},
    Error, Result,
};

#[derive(Debug, Clone)]
struct Node {
    inst: Instruction,
    block: BlockId,
    /// One entry per operand slot that refers to this node.
    users: Vec<InstId>,
    /// Operand references have been removed from the operands' use lists.
    detached: bool,
    erased: bool,
}

/// A function in the shader IR.
///
/// # Examples
///
/// ```rust
/// use shadelower::ir::{BinaryOp, FastMathFlags, Function, Instruction, IrType, Op, Value};
///
/// let mut func = Function::new("main", vec![IrType::F32], IrType::F32);
/// let entry = func.add_block("entry");
/// let sum = func.append(
///     entry,
///     Instruction::new(
///         Op::Binary {
///             op: BinaryOp::FAdd,
///             lhs: Value::Arg(0),
///             rhs: Value::f32(1.0),
///             flags: FastMathFlags::empty(),
///         },
///         IrType::F32,
///     ),
/// )?;
/// func.append(entry, Instruction::new(Op::Return { value: Some(Value::Inst(sum)) }, IrType::VOID))?;
///
/// assert_eq!(func.users(sum).len(), 1);
/// func.verify()?;
/// # Ok::<(), shadelower::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    params: Vec<IrType>,
    ret: IrType,
    nodes: Vec<Node>,
    blocks: Vec<Block>,
}

impl Function {
    /// Creates an empty function.
    #[must_use]
    pub fn new(name: impl Into<String>, params: Vec<IrType>, ret: IrType) -> Self {
        Self {
            name: name.into(),
            params,
            ret,
            nodes: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Returns the function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the parameter types.
    #[must_use]
    pub fn params(&self) -> &[IrType] {
        &self.params
    }

    /// Returns the return type.
    #[must_use]
    pub const fn ret(&self) -> IrType {
        self.ret
    }

    /// Appends a new empty block.
    pub fn add_block(&mut self, label: impl Into<String>) -> BlockId {
        let id = BlockId::new(self.blocks.len());
        self.blocks.push(Block::new(id, label));
        id
    }

    /// Returns the blocks in layout order.
    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Returns the number of blocks.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the live instruction with the given id.
    #[must_use]
    pub fn inst(&self, id: InstId) -> Option<&Instruction> {
        self.node(id).map(|node| &node.inst)
    }

    /// Returns `true` if `id` names an instruction that has not been erased.
    #[must_use]
    pub fn is_live(&self, id: InstId) -> bool {
        self.node(id).is_some()
    }

    /// Returns the block containing a live instruction.
    #[must_use]
    pub fn block_of(&self, id: InstId) -> Option<BlockId> {
        self.node(id).map(|node| node.block)
    }

    /// Returns the instructions using the result of `id`, one entry per operand slot.
    #[must_use]
    pub fn users(&self, id: InstId) -> &[InstId] {
        self.node(id).map_or(&[], |node| node.users.as_slice())
    }

    /// Returns `true` if any instruction uses the result of `id`.
    #[must_use]
    pub fn has_uses(&self, id: InstId) -> bool {
        !self.users(id).is_empty()
    }

    fn node(&self, id: InstId) -> Option<&Node> {
        self.nodes.get(id.index()).filter(|node| !node.erased)
    }

    fn node_mut(&mut self, id: InstId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()).filter(|node| !node.erased)
    }

    /// Returns the type of a value as seen from inside this function.
    #[must_use]
    pub fn value_type(&self, value: &Value) -> Option<IrType> {
        match value {
            Value::Inst(id) => self.inst(*id).map(Instruction::ty),
            Value::Const(constant) => Some(constant.ty()),
            Value::Arg(index) => self.params.get(*index as usize).copied(),
        }
    }

    /// Snapshot of every live instruction id in program order.
    #[must_use]
    pub fn instruction_ids(&self) -> Vec<InstId> {
        self.blocks
            .iter()
            .flat_map(|block| block.order().iter().copied())
            .filter(|id| self.is_live(*id))
            .collect()
    }

    /// Iterates over the live instructions of one block in program order.
    pub fn block_instructions(
        &self,
        block: BlockId,
    ) -> impl Iterator<Item = (InstId, &Instruction)> + '_ {
        self.blocks
            .get(block.index())
            .map(Block::order)
            .unwrap_or_default()
            .iter()
            .filter_map(|id| self.inst(*id).map(|inst| (*id, inst)))
    }

    /// Iterates over all live instructions in program order.
    pub fn iter_instructions(&self) -> impl Iterator<Item = (InstId, &Instruction)> + '_ {
        self.blocks
            .iter()
            .flat_map(|block| block.order().iter())
            .filter_map(|id| self.inst(*id).map(|inst| (*id, inst)))
    }

    /// Returns the number of live instructions.
    #[must_use]
    pub fn instruction_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.erased).count()
    }

    fn check_operands(&self, inst: &Instruction) -> Result<()> {
        for operand in inst.op().operands() {
            if self.value_type(operand).is_none() {
                return Err(Error::InvalidValue(format!(
                    "operand {operand} of `{inst}` does not resolve in @{}",
                    self.name
                )));
            }
        }
        Ok(())
    }

    fn allocate(&mut self, block: BlockId, inst: Instruction) -> InstId {
        let id = InstId::new(self.nodes.len());
        for operand in inst.op().operands() {
            if let Value::Inst(def) = operand {
                if let Some(node) = self.nodes.get_mut(def.index()) {
                    node.users.push(id);
                }
            }
        }
        self.nodes.push(Node {
            inst,
            block,
            users: Vec::new(),
            detached: false,
            erased: false,
        });
        id
    }

    /// Appends an instruction to the end of a block.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if the block does not exist or an operand does not
    /// resolve (erased instruction, argument out of range).
    pub fn append(&mut self, block: BlockId, inst: Instruction) -> Result<InstId> {
        if block.index() >= self.blocks.len() {
            return Err(Error::InvalidValue(format!("no block {block} in @{}", self.name)));
        }
        self.check_operands(&inst)?;
        let id = self.allocate(block, inst);
        self.blocks[block.index()].order_mut().push(id);
        Ok(id)
    }

    /// Inserts an instruction immediately before a live instruction.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownInstruction`] if `before` is not live and
    /// [`Error::InvalidValue`] if an operand does not resolve.
    pub fn insert_before(&mut self, before: InstId, inst: Instruction) -> Result<InstId> {
        let block = self
            .block_of(before)
            .ok_or(Error::UnknownInstruction(before))?;
        self.check_operands(&inst)?;
        let position = self.blocks[block.index()]
            .order()
            .iter()
            .position(|id| *id == before)
            .ok_or_else(|| malformed_error!("{before} missing from block {block}"))?;
        let id = self.allocate(block, inst);
        self.blocks[block.index()].order_mut().insert(position, id);
        Ok(id)
    }

    /// Replaces the fast-math flags of a floating-point math instruction.
    ///
    /// Returns `false` if `id` is not live or carries no flags.
    pub fn set_fast_math_flags(&mut self, id: InstId, flags: FastMathFlags) -> bool {
        self.node_mut(id)
            .is_some_and(|node| node.inst.set_fast_math_flags(flags))
    }

    /// Rewrites every use of `id` to refer to `replacement` instead.
    ///
    /// Afterwards `id` has no users. Replacing a value with itself is a no-op.
    pub fn replace_all_uses_with(&mut self, id: InstId, replacement: &Value) {
        if replacement == &Value::Inst(id) {
            return;
        }
        let Some(node) = self.node_mut(id) else {
            return;
        };
        let users = std::mem::take(&mut node.users);

        let mut seen = HashSet::new();
        for user in users {
            if !seen.insert(user) {
                continue;
            }
            let mut replaced = 0;
            if let Some(user_node) = self.nodes.get_mut(user.index()) {
                for operand in user_node.inst.op_mut().operands_mut() {
                    if *operand == Value::Inst(id) {
                        *operand = replacement.clone();
                        replaced += 1;
                    }
                }
            }
            if let Value::Inst(new_def) = replacement {
                if let Some(def_node) = self.nodes.get_mut(new_def.index()) {
                    def_node.users.extend(std::iter::repeat_n(user, replaced));
                }
            }
        }
    }

    /// Removes `id` from the use lists of its operands.
    ///
    /// The instruction keeps its operands for display but no longer counts as a user.
    /// Calling this twice is harmless.
    pub fn drop_all_references(&mut self, id: InstId) {
        let operands: Vec<InstId> = match self.node_mut(id) {
            Some(node) if !node.detached => {
                node.detached = true;
                node.inst
                    .op()
                    .operands()
                    .into_iter()
                    .filter_map(Value::as_inst)
                    .collect()
            }
            _ => return,
        };
        for def in operands {
            if let Some(def_node) = self.nodes.get_mut(def.index()) {
                if let Some(position) = def_node.users.iter().position(|user| *user == id) {
                    def_node.users.swap_remove(position);
                }
            }
        }
    }

    /// Erases an instruction whose result is no longer used.
    ///
    /// The id becomes a tombstone; it is dropped from block order by
    /// [`Function::compact`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownInstruction`] if `id` is not live and
    /// [`Error::Malformed`] if the instruction still has users.
    pub fn erase(&mut self, id: InstId) -> Result<()> {
        let users = self.node(id).ok_or(Error::UnknownInstruction(id))?.users.len();
        if users != 0 {
            return Err(malformed_error!("cannot erase {id}: {users} uses remain"));
        }
        self.drop_all_references(id);
        if let Some(node) = self.node_mut(id) {
            node.erased = true;
        }
        Ok(())
    }

    /// Returns `true` if executing the instruction can be observed other than through
    /// its result.
    #[must_use]
    pub fn has_side_effects(inst: &Instruction, declarations: &Declarations) -> bool {
        match inst.op() {
            Op::StoreOutput { .. } | Op::Return { .. } => true,
            Op::Call { callee, .. } => !declarations.is_pure(callee),
            _ => false,
        }
    }

    /// Returns `true` if the instruction is live, unused, and free of side effects.
    #[must_use]
    pub fn is_trivially_dead(&self, id: InstId, declarations: &Declarations) -> bool {
        self.node(id).is_some_and(|node| {
            node.users.is_empty() && !Self::has_side_effects(&node.inst, declarations)
        })
    }

    /// Erases `id` if it is trivially dead, then any operands that become trivially
    /// dead as a result.
    ///
    /// Returns the erased ids in erase order.
    pub fn erase_if_trivially_dead(
        &mut self,
        id: InstId,
        declarations: &Declarations,
    ) -> Vec<InstId> {
        let mut erased = Vec::new();
        let mut worklist = vec![id];
        while let Some(candidate) = worklist.pop() {
            if !self.is_trivially_dead(candidate, declarations) {
                continue;
            }
            let operands: Vec<InstId> = self
                .inst(candidate)
                .map(|inst| {
                    inst.op()
                        .operands()
                        .into_iter()
                        .filter_map(Value::as_inst)
                        .collect()
                })
                .unwrap_or_default();
            if self.erase(candidate).is_ok() {
                erased.push(candidate);
                worklist.extend(operands);
            }
        }
        erased
    }

    /// Drops tombstones from the block order lists.
    pub fn compact(&mut self) {
        let nodes = &self.nodes;
        for block in &mut self.blocks {
            block
                .order_mut()
                .retain(|id| nodes.get(id.index()).is_some_and(|node| !node.erased));
        }
    }

    /// Checks the structural invariants of the graph.
    ///
    /// - every operand resolves (live instruction, valid argument)
    /// - use lists match operand references exactly
    /// - every live instruction appears exactly once in the order of its own block
    /// - erased instructions have no users
    ///
    /// # Errors
    ///
    /// Returns [`Error::Malformed`] describing the first violation found.
    pub fn verify(&self) -> Result<()> {
        let mut expected_users: Vec<Vec<InstId>> = vec![Vec::new(); self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            let id = InstId::new(index);
            if node.erased {
                if !node.users.is_empty() {
                    return Err(malformed_error!("erased {id} still has users"));
                }
                continue;
            }
            for operand in node.inst.op().operands() {
                if self.value_type(operand).is_none() {
                    return Err(malformed_error!("{id} uses unresolved operand {operand}"));
                }
                if let Value::Inst(def) = operand {
                    if !node.detached {
                        expected_users[def.index()].push(id);
                    }
                }
            }
        }

        for (index, node) in self.nodes.iter().enumerate() {
            let mut actual = node.users.clone();
            let mut expected = std::mem::take(&mut expected_users[index]);
            actual.sort();
            expected.sort();
            if actual != expected {
                return Err(malformed_error!(
                    "use list of %{index} is {actual:?}, operands say {expected:?}"
                ));
            }
        }

        let mut placed = vec![0usize; self.nodes.len()];
        for block in &self.blocks {
            for id in block.order() {
                let Some(node) = self.nodes.get(id.index()) else {
                    return Err(malformed_error!("block {} lists unknown {id}", block.id()));
                };
                if node.erased {
                    continue;
                }
                if node.block != block.id() {
                    return Err(malformed_error!(
                        "{id} is listed in {} but belongs to {}",
                        block.id(),
                        node.block
                    ));
                }
                placed[id.index()] += 1;
            }
        }
        for (index, node) in self.nodes.iter().enumerate() {
            if !node.erased && placed[index] != 1 {
                return Err(malformed_error!(
                    "%{index} appears {} times in block order",
                    placed[index]
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "define {} @{}(", self.ret, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param} %arg{i}")?;
        }
        writeln!(f, ") {{")?;
        for block in &self.blocks {
            writeln!(f, "{}:", block.label())?;
            for (id, inst) in self.block_instructions(block.id()) {
                if inst.ty() == IrType::Void {
                    writeln!(f, "  {inst}")?;
                } else {
                    writeln!(f, "  {id} = {inst}")?;
                }
            }
        }
        writeln!(f, "}}")
    }
}
