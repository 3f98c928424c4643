//! Type-checked construction of functions.
//!
//! [`FunctionBuilder`] appends instructions to a current block and checks operand types
//! as it goes, so producers (and tests) get a well-typed graph without hand-assembling
//! [`Instruction`]s.
//!
//! # Example
//!
//! ```rust
//! use shadelower::ir::{FastMathFlags, FunctionBuilder, IrType, Value};
//!
//! let mut b = FunctionBuilder::new("main", &[IrType::F32, IrType::F32], IrType::VOID);
//! let product = b.fmul(Value::Arg(0), Value::Arg(1))?;
//! let sum = b.fadd_with_flags(product, Value::f32(1.0), FastMathFlags::CONTRACT)?;
//! b.store_output(0, sum)?;
//! b.ret(None)?;
//!
//! let func = b.finish();
//! assert_eq!(func.instruction_count(), 4);
//! # Ok::<(), shadelower::Error>(())
//! ```

use crate::{
    ir::{
        BinaryOp, BlockId, CastOp, FastMathFlags, Function, InstId, Instruction, IrType, Op,
        Value,
    },
    Error, Result,
};

/// Builds a [`Function`] one instruction at a time.
pub struct FunctionBuilder {
    func: Function,
    current: BlockId,
}

impl FunctionBuilder {
    /// Starts a function with an `entry` block selected.
    #[must_use]
    pub fn new(name: &str, params: &[IrType], ret: IrType) -> Self {
        let mut func = Function::new(name, params.to_vec(), ret);
        let current = func.add_block("entry");
        Self { func, current }
    }

    /// Adds a block and makes it current.
    pub fn block(&mut self, label: &str) -> BlockId {
        self.current = self.func.add_block(label);
        self.current
    }

    /// Makes an existing block current.
    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    /// Returns the function built so far.
    #[must_use]
    pub fn function(&self) -> &Function {
        &self.func
    }

    /// Finishes building.
    #[must_use]
    pub fn finish(self) -> Function {
        self.func
    }

    fn type_of(&self, value: &Value) -> Result<IrType> {
        self.func
            .value_type(value)
            .ok_or_else(|| Error::InvalidValue(format!("{value} does not resolve")))
    }

    fn push(&mut self, op: Op, ty: IrType) -> Result<InstId> {
        self.func.append(self.current, Instruction::new(op, ty))
    }

    /// Emits a binary operator with explicit fast-math flags.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the operand types differ or do not suit the
    /// operator (float operators need float operands, integer operators integers).
    pub fn binary(
        &mut self,
        op: BinaryOp,
        lhs: Value,
        rhs: Value,
        flags: FastMathFlags,
    ) -> Result<Value> {
        let lhs_ty = self.type_of(&lhs)?;
        let rhs_ty = self.type_of(&rhs)?;
        if lhs_ty != rhs_ty {
            return Err(Error::TypeMismatch {
                expected: lhs_ty,
                found: rhs_ty,
            });
        }
        let suitable = if op.is_float() {
            lhs_ty.is_fp_or_fp_vector()
        } else {
            lhs_ty.is_int_or_int_vector()
        };
        if !suitable {
            return Err(Error::InvalidValue(format!(
                "{op} cannot operate on {lhs_ty}"
            )));
        }
        let flags = if op.is_float() {
            flags
        } else {
            FastMathFlags::empty()
        };
        let id = self.push(
            Op::Binary {
                op,
                lhs,
                rhs,
                flags,
            },
            lhs_ty,
        )?;
        Ok(Value::Inst(id))
    }

    /// Emits `fadd` without fast-math flags.
    ///
    /// # Errors
    ///
    /// See [`FunctionBuilder::binary`].
    pub fn fadd(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::FAdd, lhs, rhs, FastMathFlags::empty())
    }

    /// Emits `fadd` with fast-math flags.
    ///
    /// # Errors
    ///
    /// See [`FunctionBuilder::binary`].
    pub fn fadd_with_flags(
        &mut self,
        lhs: Value,
        rhs: Value,
        flags: FastMathFlags,
    ) -> Result<Value> {
        self.binary(BinaryOp::FAdd, lhs, rhs, flags)
    }

    /// Emits `fsub` without fast-math flags.
    ///
    /// # Errors
    ///
    /// See [`FunctionBuilder::binary`].
    pub fn fsub(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::FSub, lhs, rhs, FastMathFlags::empty())
    }

    /// Emits `fmul` without fast-math flags.
    ///
    /// # Errors
    ///
    /// See [`FunctionBuilder::binary`].
    pub fn fmul(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::FMul, lhs, rhs, FastMathFlags::empty())
    }

    /// Emits `fdiv` without fast-math flags.
    ///
    /// # Errors
    ///
    /// See [`FunctionBuilder::binary`].
    pub fn fdiv(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::FDiv, lhs, rhs, FastMathFlags::empty())
    }

    /// Emits `frem` without fast-math flags.
    ///
    /// # Errors
    ///
    /// See [`FunctionBuilder::binary`].
    pub fn frem(&mut self, lhs: Value, rhs: Value) -> Result<Value> {
        self.binary(BinaryOp::FRem, lhs, rhs, FastMathFlags::empty())
    }

    /// Emits `fneg`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a non-float operand.
    pub fn fneg(&mut self, operand: Value) -> Result<Value> {
        let ty = self.type_of(&operand)?;
        if !ty.is_fp_or_fp_vector() {
            return Err(Error::InvalidValue(format!("fneg cannot operate on {ty}")));
        }
        let id = self.push(
            Op::FNeg {
                operand,
                flags: FastMathFlags::empty(),
            },
            ty,
        )?;
        Ok(Value::Inst(id))
    }

    /// Emits a conversion to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the lane counts differ and
    /// [`Error::InvalidValue`] if the source or target kind does not fit `op`
    /// (including a `void` target).
    pub fn cast(&mut self, op: CastOp, operand: Value, to: IrType) -> Result<Value> {
        let from = self.type_of(&operand)?;
        if let Some(element) = to.scalar() {
            if from.lanes() != to.lanes() {
                return Err(Error::TypeMismatch {
                    expected: from.with_scalar(element),
                    found: to,
                });
            }
        }
        let valid = match op {
            CastOp::FPExt => matches!(
                (from.float_width(), to.float_width()),
                (Some(a), Some(b)) if a < b
            ),
            CastOp::FPTrunc => matches!(
                (from.float_width(), to.float_width()),
                (Some(a), Some(b)) if a > b
            ),
            CastOp::SIToFP | CastOp::UIToFP => {
                from.is_int_or_int_vector() && to.is_fp_or_fp_vector()
            }
            CastOp::FPToSI | CastOp::FPToUI => {
                from.is_fp_or_fp_vector() && to.is_int_or_int_vector()
            }
        };
        if !valid {
            return Err(Error::InvalidValue(format!(
                "{} cannot convert {from} to {to}",
                op.mnemonic()
            )));
        }
        let id = self.push(Op::Cast { op, operand }, to)?;
        Ok(Value::Inst(id))
    }

    /// Emits `extractelement`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] for a non-vector operand or an index out of range.
    pub fn extract_element(&mut self, vector: Value, index: u32) -> Result<Value> {
        let ty = self.type_of(&vector)?;
        match ty {
            IrType::Vector(element, lanes) if index < u32::from(lanes) => {
                let id = self.push(Op::ExtractElement { vector, index }, element.into())?;
                Ok(Value::Inst(id))
            }
            _ => Err(Error::InvalidValue(format!(
                "cannot extract lane {index} from {ty}"
            ))),
        }
    }

    /// Emits a call. The callee should be declared in the owning module.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if an argument does not resolve.
    pub fn call(&mut self, callee: &str, ret: IrType, args: Vec<Value>) -> Result<Value> {
        for arg in &args {
            self.type_of(arg)?;
        }
        let id = self.push(
            Op::Call {
                callee: callee.to_string(),
                args,
            },
            ret,
        )?;
        Ok(Value::Inst(id))
    }

    /// Emits a read of a shader input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if `ty` is `void`.
    pub fn load_input(&mut self, location: u32, ty: IrType) -> Result<Value> {
        if ty == IrType::VOID {
            return Err(Error::InvalidValue("cannot load a void input".to_string()));
        }
        let id = self.push(Op::LoadInput { location }, ty)?;
        Ok(Value::Inst(id))
    }

    /// Emits a write of a shader output.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if `value` does not resolve.
    pub fn store_output(&mut self, location: u32, value: Value) -> Result<InstId> {
        self.type_of(&value)?;
        self.push(Op::StoreOutput { location, value }, IrType::VOID)
    }

    /// Emits a return.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the value does not match the return type.
    pub fn ret(&mut self, value: Option<Value>) -> Result<InstId> {
        let found = match &value {
            Some(v) => self.type_of(v)?,
            None => IrType::VOID,
        };
        if found != self.func.ret() {
            return Err(Error::TypeMismatch {
                expected: self.func.ret(),
                found,
            });
        }
        self.push(Op::Return { value }, IrType::VOID)
    }
}
