//! Backward search for operands that forbid contraction.

use crate::ir::{Function, Op, Value};

/// Returns `true` if `operand` (transitively) forbids fast-math contraction.
///
/// An operand forbids contraction if it is a floating-point binary operator whose flags
/// are non-empty but lack `contract`. Otherwise, for any binary operator the search
/// continues with its first operand only; the second operand is never inspected. Any
/// other operand (argument, constant, non-binary instruction) allows contraction.
pub(super) fn is_operand_no_contract(function: &Function, operand: &Value) -> bool {
    let mut current = operand;
    // Bounded: a malformed graph may contain an operand cycle.
    for _ in 0..=function.instruction_count() {
        let Some(inst) = current.as_inst().and_then(|id| function.inst(id)) else {
            return false;
        };
        let Op::Binary { lhs, .. } = inst.op() else {
            return false;
        };
        if let Some(flags) = inst.fast_math_flags() {
            if !flags.is_empty() && !flags.allow_contract() {
                return true;
            }
        }
        current = lhs;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{BinaryOp, FastMathFlags, FunctionBuilder, IrType},
        Result,
    };

    #[test]
    fn test_flagged_operator_without_contract() -> Result<()> {
        let mut b = FunctionBuilder::new("f", &[IrType::F32, IrType::F32], IrType::VOID);
        let strict = b.fmul(Value::Arg(0), Value::Arg(1))?;
        let nnan = b.binary(BinaryOp::FMul, Value::Arg(0), Value::Arg(1), FastMathFlags::NNAN)?;
        let contract =
            b.binary(BinaryOp::FMul, Value::Arg(0), Value::Arg(1), FastMathFlags::CONTRACT)?;
        let func = b.finish();

        // empty flags are the default, not an explicit refusal
        assert!(!is_operand_no_contract(&func, &strict));
        assert!(is_operand_no_contract(&func, &nnan));
        assert!(!is_operand_no_contract(&func, &contract));
        assert!(!is_operand_no_contract(&func, &Value::Arg(0)));
        assert!(!is_operand_no_contract(&func, &Value::f32(1.0)));
        Ok(())
    }

    #[test]
    fn test_search_follows_first_operand_only() -> Result<()> {
        let mut b = FunctionBuilder::new("f", &[IrType::F32, IrType::F32], IrType::VOID);
        let refusing = b.binary(BinaryOp::FMul, Value::Arg(0), Value::Arg(1), FastMathFlags::NSZ)?;
        let via_lhs =
            b.binary(BinaryOp::FAdd, refusing.clone(), Value::Arg(1), FastMathFlags::CONTRACT)?;
        let via_rhs =
            b.binary(BinaryOp::FAdd, Value::Arg(1), refusing, FastMathFlags::CONTRACT)?;
        let func = b.finish();

        assert!(is_operand_no_contract(&func, &via_lhs));
        assert!(!is_operand_no_contract(&func, &via_rhs));
        Ok(())
    }

    #[test]
    fn test_search_passes_through_integer_operators() -> Result<()> {
        let mut b = FunctionBuilder::new("f", &[IrType::I32], IrType::VOID);
        let sum = b.binary(BinaryOp::Add, Value::Arg(0), Value::i32(1), FastMathFlags::empty())?;
        let func = b.finish();
        assert!(!is_operand_no_contract(&func, &sum));
        Ok(())
    }
}
