//! Per-operator rewrites of floating-point binary operations.
//!
//! Each floating-point binary operator is visited once, in program order:
//!
//! 1. `fadd` with `contract`: `reassoc` and `contract` are set together, cleared if an
//!    operand chain forbids contraction
//! 2. zero identities, only under a relaxed precision policy:
//!    - `x + 0` / `0 + x` → `x`
//!    - `x * 0` / `0 * x` → `0`
//!    - `0 / x` → `0` for `x` not a zero constant
//!    - `x - 0` → `x`
//! 3. any `fdiv` still present becomes a call to the library `fdiv` builtin

use crate::{
    builtins::{emit_call, mangle_builtin, FDIV},
    compiler::{EventKind, EventLog},
    ir::{BinaryOp, ConstValue, Declarations, FastMathFlags, Function, FunctionAttrs, InstId, Op, Value},
    metadata::FloatControls,
};

use super::{contract::is_operand_no_contract, PASS_NAME};

/// Returns `true` for an aggregate zero or a scalar float zero of either sign.
pub(super) fn is_const_zero(value: &Value) -> bool {
    match value {
        Value::Const(ConstValue::Zero(_)) => true,
        Value::Const(constant) => constant.is_fp_zero(),
        _ => false,
    }
}

/// Returns the operand that `op` reduces to when one side is a zero constant.
pub(super) fn zero_identity(op: BinaryOp, lhs: &Value, rhs: &Value) -> Option<Value> {
    let lhs_zero = is_const_zero(lhs);
    let rhs_zero = is_const_zero(rhs);
    match op {
        BinaryOp::FAdd if lhs_zero => Some(rhs.clone()),
        BinaryOp::FAdd if rhs_zero => Some(lhs.clone()),
        BinaryOp::FMul if lhs_zero => Some(lhs.clone()),
        BinaryOp::FMul if rhs_zero => Some(rhs.clone()),
        BinaryOp::FDiv if lhs_zero && !rhs_zero => Some(lhs.clone()),
        BinaryOp::FSub if rhs_zero => Some(lhs.clone()),
        _ => None,
    }
}

/// Makes `reassoc` agree with `contract` on an `fadd` that allows contraction.
///
/// Returns `true` if the flags were rewritten.
fn normalize_contract_flags(
    function: &mut Function,
    id: InstId,
    lhs: &Value,
    rhs: &Value,
    flags: FastMathFlags,
) -> bool {
    if !flags.allow_contract() {
        return false;
    }
    let allow = !(is_operand_no_contract(function, lhs) || is_operand_no_contract(function, rhs));
    let mut normalized = flags;
    normalized.set(FastMathFlags::REASSOC | FastMathFlags::CONTRACT, allow);
    normalized != flags && function.set_fast_math_flags(id, normalized)
}

/// Replaces `id` with `replacement` and erases it.
fn replace_and_erase(function: &mut Function, id: InstId, replacement: &Value) -> bool {
    function.replace_all_uses_with(id, replacement);
    function.drop_all_references(id);
    match function.erase(id) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("algebra transform: could not erase {id}: {err}");
            false
        }
    }
}

/// Visits every floating-point binary operator of `function`.
///
/// Returns `true` if any instruction was added, replaced or removed. Flag rewrites
/// alone do not count.
pub(super) fn simplify_function(
    function: &mut Function,
    declarations: &mut Declarations,
    controls: &FloatControls,
    events: &EventLog,
) -> bool {
    let mut changed = false;
    let name = function.name().to_string();
    let eliminate_identities = controls.allows_identity_elimination();

    for id in function.instruction_ids() {
        let Some(inst) = function.inst(id) else {
            continue;
        };
        let ty = inst.ty();
        let (op, lhs, rhs, flags) = match inst.op() {
            Op::Binary {
                op,
                lhs,
                rhs,
                flags,
            } if op.is_float() => (*op, lhs.clone(), rhs.clone(), *flags),
            _ => continue,
        };

        if op == BinaryOp::FAdd && normalize_contract_flags(function, id, &lhs, &rhs, flags) {
            log::trace!("algebra transform: contract flags of {id} normalized");
            events
                .record(EventKind::ContractFlagsChanged)
                .at(&name, id)
                .pass(PASS_NAME);
        }

        if eliminate_identities {
            if let Some(replacement) = zero_identity(op, &lhs, &rhs) {
                log::debug!("algebra transform: {id} = {op} {lhs}, {rhs} -> {replacement}");
                if replace_and_erase(function, id, &replacement) {
                    events
                        .record(EventKind::AlgebraicSimplified)
                        .at(&name, id)
                        .message(format!("{op} {lhs}, {rhs} -> {replacement}"))
                        .pass(PASS_NAME);
                    changed = true;
                }
                continue;
            }
        }

        if op == BinaryOp::FDiv {
            let (Some(lhs_ty), Some(rhs_ty)) = (function.value_type(&lhs), function.value_type(&rhs))
            else {
                continue;
            };
            let callee = mangle_builtin(FDIV, &[lhs_ty, rhs_ty]);
            let call = match emit_call(
                function,
                declarations,
                &callee,
                ty,
                vec![lhs, rhs],
                FunctionAttrs::empty(),
                id,
            ) {
                Ok(call) => call,
                Err(err) => {
                    log::warn!("algebra transform: could not lower {id}: {err}");
                    continue;
                }
            };
            log::debug!("algebra transform: {id} = fdiv -> {call} = call @{callee}");
            if replace_and_erase(function, id, &Value::Inst(call)) {
                events
                    .record(EventKind::DivisionLowered)
                    .at(&name, id)
                    .message(format!("fdiv -> @{callee}"))
                    .pass(PASS_NAME);
            }
            changed = true;
        }
    }

    changed
}
