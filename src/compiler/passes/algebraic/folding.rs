//! Constant folding under a denormal flush policy.
//!
//! Generic folding evaluates operations with IEEE semantics, which keeps denormal
//! results. When the shader asks for denormals of a width to be flushed, every folded
//! constant of that width has to be corrected before it replaces the instruction, or
//! the compiled shader would compute something the hardware never would.
//!
//! `unpackHalf2x16` is handled by hand: its arithmetic happens inside the library
//! builtin, so the denormal inputs have to be flushed at the bit level.

use crate::{
    builtins::UNPACK_HALF_2X16,
    compiler::{EventKind, EventLog},
    ir::{ConstFolder, ConstValue, Declarations, Function, FloatWidth, InstId, IrType, ScalarType, Value},
    metadata::FloatControls,
    utils::Half,
};

use super::PASS_NAME;

/// Replaces every denormal lane of `value` with positive zero.
///
/// Returns `None` if no lane was denormal.
pub(super) fn flush_denormals(value: &ConstValue) -> Option<ConstValue> {
    let lanes = value.lanes();
    if !lanes.iter().any(ConstValue::is_denormal) {
        return None;
    }
    let flushed = lanes
        .into_iter()
        .map(|lane| {
            if lane.is_denormal() {
                ConstValue::zero(lane.ty()).unwrap_or(lane)
            } else {
                lane
            }
        })
        .collect();
    Some(ConstValue::from_lanes(value.ty(), flushed))
}

/// Evaluates `unpackHalf2x16` with denormal inputs flushed to zero of the same sign.
///
/// The low 16 bits become lane 0 and the high 16 bits lane 1.
pub(super) fn unpack_half_2x16(packed: u64) -> ConstValue {
    let lanes = [packed & 0xFFFF, (packed >> 16) & 0xFFFF]
        .into_iter()
        .map(|bits| {
            let half = Half::from_bits(u16::try_from(bits).unwrap_or(0)).flush_to_zero();
            // binary16 widens to binary32 exactly, so the rounding mode is moot.
            ConstValue::F32(half.to_f32())
        })
        .collect();
    ConstValue::from_lanes(IrType::vector(ScalarType::F32, 2), lanes)
}

/// Erases `id` and whatever became dead with it, recording each removal.
fn erase_dead(function: &mut Function, declarations: &Declarations, id: InstId, events: &EventLog) {
    let name = function.name().to_string();
    for erased in function.erase_if_trivially_dead(id, declarations) {
        events
            .record(EventKind::InstructionRemoved)
            .at(&name, erased)
            .pass(PASS_NAME);
    }
}

/// Replaces all uses of `id` with `constant` and erases it if it became dead.
fn replace_with_constant(
    function: &mut Function,
    declarations: &Declarations,
    id: InstId,
    constant: ConstValue,
    events: &EventLog,
) {
    function.replace_all_uses_with(id, &Value::Const(constant));
    erase_dead(function, declarations, id, events);
}

/// Walks `function` in program order, removing dead instructions and folding
/// floating-point constant expressions.
///
/// Returns `true` if any instruction was replaced or removed.
pub(super) fn fold_constants(
    function: &mut Function,
    declarations: &Declarations,
    controls: &FloatControls,
    events: &EventLog,
) -> bool {
    let mut changed = false;
    let name = function.name().to_string();

    for id in function.instruction_ids() {
        let Some(inst) = function.inst(id) else {
            continue;
        };

        if function.is_trivially_dead(id, declarations) {
            log::debug!("algebra transform: DCE: {id} = {inst}");
            erase_dead(function, declarations, id, events);
            changed = true;
            continue;
        }

        let ty = inst.ty();
        let first_is_const = inst.op().operand(0).is_some_and(Value::is_const);
        if !function.has_uses(id) || !ty.is_fp_or_fp_vector() || !first_is_const {
            continue;
        }

        if let Some(folded) = ConstFolder::fold(function, id) {
            log::debug!("algebra transform: constant folding: {folded} from: {id} = {inst}");
            let folded = if controls.denorm_flush_to_zero.covers(ty) {
                match flush_denormals(&folded) {
                    Some(flushed) => {
                        events
                            .record(EventKind::DenormalFlushed)
                            .at(&name, id)
                            .message(format!("{folded} -> {flushed}"))
                            .pass(PASS_NAME);
                        flushed
                    }
                    None => folded,
                }
            } else {
                folded
            };
            events
                .record(EventKind::ConstantFolded)
                .at(&name, id)
                .message(format!("{id} -> {folded}"))
                .pass(PASS_NAME);
            replace_with_constant(function, declarations, id, folded, events);
            changed = true;
            continue;
        }

        let packed = match (inst.op().callee(), inst.op().operand(0)) {
            (Some(UNPACK_HALF_2X16), Some(Value::Const(arg))) if arg.ty().is_int_or_int_vector() => {
                arg.zext_value()
            }
            _ => None,
        };
        if let Some(packed) = packed.filter(|_| controls.flushes(FloatWidth::Half)) {
            let unpacked = unpack_half_2x16(packed);
            log::debug!("algebra transform: constant folding: {unpacked} from: {id} = {inst}");
            events
                .record(EventKind::BuiltinFolded)
                .at(&name, id)
                .message(format!("{UNPACK_HALF_2X16}({packed:#x}) -> {unpacked}"))
                .pass(PASS_NAME);
            replace_with_constant(function, declarations, id, unpacked, events);
            changed = true;
        }
    }

    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        ir::{FunctionAttrs, FunctionBuilder, FunctionDecl},
        metadata::FloatWidths,
        Result,
    };

    #[test]
    fn test_flush_denormals_per_lane() -> Result<()> {
        let tiny = f32::MIN_POSITIVE / 4.0;
        let value = ConstValue::vector(vec![ConstValue::F32(tiny), ConstValue::F32(1.0)])?;
        let flushed = flush_denormals(&value);
        assert_eq!(
            flushed,
            Some(ConstValue::Vector(vec![ConstValue::F32(0.0), ConstValue::F32(1.0)]))
        );

        let negative = ConstValue::F64(-f64::MIN_POSITIVE / 2.0);
        let flushed = flush_denormals(&negative).and_then(|v| v.as_f64());
        assert_eq!(flushed.map(f64::to_bits), Some(0));

        assert_eq!(flush_denormals(&ConstValue::F16(Half::ONE)), None);
        Ok(())
    }

    #[test]
    fn test_unpack_half() {
        // 0x3C00 = 1.0, 0xC000 = -2.0
        assert_eq!(
            unpack_half_2x16(0xC000_3C00),
            ConstValue::Vector(vec![ConstValue::F32(1.0), ConstValue::F32(-2.0)])
        );
        // low half denormal, high half negative denormal
        let value = unpack_half_2x16(0x8001_0001);
        let lanes = value.lanes();
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[0], ConstValue::F32(0.0));
        assert!(matches!(lanes[1], ConstValue::F32(v) if v == 0.0 && v.is_sign_negative()));
        // both positive zero collapse to the aggregate zero
        assert_eq!(
            unpack_half_2x16(0x0003_0002),
            ConstValue::Zero(IrType::vector(ScalarType::F32, 2))
        );
    }

    #[test]
    fn test_fold_flushes_covered_width_only() -> Result<()> {
        let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
        let tiny32 = b.fmul(Value::f32(f32::MIN_POSITIVE), Value::f32(0.5))?;
        let tiny64 = b.fmul(Value::f64(f64::MIN_POSITIVE), Value::f64(0.5))?;
        b.store_output(0, tiny32)?;
        let keep = b.store_output(1, tiny64)?;
        let mut func = b.finish();

        let controls = FloatControls {
            denorm_flush_to_zero: FloatWidths::BIT32,
            ..FloatControls::relaxed()
        };
        let events = EventLog::new();
        assert!(fold_constants(&mut func, &Declarations::default(), &controls, &events));
        assert_eq!(func.instruction_count(), 2);
        assert_eq!(events.count_kind(EventKind::ConstantFolded), 2);
        assert_eq!(events.count_kind(EventKind::DenormalFlushed), 1);
        // both folded multiplications are erased once their stores take the constants
        assert_eq!(events.count_kind(EventKind::InstructionRemoved), 2);

        let stored = func.inst(keep).and_then(|inst| inst.op().operand(0).cloned());
        assert_eq!(stored, Some(Value::f64(f64::MIN_POSITIVE * 0.5)));
        func.verify()
    }

    #[test]
    fn test_dead_code_removed_recursively() -> Result<()> {
        let mut b = FunctionBuilder::new("main", &[IrType::F32], IrType::VOID);
        let a = b.fadd(Value::Arg(0), Value::f32(1.0))?;
        b.fmul(a, Value::f32(2.0))?;
        b.ret(None)?;
        let mut func = b.finish();

        let events = EventLog::new();
        let changed = fold_constants(
            &mut func,
            &Declarations::default(),
            &FloatControls::flush_all(),
            &events,
        );
        assert!(changed);
        assert_eq!(func.instruction_count(), 1);
        assert_eq!(events.count_kind(EventKind::InstructionRemoved), 2);
        func.verify()
    }

    #[test]
    fn test_unpack_requires_half_flush() -> Result<()> {
        let v2f = IrType::vector(ScalarType::F32, 2);
        let build = || -> Result<(Function, InstId)> {
            let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
            let call = b.call(UNPACK_HALF_2X16, v2f, vec![Value::i32(0x3C00_0001)])?;
            b.store_output(0, call.clone())?;
            Ok((b.finish(), call.as_inst().unwrap_or(InstId::new(0))))
        };
        let mut declarations = Declarations::default();
        declarations.declare(FunctionDecl::new(
            UNPACK_HALF_2X16,
            v2f,
            vec![IrType::I32],
            FunctionAttrs::PURE,
        ));

        let (mut func, call) = build()?;
        let only32 = FloatControls {
            denorm_flush_to_zero: FloatWidths::BIT32,
            ..FloatControls::relaxed()
        };
        assert!(!fold_constants(&mut func, &declarations, &only32, &EventLog::new()));
        assert!(func.is_live(call));

        let (mut func, call) = build()?;
        let events = EventLog::new();
        assert!(fold_constants(&mut func, &declarations, &FloatControls::flush_all(), &events));
        assert!(!func.is_live(call));
        assert!(events.has(EventKind::BuiltinFolded));
        assert_eq!(events.count_kind(EventKind::InstructionRemoved), 1);
        func.verify()
    }
}
