//! Generic constant folding.
//!
//! [`ConstFolder`] evaluates a single instruction whose operands are all constants. It
//! knows nothing about precision policy: results are plain IEEE results (binary16
//! arithmetic is evaluated in single precision and rounded back to nearest-even), and
//! deciding what to do with a denormal result is left to the caller.
//!
//! Vector operations fold lane by lane. Anything the folder does not understand, or
//! whose result would be poison (out-of-range shifts and float-to-int conversions),
//! folds to `None`.

use std::ops::{Add, Div, Mul, Rem, Sub};

use crate::{
    ir::{BinaryOp, CastOp, ConstValue, Function, InstId, Instruction, IrType, Op, ScalarType, Value},
    utils::Half,
};

/// Stateless constant evaluator.
///
/// # Examples
///
/// ```rust
/// use shadelower::ir::{ConstFolder, ConstValue, FunctionBuilder, IrType, Value};
///
/// let mut b = FunctionBuilder::new("f", &[], IrType::VOID);
/// let product = b.fmul(Value::f32(1.5), Value::f32(4.0))?;
/// let func = b.finish();
///
/// let id = product.as_inst().unwrap();
/// assert_eq!(ConstFolder::fold(&func, id), Some(ConstValue::F32(6.0)));
/// # Ok::<(), shadelower::Error>(())
/// ```
pub struct ConstFolder;

impl ConstFolder {
    /// Folds the live instruction `id` of `function`.
    #[must_use]
    pub fn fold(function: &Function, id: InstId) -> Option<ConstValue> {
        Self::fold_instruction(function.inst(id)?)
    }

    /// Folds a detached instruction.
    #[must_use]
    pub fn fold_instruction(inst: &Instruction) -> Option<ConstValue> {
        let constants = inst
            .op()
            .operands()
            .into_iter()
            .map(Value::as_const)
            .collect::<Option<Vec<_>>>()?;
        let ty = inst.ty();

        match (inst.op(), constants.as_slice()) {
            (Op::Binary { op, .. }, [lhs, rhs]) => Self::fold_binary(*op, lhs, rhs, ty),
            (Op::FNeg { .. }, [operand]) => map_lanes(operand, ty, negate),
            (Op::Cast { op, .. }, [operand]) => {
                let target = ty.scalar()?;
                map_lanes(operand, ty, |lane| cast(*op, lane, target))
            }
            (Op::ExtractElement { index, .. }, [vector]) => {
                let lane = vector.lanes().into_iter().nth(*index as usize)?;
                (lane.ty() == ty).then_some(lane)
            }
            (Op::Call { callee, .. }, args) => Self::fold_call(callee, args, ty),
            _ => None,
        }
    }

    /// Folds a binary operator over two constants of the result type.
    #[must_use]
    pub fn fold_binary(
        op: BinaryOp,
        lhs: &ConstValue,
        rhs: &ConstValue,
        ty: IrType,
    ) -> Option<ConstValue> {
        if lhs.ty() != ty || rhs.ty() != ty {
            return None;
        }
        if op.is_float() {
            zip_lanes(lhs, rhs, ty, |a, b| float_binary(op, a, b))
        } else {
            zip_lanes(lhs, rhs, ty, |a, b| int_binary(op, a, b))
        }
    }

    fn fold_call(callee: &str, args: &[&ConstValue], ty: IrType) -> Option<ConstValue> {
        let intrinsic = callee.strip_prefix("llvm.")?.split('.').next()?;
        match (intrinsic, args) {
            ("fabs", [x]) => map_float_lanes(x, ty, f64::abs),
            ("sqrt", [x]) => map_float_lanes(x, ty, f64::sqrt),
            ("floor", [x]) => map_float_lanes(x, ty, f64::floor),
            ("ceil", [x]) => map_float_lanes(x, ty, f64::ceil),
            ("trunc", [x]) => map_float_lanes(x, ty, f64::trunc),
            ("minnum", [x, y]) if x.ty() == y.ty() => zip_lanes(x, y, ty, |a, b| {
                Some(with_float_width(a, a.as_f64()?.min(b.as_f64()?)))
            }),
            ("maxnum", [x, y]) if x.ty() == y.ty() => zip_lanes(x, y, ty, |a, b| {
                Some(with_float_width(a, a.as_f64()?.max(b.as_f64()?)))
            }),
            _ => None,
        }
    }
}

fn map_lanes(
    operand: &ConstValue,
    ty: IrType,
    f: impl Fn(&ConstValue) -> Option<ConstValue>,
) -> Option<ConstValue> {
    let lanes = operand.lanes();
    if lanes.len() != ty.lanes() {
        return None;
    }
    let folded = lanes.iter().map(f).collect::<Option<Vec<_>>>()?;
    Some(ConstValue::from_lanes(ty, folded))
}

fn zip_lanes(
    lhs: &ConstValue,
    rhs: &ConstValue,
    ty: IrType,
    f: impl Fn(&ConstValue, &ConstValue) -> Option<ConstValue>,
) -> Option<ConstValue> {
    let left = lhs.lanes();
    let right = rhs.lanes();
    if left.len() != ty.lanes() || right.len() != ty.lanes() {
        return None;
    }
    let folded = left
        .iter()
        .zip(&right)
        .map(|(a, b)| f(a, b))
        .collect::<Option<Vec<_>>>()?;
    Some(ConstValue::from_lanes(ty, folded))
}

/// Applies an exact-on-widening unary function to float lanes.
fn map_float_lanes(
    operand: &ConstValue,
    ty: IrType,
    f: impl Fn(f64) -> f64,
) -> Option<ConstValue> {
    if operand.ty() != ty {
        return None;
    }
    map_lanes(operand, ty, |lane| Some(with_float_width(lane, f(lane.as_f64()?))))
}

/// Rounds `value` to the float type of `like`.
fn with_float_width(like: &ConstValue, value: f64) -> ConstValue {
    match like {
        ConstValue::F16(_) => ConstValue::F16(Half::from_f64(value)),
        ConstValue::F32(_) => ConstValue::F32(value as f32),
        _ => ConstValue::F64(value),
    }
}

fn arith<T>(op: BinaryOp, x: T, y: T) -> Option<T>
where
    T: Add<Output = T> + Sub<Output = T> + Mul<Output = T> + Div<Output = T> + Rem<Output = T>,
{
    match op {
        BinaryOp::FAdd => Some(x + y),
        BinaryOp::FSub => Some(x - y),
        BinaryOp::FMul => Some(x * y),
        BinaryOp::FDiv => Some(x / y),
        BinaryOp::FRem => Some(x % y),
        _ => None,
    }
}

fn float_binary(op: BinaryOp, a: &ConstValue, b: &ConstValue) -> Option<ConstValue> {
    match (a, b) {
        (ConstValue::F16(x), ConstValue::F16(y)) => {
            arith(op, x.to_f32(), y.to_f32()).map(|r| ConstValue::F16(Half::from_f32(r)))
        }
        (ConstValue::F32(x), ConstValue::F32(y)) => arith(op, *x, *y).map(ConstValue::F32),
        (ConstValue::F64(x), ConstValue::F64(y)) => arith(op, *x, *y).map(ConstValue::F64),
        _ => None,
    }
}

fn int_binary(op: BinaryOp, a: &ConstValue, b: &ConstValue) -> Option<ConstValue> {
    let scalar = a.ty().scalar()?;
    let bits = scalar.bits();
    let (x, y) = (a.zext_value()?, b.zext_value()?);
    let result = match op {
        BinaryOp::Add => x.wrapping_add(y),
        BinaryOp::Sub => x.wrapping_sub(y),
        BinaryOp::Mul => x.wrapping_mul(y),
        BinaryOp::And => x & y,
        BinaryOp::Or => x | y,
        BinaryOp::Xor => x ^ y,
        BinaryOp::Shl if y < u64::from(bits) => x << y,
        BinaryOp::LShr if y < u64::from(bits) => x >> y,
        _ => return None,
    };
    int_from_bits(scalar, result)
}

/// Truncates `bits` to the width of `scalar`.
fn int_from_bits(scalar: ScalarType, bits: u64) -> Option<ConstValue> {
    match scalar {
        ScalarType::Bool => Some(ConstValue::Bool(bits & 1 != 0)),
        ScalarType::I16 => Some(ConstValue::I16(bits as u16 as i16)),
        ScalarType::I32 => Some(ConstValue::I32(bits as u32 as i32)),
        ScalarType::I64 => Some(ConstValue::I64(bits as i64)),
        _ => None,
    }
}

fn negate(lane: &ConstValue) -> Option<ConstValue> {
    match lane {
        ConstValue::F16(v) => Some(ConstValue::F16(v.negate())),
        ConstValue::F32(v) => Some(ConstValue::F32(-v)),
        ConstValue::F64(v) => Some(ConstValue::F64(-v)),
        _ => None,
    }
}

/// Rounds an exactly representable `f64` (or an `f64` that rounds once) to `target`.
fn float_of(target: ScalarType, value: f64) -> Option<ConstValue> {
    match target {
        ScalarType::F16 => Some(ConstValue::F16(Half::from_f64(value))),
        ScalarType::F32 => Some(ConstValue::F32(value as f32)),
        ScalarType::F64 => Some(ConstValue::F64(value)),
        _ => None,
    }
}

fn cast(op: CastOp, lane: &ConstValue, target: ScalarType) -> Option<ConstValue> {
    match op {
        CastOp::FPExt | CastOp::FPTrunc => match (lane, target) {
            (ConstValue::F32(v), ScalarType::F16) => Some(ConstValue::F16(Half::from_f32(*v))),
            _ => float_of(target, lane.as_f64()?),
        },
        CastOp::SIToFP => {
            let value = lane.sext_value()?;
            match target {
                ScalarType::F32 => Some(ConstValue::F32(value as f32)),
                _ => float_of(target, value as f64),
            }
        }
        CastOp::UIToFP => {
            let value = lane.zext_value()?;
            match target {
                ScalarType::F32 => Some(ConstValue::F32(value as f32)),
                _ => float_of(target, value as f64),
            }
        }
        CastOp::FPToSI => {
            let truncated = lane.as_f64()?.trunc();
            let bound = 2f64.powi(i32::try_from(target.bits()).ok()? - 1);
            if !target.is_integer() || !(truncated >= -bound && truncated < bound) {
                return None;
            }
            int_from_bits(target, truncated as i64 as u64)
        }
        CastOp::FPToUI => {
            let truncated = lane.as_f64()?.trunc();
            let bound = 2f64.powi(i32::try_from(target.bits()).ok()?);
            if !target.is_integer() || !(truncated >= 0.0 && truncated < bound) {
                return None;
            }
            int_from_bits(target, truncated as u64)
        }
    }
}
