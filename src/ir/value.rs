//! Constants and operand references.
//!
//! [`ConstValue`] is an immutable compile-time constant: a scalar, a vector of scalars,
//! or an all-zero aggregate. [`Value`] is what an instruction operand points at: another
//! instruction, a constant, or a function argument.
//!
//! # Canonical Zero
//!
//! A vector whose lanes are all positive zero is always represented as
//! [`ConstValue::Zero`], never as [`ConstValue::Vector`]. Negative zero lanes are not
//! null, so `<-0.0, -0.0>` stays a `Vector`. Constructors in this module maintain that
//! form, which is what lets the simplifier recognise a zero operand with one match.

use std::{fmt, num::FpCategory};

use crate::{
    ir::{InstId, IrType, ScalarType},
    utils::Half,
    Error, Result,
};

/// IEEE 754 classification of a floating-point constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FpClass {
    /// A normal finite non-zero value.
    Normal,
    /// A subnormal (denormal) value.
    Denormal,
    /// Positive or negative zero.
    Zero,
    /// Positive or negative infinity.
    Infinite,
    /// Not a number.
    Nan,
}

impl From<FpCategory> for FpClass {
    fn from(category: FpCategory) -> Self {
        match category {
            FpCategory::Normal => Self::Normal,
            FpCategory::Subnormal => Self::Denormal,
            FpCategory::Zero => Self::Zero,
            FpCategory::Infinite => Self::Infinite,
            FpCategory::Nan => Self::Nan,
        }
    }
}

/// A compile-time constant.
///
/// # Examples
///
/// ```rust
/// use shadelower::ir::{ConstValue, FpClass, IrType, ScalarType};
///
/// let tiny = ConstValue::F32(1.0e-40);
/// assert_eq!(tiny.fp_class(), Some(FpClass::Denormal));
///
/// let zeros = ConstValue::vector(vec![ConstValue::F32(0.0), ConstValue::F32(0.0)])?;
/// assert_eq!(zeros, ConstValue::Zero(IrType::vector(ScalarType::F32, 2)));
/// # Ok::<(), shadelower::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    /// Boolean.
    Bool(bool),
    /// 16-bit integer.
    I16(i16),
    /// 32-bit integer.
    I32(i32),
    /// 64-bit integer.
    I64(i64),
    /// 16-bit float.
    F16(Half),
    /// 32-bit float.
    F32(f32),
    /// 64-bit float.
    F64(f64),
    /// A vector of scalar constants of one type, not all positive zero.
    Vector(Vec<ConstValue>),
    /// The all-zero value of a vector type.
    Zero(IrType),
}

impl ConstValue {
    /// Returns the null value of `ty`: `false`, integer `0`, `+0.0`, or an aggregate zero.
    ///
    /// Returns `None` for `void`.
    #[must_use]
    pub fn zero(ty: IrType) -> Option<Self> {
        match ty {
            IrType::Void => None,
            IrType::Vector(..) => Some(Self::Zero(ty)),
            IrType::Scalar(scalar) => Some(Self::scalar_zero(scalar)),
        }
    }

    fn scalar_zero(scalar: ScalarType) -> Self {
        match scalar {
            ScalarType::Bool => Self::Bool(false),
            ScalarType::I16 => Self::I16(0),
            ScalarType::I32 => Self::I32(0),
            ScalarType::I64 => Self::I64(0),
            ScalarType::F16 => Self::F16(Half::ZERO),
            ScalarType::F32 => Self::F32(0.0),
            ScalarType::F64 => Self::F64(0.0),
        }
    }

    /// Builds a vector constant from scalar lanes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidValue`] if `lanes` is empty, longer than 255, contains a
    /// non-scalar, or mixes element types.
    pub fn vector(lanes: Vec<ConstValue>) -> Result<Self> {
        let Some(first) = lanes.first() else {
            return Err(Error::InvalidValue("empty vector constant".to_string()));
        };
        let IrType::Scalar(element) = first.ty() else {
            return Err(Error::InvalidValue(format!(
                "vector lane must be a scalar, found {first}"
            )));
        };
        if let Some(odd) = lanes.iter().find(|lane| lane.ty() != IrType::Scalar(element)) {
            return Err(Error::InvalidValue(format!(
                "vector lane {odd} does not match element type {element}"
            )));
        }
        let count = u8::try_from(lanes.len())
            .map_err(|_| Error::InvalidValue(format!("{} lanes is too many", lanes.len())))?;
        Ok(Self::from_lanes(IrType::vector(element, count), lanes))
    }

    /// Rebuilds a constant of type `ty` from lanes known to match it.
    pub(crate) fn from_lanes(ty: IrType, mut lanes: Vec<ConstValue>) -> Self {
        match ty {
            IrType::Vector(..) => {
                if lanes.iter().all(Self::is_null) {
                    Self::Zero(ty)
                } else {
                    Self::Vector(lanes)
                }
            }
            _ => lanes.pop().unwrap_or(Self::Zero(ty)),
        }
    }

    /// Returns the type of this constant.
    #[must_use]
    pub fn ty(&self) -> IrType {
        match self {
            Self::Bool(_) => IrType::BOOL,
            Self::I16(_) => IrType::I16,
            Self::I32(_) => IrType::I32,
            Self::I64(_) => IrType::I64,
            Self::F16(_) => IrType::F16,
            Self::F32(_) => IrType::F32,
            Self::F64(_) => IrType::F64,
            Self::Vector(lanes) => match lanes.first().map(Self::ty) {
                Some(IrType::Scalar(element)) => {
                    IrType::vector(element, u8::try_from(lanes.len()).unwrap_or(u8::MAX))
                }
                _ => IrType::Void,
            },
            Self::Zero(ty) => *ty,
        }
    }

    /// Returns the scalar lanes of this constant; a scalar is its own single lane.
    #[must_use]
    pub fn lanes(&self) -> Vec<ConstValue> {
        match self {
            Self::Vector(lanes) => lanes.clone(),
            Self::Zero(ty) => match ty.scalar() {
                Some(scalar) => vec![Self::scalar_zero(scalar); ty.lanes()],
                None => Vec::new(),
            },
            scalar => vec![scalar.clone()],
        }
    }

    /// Returns `true` if every bit of the constant is zero.
    ///
    /// This is `false` for `-0.0`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match self {
            Self::Bool(v) => !*v,
            Self::I16(v) => *v == 0,
            Self::I32(v) => *v == 0,
            Self::I64(v) => *v == 0,
            Self::F16(v) => v.to_bits() == 0,
            Self::F32(v) => v.to_bits() == 0,
            Self::F64(v) => v.to_bits() == 0,
            Self::Vector(lanes) => lanes.iter().all(Self::is_null),
            Self::Zero(_) => true,
        }
    }

    /// Returns `true` for a scalar floating-point zero of either sign.
    #[must_use]
    pub fn is_fp_zero(&self) -> bool {
        self.fp_class() == Some(FpClass::Zero)
    }

    /// Returns `true` for scalar floating-point constants.
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Self::F16(_) | Self::F32(_) | Self::F64(_))
    }

    /// Classifies a scalar floating-point constant.
    ///
    /// Returns `None` for integers, booleans and vectors; use [`ConstValue::lanes`] for
    /// per-lane classification.
    #[must_use]
    pub fn fp_class(&self) -> Option<FpClass> {
        match self {
            Self::F16(v) => Some(v.classify().into()),
            Self::F32(v) => Some(v.classify().into()),
            Self::F64(v) => Some(v.classify().into()),
            _ => None,
        }
    }

    /// Returns `true` for a scalar float that is finite, non-zero and not normal.
    #[must_use]
    pub fn is_denormal(&self) -> bool {
        self.fp_class() == Some(FpClass::Denormal)
    }

    /// Returns the zero-extended value of an integer or boolean constant.
    #[must_use]
    pub fn zext_value(&self) -> Option<u64> {
        match self {
            Self::Bool(v) => Some(u64::from(*v)),
            Self::I16(v) => Some(u64::from(*v as u16)),
            Self::I32(v) => Some(u64::from(*v as u32)),
            Self::I64(v) => Some(*v as u64),
            _ => None,
        }
    }

    /// Returns the sign-extended value of an integer or boolean constant.
    #[must_use]
    pub fn sext_value(&self) -> Option<i64> {
        match self {
            Self::Bool(v) => Some(if *v { -1 } else { 0 }),
            Self::I16(v) => Some(i64::from(*v)),
            Self::I32(v) => Some(i64::from(*v)),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns a scalar float widened to `f64`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F16(v) => Some(v.to_f64()),
            Self::F32(v) => Some(f64::from(*v)),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    fn fmt_lane(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::F16(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v:?}"),
            Self::F64(v) => write!(f, "{v:?}"),
            Self::Vector(_) | Self::Zero(_) => write!(f, "{self}"),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vector(lanes) => {
                write!(f, "{} <", self.ty())?;
                for (i, lane) in lanes.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{} ", lane.ty())?;
                    lane.fmt_lane(f)?;
                }
                f.write_str(">")
            }
            Self::Zero(ty) => write!(f, "{ty} zeroinitializer"),
            scalar => {
                write!(f, "{} ", scalar.ty())?;
                scalar.fmt_lane(f)
            }
        }
    }
}

/// An instruction operand.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The result of another instruction in the same function.
    Inst(InstId),
    /// A compile-time constant.
    Const(ConstValue),
    /// A function argument, by position.
    Arg(u32),
}

impl Value {
    /// A half-precision constant from raw bits.
    #[must_use]
    pub const fn f16_bits(bits: u16) -> Self {
        Self::Const(ConstValue::F16(Half::from_bits(bits)))
    }

    /// A single-precision constant.
    #[must_use]
    pub const fn f32(value: f32) -> Self {
        Self::Const(ConstValue::F32(value))
    }

    /// A double-precision constant.
    #[must_use]
    pub const fn f64(value: f64) -> Self {
        Self::Const(ConstValue::F64(value))
    }

    /// A 32-bit integer constant.
    #[must_use]
    pub const fn i32(value: i32) -> Self {
        Self::Const(ConstValue::I32(value))
    }

    /// Returns the instruction this value refers to, if any.
    #[must_use]
    pub const fn as_inst(&self) -> Option<InstId> {
        match self {
            Self::Inst(id) => Some(*id),
            _ => None,
        }
    }

    /// Returns the constant, if this value is one.
    #[must_use]
    pub const fn as_const(&self) -> Option<&ConstValue> {
        match self {
            Self::Const(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if this value is a compile-time constant.
    #[must_use]
    pub const fn is_const(&self) -> bool {
        matches!(self, Self::Const(_))
    }
}

impl From<ConstValue> for Value {
    fn from(value: ConstValue) -> Self {
        Self::Const(value)
    }
}

impl From<InstId> for Value {
    fn from(id: InstId) -> Self {
        Self::Inst(id)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inst(id) => write!(f, "{id}"),
            Self::Const(value) => write!(f, "{value}"),
            Self::Arg(index) => write!(f, "%arg{index}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert_eq!(ConstValue::F32(1.0).fp_class(), Some(FpClass::Normal));
        assert_eq!(ConstValue::F32(-0.0).fp_class(), Some(FpClass::Zero));
        assert_eq!(
            ConstValue::F64(f64::MIN_POSITIVE / 2.0).fp_class(),
            Some(FpClass::Denormal)
        );
        assert_eq!(
            ConstValue::F16(Half::from_bits(0x0001)).fp_class(),
            Some(FpClass::Denormal)
        );
        assert_eq!(
            ConstValue::F16(Half::INFINITY).fp_class(),
            Some(FpClass::Infinite)
        );
        assert_eq!(ConstValue::F32(f32::NAN).fp_class(), Some(FpClass::Nan));
        assert_eq!(ConstValue::I32(0).fp_class(), None);
    }

    #[test]
    fn test_vector_canonicalizes_positive_zero() -> Result<()> {
        let zero = ConstValue::vector(vec![ConstValue::F16(Half::ZERO); 4])?;
        assert_eq!(zero, ConstValue::Zero(IrType::vector(ScalarType::F16, 4)));

        let negative = ConstValue::vector(vec![ConstValue::F32(-0.0), ConstValue::F32(0.0)])?;
        assert!(matches!(negative, ConstValue::Vector(_)));
        assert!(!negative.is_null());
        Ok(())
    }

    #[test]
    fn test_vector_rejects_mixed_lanes() {
        assert!(ConstValue::vector(vec![]).is_err());
        assert!(ConstValue::vector(vec![ConstValue::F32(1.0), ConstValue::F64(1.0)]).is_err());
    }

    #[test]
    fn test_zero_lanes_expand() {
        let zero = ConstValue::Zero(IrType::vector(ScalarType::F64, 3));
        assert_eq!(zero.lanes(), vec![ConstValue::F64(0.0); 3]);
        assert_eq!(ConstValue::I32(7).lanes(), vec![ConstValue::I32(7)]);
    }

    #[test]
    fn test_display() {
        assert_eq!(ConstValue::F32(1.5).to_string(), "float 1.5");
        assert_eq!(
            ConstValue::Vector(vec![ConstValue::F32(1.0), ConstValue::F32(0.0)]).to_string(),
            "<2 x float> <float 1.0, float 0.0>"
        );
        assert_eq!(
            ConstValue::Zero(IrType::vector(ScalarType::F32, 2)).to_string(),
            "<2 x float> zeroinitializer"
        );
        assert_eq!(Value::Arg(3).to_string(), "%arg3");
    }

    #[test]
    fn test_integer_extension() {
        assert_eq!(ConstValue::I32(-1).zext_value(), Some(0xFFFF_FFFF));
        assert_eq!(ConstValue::I16(-2).sext_value(), Some(-2));
        assert_eq!(ConstValue::F32(1.0).zext_value(), None);
    }
}
