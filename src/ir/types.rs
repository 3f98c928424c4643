//! Value types of the shader IR.
//!
//! Shader IR values are scalars or short vectors of scalars. Aggregates other than
//! vectors and pointers never reach the algebra passes, so they are not modelled.

use std::fmt;

/// Width class of a floating-point type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FloatWidth {
    /// IEEE binary16.
    Half,
    /// IEEE binary32.
    Single,
    /// IEEE binary64.
    Double,
}

impl FloatWidth {
    /// Returns the width in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Half => 16,
            Self::Single => 32,
            Self::Double => 64,
        }
    }
}

/// A scalar element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    /// 1-bit boolean.
    Bool,
    /// 16-bit integer.
    I16,
    /// 32-bit integer.
    I32,
    /// 64-bit integer.
    I64,
    /// 16-bit float.
    F16,
    /// 32-bit float.
    F32,
    /// 64-bit float.
    F64,
}

impl ScalarType {
    /// Returns `true` for `F16`, `F32` and `F64`.
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F16 | Self::F32 | Self::F64)
    }

    /// Returns `true` for the integer types (not `Bool`).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(self, Self::I16 | Self::I32 | Self::I64)
    }

    /// Returns the float width class, or `None` for non-float types.
    #[must_use]
    pub const fn float_width(self) -> Option<FloatWidth> {
        match self {
            Self::F16 => Some(FloatWidth::Half),
            Self::F32 => Some(FloatWidth::Single),
            Self::F64 => Some(FloatWidth::Double),
            _ => None,
        }
    }

    /// Returns the size of the type in bits.
    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bool => 1,
            Self::I16 | Self::F16 => 16,
            Self::I32 | Self::F32 => 32,
            Self::I64 | Self::F64 => 64,
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Bool => "i1",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F16 => "half",
            Self::F32 => "float",
            Self::F64 => "double",
        };
        f.write_str(name)
    }
}

/// The type of an IR value.
///
/// # Examples
///
/// ```rust
/// use shadelower::ir::{IrType, ScalarType};
///
/// let v2f = IrType::vector(ScalarType::F32, 2);
/// assert!(v2f.is_fp_or_fp_vector());
/// assert_eq!(v2f.lanes(), 2);
/// assert_eq!(v2f.to_string(), "<2 x float>");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IrType {
    /// No value (stores, returns without value, void calls).
    Void,
    /// A single scalar.
    Scalar(ScalarType),
    /// A fixed-length vector of scalars.
    Vector(ScalarType, u8),
}

impl IrType {
    /// `void`
    pub const VOID: Self = Self::Void;
    /// `i1`
    pub const BOOL: Self = Self::Scalar(ScalarType::Bool);
    /// `i16`
    pub const I16: Self = Self::Scalar(ScalarType::I16);
    /// `i32`
    pub const I32: Self = Self::Scalar(ScalarType::I32);
    /// `i64`
    pub const I64: Self = Self::Scalar(ScalarType::I64);
    /// `half`
    pub const F16: Self = Self::Scalar(ScalarType::F16);
    /// `float`
    pub const F32: Self = Self::Scalar(ScalarType::F32);
    /// `double`
    pub const F64: Self = Self::Scalar(ScalarType::F64);

    /// Creates a vector type.
    #[must_use]
    pub const fn vector(element: ScalarType, lanes: u8) -> Self {
        Self::Vector(element, lanes)
    }

    /// Returns the element type of a scalar or vector.
    #[must_use]
    pub const fn scalar(self) -> Option<ScalarType> {
        match self {
            Self::Void => None,
            Self::Scalar(scalar) | Self::Vector(scalar, _) => Some(scalar),
        }
    }

    /// Returns the lane count: 1 for scalars, 0 for `void`.
    #[must_use]
    pub const fn lanes(self) -> usize {
        match self {
            Self::Void => 0,
            Self::Scalar(_) => 1,
            Self::Vector(_, lanes) => lanes as usize,
        }
    }

    /// Returns `true` for vector types.
    #[must_use]
    pub const fn is_vector(self) -> bool {
        matches!(self, Self::Vector(..))
    }

    /// Returns `true` for float scalars and vectors of floats.
    #[must_use]
    pub const fn is_fp_or_fp_vector(self) -> bool {
        match self.scalar() {
            Some(scalar) => scalar.is_float(),
            None => false,
        }
    }

    /// Returns `true` for integer scalars and vectors of integers.
    #[must_use]
    pub const fn is_int_or_int_vector(self) -> bool {
        match self.scalar() {
            Some(scalar) => scalar.is_integer(),
            None => false,
        }
    }

    /// Returns the float width class of the element type.
    #[must_use]
    pub const fn float_width(self) -> Option<FloatWidth> {
        match self.scalar() {
            Some(scalar) => scalar.float_width(),
            None => None,
        }
    }

    /// Returns the same shape with a different element type.
    #[must_use]
    pub const fn with_scalar(self, element: ScalarType) -> Self {
        match self {
            Self::Void => Self::Void,
            Self::Scalar(_) => Self::Scalar(element),
            Self::Vector(_, lanes) => Self::Vector(element, lanes),
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Void => f.write_str("void"),
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Vector(scalar, lanes) => write!(f, "<{lanes} x {scalar}>"),
        }
    }
}

impl From<ScalarType> for IrType {
    fn from(scalar: ScalarType) -> Self {
        Self::Scalar(scalar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_classification() {
        assert!(IrType::F16.is_fp_or_fp_vector());
        assert!(IrType::vector(ScalarType::F64, 4).is_fp_or_fp_vector());
        assert!(!IrType::I32.is_fp_or_fp_vector());
        assert!(!IrType::VOID.is_fp_or_fp_vector());
        assert_eq!(
            IrType::vector(ScalarType::F16, 2).float_width(),
            Some(FloatWidth::Half)
        );
        assert_eq!(IrType::I64.float_width(), None);
    }

    #[test]
    fn test_with_scalar_keeps_shape() {
        let v3i = IrType::vector(ScalarType::I32, 3);
        assert_eq!(
            v3i.with_scalar(ScalarType::F32),
            IrType::vector(ScalarType::F32, 3)
        );
        assert_eq!(IrType::I32.with_scalar(ScalarType::F64), IrType::F64);
    }
}
