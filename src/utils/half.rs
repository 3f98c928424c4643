//! IEEE 754 binary16 (half precision) values.
//!
//! Shader code regularly carries 16-bit floats, but Rust has no stable `f16`. [`Half`]
//! stores the raw bit pattern and provides exactly what the lowering passes need:
//! classification, sign-preserving zero flushing, exact widening to `f32`/`f64`, and
//! correctly rounded (round-to-nearest-even) narrowing from `f32`/`f64`.
//!
//! # Arithmetic
//!
//! Half arithmetic is evaluated by widening both operands to `f32`, computing there, and
//! narrowing the result. For `+ - * /` and `sqrt` this is exact: `f32` carries more than
//! `2 * 11 + 2` significand bits, so the double rounding cannot differ from a direct
//! binary16 computation.

use std::{cmp::Ordering, fmt, num::FpCategory};

/// Sign bit of a binary16 pattern.
const SIGN_MASK: u16 = 0x8000;
/// Exponent field of a binary16 pattern.
const EXP_MASK: u16 = 0x7C00;
/// Significand field of a binary16 pattern.
const MANTISSA_MASK: u16 = 0x03FF;
/// 2^-24, the smallest positive binary16 subnormal, as an `f32`.
const MIN_SUBNORMAL_F32: f32 = 5.960_464_5e-8;

/// A half-precision floating-point value stored as its bit pattern.
///
/// Equality is bitwise, so `+0.0 != -0.0` and a NaN equals itself when the payload
/// matches. Use [`Half::to_f32`] for numeric comparison.
///
/// # Examples
///
/// ```rust
/// use shadelower::utils::Half;
///
/// let one = Half::from_bits(0x3C00);
/// assert_eq!(one.to_f32(), 1.0);
///
/// let tiny = Half::from_bits(0x0001);
/// assert!(tiny.is_subnormal());
/// assert_eq!(tiny.flush_to_zero(), Half::ZERO);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Half(u16);

impl Half {
    /// Positive zero.
    pub const ZERO: Self = Self(0);
    /// Negative zero.
    pub const NEG_ZERO: Self = Self(SIGN_MASK);
    /// One.
    pub const ONE: Self = Self(0x3C00);
    /// Positive infinity.
    pub const INFINITY: Self = Self(EXP_MASK);
    /// Negative infinity.
    pub const NEG_INFINITY: Self = Self(SIGN_MASK | EXP_MASK);
    /// Canonical quiet NaN.
    pub const NAN: Self = Self(0x7E00);
    /// Largest finite value (65504).
    pub const MAX: Self = Self(0x7BFF);
    /// Smallest positive normal value (2^-14).
    pub const MIN_POSITIVE: Self = Self(0x0400);

    /// Creates a value from its raw bit pattern.
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Returns the raw bit pattern.
    #[must_use]
    pub const fn to_bits(self) -> u16 {
        self.0
    }

    const fn exponent_bits(self) -> u16 {
        self.0 & EXP_MASK
    }

    const fn mantissa_bits(self) -> u16 {
        self.0 & MANTISSA_MASK
    }

    /// Returns `true` if the sign bit is set (including `-0.0` and negative NaNs).
    #[must_use]
    pub const fn is_sign_negative(self) -> bool {
        self.0 & SIGN_MASK != 0
    }

    /// Returns `true` for `+0.0` and `-0.0`.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 & !SIGN_MASK == 0
    }

    /// Returns `true` for non-zero values below the normal range.
    #[must_use]
    pub const fn is_subnormal(self) -> bool {
        self.exponent_bits() == 0 && self.mantissa_bits() != 0
    }

    /// Returns `true` for either infinity.
    #[must_use]
    pub const fn is_infinite(self) -> bool {
        self.exponent_bits() == EXP_MASK && self.mantissa_bits() == 0
    }

    /// Returns `true` for any NaN.
    #[must_use]
    pub const fn is_nan(self) -> bool {
        self.exponent_bits() == EXP_MASK && self.mantissa_bits() != 0
    }

    /// Returns `true` if the value is neither infinite nor NaN.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.exponent_bits() != EXP_MASK
    }

    /// Returns the floating-point category, mirroring [`f32::classify`].
    #[must_use]
    pub const fn classify(self) -> FpCategory {
        match (self.exponent_bits(), self.mantissa_bits()) {
            (0, 0) => FpCategory::Zero,
            (0, _) => FpCategory::Subnormal,
            (EXP_MASK, 0) => FpCategory::Infinite,
            (EXP_MASK, _) => FpCategory::Nan,
            _ => FpCategory::Normal,
        }
    }

    /// Replaces a subnormal value with a zero of the same sign.
    ///
    /// Every other value is returned unchanged.
    #[must_use]
    pub const fn flush_to_zero(self) -> Self {
        if self.is_subnormal() {
            Self(self.0 & SIGN_MASK)
        } else {
            self
        }
    }

    /// Returns the value with the sign bit flipped.
    #[must_use]
    pub const fn negate(self) -> Self {
        Self(self.0 ^ SIGN_MASK)
    }

    /// Returns the value with the sign bit cleared.
    #[must_use]
    pub const fn abs(self) -> Self {
        Self(self.0 & !SIGN_MASK)
    }

    /// Widens to single precision.
    ///
    /// Every binary16 value is exactly representable in binary32, so the result does not
    /// depend on a rounding mode: round-toward-zero and round-to-nearest agree.
    #[must_use]
    pub fn to_f32(self) -> f32 {
        let sign = u32::from(self.0 & SIGN_MASK) << 16;
        let exponent = u32::from(self.exponent_bits() >> 10);
        let mantissa = u32::from(self.mantissa_bits());

        match exponent {
            0 if mantissa == 0 => f32::from_bits(sign),
            0 => {
                // mantissa * 2^-24 is exact in f32
                let magnitude = mantissa as f32 * MIN_SUBNORMAL_F32;
                if sign == 0 {
                    magnitude
                } else {
                    -magnitude
                }
            }
            0x1F => f32::from_bits(sign | 0x7F80_0000 | (mantissa << 13)),
            _ => f32::from_bits(sign | ((exponent + 112) << 23) | (mantissa << 13)),
        }
    }

    /// Widens to double precision (exact).
    #[must_use]
    pub fn to_f64(self) -> f64 {
        f64::from(self.to_f32())
    }

    /// Narrows a single-precision value with round-to-nearest-even.
    ///
    /// Overflow produces an infinity, underflow produces a correctly rounded subnormal or
    /// a signed zero. NaN payloads keep their top bits and stay quiet.
    #[must_use]
    pub fn from_f32(value: f32) -> Self {
        let bits = value.to_bits();
        let sign = ((bits >> 16) & 0x8000) as u16;
        let exponent = ((bits >> 23) & 0xFF) as i32;
        let mantissa = bits & 0x007F_FFFF;

        if exponent == 0xFF {
            if mantissa == 0 {
                return Self(sign | EXP_MASK);
            }
            return Self(sign | 0x7E00 | (mantissa >> 13) as u16);
        }

        let half_exponent = exponent - 127 + 15;
        if half_exponent >= 0x1F {
            return Self(sign | EXP_MASK);
        }

        if half_exponent <= 0 {
            // Below 2^-25 everything rounds to zero, including the tie at exactly 2^-25
            // handled by the general path below.
            if half_exponent < -10 {
                return Self(sign);
            }
            let significand = mantissa | 0x0080_0000;
            let shift = (14 - half_exponent) as u32;
            let mut half_mantissa = significand >> shift;
            let remainder = significand & ((1 << shift) - 1);
            let halfway = 1 << (shift - 1);
            if remainder > halfway || (remainder == halfway && half_mantissa & 1 == 1) {
                // A carry into bit 10 yields the smallest normal, which is correct.
                half_mantissa += 1;
            }
            return Self(sign | half_mantissa as u16);
        }

        let mut half = ((half_exponent as u32) << 10) | (mantissa >> 13);
        let remainder = mantissa & 0x1FFF;
        if remainder > 0x1000 || (remainder == 0x1000 && half & 1 == 1) {
            // A carry out of the significand bumps the exponent, up to infinity.
            half += 1;
        }
        Self(sign | half as u16)
    }

    /// Narrows a double-precision value with round-to-nearest-even.
    ///
    /// Goes through `f32` only when that step is exact; otherwise rounds from the `f64`
    /// bits directly so no double rounding can occur.
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        let narrowed = value as f32;
        if f64::from(narrowed) == value || value.is_nan() {
            return Self::from_f32(narrowed);
        }

        let bits = value.to_bits();
        let sign = ((bits >> 48) & 0x8000) as u16;
        let exponent = ((bits >> 52) & 0x7FF) as i64;
        let mantissa = bits & 0x000F_FFFF_FFFF_FFFF;

        let half_exponent = exponent - 1023 + 15;
        if half_exponent >= 0x1F {
            return Self(sign | EXP_MASK);
        }
        if half_exponent < -10 {
            return Self(sign);
        }

        let significand = mantissa | 0x0010_0000_0000_0000;
        // Normal results keep 10 explicit bits out of 52, subnormals lose more.
        let shift = if half_exponent <= 0 {
            (43 - half_exponent) as u32
        } else {
            42
        };
        let mut half_significand = significand >> shift;
        let remainder = significand & ((1u64 << shift) - 1);
        let halfway = 1u64 << (shift - 1);
        if remainder > halfway || (remainder == halfway && half_significand & 1 == 1) {
            half_significand += 1;
        }

        if half_exponent <= 0 {
            Self(sign | half_significand as u16)
        } else {
            // half_significand still carries the implicit bit at position 10; adding the
            // biased exponent above it lets a rounding carry ripple into the exponent.
            let combined = ((half_exponent as u64 - 1) << 10) + half_significand;
            if combined >= u64::from(EXP_MASK) {
                Self(sign | EXP_MASK)
            } else {
                Self(sign | combined as u16)
            }
        }
    }
}

impl PartialOrd for Half {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.to_f32().partial_cmp(&other.to_f32())
    }
}

impl fmt::Debug for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}h", self.to_f32())
    }
}

impl fmt::Display for Half {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.to_f32())
    }
}

impl From<Half> for f32 {
    fn from(value: Half) -> Self {
        value.to_f32()
    }
}

impl From<Half> for f64 {
    fn from(value: Half) -> Self {
        value.to_f64()
    }
}
