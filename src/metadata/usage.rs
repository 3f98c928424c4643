//! Per-stage resource usage and floating-point controls.
//!
//! Earlier lowering stages fill in a [`ResourceUsage`] for each shader stage while
//! reading the module's execution modes. The algebra passes only ever read it; the
//! part they care about is [`FloatControls`], the precision policy the shader
//! requested.

use bitflags::bitflags;

use crate::ir::{FloatWidth, IrType};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// A set of floating-point widths.
    pub struct FloatWidths: u8 {
        /// binary16
        const BIT16 = 0x02;
        /// binary32
        const BIT32 = 0x04;
        /// binary64
        const BIT64 = 0x08;
    }
}

impl FloatWidths {
    /// Returns the set bit for a single width.
    #[must_use]
    pub const fn of(width: FloatWidth) -> Self {
        match width {
            FloatWidth::Half => Self::BIT16,
            FloatWidth::Single => Self::BIT32,
            FloatWidth::Double => Self::BIT64,
        }
    }

    /// Returns `true` if the set covers the element width of a float type.
    ///
    /// Always `false` for non-float types.
    #[must_use]
    pub fn covers(self, ty: IrType) -> bool {
        ty.float_width()
            .is_some_and(|width| self.contains(Self::of(width)))
    }
}

/// The precision control policy a shader requested.
///
/// # Presets
///
/// - [`FloatControls::relaxed`]: no flushing, no preservation; algebraic identities
///   may be applied freely
/// - [`FloatControls::flush_all`]: flush denormals of every width to zero
/// - [`FloatControls::strict`]: preserve signed zero, infinities and NaN at every width
///
/// # Examples
///
/// ```rust
/// use shadelower::metadata::{FloatControls, FloatWidths};
///
/// let controls = FloatControls {
///     denorm_flush_to_zero: FloatWidths::BIT16,
///     ..FloatControls::relaxed()
/// };
/// assert!(controls.requires_flush());
/// assert!(!controls.preserves_signed_zero_inf_nan());
/// assert!(!controls.allows_identity_elimination());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FloatControls {
    /// Widths whose denormal results must be flushed to zero.
    pub denorm_flush_to_zero: FloatWidths,
    /// Widths for which signed zero, infinities and NaN must be preserved exactly.
    pub signed_zero_inf_nan_preserve: FloatWidths,
}

impl FloatControls {
    /// No flushing and no preservation requirements.
    #[must_use]
    pub const fn relaxed() -> Self {
        Self {
            denorm_flush_to_zero: FloatWidths::empty(),
            signed_zero_inf_nan_preserve: FloatWidths::empty(),
        }
    }

    /// Flush denormals of every width to zero.
    #[must_use]
    pub const fn flush_all() -> Self {
        Self {
            denorm_flush_to_zero: FloatWidths::all(),
            signed_zero_inf_nan_preserve: FloatWidths::empty(),
        }
    }

    /// Preserve signed zero, infinities and NaN at every width.
    #[must_use]
    pub const fn strict() -> Self {
        Self {
            denorm_flush_to_zero: FloatWidths::empty(),
            signed_zero_inf_nan_preserve: FloatWidths::all(),
        }
    }

    /// Returns `true` if denormals of `width` must be flushed.
    #[must_use]
    pub const fn flushes(&self, width: FloatWidth) -> bool {
        self.denorm_flush_to_zero.contains(FloatWidths::of(width))
    }

    /// Returns `true` if any width requires denormal flushing.
    #[must_use]
    pub const fn requires_flush(&self) -> bool {
        !self.denorm_flush_to_zero.is_empty()
    }

    /// Returns `true` if any width requires signed zero, infinities and NaN to be kept.
    #[must_use]
    pub const fn preserves_signed_zero_inf_nan(&self) -> bool {
        !self.signed_zero_inf_nan_preserve.is_empty()
    }

    /// Returns `true` if zero-identity rewrites are sound under this policy.
    ///
    /// `x + 0.0 -> x` changes the result for `x = -0.0`, and `0.0 * x -> 0.0` changes
    /// it for infinite or NaN `x`, so both kinds of requirement rule it out.
    #[must_use]
    pub const fn allows_identity_elimination(&self) -> bool {
        !self.requires_flush() && !self.preserves_signed_zero_inf_nan()
    }
}

/// Resource usage recorded for one shader stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceUsage {
    /// Floating-point execution controls.
    pub float_controls: FloatControls,
}

impl ResourceUsage {
    /// Creates a usage record with the given float controls.
    #[must_use]
    pub const fn with_float_controls(float_controls: FloatControls) -> Self {
        Self { float_controls }
    }
}
