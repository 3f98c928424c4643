//! Fast-math flags attached to floating-point operations.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    /// Relaxations a floating-point operation permits.
    ///
    /// An empty set means strict IEEE 754 semantics.
    pub struct FastMathFlags: u8 {
        /// Allow reassociation of the operation with its neighbours
        const REASSOC = 0x01;
        /// Assume no NaN operands or results
        const NNAN = 0x02;
        /// Assume no infinite operands or results
        const NINF = 0x04;
        /// Ignore the sign of zero
        const NSZ = 0x08;
        /// Allow replacing division with multiplication by a reciprocal
        const ARCP = 0x10;
        /// Allow fusing with a neighbouring operation (multiply-add contraction)
        const CONTRACT = 0x20;
        /// Allow approximate math functions
        const AFN = 0x40;
        /// Every relaxation
        const FAST = Self::REASSOC.bits()
            | Self::NNAN.bits()
            | Self::NINF.bits()
            | Self::NSZ.bits()
            | Self::ARCP.bits()
            | Self::CONTRACT.bits()
            | Self::AFN.bits();
    }
}

impl FastMathFlags {
    /// Returns `true` if contraction is permitted.
    #[must_use]
    pub const fn allow_contract(self) -> bool {
        self.contains(Self::CONTRACT)
    }

    /// Returns `true` if reassociation is permitted.
    #[must_use]
    pub const fn allow_reassoc(self) -> bool {
        self.contains(Self::REASSOC)
    }
}

impl fmt::Display for FastMathFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.contains(Self::FAST) {
            return f.write_str("fast");
        }
        let names = [
            (Self::REASSOC, "reassoc"),
            (Self::NNAN, "nnan"),
            (Self::NINF, "ninf"),
            (Self::NSZ, "nsz"),
            (Self::ARCP, "arcp"),
            (Self::CONTRACT, "contract"),
            (Self::AFN, "afn"),
        ];
        let mut first = true;
        for (flag, name) in names {
            if self.contains(flag) {
                if !first {
                    f.write_str(" ")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(FastMathFlags::FAST.to_string(), "fast");
        assert_eq!(
            (FastMathFlags::REASSOC | FastMathFlags::CONTRACT).to_string(),
            "reassoc contract"
        );
        assert_eq!(FastMathFlags::empty().to_string(), "");
    }
}
