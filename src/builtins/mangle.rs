//! Itanium-style mangling of builtin library names.
//!
//! Library builtins are overloaded on their argument types, so calls refer to them by
//! mangled symbol. Only the subset of the Itanium C++ ABI that shader builtins need is
//! implemented: free functions in the global namespace taking scalars and vectors.
//!
//! | IR type | Encoding |
//! |---|---|
//! | `void` | `v` |
//! | `i1` | `b` |
//! | `i16` | `s` |
//! | `i32` | `i` |
//! | `i64` | `l` |
//! | `half` | `Dh` |
//! | `float` | `f` |
//! | `double` | `d` |
//! | `<N x T>` | `Dv<N>_<T>` |
//!
//! Vector types are substitution candidates: the second and later occurrences of the
//! same vector type encode as `S_`, `S0_`, `S1_`, ... in order of first appearance.

use std::fmt::Write;

use crate::ir::{IrType, ScalarType};

fn scalar_code(scalar: ScalarType) -> &'static str {
    match scalar {
        ScalarType::Bool => "b",
        ScalarType::I16 => "s",
        ScalarType::I32 => "i",
        ScalarType::I64 => "l",
        ScalarType::F16 => "Dh",
        ScalarType::F32 => "f",
        ScalarType::F64 => "d",
    }
}

/// Encodes a substitution index as `S_`, `S0_`, ..., `S9_`, `SA_`, ... `SZ_`, `S10_`.
fn substitution(index: usize, out: &mut String) {
    out.push('S');
    if index > 0 {
        let mut seq = index - 1;
        let mut digits = Vec::new();
        loop {
            let digit = u8::try_from(seq % 36).unwrap_or(0);
            digits.push(if digit < 10 {
                char::from(b'0' + digit)
            } else {
                char::from(b'A' + digit - 10)
            });
            seq /= 36;
            if seq == 0 {
                break;
            }
        }
        out.extend(digits.iter().rev());
    }
    out.push('_');
}

/// Mangles a builtin name for the given parameter types.
///
/// # Examples
///
/// ```rust
/// use shadelower::builtins::mangle_builtin;
/// use shadelower::ir::{IrType, ScalarType};
///
/// assert_eq!(mangle_builtin("fdiv", &[IrType::F32, IrType::F32]), "_Z4fdivff");
/// assert_eq!(mangle_builtin("unpackHalf2x16", &[IrType::I32]), "_Z14unpackHalf2x16i");
///
/// let v4h = IrType::vector(ScalarType::F16, 4);
/// assert_eq!(mangle_builtin("fdiv", &[v4h, v4h]), "_Z4fdivDv4_DhS_");
/// ```
#[must_use]
pub fn mangle_builtin(name: &str, params: &[IrType]) -> String {
    let mut mangled = format!("_Z{}{name}", name.len());
    if params.is_empty() {
        mangled.push('v');
        return mangled;
    }

    let mut candidates: Vec<IrType> = Vec::new();
    for param in params {
        match *param {
            IrType::Void => mangled.push('v'),
            IrType::Scalar(scalar) => mangled.push_str(scalar_code(scalar)),
            IrType::Vector(element, lanes) => {
                if let Some(index) = candidates.iter().position(|seen| seen == param) {
                    substitution(index, &mut mangled);
                } else {
                    let _ = write!(mangled, "Dv{lanes}_{}", scalar_code(element));
                    candidates.push(*param);
                }
            }
        }
    }
    mangled
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalars() {
        assert_eq!(mangle_builtin("fdiv", &[IrType::F32, IrType::F32]), "_Z4fdivff");
        assert_eq!(mangle_builtin("fdiv", &[IrType::F64, IrType::F64]), "_Z4fdivdd");
        assert_eq!(mangle_builtin("fdiv", &[IrType::F16, IrType::F16]), "_Z4fdivDhDh");
        assert_eq!(mangle_builtin("unpackHalf2x16", &[IrType::I32]), "_Z14unpackHalf2x16i");
        assert_eq!(mangle_builtin("barrier", &[]), "_Z7barrierv");
    }

    #[test]
    fn test_vector_substitutions() {
        let v2f = IrType::vector(ScalarType::F32, 2);
        let v3f = IrType::vector(ScalarType::F32, 3);
        assert_eq!(mangle_builtin("fdiv", &[v2f, v2f]), "_Z4fdivDv2_fS_");
        assert_eq!(
            mangle_builtin("mix", &[v2f, v3f, v3f, v2f]),
            "_Z3mixDv2_fDv3_fS0_S_"
        );
        assert_eq!(
            mangle_builtin("ldexp", &[v2f, IrType::vector(ScalarType::I32, 2)]),
            "_Z5ldexpDv2_fDv2_i"
        );
    }

    #[test]
    fn test_substitution_sequence() {
        let encode = |index| {
            let mut out = String::new();
            substitution(index, &mut out);
            out
        };
        assert_eq!(encode(0), "S_");
        assert_eq!(encode(1), "S0_");
        assert_eq!(encode(10), "S9_");
        assert_eq!(encode(11), "SA_");
        assert_eq!(encode(36), "SZ_");
        assert_eq!(encode(37), "S10_");
    }
}
