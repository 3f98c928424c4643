//! Builtin library functions.
//!
//! Lowering refers to library builtins by mangled name (see [`mangle_builtin`]) and
//! calls them through [`emit_call`], which declares the callee on first use.

mod mangle;

pub use mangle::mangle_builtin;

use crate::{
    ir::{Declarations, Function, FunctionAttrs, FunctionDecl, InstId, Instruction, IrType, Op, Value},
    Error, Result,
};

/// Mangled name of `vec2 unpackHalf2x16(int)`.
pub const UNPACK_HALF_2X16: &str = "_Z14unpackHalf2x16i";

/// Base name of the library division used for floating-point `fdiv`.
pub const FDIV: &str = "fdiv";

/// Inserts a call to `name` immediately before `insert_before`.
///
/// The callee is declared with the argument types, `ret` and `attrs` unless a
/// declaration with that name already exists, in which case the existing one is kept.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] if an argument does not resolve in `function` and
/// [`Error::UnknownInstruction`] if `insert_before` is not live.
///
/// # Examples
///
/// ```rust
/// use shadelower::builtins::{emit_call, mangle_builtin};
/// use shadelower::ir::{Declarations, FunctionAttrs, FunctionBuilder, IrType, Value};
///
/// let mut b = FunctionBuilder::new("main", &[IrType::F32], IrType::VOID);
/// let store = b.store_output(0, Value::Arg(0))?;
/// let mut func = b.finish();
/// let mut declarations = Declarations::default();
///
/// let name = mangle_builtin("sqrt", &[IrType::F32]);
/// let call = emit_call(
///     &mut func,
///     &mut declarations,
///     &name,
///     IrType::F32,
///     vec![Value::Arg(0)],
///     FunctionAttrs::PURE,
///     store,
/// )?;
/// assert_eq!(func.instruction_ids(), vec![call, store]);
/// assert!(declarations.is_pure("_Z4sqrtf"));
/// # Ok::<(), shadelower::Error>(())
/// ```
pub fn emit_call(
    function: &mut Function,
    declarations: &mut Declarations,
    name: &str,
    ret: IrType,
    args: Vec<Value>,
    attrs: FunctionAttrs,
    insert_before: InstId,
) -> Result<InstId> {
    let params = args
        .iter()
        .map(|arg| {
            function
                .value_type(arg)
                .ok_or_else(|| Error::InvalidValue(format!("call argument {arg} does not resolve")))
        })
        .collect::<Result<Vec<_>>>()?;

    let call = function.insert_before(
        insert_before,
        Instruction::new(
            Op::Call {
                callee: name.to_string(),
                args,
            },
            ret,
        ),
    )?;
    declarations.get_or_declare(FunctionDecl::new(name, ret, params, attrs));
    Ok(call)
}
