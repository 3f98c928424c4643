//! Instruction graph integration tests.
//!
//! These tests cover the collaborators the algebra transform relies on:
//! construction and verification, use-list maintenance, generic constant folding
//! and builtin mangling.

use shadelower::{
    builtins::{emit_call, mangle_builtin},
    ir::ConstFolder,
    prelude::*,
    utils::Half,
};

#[test]
fn test_builder_rejects_mismatched_operands() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[IrType::F32, IrType::F64], IrType::F32);
    assert!(matches!(
        b.fadd(Value::Arg(0), Value::Arg(1)),
        Err(Error::TypeMismatch { .. })
    ));
    assert!(b.fadd(Value::Arg(0), Value::Arg(7)).is_err());
    assert!(matches!(
        b.ret(Some(Value::Arg(1))),
        Err(Error::TypeMismatch { .. })
    ));
    b.ret(Some(Value::Arg(0)))?;
    b.finish().verify()
}

#[test]
fn test_rauw_and_erase_keep_uses_consistent() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[IrType::F32], IrType::VOID);
    let first = b.fmul(Value::Arg(0), Value::f32(2.0))?;
    let second = b.fadd(first.clone(), first.clone())?;
    b.store_output(0, second)?;
    let mut func = b.finish();

    let first = first.as_inst().ok_or(Error::InvalidValue(first.to_string()))?;
    assert_eq!(func.users(first).len(), 2);

    func.replace_all_uses_with(first, &Value::Arg(0));
    assert!(!func.has_uses(first));
    func.erase(first)?;
    func.compact();
    assert_eq!(func.instruction_count(), 2);
    func.verify()
}

#[test]
fn test_erase_refuses_used_instruction() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[IrType::F32], IrType::VOID);
    let value = b.fneg(Value::Arg(0))?;
    b.store_output(0, value.clone())?;
    let mut func = b.finish();

    let id = value.as_inst().ok_or(Error::InvalidValue(value.to_string()))?;
    assert!(matches!(func.erase(id), Err(Error::Malformed { .. })));
    Ok(())
}

#[test]
fn test_const_folder_library_calls() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
    let root = b.call("llvm.sqrt.f32", IrType::F32, vec![Value::f32(16.0)])?;
    let low = b.call(
        "llvm.minnum.f64",
        IrType::F64,
        vec![Value::f64(-1.5), Value::f64(2.0)],
    )?;
    let unknown = b.call("_Z3foof", IrType::F32, vec![Value::f32(1.0)])?;
    let func = b.finish();

    let fold = |value: &Value| value.as_inst().and_then(|id| ConstFolder::fold(&func, id));
    assert_eq!(fold(&root), Some(ConstValue::F32(4.0)));
    assert_eq!(fold(&low), Some(ConstValue::F64(-1.5)));
    assert_eq!(fold(&unknown), None);
    Ok(())
}

#[test]
fn test_const_folder_half_and_casts() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
    let sum = b.fadd(Value::f16_bits(Half::ONE.to_bits()), Value::f16_bits(0x4000))?;
    let widened = b.cast(CastOp::FPExt, Value::f16_bits(0x3800), IrType::F64)?;
    let too_big = b.cast(CastOp::FPToSI, Value::f32(1.0e10), IrType::I16)?;
    let func = b.finish();

    let fold = |value: &Value| value.as_inst().and_then(|id| ConstFolder::fold(&func, id));
    // 1.0 + 2.0 = 3.0 (0x4200)
    assert_eq!(fold(&sum), Some(ConstValue::F16(Half::from_bits(0x4200))));
    assert_eq!(fold(&widened), Some(ConstValue::F64(0.5)));
    assert_eq!(fold(&too_big), None);
    Ok(())
}

#[test]
fn test_emit_call_declares_once() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[IrType::F32], IrType::VOID);
    let ret = b.ret(None)?;
    let mut func = b.finish();
    let mut declarations = Declarations::default();

    let name = mangle_builtin("fdiv", &[IrType::F32, IrType::F32]);
    for _ in 0..2 {
        emit_call(
            &mut func,
            &mut declarations,
            &name,
            IrType::F32,
            vec![Value::Arg(0), Value::f32(2.0)],
            FunctionAttrs::empty(),
            ret,
        )?;
    }
    assert_eq!(declarations.len(), 1);
    assert_eq!(func.instruction_count(), 3);
    // calls to callees not declared pure are never dead
    assert!(func
        .instruction_ids()
        .iter()
        .all(|&id| !func.is_trivially_dead(id, &declarations)));
    func.verify()
}

#[test]
fn test_mangling() {
    let v2f = IrType::vector(ScalarType::F32, 2);
    assert_eq!(mangle_builtin("unpackHalf2x16", &[IrType::I32]), "_Z14unpackHalf2x16i");
    assert_eq!(mangle_builtin("fdiv", &[IrType::F64, IrType::F64]), "_Z4fdivdd");
    assert_eq!(mangle_builtin("fdiv", &[v2f, v2f]), "_Z4fdivDv2_fS_");
    assert_eq!(mangle_builtin("barrier", &[]), "_Z7barrierv");
}
