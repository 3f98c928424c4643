//! Algebra transform integration tests.
//!
//! These tests drive the pass through the public API:
//! 1. Build a shader function with `FunctionBuilder`
//! 2. Wrap it in a `Module` of some stage
//! 3. Run `AlgebraTransformPass` directly or through `PassManager`
//! 4. Inspect what the shader output now receives and verify the graph

use shadelower::prelude::*;

/// Relaxed, flush-everything, strict, and mixed per-width policies.
fn policies() -> Vec<FloatControls> {
    vec![
        FloatControls::relaxed(),
        FloatControls::flush_all(),
        FloatControls::strict(),
        FloatControls {
            denorm_flush_to_zero: FloatWidths::BIT16,
            signed_zero_inf_nan_preserve: FloatWidths::BIT64,
        },
    ]
}

fn fragment(function: Function) -> Module {
    let mut module = Module::new("shader", ShaderStage::Fragment);
    module.set_entry_point(function);
    module
}

/// Returns the value written by the store instruction `store`.
fn stored(module: &Module, store: InstId) -> Result<Value> {
    let entry = module.entry()?;
    entry
        .inst(store)
        .and_then(|inst| inst.op().operand(0).cloned())
        .ok_or(Error::UnknownInstruction(store))
}

/// Builds `main(a, b)` storing `op(lhs, rhs)` to output 0.
fn single_op(
    ty: IrType,
    op: BinaryOp,
    lhs: Value,
    rhs: Value,
) -> Result<(Module, InstId, InstId)> {
    let mut b = FunctionBuilder::new("main", &[ty, ty], IrType::VOID);
    let result = b.binary(op, lhs, rhs, FastMathFlags::empty())?;
    let store = b.store_output(0, result.clone())?;
    b.ret(None)?;
    let id = result.as_inst().ok_or(Error::InvalidValue(result.to_string()))?;
    Ok((fragment(b.finish()), id, store))
}

// ── Scenarios ─────────────────────────────────────────────────────────────────

#[test]
fn test_fadd_zero_removed() -> Result<()> {
    let (mut module, r, store) =
        single_op(IrType::F32, BinaryOp::FAdd, Value::Arg(0), Value::f32(0.0))?;

    let pass = AlgebraTransformPass::new(AlgebraOptions::default());
    assert!(pass.run(&mut module, &FloatControls::relaxed()));

    assert_eq!(stored(&module, store)?, Value::Arg(0));
    assert!(!module.entry()?.is_live(r));
    module.verify()
}

#[test]
fn test_fdiv_lowered_to_call() -> Result<()> {
    let (mut module, r, store) =
        single_op(IrType::F32, BinaryOp::FDiv, Value::Arg(0), Value::Arg(1))?;

    let pass = AlgebraTransformPass::new(AlgebraOptions::float_opt_only());
    assert!(pass.run(&mut module, &FloatControls::relaxed()));

    let entry = module.entry()?;
    assert!(!entry.is_live(r));

    let call = stored(&module, store)?
        .as_inst()
        .and_then(|id| entry.inst(id))
        .map(|inst| inst.op().clone());
    assert_eq!(
        call,
        Some(Op::Call {
            callee: "_Z4fdivff".to_string(),
            args: vec![Value::Arg(0), Value::Arg(1)],
        })
    );

    let decl = module
        .declarations
        .get("_Z4fdivff")
        .ok_or(Error::Error("fdiv not declared".to_string()))?;
    assert_eq!(decl.ret, IrType::F32);
    assert_eq!(decl.params, vec![IrType::F32, IrType::F32]);
    assert_eq!(decl.attrs, FunctionAttrs::empty());
    module.verify()
}

#[test]
fn test_vector_fdiv_mangling() -> Result<()> {
    let v4h = IrType::vector(ScalarType::F16, 4);
    let (mut module, _, store) = single_op(v4h, BinaryOp::FDiv, Value::Arg(0), Value::Arg(1))?;

    assert!(AlgebraTransformPass::default().run(&mut module, &FloatControls::strict()));

    let entry = module.entry()?;
    let callee = stored(&module, store)?
        .as_inst()
        .and_then(|id| entry.inst(id))
        .and_then(|inst| inst.op().callee().map(str::to_string));
    assert_eq!(callee.as_deref(), Some("_Z4fdivDv4_DhS_"));
    Ok(())
}

#[test]
fn test_unpack_half_denormal_lane_flushed() -> Result<()> {
    let v2f = IrType::vector(ScalarType::F32, 2);
    let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
    // low half 0x0001 is the smallest binary16 denormal, high half 0x3C00 is 1.0
    let unpacked = b.call("_Z14unpackHalf2x16i", v2f, vec![Value::i32(0x3C00_0001)])?;
    let store = b.store_output(0, unpacked.clone())?;
    b.ret(None)?;

    let mut module = fragment(b.finish());
    module.declarations.declare(FunctionDecl::new(
        "_Z14unpackHalf2x16i",
        v2f,
        vec![IrType::I32],
        FunctionAttrs::PURE,
    ));

    let controls = FloatControls {
        denorm_flush_to_zero: FloatWidths::BIT16,
        ..FloatControls::relaxed()
    };
    let pass = AlgebraTransformPass::new(AlgebraOptions::folding_only());
    assert!(pass.run(&mut module, &controls));

    let lanes = stored(&module, store)?
        .as_const()
        .map(ConstValue::lanes)
        .unwrap_or_default();
    assert_eq!(lanes, vec![ConstValue::F32(0.0), ConstValue::F32(1.0)]);
    assert!(matches!(lanes[0], ConstValue::F32(v) if v.to_bits() == 0));

    let call = unpacked.as_inst().ok_or(Error::InvalidValue(unpacked.to_string()))?;
    assert!(!module.entry()?.is_live(call));
    module.verify()
}

// ── Constant folding ──────────────────────────────────────────────────────────

#[test]
fn test_constant_operators_folded() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
    let sum = b.fadd(Value::f32(1.5), Value::f32(2.25))?;
    let product = b.fmul(sum, Value::f32(2.0))?;
    let store = b.store_output(0, product)?;
    b.ret(None)?;
    let mut module = fragment(b.finish());

    let pass = AlgebraTransformPass::new(AlgebraOptions::folding_only());
    assert!(pass.run(&mut module, &FloatControls::flush_all()));

    assert_eq!(stored(&module, store)?, Value::f32(7.5));
    assert_eq!(module.entry()?.instruction_count(), 2);
    module.verify()
}

#[test]
fn test_folded_denormals_flushed_per_width() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
    let half = b.fmul(Value::f16_bits(0x0400), Value::f16_bits(0x3800))?;
    let single = b.fmul(Value::f32(f32::MIN_POSITIVE), Value::f32(0.25))?;
    let double = b.fmul(Value::f64(f64::MIN_POSITIVE), Value::f64(0.25))?;
    let half_store = b.store_output(0, half)?;
    let single_store = b.store_output(1, single)?;
    let double_store = b.store_output(2, double)?;
    b.ret(None)?;
    let mut module = fragment(b.finish());

    let controls = FloatControls {
        denorm_flush_to_zero: FloatWidths::BIT16 | FloatWidths::BIT32,
        ..FloatControls::relaxed()
    };
    assert!(AlgebraTransformPass::default().run(&mut module, &controls));

    for store in [half_store, single_store] {
        let value = stored(&module, store)?;
        let constant = value.as_const().ok_or(Error::InvalidValue(value.to_string()))?;
        assert!(!constant.is_denormal());
        assert_eq!(constant.as_f64(), Some(0.0));
    }
    assert_eq!(
        stored(&module, double_store)?,
        Value::f64(f64::MIN_POSITIVE * 0.25)
    );
    module.verify()
}

#[test]
fn test_folding_skips_non_entry_functions() -> Result<()> {
    let mut helper = FunctionBuilder::new("helper", &[], IrType::F32);
    let sum = helper.fadd(Value::f32(1.0), Value::f32(1.0))?;
    helper.ret(Some(sum))?;

    let mut b = FunctionBuilder::new("main", &[], IrType::VOID);
    b.ret(None)?;

    let mut module = fragment(b.finish());
    module.add_function(helper.finish());

    let pass = AlgebraTransformPass::new(AlgebraOptions::folding_only());
    assert!(!pass.run(&mut module, &FloatControls::flush_all()));
    assert_eq!(
        module.function("helper").map(Function::instruction_count),
        Some(2)
    );
    Ok(())
}

// ── Identity laws ─────────────────────────────────────────────────────────────

#[test]
fn test_identity_laws_under_relaxed_policy() -> Result<()> {
    let x = Value::Arg(0);
    let zero = Value::f32(0.0);
    let cases = [
        (BinaryOp::FAdd, x.clone(), zero.clone(), x.clone()),
        (BinaryOp::FAdd, zero.clone(), x.clone(), x.clone()),
        (BinaryOp::FMul, x.clone(), zero.clone(), zero.clone()),
        (BinaryOp::FMul, zero.clone(), x.clone(), zero.clone()),
        (BinaryOp::FSub, x.clone(), zero.clone(), x.clone()),
        (BinaryOp::FDiv, zero.clone(), x.clone(), zero.clone()),
    ];

    for (op, lhs, rhs, expected) in cases {
        let (mut module, r, store) = single_op(IrType::F32, op, lhs, rhs)?;
        assert!(AlgebraTransformPass::default().run(&mut module, &FloatControls::relaxed()));
        assert_eq!(stored(&module, store)?, expected, "{op}");
        assert!(!module.entry()?.is_live(r));
        module.verify()?;
    }
    Ok(())
}

#[test]
fn test_negative_zero_operand_is_identity() -> Result<()> {
    let (mut module, _, store) =
        single_op(IrType::F64, BinaryOp::FSub, Value::Arg(0), Value::f64(-0.0))?;
    assert!(AlgebraTransformPass::default().run(&mut module, &FloatControls::relaxed()));
    assert_eq!(stored(&module, store)?, Value::Arg(0));
    Ok(())
}

#[test]
fn test_vector_aggregate_zero_identity() -> Result<()> {
    let v3f = IrType::vector(ScalarType::F32, 3);
    let zero = Value::Const(ConstValue::Zero(v3f));
    let (mut module, _, store) = single_op(v3f, BinaryOp::FMul, Value::Arg(0), zero.clone())?;
    assert!(AlgebraTransformPass::default().run(&mut module, &FloatControls::relaxed()));
    assert_eq!(stored(&module, store)?, zero);
    Ok(())
}

#[test]
fn test_identities_blocked_by_precision_policy() -> Result<()> {
    let blocking = [
        FloatControls::strict(),
        FloatControls::flush_all(),
        FloatControls {
            denorm_flush_to_zero: FloatWidths::empty(),
            signed_zero_inf_nan_preserve: FloatWidths::BIT64,
        },
    ];

    for controls in blocking {
        let (mut module, r, store) =
            single_op(IrType::F32, BinaryOp::FAdd, Value::Arg(0), Value::f32(0.0))?;
        let pass = AlgebraTransformPass::new(AlgebraOptions::float_opt_only());
        assert!(!pass.run(&mut module, &controls));
        assert_eq!(stored(&module, store)?, Value::Inst(r));
    }
    Ok(())
}

#[test]
fn test_zero_over_zero_lowered_not_eliminated() -> Result<()> {
    let (mut module, _, store) =
        single_op(IrType::F32, BinaryOp::FDiv, Value::f32(0.0), Value::f32(-0.0))?;
    let pass = AlgebraTransformPass::new(AlgebraOptions::float_opt_only());
    assert!(pass.run(&mut module, &FloatControls::relaxed()));

    let entry = module.entry()?;
    let callee = stored(&module, store)?
        .as_inst()
        .and_then(|id| entry.inst(id))
        .and_then(|inst| inst.op().callee().map(str::to_string));
    assert_eq!(callee.as_deref(), Some("_Z4fdivff"));
    Ok(())
}

// ── Contract flags ────────────────────────────────────────────────────────────

#[test]
fn test_reassoc_agrees_with_contract() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[IrType::F32, IrType::F32], IrType::VOID);
    let plain = b.fadd_with_flags(Value::Arg(0), Value::Arg(1), FastMathFlags::CONTRACT)?;
    let refusing = b.binary(BinaryOp::FMul, Value::Arg(0), Value::Arg(1), FastMathFlags::NNAN)?;
    let blocked = b.fadd_with_flags(refusing, Value::Arg(1), FastMathFlags::CONTRACT)?;
    let fused = b.binary(
        BinaryOp::FMul,
        Value::Arg(0),
        Value::Arg(1),
        FastMathFlags::CONTRACT,
    )?;
    let kept = b.fadd_with_flags(
        fused,
        Value::Arg(0),
        FastMathFlags::REASSOC | FastMathFlags::CONTRACT | FastMathFlags::NSZ,
    )?;
    for (location, value) in (0u32..).zip([plain.clone(), blocked.clone(), kept.clone()]) {
        b.store_output(location, value)?;
    }
    b.ret(None)?;
    let mut module = fragment(b.finish());

    let pass = AlgebraTransformPass::new(AlgebraOptions::float_opt_only());
    // flag rewrites alone report no change
    assert!(!pass.run(&mut module, &FloatControls::strict()));

    let entry = module.entry()?;
    let flags_of = |value: &Value| {
        value
            .as_inst()
            .and_then(|id| entry.inst(id))
            .and_then(|inst| inst.fast_math_flags())
    };
    assert_eq!(
        flags_of(&plain),
        Some(FastMathFlags::REASSOC | FastMathFlags::CONTRACT)
    );
    assert_eq!(flags_of(&blocked), Some(FastMathFlags::empty()));
    assert_eq!(
        flags_of(&kept),
        Some(FastMathFlags::REASSOC | FastMathFlags::CONTRACT | FastMathFlags::NSZ)
    );

    for (_, inst) in entry.iter_instructions() {
        if let Op::Binary {
            op: BinaryOp::FAdd,
            flags,
            ..
        } = inst.op()
        {
            assert_eq!(
                flags.contains(FastMathFlags::REASSOC),
                flags.contains(FastMathFlags::CONTRACT)
            );
        }
    }
    Ok(())
}

#[test]
fn test_refusal_on_either_side_clears_both_flags() -> Result<()> {
    let mut b = FunctionBuilder::new("main", &[IrType::F32, IrType::F32], IrType::VOID);
    let refusing = b.binary(BinaryOp::FMul, Value::Arg(0), Value::Arg(1), FastMathFlags::NNAN)?;
    let sum = b.fadd_with_flags(
        Value::Arg(0),
        refusing,
        FastMathFlags::REASSOC | FastMathFlags::CONTRACT,
    )?;
    b.store_output(0, sum.clone())?;
    b.ret(None)?;
    let mut module = fragment(b.finish());

    let pass = AlgebraTransformPass::new(AlgebraOptions::float_opt_only());
    assert!(!pass.run(&mut module, &FloatControls::strict()));

    let entry = module.entry()?;
    let flags = sum
        .as_inst()
        .and_then(|id| entry.inst(id))
        .and_then(|inst| inst.fast_math_flags());
    assert_eq!(flags, Some(FastMathFlags::empty()));
    module.verify()
}

// ── Idempotence ───────────────────────────────────────────────────────────────

/// A shader exercising every rewrite: constants, identities, divisions, flags,
/// a dead chain and an unpack call.
fn mixed_shader() -> Result<Module> {
    let v2f = IrType::vector(ScalarType::F32, 2);
    let mut b = FunctionBuilder::new("main", &[IrType::F32, IrType::F32], IrType::VOID);
    let input = b.load_input(0, IrType::F32)?;
    let tiny = b.fmul(Value::f32(f32::MIN_POSITIVE), Value::f32(0.5))?;
    let shifted = b.fadd(input.clone(), Value::f32(0.0))?;
    let ratio = b.fdiv(shifted, Value::Arg(1))?;
    let scaled = b.fadd_with_flags(ratio, tiny, FastMathFlags::CONTRACT)?;
    let dead = b.fsub(input, Value::Arg(0))?;
    b.fneg(dead)?;
    let unpacked = b.call("_Z14unpackHalf2x16i", v2f, vec![Value::i32(0x0001_8001)])?;
    let lane = b.extract_element(unpacked, 1)?;
    let total = b.fadd(scaled, lane)?;
    b.store_output(0, total)?;
    b.ret(None)?;

    let mut module = fragment(b.finish());
    module.declarations.declare(FunctionDecl::new(
        "_Z14unpackHalf2x16i",
        v2f,
        vec![IrType::I32],
        FunctionAttrs::PURE,
    ));

    let mut helper = FunctionBuilder::new("helper", &[IrType::F64], IrType::F64);
    let quotient = helper.fdiv(Value::f64(0.0), Value::Arg(0))?;
    let product = helper.fmul(quotient, Value::Arg(0))?;
    helper.ret(Some(product))?;
    module.add_function(helper.finish());
    Ok(module)
}

#[test]
fn test_second_run_reports_unchanged() -> Result<()> {
    let option_sets = [
        AlgebraOptions::default(),
        AlgebraOptions::folding_only(),
        AlgebraOptions::float_opt_only(),
    ];

    for controls in policies() {
        for options in option_sets {
            let mut module = mixed_shader()?;
            let pass = AlgebraTransformPass::new(options);
            pass.run(&mut module, &controls);
            module.verify()?;
            assert!(
                !pass.run(&mut module, &controls),
                "{options:?} under {controls:?}"
            );
            module.verify()?;
        }
    }
    Ok(())
}

#[test]
fn test_disabled_pass_changes_nothing() -> Result<()> {
    for controls in policies() {
        let mut module = mixed_shader()?;
        let before = module.entry()?.instruction_count();
        let pass = AlgebraTransformPass::new(AlgebraOptions::disabled());
        assert!(!pass.run(&mut module, &controls));
        assert_eq!(module.entry()?.instruction_count(), before);
    }
    Ok(())
}
