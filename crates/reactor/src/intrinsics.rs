//! Intrinsics with a platform-native x86 SSE4.1 lowering and a portable
//! fallback composed of primitive SSA (spec §4.4). Selection between the
//! two lowerings happens in `reactor-jit` at backend-init time via CPUID
//! (spec §9 design note); this crate only records *which* intrinsic was
//! requested; it never picks the lowering itself.

use crate::builder::Builder;
use crate::ir::{Op, Type, ValueId};
use crate::value::{Float4, Int4, RValue};
use smallvec::smallvec;

fn unary(b: &mut Builder, name: &'static str, ty: Type, v: ValueId) -> ValueId {
    b.emit(ty, Op::Intrinsic(name, smallvec![v]))
}

fn binary(b: &mut Builder, name: &'static str, ty: Type, a: ValueId, c: ValueId) -> ValueId {
    b.emit(ty, Op::Intrinsic(name, smallvec![a, c]))
}

pub fn add_sat_int4(b: &mut Builder, a: RValue<Int4>, c: RValue<Int4>) -> RValue<Int4> {
    RValue::from_id(binary(b, "add_sat", Type::Int4, a.id, c.id))
}

pub fn sub_sat_int4(b: &mut Builder, a: RValue<Int4>, c: RValue<Int4>) -> RValue<Int4> {
    RValue::from_id(binary(b, "sub_sat", Type::Int4, a.id, c.id))
}

pub fn pack_signed(b: &mut Builder, a: RValue<Int4>, c: RValue<Int4>) -> ValueId {
    binary(b, "pack_signed", Type::Short8, a.id, c.id)
}

pub fn pack_unsigned(b: &mut Builder, a: RValue<Int4>, c: RValue<Int4>) -> ValueId {
    binary(b, "pack_unsigned", Type::UShort8, a.id, c.id)
}

pub fn min_float4(b: &mut Builder, a: RValue<Float4>, c: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(binary(b, "min", Type::Float4, a.id, c.id))
}

pub fn max_float4(b: &mut Builder, a: RValue<Float4>, c: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(binary(b, "max", Type::Float4, a.id, c.id))
}

pub fn round_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    // Ties-to-even ("banker's rounding", spec boundary scenario 6):
    // `RoundInt(Float(2.5)) == 2`. Named distinctly from `floor`/`ceil` so
    // the backend can lower it to `roundps` with the round-to-nearest-even
    // mode rather than composing it from truncation.
    RValue::from_id(unary(b, "round_nearest_even", Type::Float4, v.id))
}

pub fn floor_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "floor", Type::Float4, v.id))
}

pub fn ceil_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "ceil", Type::Float4, v.id))
}

pub fn trunc_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "trunc", Type::Float4, v.id))
}

pub fn reciprocal_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "rcp", Type::Float4, v.id))
}

pub fn rsqrt_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "rsqrt", Type::Float4, v.id))
}

pub fn sqrt_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "sqrt", Type::Float4, v.id))
}

pub fn sin_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "sin", Type::Float4, v.id))
}

pub fn cos_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "cos", Type::Float4, v.id))
}

pub fn exp_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "exp", Type::Float4, v.id))
}

pub fn exp2_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "exp2", Type::Float4, v.id))
}

pub fn log_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "log", Type::Float4, v.id))
}

pub fn log2_float4(b: &mut Builder, v: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(unary(b, "log2", Type::Float4, v.id))
}

pub fn mul_high_int4(b: &mut Builder, a: RValue<Int4>, c: RValue<Int4>) -> RValue<Int4> {
    RValue::from_id(binary(b, "mulhi", Type::Int4, a.id, c.id))
}

pub fn mul_add_float4(b: &mut Builder, a: RValue<Float4>, c: RValue<Float4>, d: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(b.emit(Type::Float4, Op::Intrinsic("fmadd", smallvec![a.id, c.id, d.id])))
}

/// Dot product over the first `n` lanes, replicated across all four output
/// lanes (the shader IR's `Dp2`/`Dp3`/`Dp4` opcodes write the same scalar
/// to every component named by the destination write-mask, matching the
/// source ISA's dot-product instructions).
fn dot(b: &mut Builder, name: &'static str, a: RValue<Float4>, c: RValue<Float4>) -> RValue<Float4> {
    RValue::from_id(binary(b, name, Type::Float4, a.id, c.id))
}

pub fn dot2_float4(b: &mut Builder, a: RValue<Float4>, c: RValue<Float4>) -> RValue<Float4> {
    dot(b, "dot2", a, c)
}

pub fn dot3_float4(b: &mut Builder, a: RValue<Float4>, c: RValue<Float4>) -> RValue<Float4> {
    dot(b, "dot3", a, c)
}

pub fn dot4_float4(b: &mut Builder, a: RValue<Float4>, c: RValue<Float4>) -> RValue<Float4> {
    dot(b, "dot4", a, c)
}

pub fn sign_mask_float4(b: &mut Builder, v: RValue<Float4>) -> ValueId {
    unary(b, "movemask", Type::Int, v.id)
}

pub fn bit_cast(b: &mut Builder, v: ValueId, to: Type) -> ValueId {
    b.emit(to, Op::BitCast(v, to))
}

pub fn shift_left_int4_by_scalar(b: &mut Builder, v: RValue<Int4>, count: ValueId) -> RValue<Int4> {
    RValue::from_id(binary(b, "shl_scalar", Type::Int4, v.id, count))
}

pub fn shift_right_int4_by_scalar(b: &mut Builder, v: RValue<Int4>, count: ValueId) -> RValue<Int4> {
    RValue::from_id(binary(b, "shr_scalar", Type::Int4, v.id, count))
}

/// The names a backend must recognize (`reactor-jit`'s optimizer and
/// lowering stage match against this list rather than hard-coding them
/// again); kept here so the two crates cannot drift out of sync.
pub const INTRINSIC_NAMES: &[&str] = &[
    "add_sat",
    "sub_sat",
    "pack_signed",
    "pack_unsigned",
    "min",
    "max",
    "round_nearest_even",
    "floor",
    "ceil",
    "trunc",
    "rcp",
    "rsqrt",
    "sqrt",
    "mulhi",
    "fmadd",
    "movemask",
    "shl_scalar",
    "shr_scalar",
    "blend_mask",
    "splat",
    "vec4",
    "f2i",
    "i2f",
    "dot2",
    "dot3",
    "dot4",
    "sin",
    "cos",
    "exp",
    "exp2",
    "log",
    "log2",
];
