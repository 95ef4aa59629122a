//! Pixel routine (spec §4.6): for every pixel the outline table of a
//! `Primitive` covers, evaluates `z` and every varying at the pixel center
//! via the plane equations `setup.rs` wrote, runs the fragment shader IR,
//! and applies alpha test, two-sided stencil test/write, depth test/write,
//! and blending before storing the resolved color.
//!
//! Dispatch walks the scanline range in 2x2 quads (GLOSSARY's "Quad"),
//! pairing rows and columns two at a time with a runtime per-lane coverage
//! check, and falls back to a single-pixel tail loop for a trailing odd
//! row or column.
//!
//! Matches spec §6's `pixel(primitive*, scanline_range, framebuffer*)`,
//! with `scanline_range` flattened to two `Int` parameters the same way
//! `vertex.rs` flattens its own composite ABI arguments. The fragment
//! shader's uniforms need a source the three named parameters don't
//! provide for, so a `constants*` pointer is appended as a fourth
//! parameter, mirroring the one `vertex.rs` already takes.
//!
//! Color/depth/stencil attachments are addressed through a small fixed
//! `framebuffer` descriptor (a pointer to base address + row stride per
//! plane) rather than a raw pixel pointer, so this crate never has to
//! agree with `sw-raster` on an actual allocator — only this one header
//! shape (spec §4.6/§4.7's stated dependency direction, C6 before C7).
//! The color attachment this routine writes is `Float4`-per-pixel, not the
//! `BGRA8` visual format `sw-raster`'s committed framebuffer uses; the
//! driver resolves one into the other at commit time, the same way a
//! desktop GL implementation renders to a linear/float backing store and
//! converts only when presenting.

use crate::interpret::interpret;
use crate::regfile::RegisterFile;
use crate::setup::PrimitiveLayout;
use crate::state::{BlendEquation, BlendFactor, BlendState, CompareFunc, StencilFace, StencilOp, StencilState};
use reactor::builder::Builder;
use reactor::composite;
use reactor::control;
use reactor::ir::{Function, Module, Op, Terminator, Type};
use reactor::lvalue::{LValueTable, Variable};
use reactor::pointer::{BytePointer, Pointer};
use reactor::value::{self, ops, Bool, Float, Float4, Int, Long, RValue, ReactorType};
use sw_shader_ir::Program;

pub const PIXEL_ROUTINE_NAME: &str = "pixel";

/// Byte offsets into the small fixed header the rasterizer driver fills in
/// once per draw describing where the live attachments are.
pub mod framebuffer {
    pub const COLOR_PTR_OFFSET: i64 = 0;
    pub const COLOR_STRIDE_OFFSET: i64 = 8;
    pub const DEPTH_PTR_OFFSET: i64 = 12;
    pub const DEPTH_STRIDE_OFFSET: i64 = 20;
    pub const STENCIL_PTR_OFFSET: i64 = 24;
    pub const STENCIL_STRIDE_OFFSET: i64 = 32;
    pub const SIZE: i64 = 36;
}

/// GL ES 2.0's fixed-function alpha test, folded into this routine rather
/// than a separate stage since it is baked GL state like everything else
/// the specializer bakes (spec §4.6's "pipeline specializer bakes GL state
/// into the generated routine").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlphaTest {
    pub func: CompareFunc,
    pub reference: f32,
}

static BYTE: Type = Type::Byte;

fn byte_ptr_type() -> Type {
    Type::Pointer(&BYTE)
}

fn int_const(b: &mut Builder, v: i64) -> RValue<Int> {
    value::constant_int(b, v)
}

fn select<T: ReactorType>(b: &mut Builder, cond: RValue<Bool>, a: RValue<T>, c: RValue<T>) -> RValue<T> {
    RValue::from_id(b.emit(T::TYPE, Op::Select(cond.id, a.id, c.id)))
}

fn and_bool(b: &mut Builder, x: RValue<Bool>, y: RValue<Bool>) -> RValue<Bool> {
    let f = value::constant_bool(b, false);
    select(b, x, y, f)
}

fn min_int(b: &mut Builder, a: RValue<Int>, c: RValue<Int>) -> RValue<Int> {
    let lt = ops::cmp_lt_int(b, a, c);
    select(b, lt, a, c)
}

fn max_int(b: &mut Builder, a: RValue<Int>, c: RValue<Int>) -> RValue<Int> {
    let lt = ops::cmp_lt_int(b, a, c);
    select(b, lt, c, a)
}

fn long_nonzero(b: &mut Builder, v: RValue<Long>) -> RValue<Bool> {
    let zero = value::constant_long(b, 0);
    RValue::from_id(b.emit(Type::Bool, Op::CmpNe(v.id, zero.id)))
}

fn compare_int(b: &mut Builder, func: CompareFunc, lhs: RValue<Int>, rhs: RValue<Int>) -> RValue<Bool> {
    match func {
        CompareFunc::Never => value::constant_bool(b, false),
        CompareFunc::Less => ops::cmp_lt_int(b, lhs, rhs),
        CompareFunc::Equal => ops::cmp_eq_int(b, lhs, rhs),
        CompareFunc::LessEqual => ops::cmp_le_int(b, lhs, rhs),
        CompareFunc::Greater => ops::cmp_lt_int(b, rhs, lhs),
        CompareFunc::NotEqual => {
            let eq = ops::cmp_eq_int(b, lhs, rhs);
            ops::not_bool(b, eq)
        }
        CompareFunc::GreaterEqual => {
            let lt = ops::cmp_lt_int(b, lhs, rhs);
            ops::not_bool(b, lt)
        }
        CompareFunc::Always => value::constant_bool(b, true),
    }
}

fn compare_float(b: &mut Builder, func: CompareFunc, lhs: RValue<Float>, rhs: RValue<Float>) -> RValue<Bool> {
    match func {
        CompareFunc::Never => value::constant_bool(b, false),
        CompareFunc::Less => ops::cmp_lt_float(b, lhs, rhs),
        CompareFunc::LessEqual => ops::cmp_le_float(b, lhs, rhs),
        CompareFunc::Greater => ops::cmp_lt_float(b, rhs, lhs),
        CompareFunc::GreaterEqual => {
            let lt = ops::cmp_lt_float(b, lhs, rhs);
            ops::not_bool(b, lt)
        }
        CompareFunc::Equal => {
            let le1 = ops::cmp_le_float(b, lhs, rhs);
            let le2 = ops::cmp_le_float(b, rhs, lhs);
            and_bool(b, le1, le2)
        }
        CompareFunc::NotEqual => {
            let le1 = ops::cmp_le_float(b, lhs, rhs);
            let le2 = ops::cmp_le_float(b, rhs, lhs);
            let eq = and_bool(b, le1, le2);
            ops::not_bool(b, eq)
        }
        CompareFunc::Always => value::constant_bool(b, true),
    }
}

/// Applies one two-sided-stencil op to the current value, then folds the
/// result through `write_mask` so only the named bits of the stencil
/// buffer actually change (spec's `StencilFace::write_mask`, mirroring
/// `glStencilMaskSeparate`).
fn apply_stencil_op(b: &mut Builder, op: StencilOp, current: RValue<Int>, reference: RValue<Int>, write_mask: u8) -> RValue<Int> {
    let one = int_const(b, 1);
    let raw = match op {
        StencilOp::Keep => current,
        StencilOp::Zero => int_const(b, 0),
        StencilOp::Replace => reference,
        StencilOp::IncrementClamp => {
            let sum = ops::add_int(b, current, one);
            min_int(b, sum, int_const(b, 0xFF))
        }
        StencilOp::DecrementClamp => {
            let diff = ops::sub_int(b, current, one);
            max_int(b, diff, int_const(b, 0))
        }
        StencilOp::Invert => {
            let mask = int_const(b, 0xFF);
            RValue::from_id(b.emit(Type::Int, Op::Xor(current.id, mask.id)))
        }
        StencilOp::IncrementWrap => {
            let sum = ops::add_int(b, current, one);
            ops::bitwise_and_int(b, sum, int_const(b, 0xFF))
        }
        StencilOp::DecrementWrap => {
            let diff = ops::sub_int(b, current, one);
            ops::bitwise_and_int(b, diff, int_const(b, 0xFF))
        }
    };
    if write_mask == 0xFF {
        raw
    } else {
        let keep_bits = int_const(b, (!(write_mask as i64)) & 0xFF);
        let write_bits = int_const(b, write_mask as i64);
        let kept = ops::bitwise_and_int(b, current, keep_bits);
        let written = ops::bitwise_and_int(b, raw, write_bits);
        ops::bitwise_or_int(b, kept, written)
    }
}

/// The new stencil value for one face, selecting among `pass`/`depth_fail`/
/// `fail` by the two runtime test outcomes (spec's two-sided stencil op
/// triple, `glStencilOpSeparate`'s convention).
fn stencil_result_for_face(b: &mut Builder, face: StencilFace, current: RValue<Int>, stencil_pass: RValue<Bool>, depth_pass: RValue<Bool>) -> RValue<Int> {
    let reference = int_const(b, face.reference as i64);
    let on_pass = apply_stencil_op(b, face.pass, current, reference, face.write_mask);
    let on_depth_fail = apply_stencil_op(b, face.depth_fail, current, reference, face.write_mask);
    let on_fail = apply_stencil_op(b, face.fail, current, reference, face.write_mask);
    let on_stencil_pass = select(b, depth_pass, on_pass, on_depth_fail);
    select(b, stencil_pass, on_stencil_pass, on_fail)
}

fn zero4(b: &mut Builder) -> RValue<Float4> {
    let z = value::constant_float(b, 0.0);
    composite::splat_float4(b, z)
}

fn one4(b: &mut Builder) -> RValue<Float4> {
    let o = value::constant_float(b, 1.0);
    composite::splat_float4(b, o)
}

fn blend_factor(b: &mut Builder, factor: BlendFactor, src: RValue<Float4>, dst: RValue<Float4>) -> RValue<Float4> {
    match factor {
        BlendFactor::Zero => zero4(b),
        BlendFactor::One => one4(b),
        BlendFactor::SrcColor => src,
        BlendFactor::OneMinusSrcColor => ops::sub_float4(b, one4(b), src),
        BlendFactor::SrcAlpha => {
            let a = composite::extract_lane(b, src, 3);
            composite::splat_float4(b, a)
        }
        BlendFactor::OneMinusSrcAlpha => {
            let a = composite::extract_lane(b, src, 3);
            let a4 = composite::splat_float4(b, a);
            ops::sub_float4(b, one4(b), a4)
        }
        BlendFactor::DstColor => dst,
        BlendFactor::OneMinusDstColor => ops::sub_float4(b, one4(b), dst),
        BlendFactor::DstAlpha => {
            let a = composite::extract_lane(b, dst, 3);
            composite::splat_float4(b, a)
        }
        BlendFactor::OneMinusDstAlpha => {
            let a = composite::extract_lane(b, dst, 3);
            let a4 = composite::splat_float4(b, a);
            ops::sub_float4(b, one4(b), a4)
        }
    }
}

fn blend_color(b: &mut Builder, state: BlendState, src: RValue<Float4>, dst: RValue<Float4>) -> RValue<Float4> {
    if !state.enabled {
        return src;
    }
    let sf = blend_factor(b, state.src_factor, src, dst);
    let df = blend_factor(b, state.dst_factor, src, dst);
    let src_term = ops::mul_float4(b, src, sf);
    let dst_term = ops::mul_float4(b, dst, df);
    match state.equation {
        BlendEquation::Add => ops::add_float4(b, src_term, dst_term),
        BlendEquation::Subtract => ops::sub_float4(b, src_term, dst_term),
        BlendEquation::ReverseSubtract => ops::sub_float4(b, dst_term, src_term),
    }
}

fn read_float(b: &mut Builder, base: BytePointer, offset: u32) -> RValue<Float> {
    let off = int_const(b, offset as i64);
    let ptr = base.add_bytes(b, off);
    Pointer::<Float>::from_id(ptr.id).load(b)
}

fn read_plane(b: &mut Builder, base: BytePointer, offset: u32) -> (RValue<Float>, RValue<Float>, RValue<Float>) {
    (read_float(b, base, offset), read_float(b, base, offset + 4), read_float(b, base, offset + 8))
}

fn read_float4(b: &mut Builder, base: BytePointer, offset: u32) -> RValue<Float4> {
    let off = int_const(b, offset as i64);
    let ptr = base.add_bytes(b, off);
    Pointer::<Float4>::from_id(ptr.id).load(b)
}

fn read_int_field(b: &mut Builder, base: BytePointer, offset: i64) -> RValue<Int> {
    let off = int_const(b, offset);
    let ptr = base.add_bytes(b, off);
    Pointer::<Int>::from_id(ptr.id).load(b)
}

fn read_long_field(b: &mut Builder, base: BytePointer, offset: i64) -> RValue<Long> {
    let off = int_const(b, offset);
    let ptr = base.add_bytes(b, off);
    Pointer::<Long>::from_id(ptr.id).load(b)
}

/// Loads a pointer value that's itself stored as data at `base + offset`
/// (the framebuffer descriptor's attachment pointers), rather than
/// `base`'s own address — `Pointer<T>`'s `T: ReactorType` can't name "a
/// pointer" generically, so this goes through `BytePointer` directly.
fn load_byte_ptr_field(b: &mut Builder, base: BytePointer, offset: i64) -> BytePointer {
    let off = int_const(b, offset);
    let field_addr = base.add_bytes(b, off);
    BytePointer::from_id(b.emit(Type::Pointer(&BYTE), Op::Load(field_addr.id)))
}

fn pixel_addr(b: &mut Builder, base: BytePointer, stride: RValue<Int>, x: RValue<Int>, y: RValue<Int>, elem_bytes: i64) -> BytePointer {
    let row_bytes = ops::mul_int(b, y, stride);
    let row_ptr = base.add_bytes(b, row_bytes);
    let col_bytes = ops::mul_int(b, x, int_const(b, elem_bytes));
    row_ptr.add_bytes(b, col_bytes)
}

/// Loads a row's `(left, right)` outline bounds (spec §4.6's per-scanline
/// coverage table, one `(i32, i32)` pair per row relative to `y_min`).
fn read_row_bounds(b: &mut Builder, prim: BytePointer, layout: &PrimitiveLayout, y_min: RValue<Int>, y: RValue<Int>) -> (RValue<Int>, RValue<Int>) {
    let row = ops::sub_int(b, y, y_min);
    let row_bytes = ops::mul_int(b, row, int_const(b, 8));
    let row_off = ops::add_int(b, int_const(b, layout.outline_offset as i64), row_bytes);
    let row_ptr = prim.add_bytes(b, row_off);
    let left = Pointer::<Int>::from_id(row_ptr.id).load(b);
    let right_ptr = row_ptr.add_bytes(b, int_const(b, 4));
    let right = Pointer::<Int>::from_id(right_ptr.id).load(b);
    (left, right)
}

fn read_uniforms(b: &mut Builder, constants: BytePointer, program: &Program) -> Vec<RValue<Float4>> {
    let total = program.uniforms.total_registers();
    (0..total)
        .map(|reg| {
            let offset = int_const(b, (reg as i64) * 16);
            let ptr = constants.add_bytes(b, offset);
            Pointer::<Float4>::from_id(ptr.id).load(b)
        })
        .collect()
}

fn bake_constant_pool(b: &mut Builder, program: &Program) -> Vec<RValue<Float4>> {
    program
        .constants
        .rows()
        .iter()
        .map(|row| {
            let x = value::constant_float(b, row[0]);
            let y = value::constant_float(b, row[1]);
            let z = value::constant_float(b, row[2]);
            let w = value::constant_float(b, row[3]);
            composite::vec4(b, x, y, z, w)
        })
        .collect()
}

/// Builds the pixel entry point into `module`, returning its function
/// index. `layout` must be the same one `setup.rs` was built with for this
/// linked program; `depth`/`stencil`/`blend`/`alpha_test` are baked in from
/// the draw call's GL state the same way `setup.rs` bakes in `CullMode`.
#[allow(clippy::too_many_arguments)]
pub fn build_pixel_routine(
    module: &mut Module,
    program: &Program,
    layout: &PrimitiveLayout,
    depth_test_enabled: bool,
    depth_write_enabled: bool,
    depth_func: CompareFunc,
    stencil: StencilState,
    blend: BlendState,
    alpha_test: Option<AlphaTest>,
    mut sample: impl FnMut(&mut Builder, u32, RValue<Float4>) -> RValue<Float4>,
) -> usize {
    let ptr_ty = byte_ptr_type();
    let mut func = Function::new(PIXEL_ROUTINE_NAME, vec![ptr_ty, Type::Int, Type::Int, ptr_ty, ptr_ty], Type::Void);
    let mut b = Builder::new(&mut func);

    let prim = BytePointer::from_id(b.param(0));
    let y_start = RValue::<Int>::from_id(b.param(1));
    let y_end = RValue::<Int>::from_id(b.param(2));
    let fb = BytePointer::from_id(b.param(3));
    let constants = BytePointer::from_id(b.param(4));

    let color_ptr = load_byte_ptr_field(&mut b, fb, framebuffer::COLOR_PTR_OFFSET);
    let color_stride = read_int_field(&mut b, fb, framebuffer::COLOR_STRIDE_OFFSET);
    let depth_ptr = load_byte_ptr_field(&mut b, fb, framebuffer::DEPTH_PTR_OFFSET);
    let depth_stride = read_int_field(&mut b, fb, framebuffer::DEPTH_STRIDE_OFFSET);
    let stencil_ptr = load_byte_ptr_field(&mut b, fb, framebuffer::STENCIL_PTR_OFFSET);
    let stencil_stride = read_int_field(&mut b, fb, framebuffer::STENCIL_STRIDE_OFFSET);

    let (za, zb, zc) = read_plane(&mut b, prim, layout.z_plane_offset);
    // `w`'s plane is carried in the record for parity with `setup.rs` and
    // future perspective-correct interpolation, but this routine evaluates
    // varyings directly off their own screen-linear plane per the spec's
    // literal plane-equation definition (GLOSSARY), so `w_plane_offset`
    // goes unread here.

    let front_mask = read_long_field(&mut b, prim, layout.stencil_masks_offset as i64);
    let is_front = long_nonzero(&mut b, front_mask);

    let y_min = read_int_field(&mut b, prim, layout.y_bounds_offset as i64);
    let y_max = read_int_field(&mut b, prim, (layout.y_bounds_offset + 4) as i64);

    let y_lo = max_int(&mut b, y_start, y_min);
    let y_hi = min_int(&mut b, y_end, y_max);

    let uniforms = read_uniforms(&mut b, constants, program);
    let constant_rows = bake_constant_pool(&mut b, program);

    let mut table = LValueTable::new();
    let y_var = Variable::declare(&mut table, &mut b, y_lo);

    // Rows are visited two at a time (spec §4.6/GLOSSARY's "Quad": the unit
    // of pixel dispatch is a 2x2 lattice), each pair's shared x-range being
    // the union of both rows' own outline bounds; a pixel outside its own
    // row's bounds but inside the pair's union is skipped by a runtime
    // coverage check rather than a build-time one, since `left`/`right` are
    // only known once the routine runs. A trailing odd row or column is
    // handled below by a single-pixel-wide tail loop.
    control::for_loop(
        &mut b,
        &mut table,
        &[y_var.id],
        |_b, _table| {},
        |b, table| {
            let y0 = y_var.load(table, b);
            let y1 = ops::add_int(b, y0, int_const(b, 1));
            ops::cmp_lt_int(b, y1, y_hi)
        },
        |b, table| {
            let y = y_var.load(table, b);
            let next = ops::add_int(b, y, int_const(b, 2));
            y_var.store(table, b, next);
        },
        |b, table| {
            let y0 = y_var.load(table, b);
            let y1 = ops::add_int(b, y0, int_const(b, 1));
            let (left0, right0) = read_row_bounds(b, prim, layout, y_min, y0);
            let (left1, right1) = read_row_bounds(b, prim, layout, y_min, y1);
            let qx_lo = min_int(b, left0, left1);
            let qx_hi = max_int(b, right0, right1);

            let mut x_table = LValueTable::new();
            let x_var = Variable::declare(&mut x_table, b, qx_lo);

            control::for_loop(
                b,
                &mut x_table,
                &[x_var.id],
                |_b, _table| {},
                |b, table| {
                    let x0 = x_var.load(table, b);
                    let x1 = ops::add_int(b, x0, int_const(b, 1));
                    ops::cmp_lt_int(b, x1, qx_hi)
                },
                |b, table| {
                    let x = x_var.load(table, b);
                    let next = ops::add_int(b, x, int_const(b, 2));
                    x_var.store(table, b, next);
                },
                |b, table| {
                    let x0 = x_var.load(table, b);
                    let x1 = ops::add_int(b, x0, int_const(b, 1));
                    shade_quad_lane(b, program, layout, prim, x0, y0, left0, right0, za, zb, zc, color_ptr, color_stride, depth_ptr, depth_stride, stencil_ptr, stencil_stride, is_front, depth_test_enabled, depth_write_enabled, depth_func, stencil, blend, alpha_test, &uniforms, &constant_rows, &mut sample);
                    shade_quad_lane(b, program, layout, prim, x1, y0, left0, right0, za, zb, zc, color_ptr, color_stride, depth_ptr, depth_stride, stencil_ptr, stencil_stride, is_front, depth_test_enabled, depth_write_enabled, depth_func, stencil, blend, alpha_test, &uniforms, &constant_rows, &mut sample);
                    shade_quad_lane(b, program, layout, prim, x0, y1, left1, right1, za, zb, zc, color_ptr, color_stride, depth_ptr, depth_stride, stencil_ptr, stencil_stride, is_front, depth_test_enabled, depth_write_enabled, depth_func, stencil, blend, alpha_test, &uniforms, &constant_rows, &mut sample);
                    shade_quad_lane(b, program, layout, prim, x1, y1, left1, right1, za, zb, zc, color_ptr, color_stride, depth_ptr, depth_stride, stencil_ptr, stencil_stride, is_front, depth_test_enabled, depth_write_enabled, depth_func, stencil, blend, alpha_test, &uniforms, &constant_rows, &mut sample);
                },
            );

            let x_tail = x_var.load(&mut x_table, b);
            let has_tail_column = ops::cmp_lt_int(b, x_tail, qx_hi);
            let no_else: Option<fn(&mut Builder, &mut LValueTable)> = None;
            control::if_then_else(
                b,
                &mut x_table,
                &[],
                has_tail_column,
                |b, _table| {
                    shade_quad_lane(b, program, layout, prim, x_tail, y0, left0, right0, za, zb, zc, color_ptr, color_stride, depth_ptr, depth_stride, stencil_ptr, stencil_stride, is_front, depth_test_enabled, depth_write_enabled, depth_func, stencil, blend, alpha_test, &uniforms, &constant_rows, &mut sample);
                    shade_quad_lane(b, program, layout, prim, x_tail, y1, left1, right1, za, zb, zc, color_ptr, color_stride, depth_ptr, depth_stride, stencil_ptr, stencil_stride, is_front, depth_test_enabled, depth_write_enabled, depth_func, stencil, blend, alpha_test, &uniforms, &constant_rows, &mut sample);
                },
                no_else,
            );
        },
    );

    let y_tail = y_var.load(&mut table, &mut b);
    let has_tail_row = ops::cmp_lt_int(&mut b, y_tail, y_hi);
    let no_else: Option<fn(&mut Builder, &mut LValueTable)> = None;
    control::if_then_else(
        &mut b,
        &mut table,
        &[],
        has_tail_row,
        |b, _table| {
            let (left, right) = read_row_bounds(b, prim, layout, y_min, y_tail);
            let mut x_table = LValueTable::new();
            let x_var = Variable::declare(&mut x_table, b, left);
            control::for_loop(
                b,
                &mut x_table,
                &[x_var.id],
                |_b, _table| {},
                |b, table| {
                    let x = x_var.load(table, b);
                    ops::cmp_lt_int(b, x, right)
                },
                |b, table| {
                    let x = x_var.load(table, b);
                    let next = ops::add_int(b, x, int_const(b, 1));
                    x_var.store(table, b, next);
                },
                |b, table| {
                    let x = x_var.load(table, b);
                    shade_pixel(
                        b,
                        program,
                        layout,
                        prim,
                        x,
                        y_tail,
                        za,
                        zb,
                        zc,
                        color_ptr,
                        color_stride,
                        depth_ptr,
                        depth_stride,
                        stencil_ptr,
                        stencil_stride,
                        is_front,
                        depth_test_enabled,
                        depth_write_enabled,
                        depth_func,
                        stencil,
                        blend,
                        alpha_test,
                        &uniforms,
                        &constant_rows,
                        &mut sample,
                    );
                },
            );
        },
        no_else,
    );

    b.terminate(Terminator::Return(None));
    module.add_function(func)
}

/// Shades one lane of a 2x2 quad if it falls inside its own row's outline
/// bounds; the quad's x-range is the union of both its rows' bounds, so a
/// lane can land outside its own row (the other row being wider) and must
/// be skipped without touching the framebuffer.
#[allow(clippy::too_many_arguments)]
fn shade_quad_lane(
    b: &mut Builder,
    program: &Program,
    layout: &PrimitiveLayout,
    prim: BytePointer,
    x: RValue<Int>,
    y: RValue<Int>,
    left: RValue<Int>,
    right: RValue<Int>,
    za: RValue<Float>,
    zb: RValue<Float>,
    zc: RValue<Float>,
    color_ptr: BytePointer,
    color_stride: RValue<Int>,
    depth_ptr: BytePointer,
    depth_stride: RValue<Int>,
    stencil_ptr: BytePointer,
    stencil_stride: RValue<Int>,
    is_front: RValue<Bool>,
    depth_test_enabled: bool,
    depth_write_enabled: bool,
    depth_func: CompareFunc,
    stencil: StencilState,
    blend: BlendState,
    alpha_test: Option<AlphaTest>,
    uniforms: &[RValue<Float4>],
    constant_rows: &[RValue<Float4>],
    sample: &mut dyn FnMut(&mut Builder, u32, RValue<Float4>) -> RValue<Float4>,
) {
    let at_or_past_left = ops::not_bool(b, ops::cmp_lt_int(b, x, left));
    let before_right = ops::cmp_lt_int(b, x, right);
    let covered = and_bool(b, at_or_past_left, before_right);

    let mut table = LValueTable::new();
    let no_else: Option<fn(&mut Builder, &mut LValueTable)> = None;
    control::if_then_else(
        b,
        &mut table,
        &[],
        covered,
        |b, _table| {
            shade_pixel(
                b,
                program,
                layout,
                prim,
                x,
                y,
                za,
                zb,
                zc,
                color_ptr,
                color_stride,
                depth_ptr,
                depth_stride,
                stencil_ptr,
                stencil_stride,
                is_front,
                depth_test_enabled,
                depth_write_enabled,
                depth_func,
                stencil,
                blend,
                alpha_test,
                uniforms,
                constant_rows,
                sample,
            );
        },
        no_else,
    );
}

#[allow(clippy::too_many_arguments)]
fn shade_pixel(
    b: &mut Builder,
    program: &Program,
    layout: &PrimitiveLayout,
    prim: BytePointer,
    x: RValue<Int>,
    y: RValue<Int>,
    za: RValue<Float>,
    zb: RValue<Float>,
    zc: RValue<Float>,
    color_ptr: BytePointer,
    color_stride: RValue<Int>,
    depth_ptr: BytePointer,
    depth_stride: RValue<Int>,
    stencil_ptr: BytePointer,
    stencil_stride: RValue<Int>,
    is_front: RValue<Bool>,
    depth_test_enabled: bool,
    depth_write_enabled: bool,
    depth_func: CompareFunc,
    stencil: StencilState,
    blend: BlendState,
    alpha_test: Option<AlphaTest>,
    uniforms: &[RValue<Float4>],
    constant_rows: &[RValue<Float4>],
    sample: &mut dyn FnMut(&mut Builder, u32, RValue<Float4>) -> RValue<Float4>,
) {
    let x_f = ops::int_to_float(b, x);
    let y_f = ops::int_to_float(b, y);
    let half = value::constant_float(b, 0.5);
    let cx = ops::add_float(b, x_f, half);
    let cy = ops::add_float(b, y_f, half);

    let z = {
        let ax = ops::mul_float(b, za, cx);
        let by = ops::mul_float(b, zb, cy);
        ops::add_float(b, ops::add_float(b, ax, by), zc)
    };

    let cx4 = composite::splat_float4(b, cx);
    let cy4 = composite::splat_float4(b, cy);
    let inputs: Vec<RValue<Float4>> = (0..program.input_count)
        .map(|reg| {
            let base = layout.varying_plane_offset(reg);
            let a_vec = read_float4(b, prim, base);
            let b_vec = read_float4(b, prim, base + 16);
            let c_vec = read_float4(b, prim, base + 32);
            let term_a = ops::mul_float4(b, a_vec, cx4);
            let term_b = ops::mul_float4(b, b_vec, cy4);
            ops::add_float4(b, ops::add_float4(b, term_a, term_b), c_vec)
        })
        .collect();

    let mut regs = RegisterFile::new(program.temp_count, inputs, program.output_count, uniforms.to_vec(), constant_rows.to_vec());
    let result = interpret(b, &program.instructions, &mut regs, sample);
    let outputs = regs.outputs(b);
    let color = *outputs.last().expect("a fragment program always writes at least gl_FragColor");

    let not_discarded = ops::not_bool(b, result.discarded);
    let alpha_pass = match alpha_test {
        Some(at) => {
            let alpha = composite::extract_lane(b, color, 3);
            let reference = value::constant_float(b, at.reference);
            compare_float(b, at.func, alpha, reference)
        }
        None => value::constant_bool(b, true),
    };
    let keep = and_bool(b, not_discarded, alpha_pass);

    let mut table = LValueTable::new();
    let no_else: Option<fn(&mut Builder, &mut LValueTable)> = None;
    control::if_then_else(
        b,
        &mut table,
        &[],
        keep,
        move |b, _table| {
            test_and_write(
                b,
                x,
                y,
                z,
                color,
                color_ptr,
                color_stride,
                depth_ptr,
                depth_stride,
                stencil_ptr,
                stencil_stride,
                is_front,
                depth_test_enabled,
                depth_write_enabled,
                depth_func,
                stencil,
                blend,
            );
        },
        no_else,
    );
}

#[allow(clippy::too_many_arguments)]
fn test_and_write(
    b: &mut Builder,
    x: RValue<Int>,
    y: RValue<Int>,
    z: RValue<Float>,
    color: RValue<Float4>,
    color_ptr: BytePointer,
    color_stride: RValue<Int>,
    depth_ptr: BytePointer,
    depth_stride: RValue<Int>,
    stencil_ptr: BytePointer,
    stencil_stride: RValue<Int>,
    is_front: RValue<Bool>,
    depth_test_enabled: bool,
    depth_write_enabled: bool,
    depth_func: CompareFunc,
    stencil: StencilState,
    blend: BlendState,
) {
    let color_addr = pixel_addr(b, color_ptr, color_stride, x, y, 16);
    let depth_addr = pixel_addr(b, depth_ptr, depth_stride, x, y, 4);
    let stencil_addr = pixel_addr(b, stencil_ptr, stencil_stride, x, y, 4);

    let existing_depth = Pointer::<Float>::from_id(depth_addr.id).load(b);
    let depth_pass = if depth_test_enabled { compare_float(b, depth_func, z, existing_depth) } else { value::constant_bool(b, true) };

    let stencil_pass = if stencil.test_enabled {
        let existing_stencil = Pointer::<Int>::from_id(stencil_addr.id).load(b);
        let front_ref = int_const(b, (stencil.front.reference as i64) & (stencil.front.read_mask as i64));
        let back_ref = int_const(b, (stencil.back.reference as i64) & (stencil.back.read_mask as i64));
        let front_mask = int_const(b, stencil.front.read_mask as i64);
        let back_mask = int_const(b, stencil.back.read_mask as i64);
        let masked_front = ops::bitwise_and_int(b, existing_stencil, front_mask);
        let masked_back = ops::bitwise_and_int(b, existing_stencil, back_mask);
        let pass_front = compare_int(b, stencil.front.func, front_ref, masked_front);
        let pass_back = compare_int(b, stencil.back.func, back_ref, masked_back);
        let pass = select(b, is_front, pass_front, pass_back);

        let new_front = stencil_result_for_face(b, stencil.front, existing_stencil, pass, depth_pass);
        let new_back = stencil_result_for_face(b, stencil.back, existing_stencil, pass, depth_pass);
        let new_val = select(b, is_front, new_front, new_back);
        Pointer::<Int>::from_id(stencil_addr.id).store(b, new_val);

        pass
    } else {
        value::constant_bool(b, true)
    };

    let final_pass = if stencil.test_enabled { and_bool(b, stencil_pass, depth_pass) } else { depth_pass };

    let mut table = LValueTable::new();
    let no_else: Option<fn(&mut Builder, &mut LValueTable)> = None;
    control::if_then_else(
        b,
        &mut table,
        &[],
        final_pass,
        move |b, _table| {
            if depth_write_enabled {
                Pointer::<Float>::from_id(depth_addr.id).store(b, z);
            }
            let existing_color = Pointer::<Float4>::from_id(color_addr.id).load(b);
            let blended = blend_color(b, blend, color, existing_color);
            Pointer::<Float4>::from_id(color_addr.id).store(b, blended);
        },
        no_else,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_shader_ir::ShaderKind;

    #[test]
    fn builds_one_function_per_call() {
        let mut module = Module::new();
        let program = Program::new(ShaderKind::Fragment);
        let layout = PrimitiveLayout::new(0, 32);
        let idx = build_pixel_routine(
            &mut module,
            &program,
            &layout,
            true,
            true,
            CompareFunc::Less,
            StencilState::default(),
            BlendState::default(),
            None,
            |b, _unit, coord| coord_passthrough(b, coord),
        );
        assert_eq!(module.functions[idx].name, PIXEL_ROUTINE_NAME);
    }

    fn coord_passthrough(_b: &mut Builder, coord: RValue<Float4>) -> RValue<Float4> {
        coord
    }
}
