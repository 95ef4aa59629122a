//! Triangle setup routine (spec §4.6 / data model §3): consumes three
//! post-vertex-shader rows — the same per-vertex byte layout `vertex.rs`
//! writes, varying registers `0..N-1` followed by `gl_Position` — and
//! produces one `Primitive` record: the signed area, the back-face
//! decision, the `z`/`w` and per-varying plane equations, and the
//! y-bounded `outline[]` span table the rasterizer driver walks one
//! scanline at a time.
//!
//! Matches spec §6's `setup(triangle* in, primitive* out) -> bool`; the
//! boolean result is `false` when the triangle is culled or degenerate,
//! telling the driver to skip rasterizing it without inspecting the rest
//! of the record.

use reactor::builder::Builder;
use reactor::composite;
use reactor::control;
use reactor::ir::{Function, Module, Op, Terminator, Type};
use reactor::lvalue::LValueTable;
use reactor::pointer::{BytePointer, Pointer};
use reactor::value::{self, ops, Bool, Float, Int, Long, RValue, ReactorType};

pub const SETUP_ROUTINE_NAME: &str = "setup";

/// Mirrors the GL front/back culling state that's in effect for the draw
/// call this routine was specialized from (spec §4.6: the pipeline
/// specializer bakes GL state into the generated routine rather than
/// branching on it at raster time).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Byte layout of the `Primitive` record this routine writes, derived
/// once per linked program from its varying count and the maximum
/// scanline span any draw against this routine can hit. `sw-raster`
/// allocates its primitive buffers to this exact shape and reads them
/// back by the same offsets; the two crates agree on the layout through
/// this type rather than `sw-pipeline` depending on a `sw-raster` struct
/// (spec §4.6/§4.7's stated dependency direction, C6 before C7).
///
/// Record shape, in order: the 3 copied vertex rows (position + varyings,
/// `vertex.rs`'s own output layout), one point size per vertex, the
/// signed area, the `z` and `w` plane equations (3 floats each: A, B, C),
/// one plane equation triple per varying *lane* (stored as three `Float4`
/// — the A, B, and C vectors across all 4 lanes of that varying
/// register), the two-sided stencil masks, the `yMin`/`yMax` bounds, and
/// the `outline[]` table.
#[derive(Debug, Clone, Copy)]
pub struct PrimitiveLayout {
    pub varying_count: u32,
    pub max_scanlines: u32,
    pub vertex_stride: u32,
    pub vertices_offset: u32,
    pub point_size_offset: u32,
    pub area_offset: u32,
    pub z_plane_offset: u32,
    pub w_plane_offset: u32,
    pub varying_planes_offset: u32,
    pub stencil_masks_offset: u32,
    pub y_bounds_offset: u32,
    pub outline_offset: u32,
    pub size: u32,
}

impl PrimitiveLayout {
    pub fn new(varying_count: u32, max_scanlines: u32) -> PrimitiveLayout {
        let vertex_stride = (varying_count + 1) * 16;
        let vertices_offset = 0;
        let point_size_offset = vertices_offset + vertex_stride * 3;
        let area_offset = point_size_offset + 4 * 3;
        let z_plane_offset = area_offset + 4;
        let w_plane_offset = z_plane_offset + 16;
        let varying_planes_offset = w_plane_offset + 16;
        let stencil_masks_offset = varying_planes_offset + varying_count * 3 * 16;
        let y_bounds_offset = stencil_masks_offset + 16;
        let outline_offset = y_bounds_offset + 8;
        let size = outline_offset + max_scanlines * 8;
        PrimitiveLayout {
            varying_count,
            max_scanlines,
            vertex_stride,
            vertices_offset,
            point_size_offset,
            area_offset,
            z_plane_offset,
            w_plane_offset,
            varying_planes_offset,
            stencil_masks_offset,
            y_bounds_offset,
            outline_offset,
            size,
        }
    }

    pub fn position_offset(&self, vertex: u32) -> u32 {
        self.vertices_offset + vertex * self.vertex_stride + self.varying_count * 16
    }

    pub fn varying_offset(&self, vertex: u32, varying: u32) -> u32 {
        self.vertices_offset + vertex * self.vertex_stride + varying * 16
    }

    pub fn varying_plane_offset(&self, varying: u32) -> u32 {
        self.varying_planes_offset + varying * 3 * 16
    }
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

fn min_float(b: &mut Builder, a: RValue<Float>, c: RValue<Float>) -> RValue<Float> {
    let lt = ops::cmp_lt_float(b, a, c);
    select(b, lt, a, c)
}

fn max_float(b: &mut Builder, a: RValue<Float>, c: RValue<Float>) -> RValue<Float> {
    let lt = ops::cmp_lt_float(b, a, c);
    select(b, lt, c, a)
}

fn abs_float(b: &mut Builder, v: RValue<Float>) -> RValue<Float> {
    let zero = value::constant_float(b, 0.0);
    let neg = ops::neg_float(b, v);
    max_float(b, v, neg)
}

fn min_int(b: &mut Builder, a: RValue<Int>, c: RValue<Int>) -> RValue<Int> {
    let lt = ops::cmp_lt_int(b, a, c);
    select(b, lt, a, c)
}

fn max_int(b: &mut Builder, a: RValue<Int>, c: RValue<Int>) -> RValue<Int> {
    let lt = ops::cmp_lt_int(b, a, c);
    select(b, lt, c, a)
}

fn scalar_intrinsic(b: &mut Builder, name: &'static str, v: RValue<Float>) -> RValue<Float> {
    RValue::from_id(b.emit(Float::TYPE, Op::Intrinsic(name, smallvec::smallvec![v.id])))
}

/// Fits the plane `f(x, y) = A*x + B*y + C` through the three vertices,
/// given `area2` (twice the triangle's signed area — the same
/// determinant both the barycentric weights and this plane fit are
/// built from, so setup computes it once and reuses it everywhere).
#[allow(clippy::too_many_arguments)]
fn fit_plane(
    b: &mut Builder,
    x0: RValue<Float>,
    y0: RValue<Float>,
    dx1: RValue<Float>,
    dy1: RValue<Float>,
    dx2: RValue<Float>,
    dy2: RValue<Float>,
    f0: RValue<Float>,
    f1: RValue<Float>,
    f2: RValue<Float>,
    inv_area2: RValue<Float>,
) -> (RValue<Float>, RValue<Float>, RValue<Float>) {
    let df1 = ops::sub_float(b, f1, f0);
    let df2 = ops::sub_float(b, f2, f0);

    let a_num1 = ops::mul_float(b, df1, dy2);
    let a_num2 = ops::mul_float(b, df2, dy1);
    let a_num = ops::sub_float(b, a_num1, a_num2);
    let a = ops::mul_float(b, a_num, inv_area2);

    let b_num1 = ops::mul_float(b, dx1, df2);
    let b_num2 = ops::mul_float(b, dx2, df1);
    let b_num = ops::sub_float(b, b_num1, b_num2);
    let b_coef = ops::mul_float(b, b_num, inv_area2);

    let ax0 = ops::mul_float(b, a, x0);
    let by0 = ops::mul_float(b, b_coef, y0);
    let c = ops::sub_float(b, ops::sub_float(b, f0, ax0), by0);

    (a, b_coef, c)
}

/// Builds the setup entry point into `module`, returning its function
/// index. `layout` must be the same one the caller sizes `out`'s buffer
/// with; `cull` is baked in from the draw call's GL state.
pub fn build_setup_routine(module: &mut Module, layout: &PrimitiveLayout, cull: CullMode) -> usize {
    let ptr_ty = byte_ptr_type();
    let mut func = Function::new(SETUP_ROUTINE_NAME, vec![ptr_ty, ptr_ty], Type::Bool);
    let mut b = Builder::new(&mut func);

    let tri_in = BytePointer::from_id(b.param(0));
    let out = BytePointer::from_id(b.param(1));

    // Copy the 3 vertex rows through unchanged: the number of Float4
    // registers per vertex is known at specialization time, so this
    // loop is unrolled in Rust rather than built as a Reactor loop.
    let registers_per_vertex = layout.varying_count + 1;
    for v in 0..3u32 {
        for r in 0..registers_per_vertex {
            let byte_offset = (v * layout.vertex_stride + r * 16) as i64;
            let off = int_const(&mut b, byte_offset);
            let src_ptr = tri_in.add_bytes(&mut b, off);
            let dst_ptr = out.add_bytes(&mut b, off);
            let value = Pointer::<reactor::value::Float4>::from_id(src_ptr.id).load(&mut b);
            Pointer::<reactor::value::Float4>::from_id(dst_ptr.id).store(&mut b, value);
        }
    }

    let position = |b: &mut Builder, v: u32| -> RValue<reactor::value::Float4> {
        let off = int_const(b, layout.position_offset(v) as i64);
        let ptr = tri_in.add_bytes(b, off);
        Pointer::<reactor::value::Float4>::from_id(ptr.id).load(b)
    };

    let p0 = position(&mut b, 0);
    let p1 = position(&mut b, 1);
    let p2 = position(&mut b, 2);

    let x0 = composite::extract_lane(&mut b, p0, 0);
    let y0 = composite::extract_lane(&mut b, p0, 1);
    let z0 = composite::extract_lane(&mut b, p0, 2);
    let w0 = composite::extract_lane(&mut b, p0, 3);
    let x1 = composite::extract_lane(&mut b, p1, 0);
    let y1 = composite::extract_lane(&mut b, p1, 1);
    let z1 = composite::extract_lane(&mut b, p1, 2);
    let w1 = composite::extract_lane(&mut b, p1, 3);
    let x2 = composite::extract_lane(&mut b, p2, 0);
    let y2 = composite::extract_lane(&mut b, p2, 1);
    let z2 = composite::extract_lane(&mut b, p2, 2);
    let w2 = composite::extract_lane(&mut b, p2, 3);

    let dx1 = ops::sub_float(&mut b, x1, x0);
    let dy1 = ops::sub_float(&mut b, y1, y0);
    let dx2 = ops::sub_float(&mut b, x2, x0);
    let dy2 = ops::sub_float(&mut b, y2, y0);

    // Twice the signed area: positive for a counter-clockwise winding in
    // a y-down screen-space coordinate system (spec §3/§9's framebuffer
    // convention).
    let area2 = {
        let t1 = ops::mul_float(&mut b, dx1, dy2);
        let t2 = ops::mul_float(&mut b, dx2, dy1);
        ops::sub_float(&mut b, t1, t2)
    };
    let area = {
        let half = value::constant_float(&mut b, 0.5);
        ops::mul_float(&mut b, area2, half)
    };

    let zero = value::constant_float(&mut b, 0.0);
    let is_front = ops::cmp_lt_float(&mut b, zero, area);

    let epsilon = value::constant_float(&mut b, 1e-12);
    let abs_area = abs_float(&mut b, area);
    let nondegenerate = ops::cmp_lt_float(&mut b, epsilon, abs_area);

    let true_val = value::constant_bool(&mut b, true);
    let false_val = value::constant_bool(&mut b, false);
    let passes_cull = match cull {
        CullMode::None => true_val,
        CullMode::Back => is_front,
        CullMode::Front => {
            let is_back = ops::not_bool(&mut b, is_front);
            is_back
        }
    };
    let keep = select(&mut b, passes_cull, nondegenerate, false_val);

    // Area and the two-sided stencil activity masks are written
    // regardless of `keep`, matching the spec's "skipped" primitives
    // still occupying a slot the driver can cheaply recognize as empty
    // via yMin > yMax below, rather than leaving the record partially
    // initialized.
    {
        let ptr = out.add_bytes(&mut b, int_const(&mut b, layout.area_offset as i64));
        Pointer::<Float>::from_id(ptr.id).store(&mut b, area);
    }
    {
        let all_ones = value::constant_long(&mut b, -1i64);
        let zero_mask = value::constant_long(&mut b, 0i64);
        let front_mask = select(&mut b, is_front, all_ones, zero_mask);
        let back_mask = select(&mut b, is_front, zero_mask, all_ones);
        let front_ptr = out.add_bytes(&mut b, int_const(&mut b, layout.stencil_masks_offset as i64));
        let back_ptr = out.add_bytes(&mut b, int_const(&mut b, (layout.stencil_masks_offset + 8) as i64));
        Pointer::<Long>::from_id(front_ptr.id).store(&mut b, front_mask);
        Pointer::<Long>::from_id(back_ptr.id).store(&mut b, back_mask);
    }

    let inv_area2 = ops::div_float(&mut b, value::constant_float(&mut b, 1.0), area2);

    let mut table = LValueTable::new();

    let empty_y_min = int_const(&mut b, 1);
    let empty_y_max = int_const(&mut b, 0);

    control::if_then_else(
        &mut b,
        &mut table,
        &[],
        keep,
        |b, _table| {
            build_planes_and_outline(b, layout, x0, y0, dx1, dy1, dx2, dy2, z0, z1, z2, w0, w1, w2, y0, y1, y2, inv_area2, out);
        },
        Some(move |b: &mut Builder, _table: &mut LValueTable| {
            let ptr = out.add_bytes(b, int_const(b, layout.y_bounds_offset as i64));
            Pointer::<Int>::from_id(ptr.id).store(b, empty_y_min);
            let ptr = out.add_bytes(b, int_const(b, (layout.y_bounds_offset + 4) as i64));
            Pointer::<Int>::from_id(ptr.id).store(b, empty_y_max);
        }),
    );

    b.terminate(Terminator::Return(Some(keep.id)));
    module.add_function(func)
}

#[allow(clippy::too_many_arguments)]
fn build_planes_and_outline(
    b: &mut Builder,
    layout: &PrimitiveLayout,
    x0: RValue<Float>,
    y0_base: RValue<Float>,
    dx1: RValue<Float>,
    dy1: RValue<Float>,
    dx2: RValue<Float>,
    dy2: RValue<Float>,
    z0: RValue<Float>,
    z1: RValue<Float>,
    z2: RValue<Float>,
    w0: RValue<Float>,
    w1: RValue<Float>,
    w2: RValue<Float>,
    y0: RValue<Float>,
    y1: RValue<Float>,
    y2: RValue<Float>,
    inv_area2: RValue<Float>,
    out: BytePointer,
) {
    let (za, zb, zc) = fit_plane(b, x0, y0_base, dx1, dy1, dx2, dy2, z0, z1, z2, inv_area2);
    write_plane_triple(b, out, layout.z_plane_offset, za, zb, zc);

    let (wa, wb, wc) = fit_plane(b, x0, y0_base, dx1, dy1, dx2, dy2, w0, w1, w2, inv_area2);
    write_plane_triple(b, out, layout.w_plane_offset, wa, wb, wc);

    for reg in 0..layout.varying_count {
        let v0 = read_float4(b, out, layout.varying_offset(0, reg));
        let v1 = read_float4(b, out, layout.varying_offset(1, reg));
        let v2 = read_float4(b, out, layout.varying_offset(2, reg));

        let mut a_lanes = [None; 4];
        let mut b_lanes = [None; 4];
        let mut c_lanes = [None; 4];
        for lane in 0..4u8 {
            let f0 = composite::extract_lane(b, v0, lane);
            let f1 = composite::extract_lane(b, v1, lane);
            let f2 = composite::extract_lane(b, v2, lane);
            let (a, bc, c) = fit_plane(b, x0, y0_base, dx1, dy1, dx2, dy2, f0, f1, f2, inv_area2);
            a_lanes[lane as usize] = Some(a);
            b_lanes[lane as usize] = Some(bc);
            c_lanes[lane as usize] = Some(c);
        }
        let a_vec = composite::vec4(b, a_lanes[0].unwrap(), a_lanes[1].unwrap(), a_lanes[2].unwrap(), a_lanes[3].unwrap());
        let b_vec = composite::vec4(b, b_lanes[0].unwrap(), b_lanes[1].unwrap(), b_lanes[2].unwrap(), b_lanes[3].unwrap());
        let c_vec = composite::vec4(b, c_lanes[0].unwrap(), c_lanes[1].unwrap(), c_lanes[2].unwrap(), c_lanes[3].unwrap());

        let base = layout.varying_plane_offset(reg);
        write_float4(b, out, base, a_vec);
        write_float4(b, out, base + 16, b_vec);
        write_float4(b, out, base + 32, c_vec);
    }

    build_outline(b, layout, x0, y0_base, dx1, dy1, dx2, dy2, y0, y1, y2, out);
}

fn read_float4(b: &mut Builder, base: BytePointer, offset: u32) -> RValue<reactor::value::Float4> {
    let off = int_const(b, offset as i64);
    let ptr = base.add_bytes(b, off);
    Pointer::<reactor::value::Float4>::from_id(ptr.id).load(b)
}

fn write_float4(b: &mut Builder, base: BytePointer, offset: u32, value: RValue<reactor::value::Float4>) {
    let off = int_const(b, offset as i64);
    let ptr = base.add_bytes(b, off);
    Pointer::<reactor::value::Float4>::from_id(ptr.id).store(b, value);
}

fn write_plane_triple(b: &mut Builder, out: BytePointer, offset: u32, a: RValue<Float>, bc: RValue<Float>, c: RValue<Float>) {
    let a_ptr = out.add_bytes(b, int_const(b, offset as i64));
    Pointer::<Float>::from_id(a_ptr.id).store(b, a);
    let b_ptr = out.add_bytes(b, int_const(b, (offset + 4) as i64));
    Pointer::<Float>::from_id(b_ptr.id).store(b, bc);
    let c_ptr = out.add_bytes(b, int_const(b, (offset + 8) as i64));
    Pointer::<Float>::from_id(c_ptr.id).store(b, c);
}

/// Fills `yMin`/`yMax` and the scanline outline table. Each scanline's
/// `(left, right)` span is the min/max over the three edges' x-axis
/// intersections with that `y`, masked to +/-infinity for the one edge
/// (of the three) that doesn't span the scanline — this is equivalent
/// to the usual top/bottom split without needing to branch on which
/// vertex is topmost (spec §4.6 "steps edges in fixed-point"; this
/// implementation steps in floating point and rounds once per scanline
/// rather than carrying a fixed-point accumulator, since the outline
/// only needs to be exact at pixel-center samples, not sub-pixel
/// accurate).
#[allow(clippy::too_many_arguments)]
fn build_outline(
    b: &mut Builder,
    layout: &PrimitiveLayout,
    x0: RValue<Float>,
    y0_base: RValue<Float>,
    dx1: RValue<Float>,
    dy1: RValue<Float>,
    dx2: RValue<Float>,
    dy2: RValue<Float>,
    y0: RValue<Float>,
    y1: RValue<Float>,
    y2: RValue<Float>,
    out: BytePointer,
) {
    let x1 = ops::add_float(b, x0, dx1);
    let x2 = ops::add_float(b, x0, dx2);

    let y_min_f = min_float(b, min_float(b, y0, y1), y2);
    let y_max_f = max_float(b, max_float(b, y0, y1), y2);
    let y_min_floor = scalar_intrinsic(b, "floor", y_min_f);
    let y_max_ceil = scalar_intrinsic(b, "ceil", y_max_f);
    let y_min_i = ops::float_to_int(b, y_min_floor);
    let y_max_i = ops::float_to_int(b, y_max_ceil);

    let zero_i = int_const(b, 0);
    let cap_i = int_const(b, layout.max_scanlines as i64);
    let y_min_clamped = max_int(b, y_min_i, zero_i);
    let y_max_clamped = min_int(b, y_max_i, cap_i);

    {
        let ptr = out.add_bytes(b, int_const(b, layout.y_bounds_offset as i64));
        Pointer::<Int>::from_id(ptr.id).store(b, y_min_clamped);
        let ptr = out.add_bytes(b, int_const(b, (layout.y_bounds_offset + 4) as i64));
        Pointer::<Int>::from_id(ptr.id).store(b, y_max_clamped);
    }

    let mut table = LValueTable::new();
    let y_var = reactor::lvalue::Variable::declare(&mut table, b, y_min_clamped);

    control::for_loop(
        b,
        &mut table,
        &[y_var.id],
        |_b, _table| {},
        |b, table| {
            let y = y_var.load(table, b);
            ops::cmp_lt_int(b, y, y_max_clamped)
        },
        |b, table| {
            let y = y_var.load(table, b);
            let one = int_const(b, 1);
            let next = ops::add_int(b, y, one);
            y_var.store(table, b, next);
        },
        |b, table| {
            let y = y_var.load(table, b);
            let y_f = ops::int_to_float(b, y);
            let half = value::constant_float(b, 0.5);
            let sample_y = ops::add_float(b, y_f, half);

            let (left, right) = edge_span_at(b, x0, y0_base, x1, y1, x2, y2, sample_y);

            let left_i = ops::float_to_int(b, scalar_intrinsic(b, "ceil", left));
            let right_i = ops::float_to_int(b, scalar_intrinsic(b, "floor", right));

            let row = ops::sub_int(b, y, y_min_clamped);
            let row_bytes = ops::mul_int(b, row, int_const(b, 8));
            let row_offset = ops::add_int(b, int_const(b, layout.outline_offset as i64), row_bytes);
            let row_ptr = out.add_bytes(b, row_offset);
            Pointer::<Int>::from_id(row_ptr.id).store(b, left_i);
            let right_ptr = row_ptr.add_bytes(b, int_const(b, 4));
            Pointer::<Int>::from_id(right_ptr.id).store(b, right_i);
        },
    );
}

/// The x-intersection of each of the 3 edges `(x0,y0)-(x1,y1)`,
/// `(x1,y1)-(x2,y2)`, `(x2,y2)-(x0,y0)` with the horizontal line `y =
/// sample_y`, reduced to `(left, right)` by masking out whichever edge
/// doesn't straddle `sample_y` with +/-infinity.
#[allow(clippy::too_many_arguments)]
fn edge_span_at(
    b: &mut Builder,
    x0: RValue<Float>,
    y0: RValue<Float>,
    x1: RValue<Float>,
    y1: RValue<Float>,
    x2: RValue<Float>,
    y2: RValue<Float>,
    sample_y: RValue<Float>,
) -> (RValue<Float>, RValue<Float>) {
    let pos_inf = value::constant_float(b, f32::INFINITY);
    let neg_inf = value::constant_float(b, f32::NEG_INFINITY);

    let edges = [(x0, y0, x1, y1), (x1, y1, x2, y2), (x2, y2, x0, y0)];
    let mut left = pos_inf;
    let mut right = neg_inf;
    for (ex0, ey0, ex1, ey1) in edges {
        let lo = min_float(b, ey0, ey1);
        let hi = max_float(b, ey0, ey1);
        let above_lo = {
            let lt = ops::cmp_lt_float(b, sample_y, lo);
            ops::not_bool(b, lt)
        };
        let below_hi = ops::cmp_lt_float(b, sample_y, hi);
        let valid = select(b, above_lo, below_hi, value::constant_bool(b, false));

        let dy = ops::sub_float(b, ey1, ey0);
        let dx = ops::sub_float(b, ex1, ex0);
        let t = ops::div_float(b, ops::sub_float(b, sample_y, ey0), dy);
        let x_at_y = ops::add_float(b, ex0, ops::mul_float(b, t, dx));

        let low_candidate = select(b, valid, x_at_y, pos_inf);
        let high_candidate = select(b, valid, x_at_y, neg_inf);
        left = min_float(b, left, low_candidate);
        right = max_float(b, right, high_candidate);
    }
    (left, right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_monotonic_and_fits_varyings() {
        let layout = PrimitiveLayout::new(3, 64);
        assert!(layout.area_offset > layout.point_size_offset);
        assert!(layout.varying_planes_offset > layout.w_plane_offset);
        assert!(layout.outline_offset < layout.size);
        assert_eq!(layout.size, layout.outline_offset + 64 * 8);
    }

    #[test]
    fn builds_one_function_per_call() {
        let mut module = Module::new();
        let layout = PrimitiveLayout::new(1, 32);
        let idx = build_setup_routine(&mut module, &layout, CullMode::Back);
        assert_eq!(module.functions[idx].name, SETUP_ROUTINE_NAME);
    }
}
