//! Glue crate: re-exports every pipeline-stage crate under one namespace
//! and exposes the three JIT-emitted entry points spec §6 names —
//! `vertex`, `setup`, `pixel` — as thin wrappers that pack real buffer
//! addresses into the `Slot` ABI `reactor_jit::Routine::invoke` expects.
//! Plays the same role the teacher's own `lib.rs` plays over its
//! renderer's internal crates: no logic of its own, just the seam callers
//! link against.
//!
//! EGL bookkeeping, window-system integration, and the config-file/HTTP
//! config server are out of scope here, as they are for every crate this
//! one glues together.

pub use reactor;
pub use reactor_jit;
pub use sw_glsl;
pub use sw_pipeline;
pub use sw_pp;
pub use sw_raster;
pub use sw_shader_ir;

use reactor_jit::Slot;
use sw_pipeline::cache::Pipeline;

/// `vertex(batch* in, vertex* out, uint count, constants*)` (spec §6).
pub fn vertex(pipeline: &Pipeline, batch: &[u8], out: &mut [u8], count: u32, constants: &[u8]) {
    pipeline.vertex.invoke(vec![
        Slot::Int(batch.as_ptr() as i64),
        Slot::Int(out.as_mut_ptr() as i64),
        Slot::Int(count as i64),
        Slot::Int(constants.as_ptr() as i64),
    ]);
}

/// `setup(triangle* in, primitive* out) -> bool` (spec §6).
pub fn setup(pipeline: &Pipeline, triangle: &[u8], out: &mut [u8]) -> bool {
    matches!(
        pipeline.setup.invoke(vec![Slot::Int(triangle.as_ptr() as i64), Slot::Int(out.as_mut_ptr() as i64)]),
        Some(Slot::Int(v)) if v != 0
    )
}

/// `pixel(primitive*, scanline_range, framebuffer*)` (spec §6). This
/// core's pixel routine also threads the per-draw-call constant pool
/// through explicitly rather than folding it into `primitive*` — see
/// `sw_pipeline::pixel`'s own doc comment for why.
pub fn pixel(pipeline: &Pipeline, primitive: &[u8], y_start: i32, y_end: i32, framebuffer: &[u8], constants: &[u8]) {
    pipeline.pixel.invoke(vec![
        Slot::Int(primitive.as_ptr() as i64),
        Slot::Int(y_start as i64),
        Slot::Int(y_end as i64),
        Slot::Int(framebuffer.as_ptr() as i64),
        Slot::Int(constants.as_ptr() as i64),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor::builder::Builder;
    use reactor::value::{Float4, RValue};
    use reactor_jit::BackendConfig;
    use sw_pipeline::link::link;
    use sw_shader_ir::{Program, ShaderKind};

    fn no_sample(_b: &mut Builder, _unit: u32, coord: RValue<Float4>) -> RValue<Float4> {
        coord
    }

    #[test]
    fn entry_points_route_through_to_the_underlying_routines_without_panicking() {
        let linked = link(Program::new(ShaderKind::Vertex), Program::new(ShaderKind::Fragment)).unwrap();
        let config = BackendConfig::default();
        let built = sw_pipeline::build_pipeline(&linked, &sw_pipeline::state::GlState::default(), &[], 16, None, &config, no_sample, no_sample).unwrap();

        let mut out = vec![0u8; 64];
        vertex(&built, &[], &mut out, 0, &[]);

        let mut prim_out = vec![0u8; 256];
        let tri_in = vec![0u8; 64];
        let _kept = setup(&built, &tri_in, &mut prim_out);

        let fb = vec![0u8; 64];
        pixel(&built, &prim_out, 0, 0, &fb, &[]);
    }
}
