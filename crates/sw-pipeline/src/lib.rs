//! Pipeline specializer (spec §4.6): given a linked program's shader IR
//! and the GL state vector for a draw call, builds the vertex, setup, and
//! pixel Reactor routines, compiles them through `reactor-jit`, and caches
//! the result keyed by `(program id, state hash)` (SPEC_FULL §4.6) so a
//! repeated draw with identical state skips both the Reactor-building pass
//! and the native backend entirely.

pub mod cache;
pub mod interpret;
pub mod link;
pub mod pixel;
pub mod regfile;
pub mod setup;
pub mod state;
pub mod vertex;

use cache::{Pipeline, PipelineCache};
use link::LinkedProgram;
use reactor::builder::Builder;
use reactor::ir::Module;
use reactor::value::{Float4, RValue};
use reactor_jit::{Backend, BackendConfig};
use setup::{CullMode, PrimitiveLayout};
use state::GlState;
use std::rc::Rc;
use vertex::AttributeDescriptor;

#[derive(Debug, thiserror::Error)]
pub enum SpecializeError {
    #[error(transparent)]
    Backend(#[from] reactor_jit::BackendError),
}

/// A texture-sampling callback threaded through to both the vertex routine
/// (ES 3.0 permits vertex texture fetch) and the pixel routine; `sw-raster`
/// owns the actual texture objects, so this crate only ever sees a
/// closure.
pub type Sampler<'s> = dyn FnMut(&mut Builder, u32, RValue<Float4>) -> RValue<Float4> + 's;

fn cull_mode(state: &GlState) -> CullMode {
    match (state.cull_back_face, state.cull_front_face) {
        (true, true) => CullMode::Back, // both enabled is a degenerate GL config; back wins rather than culling everything silently.
        (true, false) => CullMode::Back,
        (false, true) => CullMode::Front,
        (false, false) => CullMode::None,
    }
}

/// Builds and compiles the three routines for one `(program, state)` pair,
/// without consulting or updating the cache. Exposed separately from
/// [`Specializer::specialize`] so callers that already know they need a
/// fresh build (e.g. after `invalidate_program`) can skip the lookup.
pub fn build_pipeline(
    program: &LinkedProgram,
    gl_state: &GlState,
    attributes: &[AttributeDescriptor],
    max_scanlines: u32,
    alpha_test: Option<pixel::AlphaTest>,
    backend_config: &BackendConfig,
    mut vertex_sample: impl FnMut(&mut Builder, u32, RValue<Float4>) -> RValue<Float4>,
    mut pixel_sample: impl FnMut(&mut Builder, u32, RValue<Float4>) -> RValue<Float4>,
) -> Result<Pipeline, SpecializeError> {
    let layout = PrimitiveLayout::new(program.varyings.len() as u32, max_scanlines);

    let mut vertex_module = Module::new();
    vertex::build_vertex_routine(&mut vertex_module, &program.vertex, attributes, &mut vertex_sample);
    let vertex_routine = Backend::compile(vertex_module, backend_config)?;

    let mut setup_module = Module::new();
    setup::build_setup_routine(&mut setup_module, &layout, cull_mode(gl_state));
    let setup_routine = Backend::compile(setup_module, backend_config)?;

    let mut pixel_module = Module::new();
    pixel::build_pixel_routine(
        &mut pixel_module,
        &program.fragment,
        &layout,
        gl_state.depth.test_enabled,
        gl_state.depth.write_enabled,
        gl_state.depth.func,
        gl_state.stencil,
        gl_state.blend,
        alpha_test,
        &mut pixel_sample,
    );
    let pixel_routine = Backend::compile(pixel_module, backend_config)?;

    Ok(Pipeline { vertex: Rc::new(vertex_routine), setup: Rc::new(setup_routine), pixel: Rc::new(pixel_routine) })
}

/// Owns the routine cache across draw calls within one context. One
/// `Specializer` per GL context, matching the cache's own per-context
/// lifetime (spec §5: the specializer is single-threaded per context).
#[derive(Default)]
pub struct Specializer {
    cache: PipelineCache,
}

impl Specializer {
    pub fn new() -> Specializer {
        Specializer::default()
    }

    /// Returns the cached pipeline for `(program_id, gl_state)` if one
    /// exists, building and caching a fresh one otherwise.
    #[allow(clippy::too_many_arguments)]
    pub fn specialize(
        &mut self,
        program_id: u64,
        program: &LinkedProgram,
        gl_state: &GlState,
        attributes: &[AttributeDescriptor],
        max_scanlines: u32,
        alpha_test: Option<pixel::AlphaTest>,
        backend_config: &BackendConfig,
        vertex_sample: impl FnMut(&mut Builder, u32, RValue<Float4>) -> RValue<Float4>,
        pixel_sample: impl FnMut(&mut Builder, u32, RValue<Float4>) -> RValue<Float4>,
    ) -> Result<Rc<Pipeline>, SpecializeError> {
        if let Some(hit) = self.cache.get(program_id, gl_state) {
            return Ok(hit);
        }
        let built = build_pipeline(program, gl_state, attributes, max_scanlines, alpha_test, backend_config, vertex_sample, pixel_sample)?;
        Ok(self.cache.insert(program_id, gl_state, built))
    }

    pub fn invalidate_program(&mut self, program_id: u64) {
        self.cache.invalidate_program(program_id);
    }

    pub fn cached_pipeline_count(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use link::link;
    use sw_shader_ir::{Program, ShaderKind};

    fn trivial_program() -> LinkedProgram {
        let vertex = Program::new(ShaderKind::Vertex);
        let fragment = Program::new(ShaderKind::Fragment);
        link(vertex, fragment).unwrap()
    }

    fn no_sample(b: &mut Builder, _unit: u32, coord: RValue<Float4>) -> RValue<Float4> {
        coord
    }

    #[test]
    fn second_specialize_with_same_state_hits_the_cache() {
        let mut spec = Specializer::new();
        let program = trivial_program();
        let state = GlState::default();
        let config = BackendConfig::default();

        let first = spec.specialize(1, &program, &state, &[], 32, None, &config, no_sample, no_sample).unwrap();
        assert_eq!(spec.cached_pipeline_count(), 1);
        let second = spec.specialize(1, &program, &state, &[], 32, None, &config, no_sample, no_sample).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(spec.cached_pipeline_count(), 1);
    }

    #[test]
    fn differing_state_builds_a_second_pipeline() {
        let mut spec = Specializer::new();
        let program = trivial_program();
        let config = BackendConfig::default();

        let mut state_b = GlState::default();
        state_b.cull_back_face = true;

        spec.specialize(1, &program, &GlState::default(), &[], 32, None, &config, no_sample, no_sample).unwrap();
        spec.specialize(1, &program, &state_b, &[], 32, None, &config, no_sample, no_sample).unwrap();
        assert_eq!(spec.cached_pipeline_count(), 2);
    }
}
