//! Routine cache keyed by `(program id, state hash)` (SPEC_FULL §4.6): a
//! repeated draw against the same linked program and the same baked GL
//! state reuses the `Routine` triple from the previous specialization pass
//! instead of re-invoking the native backend, which is the whole point of
//! specializing in the first place (spec §1's throughput goal).
//!
//! `sw-pipeline` does not own program ids itself — `sw-raster` assigns
//! them when a program is linked and passes the same id back on every draw
//! against it — so the cache here is a plain map, not a program registry.

use crate::state::GlState;
use fxhash::FxHashMap;
use reactor_jit::Routine;
use std::rc::Rc;

/// The three routines one `(program, state)` specialization produces,
/// kept together since they always get invalidated together (spec §4.6:
/// one specialization pass builds all three from one shader IR pair).
pub struct Pipeline {
    pub vertex: Rc<Routine>,
    pub setup: Rc<Routine>,
    pub pixel: Rc<Routine>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    program_id: u64,
    state_hash: u64,
}

#[derive(Default)]
pub struct PipelineCache {
    entries: FxHashMap<CacheKey, Rc<Pipeline>>,
}

impl PipelineCache {
    pub fn new() -> PipelineCache {
        PipelineCache::default()
    }

    pub fn get(&self, program_id: u64, state: &GlState) -> Option<Rc<Pipeline>> {
        let key = CacheKey { program_id, state_hash: state.state_hash() };
        self.entries.get(&key).cloned()
    }

    pub fn insert(&mut self, program_id: u64, state: &GlState, pipeline: Pipeline) -> Rc<Pipeline> {
        let key = CacheKey { program_id, state_hash: state.state_hash() };
        let rc = Rc::new(pipeline);
        self.entries.insert(key, rc.clone());
        rc
    }

    /// Drops every cached routine for `program_id`, forcing re-specialization
    /// on the next draw against it. Called when a program is deleted or
    /// (outside this core's Non-goals, but kept cheap to support) relinked.
    pub fn invalidate_program(&mut self, program_id: u64) {
        self.entries.retain(|key, _| key.program_id != program_id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_pipeline() -> Pipeline {
        use reactor::builder::Builder;
        use reactor::ir::{Function, Module, Terminator};
        use reactor::ty::Type;
        use reactor_jit::{Backend, BackendConfig};

        let routine = |name: &str| {
            let mut func = Function::new(name, vec![], Type::Void);
            let mut b = Builder::new(&mut func);
            b.terminate(Terminator::Return(None));
            let mut module = Module::new();
            module.add_function(func);
            Rc::new(Backend::compile(module, &BackendConfig::default()).unwrap())
        };
        Pipeline { vertex: routine("vertex"), setup: routine("setup"), pixel: routine("pixel") }
    }

    #[test]
    fn misses_until_inserted_then_hits() {
        let mut cache = PipelineCache::new();
        let state = GlState::default();
        assert!(cache.get(1, &state).is_none());
        cache.insert(1, &state, dummy_pipeline());
        assert!(cache.get(1, &state).is_some());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn differing_state_is_a_separate_entry() {
        let mut cache = PipelineCache::new();
        let mut other = GlState::default();
        other.blend.enabled = true;
        cache.insert(1, &GlState::default(), dummy_pipeline());
        cache.insert(1, &other, dummy_pipeline());
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn invalidate_program_drops_only_its_entries() {
        let mut cache = PipelineCache::new();
        cache.insert(1, &GlState::default(), dummy_pipeline());
        cache.insert(2, &GlState::default(), dummy_pipeline());
        cache.invalidate_program(1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(1, &GlState::default()).is_none());
        assert!(cache.get(2, &GlState::default()).is_some());
    }
}
