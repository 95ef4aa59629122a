//! Tunables for a single `Backend::compile` call (SPEC_FULL.md's ambient
//! config addition: an in-process config struct stands in for the file- or
//! env-based configuration layers this crate's embedding doesn't have).

use crate::passes::{Pass, DEFAULT_PASSES};

#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Passes run in order before code generation. Empty disables
    /// optimization entirely (used by the retry-on-failure path, SPEC_FULL
    /// §7: "if the optimizer pipeline itself is suspected of miscompiling
    /// a routine, recompiling with an empty pass list is a valid recovery
    /// path").
    pub passes: Vec<Pass>,
    /// Runs `reactor::verify::verify` on the module before optimizing.
    /// Should stay on outside of release builds; spec says verification is
    /// "debug-only" so this defaults to `cfg!(debug_assertions)`.
    pub verify: bool,
}

impl Default for BackendConfig {
    fn default() -> BackendConfig {
        BackendConfig { passes: DEFAULT_PASSES.to_vec(), verify: cfg!(debug_assertions) }
    }
}

impl BackendConfig {
    pub fn with_empty_pipeline(&self) -> BackendConfig {
        BackendConfig { passes: Vec::new(), verify: self.verify }
    }
}
