//! Rasterizer driver (spec §4.7): primitive assembly, point/line-to-quad
//! expansion, Sutherland–Hodgman clipping, and a worker-pool-backed
//! dispatch of the compiled vertex/setup/pixel routines against a real
//! framebuffer. Sits above `sw-pipeline` (which only ever builds and
//! caches routines) and owns everything with a concrete buffer: vertex
//! batches, the constant pool, and the framebuffer's color/depth/stencil
//! planes.
//!
//! Out of scope here, per the spec's Non-goals: EGL surface/context
//! bookkeeping, window-system integration, and the config-file/HTTP
//! config server the original ships — this crate's own configuration is
//! the plain `RasterConfig` in `config.rs`.

pub mod clip;
pub mod config;
pub mod driver;
pub mod error;
pub mod framebuffer;
pub mod topology;
pub mod worker;

pub use config::RasterConfig;
pub use driver::Driver;
pub use error::{ErrorState, GlError};
pub use framebuffer::{Framebuffer, ScissorRect};
pub use topology::Topology;
