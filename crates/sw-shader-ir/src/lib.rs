//! Lowers a `sw-glsl` typed AST into a linear, register-allocated shader
//! IR program ("OutputASM", spec §4.3) and defines its binary wire format
//! (spec §6) so that `sw-pipeline` can consume compiled shaders without a
//! dependency on the AST crate's lifetime-bound types.

pub mod encode;
pub mod inst;
mod lower;
pub mod opcode;
pub mod reg;

pub use inst::{Program, ShaderKind};
pub use lower::lower_shader;
