//! Links a vertex and fragment shader IR pair into one `LinkedProgram`:
//! matches varyings by name, assigns them stable slot indices, and flags
//! mismatches as a tier-2 error (spec §7) rather than the tier-1 compile
//! diagnostics `sw_glsl`/`sw_shader_ir` already surfaced.

use sw_shader_ir::inst::Interpolation;
use sw_shader_ir::{Program, ShaderKind};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LinkError {
    #[error("vertex shader is missing, program cannot be linked")]
    MissingVertexStage,
    #[error("fragment shader is missing, program cannot be linked")]
    MissingFragmentStage,
    #[error("varying `{0}` is read by the fragment shader but never written by the vertex shader")]
    UnmatchedVarying(String),
    #[error("varying `{name}` has conflicting interpolation qualifiers between stages")]
    InterpolationMismatch { name: String },
}

/// One resolved varying slot shared between the vertex and fragment
/// routines, with the linked (post-mismatch-check) interpolation mode.
#[derive(Debug, Clone)]
pub struct LinkedVarying {
    pub name: String,
    pub vertex_location: u32,
    pub fragment_location: u32,
    pub components: u8,
    pub interpolation: Interpolation,
}

pub struct LinkedProgram {
    pub vertex: Program,
    pub fragment: Program,
    pub varyings: Vec<LinkedVarying>,
}

pub fn link(vertex: Program, fragment: Program) -> Result<LinkedProgram, LinkError> {
    if vertex.kind != ShaderKind::Vertex {
        return Err(LinkError::MissingVertexStage);
    }
    if fragment.kind != ShaderKind::Fragment {
        return Err(LinkError::MissingFragmentStage);
    }

    let mut varyings = Vec::new();
    for fs_varying in &fragment.varyings {
        let vs_varying = vertex
            .varyings
            .iter()
            .find(|v| v.name == fs_varying.name)
            .ok_or_else(|| LinkError::UnmatchedVarying(fs_varying.name.clone()))?;
        if vs_varying.interpolation != fs_varying.interpolation {
            return Err(LinkError::InterpolationMismatch { name: fs_varying.name.clone() });
        }
        varyings.push(LinkedVarying {
            name: fs_varying.name.clone(),
            vertex_location: vs_varying.location,
            fragment_location: fs_varying.location,
            components: fs_varying.components,
            interpolation: fs_varying.interpolation,
        });
    }

    Ok(LinkedProgram { vertex, fragment, varyings })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_shader_ir::inst::VaryingSlot;

    fn varying_program(kind: ShaderKind, varyings: Vec<VaryingSlot>) -> Program {
        let mut p = Program::new(kind);
        p.varyings = varyings;
        p
    }

    #[test]
    fn unmatched_fragment_varying_is_a_link_error() {
        let vs = varying_program(ShaderKind::Vertex, vec![]);
        let fs = varying_program(
            ShaderKind::Fragment,
            vec![VaryingSlot { name: "vColor".into(), location: 0, components: 4, interpolation: Interpolation::Smooth }],
        );
        assert_eq!(link(vs, fs).unwrap_err(), LinkError::UnmatchedVarying("vColor".into()));
    }

    #[test]
    fn matching_varyings_link_successfully() {
        let slot = |loc| VaryingSlot { name: "vColor".into(), location: loc, components: 4, interpolation: Interpolation::Smooth };
        let vs = varying_program(ShaderKind::Vertex, vec![slot(0)]);
        let fs = varying_program(ShaderKind::Fragment, vec![slot(0)]);
        let linked = link(vs, fs).unwrap();
        assert_eq!(linked.varyings.len(), 1);
    }
}
