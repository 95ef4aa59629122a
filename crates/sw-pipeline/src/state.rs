//! The GL state vector a draw call specializes against (spec §4.6). Kept
//! as one small, `Hash`-able struct rather than a bag of GL enums so the
//! routine cache key (`cache.rs`) is cheap to compute per draw.

use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColor,
    OneMinusSrcColor,
    SrcAlpha,
    OneMinusSrcAlpha,
    DstColor,
    OneMinusDstColor,
    DstAlpha,
    OneMinusDstAlpha,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendEquation {
    Add,
    Subtract,
    ReverseSubtract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StencilOp {
    Keep,
    Zero,
    Replace,
    IncrementClamp,
    DecrementClamp,
    Invert,
    IncrementWrap,
    DecrementWrap,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    pub enabled: bool,
    pub equation: BlendEquation,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepthState {
    pub test_enabled: bool,
    pub write_enabled: bool,
    pub func: CompareFunc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilFace {
    pub func: CompareFunc,
    pub reference: u8,
    pub read_mask: u8,
    pub write_mask: u8,
    pub fail: StencilOp,
    pub depth_fail: StencilOp,
    pub pass: StencilOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StencilState {
    pub test_enabled: bool,
    pub front: StencilFace,
    pub back: StencilFace,
}

/// Per-varying layout the vertex routine writes and the pixel routine
/// reads; distinct from `sw_shader_ir::VaryingSlot` because two shaders
/// can agree on names but disagree on interpolation only after linking.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VaryingLayout {
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlState {
    pub blend: BlendState,
    pub depth: DepthState,
    pub stencil: StencilState,
    pub sample_count: u8,
    pub varyings: VaryingLayout,
    pub cull_back_face: bool,
    pub cull_front_face: bool,
}

impl GlState {
    pub fn state_hash(&self) -> u64 {
        let mut hasher = fxhash::FxHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl Default for BlendState {
    fn default() -> BlendState {
        BlendState {
            enabled: false,
            equation: BlendEquation::Add,
            src_factor: BlendFactor::One,
            dst_factor: BlendFactor::Zero,
        }
    }
}

impl Default for DepthState {
    fn default() -> DepthState {
        DepthState { test_enabled: false, write_enabled: true, func: CompareFunc::Less }
    }
}

impl Default for StencilFace {
    fn default() -> StencilFace {
        StencilFace {
            func: CompareFunc::Always,
            reference: 0,
            read_mask: 0xFF,
            write_mask: 0xFF,
            fail: StencilOp::Keep,
            depth_fail: StencilOp::Keep,
            pass: StencilOp::Keep,
        }
    }
}

impl Default for StencilState {
    fn default() -> StencilState {
        StencilState { test_enabled: false, front: StencilFace::default(), back: StencilFace::default() }
    }
}

impl Default for GlState {
    fn default() -> GlState {
        GlState {
            blend: BlendState::default(),
            depth: DepthState::default(),
            stencil: StencilState::default(),
            sample_count: 1,
            varyings: VaryingLayout { count: 0 },
            cull_back_face: false,
            cull_front_face: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_states_hash_identically() {
        let a = GlState::default();
        let b = GlState::default();
        assert_eq!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn differing_blend_state_changes_the_hash() {
        let a = GlState::default();
        let mut b = GlState::default();
        b.blend.enabled = true;
        assert_ne!(a.state_hash(), b.state_hash());
    }
}
