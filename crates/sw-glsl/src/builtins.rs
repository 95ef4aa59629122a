use crate::types::{Basic, SamplerKind, TypeDesc};

/// One overload of a built-in function: parameter types plus return type.
pub struct BuiltinOverload {
    pub params: &'static [TypeDesc_],
    pub ret: TypeDesc_,
}

/// `TypeDesc` isn't `Copy` (it owns `Vec`s for structs/arrays), so built-in
/// tables describe shapes with this small `Copy` stand-in and materialize a
/// real `TypeDesc` on lookup.
#[derive(Clone, Copy)]
pub enum TypeDesc_ {
    F,
    V2,
    V3,
    V4,
    I,
    IV2,
    IV3,
    IV4,
    B,
    M2,
    M3,
    M4,
    Sampler2D,
    SamplerCube,
}

impl TypeDesc_ {
    pub fn materialize(self) -> TypeDesc {
        use Basic::*;
        match self {
            TypeDesc_::F => TypeDesc::Basic(Float),
            TypeDesc_::V2 => TypeDesc::Vector(Float, 2),
            TypeDesc_::V3 => TypeDesc::Vector(Float, 3),
            TypeDesc_::V4 => TypeDesc::Vector(Float, 4),
            TypeDesc_::I => TypeDesc::Basic(Int),
            TypeDesc_::IV2 => TypeDesc::Vector(Int, 2),
            TypeDesc_::IV3 => TypeDesc::Vector(Int, 3),
            TypeDesc_::IV4 => TypeDesc::Vector(Int, 4),
            TypeDesc_::B => TypeDesc::Basic(Bool),
            TypeDesc_::M2 => TypeDesc::Matrix(2, 2),
            TypeDesc_::M3 => TypeDesc::Matrix(3, 3),
            TypeDesc_::M4 => TypeDesc::Matrix(4, 4),
            TypeDesc_::Sampler2D => TypeDesc::Sampler(SamplerKind::Sampler2D),
            TypeDesc_::SamplerCube => TypeDesc::Sampler(SamplerKind::SamplerCube),
        }
    }
}

pub fn lookup(name: &str) -> Option<Vec<(&'static [TypeDesc_], TypeDesc_)>> {
    use TypeDesc_::*;
    let overloads: &[(&[TypeDesc_], TypeDesc_)] = match name {
        "sin" | "cos" | "tan" | "exp" | "log" | "exp2" | "log2" | "sqrt" | "inversesqrt"
        | "abs" | "sign" | "floor" | "ceil" | "fract" | "normalize" | "radians" | "degrees" => {
            &[(&[F], F), (&[V2], V2), (&[V3], V3), (&[V4], V4)]
        }
        "pow" | "min" | "max" | "mod" | "step" | "reflect" | "distance" => {
            &[(&[F, F], F), (&[V2, V2], V2), (&[V3, V3], V3), (&[V4, V4], V4)]
        }
        "mix" | "clamp" | "smoothstep" => {
            &[(&[F, F, F], F), (&[V2, V2, V2], V2), (&[V3, V3, V3], V3), (&[V4, V4, V4], V4)]
        }
        "dot" => &[(&[V2, V2], F), (&[V3, V3], F), (&[V4, V4], F)],
        "cross" => &[(&[V3, V3], V3)],
        "length" => &[(&[F], F), (&[V2], F), (&[V3], F), (&[V4], F)],
        "texture2D" | "texture2DProj" | "texture2DLod" => &[(&[Sampler2D, V2], V4)],
        "textureCube" => &[(&[SamplerCube, V3], V4)],
        "all" | "any" => &[(&[B], B)],
        "discard" => return None,
        _ => return None,
    };
    Some(overloads.iter().map(|(p, r)| (*p, *r)).collect())
}

pub fn builtin_variable(name: &str, stage_is_vertex: bool) -> Option<TypeDesc> {
    use Basic::*;
    Some(match (name, stage_is_vertex) {
        ("gl_Position", true) => TypeDesc::Vector(Float, 4),
        ("gl_PointSize", true) => TypeDesc::Basic(Float),
        ("gl_VertexID", true) => TypeDesc::Basic(Int),
        ("gl_InstanceID", true) => TypeDesc::Basic(Int),
        ("gl_FragColor", false) => TypeDesc::Vector(Float, 4),
        ("gl_FragData", false) => TypeDesc::Array(Box::new(TypeDesc::Vector(Float, 4)), Some(4)),
        ("gl_FragCoord", false) => TypeDesc::Vector(Float, 4),
        ("gl_FrontFacing", false) => TypeDesc::Basic(Bool),
        ("gl_PointCoord", false) => TypeDesc::Vector(Float, 2),
        ("gl_FragDepth", false) => TypeDesc::Basic(Float),
        _ => return None,
    })
}
