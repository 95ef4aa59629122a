//! The closed type set shaders are built from: scalar/vector/matrix bases,
//! samplers, and (non-recursive) structs. Mirrors the small fixed lattice a
//! CPU rasterizer's shader compiler needs rather than a general type system.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Basic {
    Void,
    Bool,
    Int,
    UInt,
    Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    Sampler2D,
    SamplerCube,
    Sampler3D,
    Sampler2DArray,
    Sampler2DShadow,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    Basic(Basic),
    Vector(Basic, u8),
    Matrix(u8, u8),
    Sampler(SamplerKind),
    Struct(Vec<(String, TypeDesc)>),
    Array(Box<TypeDesc>, Option<u32>),
}

impl TypeDesc {
    pub fn is_sampler(&self) -> bool {
        matches!(self, TypeDesc::Sampler(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeDesc::Basic(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeDesc::Basic(Basic::Int) | TypeDesc::Basic(Basic::UInt) | TypeDesc::Basic(Basic::Float)
        ) || matches!(self, TypeDesc::Vector(b, _) if *b != Basic::Bool)
            || matches!(self, TypeDesc::Matrix(_, _))
    }

    pub fn component(&self) -> Option<Basic> {
        match self {
            TypeDesc::Basic(b) => Some(*b),
            TypeDesc::Vector(b, _) => Some(*b),
            TypeDesc::Matrix(_, _) => Some(Basic::Float),
            _ => None,
        }
    }

    /// Byte-ish "word" size used by the IR lowerer for register-slot counts:
    /// each component occupies one 4-wide SIMD lane register.
    pub fn register_width(&self) -> u32 {
        match self {
            TypeDesc::Basic(_) => 1,
            TypeDesc::Vector(_, n) => *n as u32,
            TypeDesc::Matrix(cols, _rows) => *cols as u32,
            TypeDesc::Sampler(_) => 1,
            TypeDesc::Struct(fields) => fields.iter().map(|(_, t)| t.register_width()).sum(),
            TypeDesc::Array(elem, Some(n)) => elem.register_width() * n,
            TypeDesc::Array(elem, None) => elem.register_width(),
        }
    }

    pub fn builtin_from_keyword(kw: &str) -> Option<TypeDesc> {
        use Basic::*;
        Some(match kw {
            "void" => TypeDesc::Basic(Void),
            "bool" => TypeDesc::Basic(Bool),
            "int" => TypeDesc::Basic(Int),
            "uint" => TypeDesc::Basic(UInt),
            "float" => TypeDesc::Basic(Float),
            "vec2" => TypeDesc::Vector(Float, 2),
            "vec3" => TypeDesc::Vector(Float, 3),
            "vec4" => TypeDesc::Vector(Float, 4),
            "ivec2" => TypeDesc::Vector(Int, 2),
            "ivec3" => TypeDesc::Vector(Int, 3),
            "ivec4" => TypeDesc::Vector(Int, 4),
            "uvec2" => TypeDesc::Vector(UInt, 2),
            "uvec3" => TypeDesc::Vector(UInt, 3),
            "uvec4" => TypeDesc::Vector(UInt, 4),
            "bvec2" => TypeDesc::Vector(Bool, 2),
            "bvec3" => TypeDesc::Vector(Bool, 3),
            "bvec4" => TypeDesc::Vector(Bool, 4),
            "mat2" => TypeDesc::Matrix(2, 2),
            "mat3" => TypeDesc::Matrix(3, 3),
            "mat4" => TypeDesc::Matrix(4, 4),
            "sampler2D" => TypeDesc::Sampler(SamplerKind::Sampler2D),
            "samplerCube" => TypeDesc::Sampler(SamplerKind::SamplerCube),
            "sampler3D" => TypeDesc::Sampler(SamplerKind::Sampler3D),
            "sampler2DArray" => TypeDesc::Sampler(SamplerKind::Sampler2DArray),
            "sampler2DShadow" => TypeDesc::Sampler(SamplerKind::Sampler2DShadow),
            _ => return None,
        })
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDesc::Basic(Basic::Void) => write!(f, "void"),
            TypeDesc::Basic(Basic::Bool) => write!(f, "bool"),
            TypeDesc::Basic(Basic::Int) => write!(f, "int"),
            TypeDesc::Basic(Basic::UInt) => write!(f, "uint"),
            TypeDesc::Basic(Basic::Float) => write!(f, "float"),
            TypeDesc::Vector(b, n) => write!(f, "{}vec{}", prefix(*b), n),
            TypeDesc::Matrix(c, r) if c == r => write!(f, "mat{}", c),
            TypeDesc::Matrix(c, r) => write!(f, "mat{}x{}", c, r),
            TypeDesc::Sampler(k) => write!(f, "{:?}", k),
            TypeDesc::Struct(_) => write!(f, "struct"),
            TypeDesc::Array(elem, Some(n)) => write!(f, "{}[{}]", elem, n),
            TypeDesc::Array(elem, None) => write!(f, "{}[]", elem),
        }
    }
}

fn prefix(b: Basic) -> &'static str {
    match b {
        Basic::Bool => "b",
        Basic::Int => "i",
        Basic::UInt => "u",
        Basic::Float => "",
        Basic::Void => "",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Precision {
    Low,
    Medium,
    High,
    Unspecified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Qualifier {
    None,
    Const,
    In,
    Out,
    InOut,
    Uniform,
    Attribute,
    Varying,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ty {
    pub desc: TypeDesc,
    pub precision: Precision,
    pub qualifier: Qualifier,
}

impl Ty {
    pub fn new(desc: TypeDesc) -> Ty {
        Ty { desc, precision: Precision::Unspecified, qualifier: Qualifier::None }
    }
}
