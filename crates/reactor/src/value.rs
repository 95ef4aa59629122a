//! Typed value handles. `RValue<T>` wraps an opaque SSA node tagged by one
//! of the marker types below; operator overloads are implemented only for
//! the combinations the closed type alphabet allows (spec §9: the
//! source's SFINAE-constrained `CToReactor`/`CanBeUsedAsReturn` traits
//! collapse into this fixed set of trait impls).

use crate::builder::Builder;
use crate::ir::{Op, Type};
use std::marker::PhantomData;

pub trait ReactorType: Copy {
    const TYPE: Type;
}

macro_rules! marker {
    ($name:ident, $ty:expr) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $name;
        impl ReactorType for $name {
            const TYPE: Type = $ty;
        }
    };
}

marker!(Bool, Type::Bool);
marker!(Int, Type::Int);
marker!(UInt, Type::UInt);
marker!(Long, Type::Long);
marker!(Float, Type::Float);
marker!(Byte, Type::Byte);
marker!(SByte, Type::SByte);
marker!(Short, Type::Short);
marker!(UShort, Type::UShort);
marker!(Int4, Type::Int4);
marker!(UInt4, Type::UInt4);
marker!(Float4, Type::Float4);
marker!(Float2, Type::Float2);

#[derive(Clone, Copy)]
pub struct RValue<T: ReactorType> {
    pub id: crate::ir::ValueId,
    _marker: PhantomData<T>,
}

impl<T: ReactorType> RValue<T> {
    pub fn from_id(id: crate::ir::ValueId) -> RValue<T> {
        RValue { id, _marker: PhantomData }
    }
}

impl<T: ReactorType> std::fmt::Debug for RValue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RValue({:?})", self.id)
    }
}

pub fn constant_int(b: &mut Builder, v: i64) -> RValue<Int> {
    RValue::from_id(b.emit(Type::Int, Op::ConstInt(v)))
}

pub fn constant_uint(b: &mut Builder, v: u32) -> RValue<UInt> {
    RValue::from_id(b.emit(Type::UInt, Op::ConstInt(v as i64)))
}

pub fn constant_long(b: &mut Builder, v: i64) -> RValue<Long> {
    RValue::from_id(b.emit(Type::Long, Op::ConstInt(v)))
}

pub fn constant_float(b: &mut Builder, v: f32) -> RValue<Float> {
    RValue::from_id(b.emit(Type::Float, Op::ConstFloat(v as f64)))
}

pub fn constant_bool(b: &mut Builder, v: bool) -> RValue<Bool> {
    RValue::from_id(b.emit(Type::Bool, Op::ConstInt(v as i64)))
}

/// Arithmetic over typed values, `cranelift`-`InstBuilder`-style: every
/// operation takes the `Builder` for the function it appends to, since
/// `RValue<T>` itself is just an SSA id tag with no access to a `Module`.
pub mod ops {
    use super::*;

    macro_rules! binop {
        ($fn_name:ident, $op:ident, $t:ty) => {
            pub fn $fn_name(b: &mut Builder, lhs: RValue<$t>, rhs: RValue<$t>) -> RValue<$t> {
                RValue::from_id(b.emit(<$t>::TYPE, Op::$op(lhs.id, rhs.id)))
            }
        };
    }

    binop!(add_int, Add, Int);
    binop!(sub_int, Sub, Int);
    binop!(mul_int, Mul, Int);
    binop!(div_int, Div, Int);
    binop!(add_uint, Add, UInt);
    binop!(sub_uint, Sub, UInt);
    binop!(mul_uint, Mul, UInt);
    binop!(div_uint, Div, UInt);
    binop!(add_float, Add, Float);
    binop!(sub_float, Sub, Float);
    binop!(mul_float, Mul, Float);
    binop!(div_float, Div, Float);
    binop!(add_float4, Add, Float4);
    binop!(sub_float4, Sub, Float4);
    binop!(mul_float4, Mul, Float4);
    binop!(div_float4, Div, Float4);
    binop!(add_int4, Add, Int4);
    binop!(sub_int4, Sub, Int4);
    binop!(mul_int4, Mul, Int4);

    pub fn neg_float(b: &mut Builder, v: RValue<Float>) -> RValue<Float> {
        RValue::from_id(b.emit(Float::TYPE, Op::Neg(v.id)))
    }

    pub fn neg_int(b: &mut Builder, v: RValue<Int>) -> RValue<Int> {
        RValue::from_id(b.emit(Int::TYPE, Op::Neg(v.id)))
    }

    pub fn cmp_lt_float(b: &mut Builder, lhs: RValue<Float>, rhs: RValue<Float>) -> RValue<Bool> {
        RValue::from_id(b.emit(Bool::TYPE, Op::CmpLt(lhs.id, rhs.id)))
    }

    pub fn cmp_le_float(b: &mut Builder, lhs: RValue<Float>, rhs: RValue<Float>) -> RValue<Bool> {
        RValue::from_id(b.emit(Bool::TYPE, Op::CmpLe(lhs.id, rhs.id)))
    }

    pub fn cmp_eq_int(b: &mut Builder, lhs: RValue<Int>, rhs: RValue<Int>) -> RValue<Bool> {
        RValue::from_id(b.emit(Bool::TYPE, Op::CmpEq(lhs.id, rhs.id)))
    }

    pub fn cmp_lt_int(b: &mut Builder, lhs: RValue<Int>, rhs: RValue<Int>) -> RValue<Bool> {
        RValue::from_id(b.emit(Bool::TYPE, Op::CmpLt(lhs.id, rhs.id)))
    }

    pub fn cmp_le_int(b: &mut Builder, lhs: RValue<Int>, rhs: RValue<Int>) -> RValue<Bool> {
        RValue::from_id(b.emit(Bool::TYPE, Op::CmpLe(lhs.id, rhs.id)))
    }

    pub fn select_float(b: &mut Builder, cond: RValue<Bool>, a: RValue<Float>, c: RValue<Float>) -> RValue<Float> {
        RValue::from_id(b.emit(Float::TYPE, Op::Select(cond.id, a.id, c.id)))
    }

    pub fn bitwise_and_int(b: &mut Builder, lhs: RValue<Int>, rhs: RValue<Int>) -> RValue<Int> {
        RValue::from_id(b.emit(Int::TYPE, Op::And(lhs.id, rhs.id)))
    }

    pub fn bitwise_or_int(b: &mut Builder, lhs: RValue<Int>, rhs: RValue<Int>) -> RValue<Int> {
        RValue::from_id(b.emit(Int::TYPE, Op::Or(lhs.id, rhs.id)))
    }

    pub fn not_bool(b: &mut Builder, v: RValue<Bool>) -> RValue<Bool> {
        RValue::from_id(b.emit(Bool::TYPE, Op::Not(v.id)))
    }

    /// Truncating float-to-int conversion (`cvttss2si` on the target ISA),
    /// expressed as a named intrinsic rather than `BitCast` since it
    /// changes the numeric value, not just its type tag.
    pub fn float_to_int(b: &mut Builder, v: RValue<Float>) -> RValue<Int> {
        RValue::from_id(b.emit(Int::TYPE, Op::Intrinsic("f2i", smallvec::smallvec![v.id])))
    }

    pub fn int_to_float(b: &mut Builder, v: RValue<Int>) -> RValue<Float> {
        RValue::from_id(b.emit(Float::TYPE, Op::Intrinsic("i2f", smallvec::smallvec![v.id])))
    }
}

