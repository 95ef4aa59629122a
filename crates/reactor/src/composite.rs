//! Lane-wise composite types (`Float4`, `Int4`) and their swizzle algebra
//! (spec §4.4/§9). A swizzle pattern selects any 4-of-4 lanes from one or
//! two source vectors; it is packed into a 16-bit constant, 2 bits per
//! lane, **lane 0 in the high nibble** (spec's GLOSSARY entry for
//! "Swizzle").

use crate::builder::Builder;
use crate::ir::{Op, Type, ValueId};
use crate::value::{Float, Float4, Int4, RValue};

/// One lane selector, 0..=3.
pub type Lane = u8;

/// Packs four lane selectors into the 16-bit constant the IR's `Shuffle`
/// op carries: lane 0 occupies bits 14..16 (the high nibble pair), lane 3
/// occupies bits 0..2.
pub fn pack_swizzle(l0: Lane, l1: Lane, l2: Lane, l3: Lane) -> u16 {
    ((l0 as u16 & 0b11) << 14) | ((l1 as u16 & 0b11) << 12) | ((l2 as u16 & 0b11) << 10) | ((l3 as u16 & 0b11) << 8)
}

pub fn unpack_swizzle(packed: u16) -> [Lane; 4] {
    [
        ((packed >> 14) & 0b11) as Lane,
        ((packed >> 12) & 0b11) as Lane,
        ((packed >> 10) & 0b11) as Lane,
        ((packed >> 8) & 0b11) as Lane,
    ]
}

/// Parses a GLSL-style swizzle mnemonic (`"xyzw"`, `"rgba"`, `"stpq"`) into
/// lane indices, matching the parser-side helper in `sw-shader-ir` but
/// kept independent since Reactor has no dependency on the shading
/// language crates.
pub fn lanes_from_mnemonic(pattern: &str) -> [Lane; 4] {
    let mut out = [0u8; 4];
    let chars: Vec<char> = pattern.chars().collect();
    for i in 0..4 {
        let c = *chars.get(i.min(chars.len().saturating_sub(1))).unwrap_or(&'x');
        out[i] = match c {
            'x' | 'r' | 's' => 0,
            'y' | 'g' | 't' => 1,
            'z' | 'b' | 'p' => 2,
            'w' | 'a' | 'q' => 3,
            _ => 0,
        };
    }
    out
}

/// Reads an arbitrary 4-of-4 swizzle of `v` (single-source shuffle: both
/// shuffle operands are the same value).
pub fn swizzle(b: &mut Builder, v: RValue<Float4>, l0: Lane, l1: Lane, l2: Lane, l3: Lane) -> RValue<Float4> {
    let packed = pack_swizzle(l0, l1, l2, l3);
    RValue::from_id(b.emit(Type::Float4, Op::Shuffle(v.id, v.id, packed)))
}

pub fn swizzle_int4(b: &mut Builder, v: RValue<Int4>, l0: Lane, l1: Lane, l2: Lane, l3: Lane) -> RValue<Int4> {
    let packed = pack_swizzle(l0, l1, l2, l3);
    RValue::from_id(b.emit(Type::Int4, Op::Shuffle(v.id, v.id, packed)))
}

/// Shuffles between two source vectors `a` and `c`: each output lane takes
/// its packed index from whichever of `a`/`c` the backend's shuffle
/// lowering resolves it against (spec §4.4 "shuffles between two
/// vectors").
pub fn shuffle(b: &mut Builder, a: RValue<Float4>, c: RValue<Float4>, l0: Lane, l1: Lane, l2: Lane, l3: Lane) -> RValue<Float4> {
    let packed = pack_swizzle(l0, l1, l2, l3);
    RValue::from_id(b.emit(Type::Float4, Op::Shuffle(a.id, c.id, packed)))
}

/// Masked write: `dst`'s lanes named by `mask` (bit i = lane i) take their
/// value from `src`'s matching lane; the rest keep `dst`'s existing value.
/// Implemented as a `Select` per lane composed through a shuffle of a
/// lane-mask constant — represented here as a dedicated intrinsic so the
/// backend can lower it to a single blend instruction on targets that have
/// one (spec §4.4 "masked writes").
pub fn masked_write(b: &mut Builder, dst: RValue<Float4>, src: RValue<Float4>, mask: u8) -> RValue<Float4> {
    let args: smallvec::SmallVec<[ValueId; 4]> = smallvec::smallvec![dst.id, src.id, b.emit(Type::Int, Op::ConstInt(mask as i64))];
    RValue::from_id(b.emit(Type::Float4, Op::Intrinsic("blend_mask", args)))
}

/// Broadcasts a scalar into all four lanes of a `Float4`.
pub fn splat_float4(b: &mut Builder, v: crate::value::RValue<crate::value::Float>) -> RValue<Float4> {
    let args: smallvec::SmallVec<[ValueId; 4]> = smallvec::smallvec![v.id];
    RValue::from_id(b.emit(Type::Float4, Op::Intrinsic("splat", args)))
}

/// Assembles four independent scalars into one `Float4`, lane 0 = `x`.
/// Used wherever a vector is built up component-by-component rather than
/// read back from a register (constant-pool rows, plane equation triples).
pub fn vec4(
    b: &mut Builder,
    x: crate::value::RValue<crate::value::Float>,
    y: crate::value::RValue<crate::value::Float>,
    z: crate::value::RValue<crate::value::Float>,
    w: crate::value::RValue<crate::value::Float>,
) -> RValue<Float4> {
    let args: smallvec::SmallVec<[ValueId; 4]> = smallvec::smallvec![x.id, y.id, z.id, w.id];
    RValue::from_id(b.emit(Type::Float4, Op::Intrinsic("vec4", args)))
}

/// Reads a single lane of `v` out as a scalar `Float`: swizzles it to every
/// lane, then reinterprets lane 0's bits as a scalar (exact, since every
/// lane now holds the same value).
pub fn extract_lane(b: &mut Builder, v: RValue<Float4>, lane: Lane) -> RValue<Float> {
    let broadcast = swizzle(b, v, lane, lane, lane, lane);
    RValue::from_id(b.emit(Type::Float, Op::BitCast(broadcast.id, Type::Float)))
}
