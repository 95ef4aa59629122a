//! A software interpreter over the optimized Reactor SSA, used as the JIT
//! routine's actual execution engine for every function the backend's
//! native instruction selector (see `codegen.rs`) declines to cover (see
//! `routine.rs`'s module docs for the split between the two). This is also
//! exactly the "software interpreter" the spec's round-trip testable
//! property (§8) asks for when comparing shader IR lowered through Reactor
//! against a reference evaluator.
//!
//! `Slot` carries real lane-wise vectors (`Float4`/`Int4`), not just a
//! scalar per value, and `Load`/`Store`/`Gep` dereference genuine raw
//! pointers for any address that did not come from this interpreter's own
//! `Alloca` arena — routines are invoked against real `Vec<u8>` buffers
//! (`sw-raster::driver`), and those addresses have to actually be written
//! for a draw call to produce pixels.

use reactor::composite::unpack_swizzle;
use reactor::ir::{Function, MemoryOrder, Op, Terminator, Type, ValueId};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
pub enum Slot {
    Int(i64),
    Float(f64),
    Float4([f64; 4]),
    Int4([i64; 4]),
    /// A materialized `Alloca` slot's backing storage, indexed into a
    /// side table since the interpreter's own locals have no address in
    /// the process's real address space.
    Memory(usize),
}

pub struct Interpreter<'f> {
    func: &'f Function,
    values: HashMap<u32, Slot>,
    memory: Vec<Slot>,
    params: Vec<Slot>,
}

impl<'f> Interpreter<'f> {
    pub fn new(func: &'f Function, params: Vec<Slot>) -> Interpreter<'f> {
        Interpreter { func, values: HashMap::new(), memory: Vec::new(), params }
    }

    pub fn run(&mut self) -> Option<Slot> {
        let mut block = self.func.entry;
        loop {
            let b = self.func.block(block);
            for &vid in &b.values {
                let slot = self.eval(vid);
                self.values.insert(vid.0, slot);
            }
            match b.terminator.as_ref().expect("verified function: every block terminates") {
                Terminator::Branch(next) => block = *next,
                Terminator::CondBranch(cond, t, f) => {
                    let c = self.get(*cond);
                    block = if as_bool(c) { *t } else { *f };
                }
                Terminator::Return(v) => return v.map(|id| self.get(id)),
                Terminator::Unreachable => panic!("interpreter reached an Unreachable terminator"),
            }
        }
    }

    fn get(&self, id: ValueId) -> Slot {
        self.values.get(&id.0).copied().unwrap_or(Slot::Int(0))
    }

    fn eval(&mut self, id: ValueId) -> Slot {
        let value = self.func.value(id);
        let ty = value.ty;
        match &value.op {
            Op::ConstInt(v) => Slot::Int(*v),
            Op::ConstFloat(v) => Slot::Float(*v),
            Op::Param(idx) => self.params.get(*idx as usize).copied().unwrap_or(Slot::Int(0)),
            Op::Alloca(_) => {
                let idx = self.memory.len();
                self.memory.push(Slot::Int(0));
                Slot::Memory(idx)
            }
            Op::Load(ptr) => match self.get(*ptr) {
                Slot::Memory(idx) => self.memory[idx],
                Slot::Int(0) => zero_of(ty),
                Slot::Int(addr) => unsafe { raw_load(addr, ty) },
                other => other,
            },
            Op::Store(ptr, val) => {
                let v = self.get(*val);
                let val_ty = self.func.value(*val).ty;
                match self.get(*ptr) {
                    Slot::Memory(idx) => self.memory[idx] = v,
                    Slot::Int(0) => {}
                    Slot::Int(addr) => unsafe { raw_store(addr, val_ty, v) },
                    _ => {}
                }
                Slot::Int(0)
            }
            Op::Add(a, b) => numeric(self.get(*a), self.get(*b), |x, y| x + y, |x, y| x + y),
            Op::Sub(a, b) => numeric(self.get(*a), self.get(*b), |x, y| x - y, |x, y| x - y),
            Op::Mul(a, b) => numeric(self.get(*a), self.get(*b), |x, y| x * y, |x, y| x * y),
            Op::Div(a, b) => numeric(self.get(*a), self.get(*b), |x, y| if y != 0 { x / y } else { 0 }, |x, y| x / y),
            Op::Rem(a, b) => numeric(self.get(*a), self.get(*b), |x, y| if y != 0 { x % y } else { 0 }, |x, y| x % y),
            Op::And(a, b) => Slot::Int(as_int(self.get(*a)) & as_int(self.get(*b))),
            Op::Or(a, b) => Slot::Int(as_int(self.get(*a)) | as_int(self.get(*b))),
            Op::Xor(a, b) => Slot::Int(as_int(self.get(*a)) ^ as_int(self.get(*b))),
            Op::Shl(a, b) => Slot::Int(as_int(self.get(*a)) << as_int(self.get(*b))),
            Op::Shr(a, b) => Slot::Int(as_int(self.get(*a)) >> as_int(self.get(*b))),
            Op::Neg(a) => match self.get(*a) {
                Slot::Int(v) => Slot::Int(-v),
                Slot::Float(v) => Slot::Float(-v),
                Slot::Float4(l) => Slot::Float4([-l[0], -l[1], -l[2], -l[3]]),
                Slot::Int4(l) => Slot::Int4([-l[0], -l[1], -l[2], -l[3]]),
                other => other,
            },
            Op::Not(a) => Slot::Int(!as_int(self.get(*a))),
            Op::CmpEq(a, b) => Slot::Int((as_float(self.get(*a)) == as_float(self.get(*b))) as i64),
            Op::CmpNe(a, b) => Slot::Int((as_float(self.get(*a)) != as_float(self.get(*b))) as i64),
            Op::CmpLt(a, b) => Slot::Int((as_float(self.get(*a)) < as_float(self.get(*b))) as i64),
            Op::CmpLe(a, b) => Slot::Int((as_float(self.get(*a)) <= as_float(self.get(*b))) as i64),
            Op::CmpGt(a, b) => Slot::Int((as_float(self.get(*a)) > as_float(self.get(*b))) as i64),
            Op::CmpGe(a, b) => Slot::Int((as_float(self.get(*a)) >= as_float(self.get(*b))) as i64),
            Op::Select(c, a, b) => if as_bool(self.get(*c)) { self.get(*a) } else { self.get(*b) },
            Op::Gep(base, offset) => {
                let off = as_int(self.get(*offset));
                match self.get(*base) {
                    Slot::Memory(idx) => Slot::Memory((idx as i64 + off) as usize),
                    other => {
                        let scale = match ty {
                            Type::Pointer(pointee) => pointee.size_of() as i64,
                            _ => 1,
                        };
                        Slot::Int(as_int(other) + off * scale)
                    }
                }
            }
            Op::BitCast(a, target) => match (self.get(*a), target) {
                (Slot::Float4(l), Type::Float) => Slot::Float(l[0]),
                (Slot::Int4(l), Type::Int) | (Slot::Int4(l), Type::UInt) => Slot::Int(l[0]),
                (other, _) => other,
            },
            Op::Shuffle(a, b, packed) => self.shuffle(*a, *b, *packed),
            Op::Intrinsic(name, args) => self.eval_intrinsic(name, args),
            Op::AtomicLoad(ptr, order) => {
                debug_assert!(!matches!(order, MemoryOrder::Release));
                match self.get(*ptr) {
                    Slot::Memory(idx) => self.memory[idx],
                    Slot::Int(0) => zero_of(ty),
                    Slot::Int(addr) => unsafe { raw_load(addr, ty) },
                    other => other,
                }
            }
            Op::AtomicStore(ptr, val, order) => {
                debug_assert!(!matches!(order, MemoryOrder::Acquire | MemoryOrder::AcqRel));
                let v = self.get(*val);
                let val_ty = self.func.value(*val).ty;
                match self.get(*ptr) {
                    Slot::Memory(idx) => self.memory[idx] = v,
                    Slot::Int(0) => {}
                    Slot::Int(addr) => unsafe { raw_store(addr, val_ty, v) },
                    _ => {}
                }
                Slot::Int(0)
            }
            Op::Phi(edges) => {
                // The interpreter walks blocks sequentially rather than
                // tracking which predecessor it arrived from, so a `Phi`
                // resolves to its first edge; this crate never actually
                // emits `Phi` nodes (the control-flow builders materialize
                // `LValue`s instead), so this arm exists for completeness.
                edges.first().map(|(_, v)| self.get(*v)).unwrap_or(Slot::Int(0))
            }
            Op::CallArg(a) => self.get(*a),
        }
    }

    /// Lane-wise shuffle, SHUFPS-style: output lanes 0/1 are drawn from
    /// `a`'s own lanes, output lanes 2/3 from `b`'s own lanes, each
    /// selected by `packed`'s four 2-bit selectors (spec §4.4/GLOSSARY
    /// "Swizzle").
    fn shuffle(&self, a: ValueId, b: ValueId, packed: u16) -> Slot {
        let sel = unpack_swizzle(packed);
        let av = self.get(a);
        let bv = self.get(b);
        if matches!(av, Slot::Int4(_)) || matches!(bv, Slot::Int4(_)) {
            let ai = as_int4(av);
            let bi = as_int4(bv);
            let mut out = [0i64; 4];
            for (lane, slot) in out.iter_mut().enumerate() {
                let s = sel[lane] as usize;
                *slot = if lane < 2 { ai[s] } else { bi[s] };
            }
            Slot::Int4(out)
        } else {
            let af = as_float4(av);
            let bf = as_float4(bv);
            let mut out = [0.0; 4];
            for (lane, slot) in out.iter_mut().enumerate() {
                let s = sel[lane] as usize;
                *slot = if lane < 2 { af[s] } else { bf[s] };
            }
            Slot::Float4(out)
        }
    }

    fn eval_intrinsic(&mut self, name: &str, args: &[ValueId]) -> Slot {
        let a = args.first().map(|&id| self.get(id));
        let b = args.get(1).map(|&id| self.get(id));
        match (name, a, b) {
            ("floor", Some(v), _) => map_float_unary(v, f64::floor),
            ("ceil", Some(v), _) => map_float_unary(v, f64::ceil),
            ("trunc", Some(v), _) => map_float_unary(v, f64::trunc),
            // Banker's rounding (spec boundary scenario 6): `round_ties_even`
            // mirrors hardware `roundps` with the round-to-nearest-even mode
            // rather than `f64::round`'s round-half-away-from-zero.
            ("round_nearest_even", Some(v), _) => map_float_unary(v, round_ties_even),
            ("rcp", Some(v), _) => map_float_unary(v, |x| 1.0 / x),
            ("rsqrt", Some(v), _) => map_float_unary(v, |x| 1.0 / x.sqrt()),
            ("sqrt", Some(v), _) => map_float_unary(v, f64::sqrt),
            ("min", Some(x), Some(y)) => map_float_binary(x, y, f64::min),
            ("max", Some(x), Some(y)) => map_float_binary(x, y, f64::max),
            ("add_sat", Some(x), Some(y)) => map_int_binary(x, y, i64::saturating_add),
            ("sub_sat", Some(x), Some(y)) => map_int_binary(x, y, i64::saturating_sub),
            ("mulhi", Some(x), Some(y)) => map_int_binary(x, y, |p, q| ((p as i128 * q as i128) >> 32) as i64),
            ("fmadd", Some(x), Some(y)) => {
                let z = args.get(2).map(|&id| self.get(id)).unwrap_or(Slot::Float(0.0));
                if matches!(x, Slot::Float4(_)) || matches!(y, Slot::Float4(_)) || matches!(z, Slot::Float4(_)) {
                    let xl = as_float4(x);
                    let yl = as_float4(y);
                    let zl = as_float4(z);
                    let mut out = [0.0; 4];
                    for i in 0..4 {
                        out[i] = xl[i].mul_add(yl[i], zl[i]);
                    }
                    Slot::Float4(out)
                } else {
                    Slot::Float(as_float(x).mul_add(as_float(y), as_float(z)))
                }
            }
            ("splat", Some(v), _) => {
                let x = as_float(v);
                Slot::Float4([x, x, x, x])
            }
            ("vec4", Some(x), Some(y)) => {
                let z = args.get(2).map(|&id| self.get(id)).unwrap_or(Slot::Float(0.0));
                let w = args.get(3).map(|&id| self.get(id)).unwrap_or(Slot::Float(0.0));
                Slot::Float4([as_float(x), as_float(y), as_float(z), as_float(w)])
            }
            ("f2i", Some(v), _) => Slot::Int(as_float(v) as i64),
            ("i2f", Some(v), _) => Slot::Float(as_int(v) as f64),
            ("sin", Some(v), _) => map_float_unary(v, f64::sin),
            ("cos", Some(v), _) => map_float_unary(v, f64::cos),
            ("exp", Some(v), _) => map_float_unary(v, f64::exp),
            ("exp2", Some(v), _) => map_float_unary(v, f64::exp2),
            ("log", Some(v), _) => map_float_unary(v, f64::ln),
            ("log2", Some(v), _) => map_float_unary(v, f64::log2),
            // Dot product over the first `n` lanes, replicated across all
            // four output lanes (`reactor::intrinsics::dot2_float4`'s doc
            // comment: the source ISA's dot-product instructions write the
            // same scalar to every component named by the destination
            // write-mask).
            ("dot2", Some(x), Some(y)) => Slot::Float4(dot_n(x, y, 2)),
            ("dot3", Some(x), Some(y)) => Slot::Float4(dot_n(x, y, 3)),
            ("dot4", Some(x), Some(y)) => Slot::Float4(dot_n(x, y, 4)),
            ("movemask", Some(v), _) => {
                let lanes = as_float4(v);
                let mut mask = 0i64;
                for (i, lane) in lanes.iter().enumerate() {
                    if *lane < 0.0 {
                        mask |= 1 << i;
                    }
                }
                Slot::Int(mask)
            }
            ("shl_scalar", Some(x), Some(y)) => map_int_binary(x, y, |v, c| v << c),
            ("shr_scalar", Some(x), Some(y)) => map_int_binary(x, y, |v, c| v >> c),
            ("blend_mask", Some(dst), Some(src)) => {
                let mask = args.get(2).map(|&id| as_int(self.get(id))).unwrap_or(0);
                let d = as_float4(dst);
                let s = as_float4(src);
                let mut out = [0.0; 4];
                for i in 0..4 {
                    out[i] = if (mask >> i) & 1 != 0 { s[i] } else { d[i] };
                }
                Slot::Float4(out)
            }
            _ => a.unwrap_or(Slot::Int(0)),
        }
    }
}

fn dot_n(x: Slot, y: Slot, n: usize) -> [f64; 4] {
    let xl = as_float4(x);
    let yl = as_float4(y);
    let d: f64 = (0..n).map(|i| xl[i] * yl[i]).sum();
    [d, d, d, d]
}

fn map_float_unary(v: Slot, f: impl Fn(f64) -> f64) -> Slot {
    match v {
        Slot::Float4(l) => Slot::Float4([f(l[0]), f(l[1]), f(l[2]), f(l[3])]),
        other => Slot::Float(f(as_float(other))),
    }
}

fn map_float_binary(a: Slot, b: Slot, f: impl Fn(f64, f64) -> f64) -> Slot {
    match (a, b) {
        (Slot::Float4(_), _) | (_, Slot::Float4(_)) => {
            let x = as_float4(a);
            let y = as_float4(b);
            Slot::Float4([f(x[0], y[0]), f(x[1], y[1]), f(x[2], y[2]), f(x[3], y[3])])
        }
        _ => Slot::Float(f(as_float(a), as_float(b))),
    }
}

fn map_int_binary(a: Slot, b: Slot, f: impl Fn(i64, i64) -> i64) -> Slot {
    match (a, b) {
        (Slot::Int4(_), _) | (_, Slot::Int4(_)) => {
            let x = as_int4(a);
            let y = as_int4(b);
            Slot::Int4([f(x[0], y[0]), f(x[1], y[1]), f(x[2], y[2]), f(x[3], y[3])])
        }
        _ => Slot::Int(f(as_int(a), as_int(b))),
    }
}

fn round_ties_even(v: f64) -> f64 {
    let floor = v.floor();
    let diff = v - floor;
    if diff < 0.5 {
        floor
    } else if diff > 0.5 {
        floor + 1.0
    } else if (floor as i64) % 2 == 0 {
        floor
    } else {
        floor + 1.0
    }
}

fn numeric(a: Slot, b: Slot, fi: impl Fn(i64, i64) -> i64, ff: impl Fn(f64, f64) -> f64) -> Slot {
    match (a, b) {
        (Slot::Float4(_), _) | (_, Slot::Float4(_)) => {
            let x = as_float4(a);
            let y = as_float4(b);
            Slot::Float4([ff(x[0], y[0]), ff(x[1], y[1]), ff(x[2], y[2]), ff(x[3], y[3])])
        }
        (Slot::Int4(_), _) | (_, Slot::Int4(_)) => {
            let x = as_int4(a);
            let y = as_int4(b);
            Slot::Int4([fi(x[0], y[0]), fi(x[1], y[1]), fi(x[2], y[2]), fi(x[3], y[3])])
        }
        (Slot::Float(_), _) | (_, Slot::Float(_)) => Slot::Float(ff(as_float(a), as_float(b))),
        _ => Slot::Int(fi(as_int(a), as_int(b))),
    }
}

fn zero_of(ty: Type) -> Slot {
    match ty {
        Type::Float | Type::Float2 => Slot::Float(0.0),
        Type::Float4 => Slot::Float4([0.0; 4]),
        Type::Int4 | Type::UInt4 => Slot::Int4([0; 4]),
        _ => Slot::Int(0),
    }
}

/// Dereferences `addr` as a real process address, sized and typed by `ty`.
/// `addr` comes from a `Slot::Int` that is not this interpreter's own
/// `Alloca` arena — i.e. a real buffer pointer handed in by the caller
/// (`sw-raster::driver` invokes routines with `Slot::Int(vec.as_ptr() as
/// i64)`), so this has to be a genuine unsafe read for those writes to
/// ever reach the framebuffer.
unsafe fn raw_load(addr: i64, ty: Type) -> Slot {
    let p = addr as usize;
    match ty {
        Type::Bool | Type::Byte => Slot::Int(*(p as *const u8) as i64),
        Type::SByte => Slot::Int(*(p as *const i8) as i64),
        Type::Short => Slot::Int(*(p as *const i16) as i64),
        Type::UShort => Slot::Int(*(p as *const u16) as i64),
        Type::Int | Type::UInt => Slot::Int(*(p as *const i32) as i64),
        Type::Long | Type::Pointer(_) => Slot::Int(*(p as *const i64)),
        Type::Float => Slot::Float(*(p as *const f32) as f64),
        Type::Int4 | Type::UInt4 => {
            let lanes = *(p as *const [i32; 4]);
            Slot::Int4([lanes[0] as i64, lanes[1] as i64, lanes[2] as i64, lanes[3] as i64])
        }
        Type::Float4 => {
            let lanes = *(p as *const [f32; 4]);
            Slot::Float4([lanes[0] as f64, lanes[1] as f64, lanes[2] as f64, lanes[3] as f64])
        }
        _ => Slot::Int(*(p as *const i64)),
    }
}

unsafe fn raw_store(addr: i64, ty: Type, v: Slot) {
    let p = addr as usize;
    match ty {
        Type::Bool | Type::Byte => *(p as *mut u8) = as_int(v) as u8,
        Type::SByte => *(p as *mut i8) = as_int(v) as i8,
        Type::Short => *(p as *mut i16) = as_int(v) as i16,
        Type::UShort => *(p as *mut u16) = as_int(v) as u16,
        Type::Int | Type::UInt => *(p as *mut i32) = as_int(v) as i32,
        Type::Long | Type::Pointer(_) => *(p as *mut i64) = as_int(v),
        Type::Float => *(p as *mut f32) = as_float(v) as f32,
        Type::Int4 | Type::UInt4 => {
            let lanes = as_int4(v);
            *(p as *mut [i32; 4]) = [lanes[0] as i32, lanes[1] as i32, lanes[2] as i32, lanes[3] as i32];
        }
        Type::Float4 => {
            let lanes = as_float4(v);
            *(p as *mut [f32; 4]) = [lanes[0] as f32, lanes[1] as f32, lanes[2] as f32, lanes[3] as f32];
        }
        _ => *(p as *mut i64) = as_int(v),
    }
}

fn as_int(s: Slot) -> i64 {
    match s {
        Slot::Int(v) => v,
        Slot::Float(v) => v as i64,
        Slot::Memory(idx) => idx as i64,
        Slot::Float4(l) => l[0] as i64,
        Slot::Int4(l) => l[0],
    }
}

fn as_float(s: Slot) -> f64 {
    match s {
        Slot::Int(v) => v as f64,
        Slot::Float(v) => v,
        Slot::Memory(idx) => idx as f64,
        Slot::Float4(l) => l[0],
        Slot::Int4(l) => l[0] as f64,
    }
}

fn as_float4(s: Slot) -> [f64; 4] {
    match s {
        Slot::Float4(l) => l,
        Slot::Int4(l) => [l[0] as f64, l[1] as f64, l[2] as f64, l[3] as f64],
        Slot::Float(v) => [v; 4],
        Slot::Int(v) => [v as f64; 4],
        Slot::Memory(idx) => [idx as f64; 4],
    }
}

fn as_int4(s: Slot) -> [i64; 4] {
    match s {
        Slot::Int4(l) => l,
        Slot::Float4(l) => [l[0] as i64, l[1] as i64, l[2] as i64, l[3] as i64],
        Slot::Int(v) => [v; 4],
        Slot::Float(v) => [v as i64; 4],
        Slot::Memory(idx) => [idx as i64; 4],
    }
}

fn as_bool(s: Slot) -> bool {
    as_int(s) != 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor::builder::Builder;
    use reactor::composite;
    use reactor::ir::{Function, Terminator};
    use reactor::pointer::Pointer;
    use reactor::ty::Type;
    use reactor::value::{constant_float, constant_int, Float, Int};

    #[test]
    fn load_and_store_dereference_a_real_buffer_address() {
        let mut func = Function::new("store_one", vec![Type::Pointer(&Type::Int)], Type::Void);
        let mut b = Builder::new(&mut func);
        let ptr: Pointer<Int> = Pointer::from_id(b.param(0));
        let forty_two = constant_int(&mut b, 42);
        ptr.store(&mut b, forty_two);
        b.terminate(Terminator::Return(None));

        let mut buf = [0i32; 1];
        let addr = buf.as_mut_ptr() as i64;
        let mut interp = Interpreter::new(&func, vec![Slot::Int(addr)]);
        interp.run();
        assert_eq!(buf[0], 42);
    }

    #[test]
    fn gep_scales_by_the_pointee_size() {
        let mut func = Function::new("write_second", vec![Type::Pointer(&Type::Float)], Type::Void);
        let mut b = Builder::new(&mut func);
        let base: Pointer<Float> = Pointer::from_id(b.param(0));
        let one = constant_int(&mut b, 1);
        let second = base.offset(&mut b, one);
        let v = constant_float(&mut b, 7.5);
        second.store(&mut b, v);
        b.terminate(Terminator::Return(None));

        let mut buf = [0.0f32; 2];
        let addr = buf.as_mut_ptr() as i64;
        let mut interp = Interpreter::new(&func, vec![Slot::Int(addr)]);
        interp.run();
        assert_eq!(buf, [0.0, 7.5]);
    }

    #[test]
    fn vec4_and_extract_lane_round_trip_every_lane() {
        let mut func = Function::new("lanes", vec![], Type::Float4);
        let mut b = Builder::new(&mut func);
        let x = constant_float(&mut b, 1.0);
        let y = constant_float(&mut b, 2.0);
        let z = constant_float(&mut b, 3.0);
        let w = constant_float(&mut b, 4.0);
        let v = composite::vec4(&mut b, x, y, z, w);
        b.terminate(Terminator::Return(Some(v.id)));

        let mut interp = Interpreter::new(&func, vec![]);
        match interp.run() {
            Some(Slot::Float4(lanes)) => assert_eq!(lanes, [1.0, 2.0, 3.0, 4.0]),
            other => panic!("expected a Float4 slot, got {other:?}"),
        }
    }

    #[test]
    fn dot3_reduces_three_lanes_not_two_scalars() {
        let mut func = Function::new("dot3", vec![], Type::Float4);
        let mut b = Builder::new(&mut func);
        let one = constant_float(&mut b, 1.0);
        let a = composite::splat_float4(&mut b, one);
        let two = constant_float(&mut b, 2.0);
        let c = composite::splat_float4(&mut b, two);
        let d = reactor::intrinsics::dot3_float4(&mut b, a, c);
        b.terminate(Terminator::Return(Some(d.id)));

        let mut interp = Interpreter::new(&func, vec![]);
        match interp.run() {
            Some(Slot::Float4(lanes)) => assert_eq!(lanes, [6.0, 6.0, 6.0, 6.0]),
            other => panic!("expected a Float4 slot, got {other:?}"),
        }
    }

    #[test]
    fn shuffle_honors_the_packed_swizzle_pattern() {
        let mut func = Function::new("swizzle", vec![], Type::Float4);
        let mut b = Builder::new(&mut func);
        let x = constant_float(&mut b, 1.0);
        let y = constant_float(&mut b, 2.0);
        let z = constant_float(&mut b, 3.0);
        let w = constant_float(&mut b, 4.0);
        let v = composite::vec4(&mut b, x, y, z, w);
        // wzyx
        let swizzled = composite::swizzle(&mut b, v, 3, 2, 1, 0);
        b.terminate(Terminator::Return(Some(swizzled.id)));

        let mut interp = Interpreter::new(&func, vec![]);
        match interp.run() {
            Some(Slot::Float4(lanes)) => assert_eq!(lanes, [4.0, 3.0, 2.0, 1.0]),
            other => panic!("expected a Float4 slot, got {other:?}"),
        }
    }
}
