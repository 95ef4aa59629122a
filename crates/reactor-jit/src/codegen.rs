//! A minimal real x86-64 instruction selector (spec §4.5 step 3): given a
//! `Function` narrow enough to fit a hand-written selector authored
//! without a build/test loop, emits a genuine machine-code function body
//! System V AMD64 callers can invoke directly. Everything outside this
//! narrow subset (multi-block control flow, vector types, loads/stores,
//! intrinsics) still runs through `interp.rs`'s tree-walking interpreter;
//! `routine.rs` picks whichever path `try_select` accepted.
//!
//! The subset: a single basic block, `Int`-typed values only, at most six
//! parameters (the number of System V integer argument registers), at
//! most [`MAX_VALUES`] values (so every value's spill slot fits an `i8`
//! displacement off `rbp`), and an op list limited to `ConstInt`, `Param`,
//! `Add`, `Sub`, `Mul`, `Neg`, terminated by `Return`. Every SSA value
//! gets its own 8-byte stack slot — no register allocation — which keeps
//! the encoder small enough to hand-verify against the System V ABI and
//! the Intel SDM's encoding tables.

use reactor::ir::{BasicBlock, Function, Op, Terminator};
use reactor::ty::Type;

/// Bounds every value's `rbp`-relative spill slot to a single signed byte
/// displacement (`-96` at the cap, well inside `i8`'s `-128..=127`).
const MAX_VALUES: usize = 12;

/// System V AMD64 integer argument registers in order, as `(low 3 bits,
/// needs REX.R)` — `r8`/`r9` are register numbers 8/9, whose low 3 bits
/// collide with `rax`/`rcx` and need the REX.R extension bit to disambiguate.
const ARG_REGS: [(u8, bool); 6] = [(7, false), (6, false), (2, false), (1, false), (0, true), (1, true)];

fn is_eligible(func: &Function) -> bool {
    if func.blocks.len() != 1 {
        return false;
    }
    if func.params.len() > ARG_REGS.len() {
        return false;
    }
    if func.params.iter().any(|t| !matches!(t, Type::Int)) {
        return false;
    }
    if !matches!(func.return_type, Type::Int | Type::Void) {
        return false;
    }
    let block = &func.blocks[0];
    if block.values.len() > MAX_VALUES {
        return false;
    }
    for &id in &block.values {
        let v = func.value(id);
        if !matches!(v.ty, Type::Int) {
            return false;
        }
        match &v.op {
            Op::ConstInt(_) | Op::Param(_) | Op::Add(_, _) | Op::Sub(_, _) | Op::Mul(_, _) | Op::Neg(_) => {}
            _ => return false,
        }
    }
    matches!(&block.terminator, Some(Terminator::Return(_)))
}

fn slot_of(block: &BasicBlock, id: reactor::ir::ValueId) -> usize {
    block.values.iter().position(|&v| v == id).expect("operand defined earlier in the same block")
}

/// `-((slot + 1) * 8)` as a twos-complement displacement byte.
fn disp(slot: usize) -> u8 {
    (-(((slot + 1) * 8) as i64) as i8) as u8
}

fn emit_load(code: &mut Vec<u8>, dst_low3: u8, slot: usize) {
    // `mov dst, [rbp+disp8]` — opcode 0x8B /r, mod=01 (disp8), rm=101 (rbp).
    code.extend_from_slice(&[0x48, 0x8B, 0b0100_0101 | (dst_low3 << 3), disp(slot)]);
}

fn emit_store_reg(code: &mut Vec<u8>, src_low3: u8, needs_rex_r: bool, slot: usize) {
    // `mov [rbp+disp8], src` — opcode 0x89 /r, mod=01, rm=101 (rbp).
    let rex = 0x48 | if needs_rex_r { 0x04 } else { 0 };
    code.extend_from_slice(&[rex, 0x89, 0b0100_0101 | (src_low3 << 3), disp(slot)]);
}

/// Emits one System V AMD64 function body for `func`, or `None` if it
/// falls outside the subset `is_eligible` accepts. Parameters arrive in
/// `rdi, rsi, rdx, rcx, r8, r9`; the result (or 0 for a `Void` return)
/// comes back in `rax`.
pub fn try_select(func: &Function) -> Option<Vec<u8>> {
    if !is_eligible(func) {
        return None;
    }
    let block = &func.blocks[0];
    let stack_size = (((block.values.len() * 8) + 15) / 16 * 16) as i32;

    let mut code = Vec::new();
    code.push(0x55); // push rbp
    code.extend_from_slice(&[0x48, 0x89, 0xE5]); // mov rbp, rsp
    if stack_size > 0 {
        code.extend_from_slice(&[0x48, 0x81, 0xEC]);
        code.extend_from_slice(&stack_size.to_le_bytes());
    }

    for (slot, &id) in block.values.iter().enumerate() {
        let v = func.value(id);
        match &v.op {
            Op::Param(i) => {
                let (low3, needs_r) = ARG_REGS[*i as usize];
                emit_store_reg(&mut code, low3, needs_r, slot);
            }
            Op::ConstInt(c) => {
                code.extend_from_slice(&[0x48, 0xB8]); // mov rax, imm64
                code.extend_from_slice(&c.to_le_bytes());
                emit_store_reg(&mut code, 0, false, slot);
            }
            Op::Add(a, c) => {
                emit_load(&mut code, 0, slot_of(block, *a)); // rax = a
                emit_load(&mut code, 1, slot_of(block, *c)); // rcx = c
                code.extend_from_slice(&[0x48, 0x01, 0xC8]); // rax += rcx
                emit_store_reg(&mut code, 0, false, slot);
            }
            Op::Sub(a, c) => {
                emit_load(&mut code, 0, slot_of(block, *a));
                emit_load(&mut code, 1, slot_of(block, *c));
                code.extend_from_slice(&[0x48, 0x29, 0xC8]); // rax -= rcx
                emit_store_reg(&mut code, 0, false, slot);
            }
            Op::Mul(a, c) => {
                emit_load(&mut code, 0, slot_of(block, *a));
                emit_load(&mut code, 1, slot_of(block, *c));
                code.extend_from_slice(&[0x48, 0x0F, 0xAF, 0xC1]); // rax *= rcx
                emit_store_reg(&mut code, 0, false, slot);
            }
            Op::Neg(a) => {
                emit_load(&mut code, 0, slot_of(block, *a));
                code.extend_from_slice(&[0x48, 0xF7, 0xD8]); // neg rax
                emit_store_reg(&mut code, 0, false, slot);
            }
            _ => unreachable!("is_eligible already rejected this op"),
        }
    }

    match &block.terminator {
        Some(Terminator::Return(Some(id))) => emit_load(&mut code, 0, slot_of(block, *id)),
        Some(Terminator::Return(None)) => code.extend_from_slice(&[0x48, 0x31, 0xC0]), // xor rax, rax
        _ => unreachable!("is_eligible already required a Return terminator"),
    }
    code.push(0xC9); // leave
    code.push(0xC3); // ret
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reactor::builder::Builder;
    use reactor::ir::Terminator;

    #[test]
    fn rejects_a_multi_block_function() {
        let mut func = Function::new("branchy", vec![Type::Int], Type::Bool);
        let mut b = Builder::new(&mut func);
        let p = b.param(0);
        let other = b.create_block();
        b.terminate(Terminator::Branch(other));
        b.switch_to(other);
        b.terminate(Terminator::Return(Some(p)));
        assert!(try_select(&func).is_none());
    }

    #[test]
    fn rejects_an_unsupported_opcode() {
        let mut func = Function::new("divider", vec![Type::Int, Type::Int], Type::Int);
        let mut b = Builder::new(&mut func);
        let a = b.param(0);
        let c = b.param(1);
        let q = b.emit(Type::Int, Op::Div(a, c));
        b.terminate(Terminator::Return(Some(q)));
        assert!(try_select(&func).is_none());
    }

    #[test]
    fn accepts_a_straight_line_arithmetic_function() {
        let mut func = Function::new("poly", vec![Type::Int, Type::Int], Type::Int);
        let mut b = Builder::new(&mut func);
        let x = b.param(0);
        let y = b.param(1);
        let sum = b.emit(Type::Int, Op::Add(x, y));
        let doubled = b.emit(Type::Int, Op::Mul(sum, sum));
        let negated = b.emit(Type::Int, Op::Neg(doubled));
        b.terminate(Terminator::Return(Some(negated)));
        let code = try_select(&func).expect("straight-line Int arithmetic is in the selected subset");
        assert_eq!(*code.last().unwrap(), 0xC3);
        assert_eq!(code[0], 0x55);
    }

    #[test]
    fn rejects_functions_with_too_many_values_to_spill_within_a_disp8() {
        let mut func = Function::new("wide", vec![Type::Int], Type::Int);
        let mut b = Builder::new(&mut func);
        let mut v = b.param(0);
        for _ in 0..(MAX_VALUES + 1) {
            v = b.emit(Type::Int, Op::Add(v, v));
        }
        b.terminate(Terminator::Return(Some(v)));
        assert!(try_select(&func).is_none());
    }
}
