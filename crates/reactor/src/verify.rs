//! A debug-only structural verifier (SPEC_FULL §4.4 addition): checks that
//! every value read is produced by a dominating block and that every
//! store's operand type matches the slot's declared type. Runs even when
//! `reactor-jit`'s own (heavier) verifier is disabled, so a builder bug is
//! caught close to the call site that introduced it rather than deep in
//! backend lowering.

use crate::ir::{BlockId, Function, Op, Terminator};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("block {0:?} has no terminator")]
    MissingTerminator(BlockId),
    #[error("value in block {0:?} reads an operand not dominated by its definition")]
    UseBeforeDef(BlockId),
    #[error("store target type does not match the stored value's type in block {0:?}")]
    StoreTypeMismatch(BlockId),
}

/// Computes, for each block, the set of blocks that dominate it by a
/// straightforward fixed-point iteration (routines are small — spec §3
/// caps locals at a few hundred — so the O(n²) iteration terminates in
/// practice within a handful of passes).
fn dominators(func: &Function) -> Vec<HashSet<BlockId>> {
    let n = func.blocks.len();
    let all: HashSet<BlockId> = func.blocks.iter().map(|b| b.id).collect();
    let mut dom: Vec<HashSet<BlockId>> = vec![all.clone(); n];
    dom[func.entry.0 as usize] = [func.entry].into_iter().collect();

    let mut changed = true;
    while changed {
        changed = false;
        for block in &func.blocks {
            if block.id == func.entry {
                continue;
            }
            if block.predecessors.is_empty() {
                continue;
            }
            let mut new_dom: HashSet<BlockId> = block
                .predecessors
                .iter()
                .map(|p| dom[p.0 as usize].clone())
                .reduce(|a, b| a.intersection(&b).copied().collect())
                .unwrap_or_else(|| all.clone());
            new_dom.insert(block.id);
            if new_dom != dom[block.id.0 as usize] {
                dom[block.id.0 as usize] = new_dom;
                changed = true;
            }
        }
    }
    dom
}

pub fn verify(func: &Function) -> Result<(), VerifyError> {
    for block in &func.blocks {
        if block.terminator.is_none() {
            return Err(VerifyError::MissingTerminator(block.id));
        }
    }

    let dom = dominators(func);
    let block_of_value = |idx: u32| -> Option<BlockId> {
        func.blocks.iter().find(|b| b.values.iter().any(|v| v.0 == idx)).map(|b| b.id)
    };

    for block in &func.blocks {
        for &vid in &block.values {
            let value = func.value(vid);
            let operands = operand_ids(&value.op);
            for op_id in operands {
                if let Some(def_block) = block_of_value(op_id.0) {
                    if !dom[block.id.0 as usize].contains(&def_block) && def_block != block.id {
                        return Err(VerifyError::UseBeforeDef(block.id));
                    }
                }
            }
            if let Op::Store(slot, val) = &value.op {
                let slot_ty = func.value(*slot).ty;
                let val_ty = func.value(*val).ty;
                if let crate::ir::Type::Pointer(pointee) = slot_ty {
                    if *pointee != val_ty {
                        return Err(VerifyError::StoreTypeMismatch(block.id));
                    }
                }
            }
        }
        if let Some(Terminator::CondBranch(cond, _, _)) = &block.terminator {
            if let Some(def_block) = block_of_value(cond.0) {
                if !dom[block.id.0 as usize].contains(&def_block) && def_block != block.id {
                    return Err(VerifyError::UseBeforeDef(block.id));
                }
            }
        }
    }
    Ok(())
}

fn operand_ids(op: &Op) -> Vec<crate::ir::ValueId> {
    match op {
        Op::Load(a) | Op::Neg(a) | Op::Not(a) | Op::BitCast(a, _) | Op::AtomicLoad(a, _) => vec![*a],
        Op::Store(a, b) | Op::Add(a, b) | Op::Sub(a, b) | Op::Mul(a, b) | Op::Div(a, b) | Op::Rem(a, b)
        | Op::And(a, b) | Op::Or(a, b) | Op::Xor(a, b) | Op::Shl(a, b) | Op::Shr(a, b) | Op::CmpEq(a, b)
        | Op::CmpNe(a, b) | Op::CmpLt(a, b) | Op::CmpLe(a, b) | Op::CmpGt(a, b) | Op::CmpGe(a, b)
        | Op::Gep(a, b) | Op::Shuffle(a, b, _) | Op::AtomicStore(a, b, _) => vec![*a, *b],
        Op::Select(a, b, c) => vec![*a, *b, *c],
        Op::Intrinsic(_, args) => args.iter().copied().collect(),
        Op::Phi(edges) => edges.iter().map(|(_, v)| *v).collect(),
        Op::CallArg(a) => vec![*a],
        Op::ConstInt(_) | Op::ConstFloat(_) | Op::Alloca(_) | Op::Param(_) => vec![],
    }
}
