//! The low-level instruction emitter the typed value handles (`value.rs`)
//! and control-flow macros (`control.rs`) are built on top of. Keeps track
//! of the current insertion block only — the DSL macros manage block
//! creation/sealing.

use crate::ir::{BasicBlock, BlockId, Function, Op, Terminator, Type, Value, ValueId};
use smallvec::SmallVec;

pub struct Builder<'f> {
    pub func: &'f mut Function,
    pub current: BlockId,
}

impl<'f> Builder<'f> {
    pub fn new(func: &'f mut Function) -> Builder<'f> {
        let current = func.entry;
        Builder { func, current }
    }

    pub fn emit(&mut self, ty: Type, op: Op) -> ValueId {
        let id = ValueId(self.func.values.len() as u32);
        self.func.values.push(Value { ty, op });
        self.func.block_mut(self.current).values.push(id);
        id
    }

    pub fn ty(&self, v: ValueId) -> Type {
        self.func.value(v).ty
    }

    pub fn create_block(&mut self) -> BlockId {
        let id = BlockId(self.func.blocks.len() as u32);
        self.func.blocks.push(BasicBlock { id, values: Vec::new(), terminator: None, predecessors: SmallVec::new() });
        id
    }

    pub fn switch_to(&mut self, block: BlockId) {
        self.current = block;
    }

    pub fn terminate(&mut self, term: Terminator) {
        let targets: SmallVec<[BlockId; 2]> = match &term {
            Terminator::Branch(b) => SmallVec::from_slice(&[*b]),
            Terminator::CondBranch(_, a, b) => SmallVec::from_slice(&[*a, *b]),
            Terminator::Return(_) | Terminator::Unreachable => SmallVec::new(),
        };
        let from = self.current;
        self.func.block_mut(self.current).terminator = Some(term);
        for t in targets {
            self.func.block_mut(t).predecessors.push(from);
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.func.block(self.current).terminator.is_some()
    }

    pub fn param(&mut self, index: u32) -> ValueId {
        let ty = self.func.params[index as usize];
        self.emit(ty, Op::Param(index))
    }
}
