//! Stack-allocated variables that are promoted to plain SSA values when
//! never address-taken (spec §4.4). An `LValue` starts "unmaterialized":
//! writes redirect into a pending SSA value held in the builder's local
//! map rather than to memory. It materializes — gets a real `Alloca` slot
//! — the first time its address is taken, on an explicit store after a
//! reload, or at a block join where its predecessors disagree on the
//! pending value (handled by the control-flow macros in `control.rs`).

use crate::builder::Builder;
use crate::ir::{Op, Type, ValueId};
use crate::value::{RValue, ReactorType};
use std::collections::HashMap;
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LValueId(pub u32);

enum Storage {
    /// Not yet materialized: holds the current SSA value directly.
    Pending(ValueId),
    /// Materialized: a stack slot (`Alloca` result) backs every read/write.
    Slot(ValueId),
}

pub struct LValueTable {
    ty: Vec<Type>,
    storage: Vec<Storage>,
}

impl LValueTable {
    pub fn new() -> LValueTable {
        LValueTable { ty: Vec::new(), storage: Vec::new() }
    }

    pub fn declare(&mut self, b: &mut Builder, ty: Type, initial: ValueId) -> LValueId {
        let id = LValueId(self.ty.len() as u32);
        self.ty.push(ty);
        self.storage.push(Storage::Pending(initial));
        let _ = b; // reserved for future eager-materialization heuristics
        id
    }

    pub fn read(&self, b: &mut Builder, id: LValueId) -> ValueId {
        match self.storage[id.0 as usize] {
            Storage::Pending(v) => v,
            Storage::Slot(slot) => b.emit(self.ty[id.0 as usize], Op::Load(slot)),
        }
    }

    pub fn write(&mut self, b: &mut Builder, id: LValueId, value: ValueId) {
        match self.storage[id.0 as usize] {
            Storage::Pending(_) => self.storage[id.0 as usize] = Storage::Pending(value),
            Storage::Slot(slot) => {
                b.emit(Type::Void, Op::Store(slot, value));
            }
        }
    }

    /// Forces a stack slot into existence for `id`, copying the pending
    /// value into it if it was never materialized before. Called on the
    /// first `&var`, and by the control-flow macros when a live `LValue`
    /// reaches a block boundary with divergent pending values on its
    /// incoming edges.
    pub fn materialize(&mut self, b: &mut Builder, id: LValueId) -> ValueId {
        match self.storage[id.0 as usize] {
            Storage::Slot(slot) => slot,
            Storage::Pending(v) => {
                let ty = self.ty[id.0 as usize];
                // Routines have at most a few hundred locals (spec §3), so
                // leaking one static `Type` per materialized slot to build
                // its pointee reference is bounded and avoids a type arena.
                let slot = b.emit(Type::Pointer(Box::leak(Box::new(ty))), Op::Alloca(ty));
                b.emit(Type::Void, Op::Store(slot, v));
                self.storage[id.0 as usize] = Storage::Slot(slot);
                slot
            }
        }
    }

    pub fn is_materialized(&self, id: LValueId) -> bool {
        matches!(self.storage[id.0 as usize], Storage::Slot(_))
    }

    /// Drops bookkeeping for an `LValue` that goes out of scope with no
    /// materialized slot: reads past this point are reachable only through
    /// dead code (an unconditional `discard`/`return` preceded them), so
    /// per the spec's builder guarantee this is safe to no-op rather than
    /// chase down every such read.
    pub fn kill(&mut self, _id: LValueId) {}

    pub fn type_of(&self, id: LValueId) -> Type {
        self.ty[id.0 as usize]
    }
}

impl Default for LValueTable {
    fn default() -> LValueTable {
        LValueTable::new()
    }
}

/// A typed front-end over `LValueTable` for callers that want `RValue<T>`
/// ergonomics rather than raw `ValueId`s.
pub struct Variable<T: ReactorType> {
    pub id: LValueId,
    _marker: PhantomData<T>,
}

impl<T: ReactorType> Variable<T> {
    pub fn declare(table: &mut LValueTable, b: &mut Builder, initial: RValue<T>) -> Variable<T> {
        Variable { id: table.declare(b, T::TYPE, initial.id), _marker: PhantomData }
    }

    pub fn load(&self, table: &LValueTable, b: &mut Builder) -> RValue<T> {
        RValue::from_id(table.read(b, self.id))
    }

    pub fn store(&self, table: &mut LValueTable, b: &mut Builder, value: RValue<T>) {
        table.write(b, self.id, value.id);
    }
}

/// Named-variable convenience layer used by `sw-pipeline`'s opcode
/// interpreter, which addresses Reactor locals by shader-IR register
/// rather than by a `Variable<T>` handle kept around in Rust-land.
#[derive(Default)]
pub struct NamedLocals {
    table: LValueTable,
    names: HashMap<String, LValueId>,
}

impl NamedLocals {
    pub fn get_or_declare(&mut self, b: &mut Builder, name: &str, ty: Type, initial: ValueId) -> LValueId {
        if let Some(&id) = self.names.get(name) {
            return id;
        }
        let id = self.table.declare(b, ty, initial);
        self.names.insert(name.to_string(), id);
        id
    }

    pub fn read(&self, b: &mut Builder, id: LValueId) -> ValueId {
        self.table.read(b, id)
    }

    pub fn write(&mut self, b: &mut Builder, id: LValueId, value: ValueId) {
        self.table.write(b, id, value);
    }

    pub fn table(&mut self) -> &mut LValueTable {
        &mut self.table
    }
}
