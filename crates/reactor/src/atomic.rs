//! Atomic load/store with an explicit memory-order mapping (spec §4.4).

use crate::builder::Builder;
use crate::ir::{MemoryOrder, Op, Type};
use crate::pointer::Pointer;
use crate::value::{RValue, ReactorType};

pub fn atomic_load<T: ReactorType>(b: &mut Builder, ptr: Pointer<T>, order: MemoryOrder) -> RValue<T> {
    debug_assert!(
        !matches!(order, MemoryOrder::Release),
        "an atomic load may not use release ordering"
    );
    RValue::from_id(b.emit(T::TYPE, Op::AtomicLoad(ptr.id, order)))
}

pub fn atomic_store<T: ReactorType>(b: &mut Builder, ptr: Pointer<T>, value: RValue<T>, order: MemoryOrder) {
    debug_assert!(
        !matches!(order, MemoryOrder::Acquire | MemoryOrder::AcqRel),
        "an atomic store may not use acquire ordering"
    );
    b.emit(Type::Void, Op::AtomicStore(ptr.id, value.id, order));
}
