//! Typed `GEP`-equivalent pointer arithmetic (spec §4.4): byte-pointer `+`
//! integer yields a byte-pointer, and every offset is expressed in element
//! counts of the pointee type rather than raw bytes, matching the
//! source's `Pointer<T>` indexing.

use crate::builder::Builder;
use crate::ir::{Op, Type, ValueId};
use crate::value::{Int, RValue, ReactorType};
use std::marker::PhantomData;

pub struct Pointer<T: ReactorType> {
    pub id: ValueId,
    _marker: PhantomData<T>,
}

impl<T: ReactorType> Clone for Pointer<T> {
    fn clone(&self) -> Pointer<T> {
        *self
    }
}
impl<T: ReactorType> Copy for Pointer<T> {}

impl<T: ReactorType> Pointer<T> {
    pub fn from_id(id: ValueId) -> Pointer<T> {
        Pointer { id, _marker: PhantomData }
    }

    /// `self + offset` (in elements of `T`); the backend scales `offset`
    /// by `size_of(T)` when lowering `Gep`.
    pub fn offset(&self, b: &mut Builder, offset: RValue<Int>) -> Pointer<T> {
        Pointer::from_id(b.emit(Type::Pointer(Box::leak(Box::new(T::TYPE))), Op::Gep(self.id, offset.id)))
    }

    pub fn load(&self, b: &mut Builder) -> RValue<T> {
        RValue::from_id(b.emit(T::TYPE, Op::Load(self.id)))
    }

    pub fn store(&self, b: &mut Builder, value: RValue<T>) {
        b.emit(Type::Void, Op::Store(self.id, value.id));
    }
}

/// A byte-addressed pointer (no element type): `+ n` advances by exactly
/// `n` bytes regardless of what it points at, used for the framebuffer
/// row/stride arithmetic in `sw-raster`.
#[derive(Clone, Copy)]
pub struct BytePointer {
    pub id: ValueId,
}

impl BytePointer {
    pub fn from_id(id: ValueId) -> BytePointer {
        BytePointer { id }
    }

    pub fn add_bytes(&self, b: &mut Builder, offset: RValue<Int>) -> BytePointer {
        static BYTE: Type = Type::Byte;
        BytePointer::from_id(b.emit(Type::Pointer(&BYTE), Op::Gep(self.id, offset.id)))
    }
}
