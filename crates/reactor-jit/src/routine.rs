//! A compiled entry point. `Routine` owns the executable pages produced by
//! `Backend::compile` and dispatches calls either into real machine code
//! `codegen.rs` selected, or into the software interpreter in `interp.rs`.
//!
//! SPEC_FULL.md's addition over the distilled spec: a `Routine` whose
//! owning `Program` was relinked must not be invocable once its pages are
//! released. Since a released `Routine`'s page is never unmapped eagerly
//! (interpreted routines hold no native code worth re-JITting per call,
//! and a native routine's page would otherwise need to outlive every
//! in-flight call into it), "released" is modeled with a generation
//! counter instead — `invoke` asserts the routine's generation still
//! matches its `Program`'s current one.

use crate::interp::{Interpreter, Slot};
use crate::page::CodePage;
use reactor::ir::{Function, Type};
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// System V AMD64 integer argument/return calling convention, no SSE
/// registers involved, matching the subset `codegen::try_select` accepts.
type NativeFn0 = extern "C" fn() -> i64;
type NativeFn1 = extern "C" fn(i64) -> i64;
type NativeFn2 = extern "C" fn(i64, i64) -> i64;
type NativeFn3 = extern "C" fn(i64, i64, i64) -> i64;
type NativeFn4 = extern "C" fn(i64, i64, i64, i64) -> i64;
type NativeFn5 = extern "C" fn(i64, i64, i64, i64, i64) -> i64;
type NativeFn6 = extern "C" fn(i64, i64, i64, i64, i64, i64) -> i64;

enum Entry {
    Interpreted,
    Native,
}

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

/// Shared by every `Routine` produced from the same `compile` call (a
/// pipeline state's vertex/setup/pixel routines link together and are
/// invalidated together when the state is relinked).
pub struct Generation(AtomicU64);

impl Generation {
    pub fn new() -> Rc<Generation> {
        Rc::new(Generation(AtomicU64::new(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))))
    }

    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Bumps to a fresh id, invalidating every `Routine` still holding the
    /// old one.
    pub fn release(&self) {
        self.0.store(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed), Ordering::Release);
    }
}

pub struct Routine {
    func: Function,
    page: CodePage,
    entry: Entry,
    generation: Rc<Generation>,
    born_at: u64,
}

impl Routine {
    pub(crate) fn new(func: Function, page: CodePage, generation: Rc<Generation>) -> Routine {
        let born_at = generation.current();
        Routine { func, page, entry: Entry::Interpreted, generation, born_at }
    }

    pub(crate) fn new_native(func: Function, page: CodePage, generation: Rc<Generation>) -> Routine {
        let born_at = generation.current();
        Routine { func, page, entry: Entry::Native, generation, born_at }
    }

    pub fn name(&self) -> &str {
        &self.func.name
    }

    pub fn is_native(&self) -> bool {
        matches!(self.entry, Entry::Native)
    }

    /// Runs the routine against the given scalar/vector parameters packed
    /// as `Slot`s. Panics in debug builds if this routine's generation has
    /// been released (see module docs); in release builds this becomes a
    /// silent stale-read, matching the no-bounds-checking contract the
    /// rest of this crate already accepts for JIT'd code.
    pub fn invoke(&self, params: Vec<Slot>) -> Option<Slot> {
        debug_assert_eq!(
            self.generation.current(),
            self.born_at,
            "invoked a Routine after its owning Program was relinked"
        );
        match self.entry {
            Entry::Native => match self.invoke_native(&params) {
                Some(result) => Some(result),
                // Falls back rather than panicking if a param arrived in a
                // shape `codegen.rs` didn't select for (e.g. a non-`Int`
                // slot) — the eligibility check is on the function, not the
                // actual call-site arguments, so this keeps a mismatch from
                // ever reading a wrong register.
                None => {
                    let mut interp = Interpreter::new(&self.func, params);
                    interp.run()
                }
            },
            Entry::Interpreted => {
                let mut interp = Interpreter::new(&self.func, params);
                interp.run()
            }
        }
    }

    fn invoke_native(&self, params: &[Slot]) -> Option<Slot> {
        if params.len() != self.func.params.len() {
            return None;
        }
        let mut args = [0i64; 6];
        for (slot, dst) in params.iter().zip(args.iter_mut()) {
            match slot {
                Slot::Int(v) => *dst = *v,
                _ => return None,
            }
        }
        let ptr = self.page.as_ptr();
        // SAFETY: `ptr` is a page `codegen::try_select` produced for this
        // exact `func`, made executable by `Backend::compile_once`, with a
        // System V AMD64 prologue/epilogue matching the arity below; the
        // generation check above guarantees the page outlives this call.
        let result = unsafe {
            match params.len() {
                0 => std::mem::transmute::<*const u8, NativeFn0>(ptr)(),
                1 => std::mem::transmute::<*const u8, NativeFn1>(ptr)(args[0]),
                2 => std::mem::transmute::<*const u8, NativeFn2>(ptr)(args[0], args[1]),
                3 => std::mem::transmute::<*const u8, NativeFn3>(ptr)(args[0], args[1], args[2]),
                4 => std::mem::transmute::<*const u8, NativeFn4>(ptr)(args[0], args[1], args[2], args[3]),
                5 => std::mem::transmute::<*const u8, NativeFn5>(ptr)(args[0], args[1], args[2], args[3], args[4]),
                6 => std::mem::transmute::<*const u8, NativeFn6>(ptr)(args[0], args[1], args[2], args[3], args[4], args[5]),
                _ => return None,
            }
        };
        match self.func.return_type {
            Type::Void => None,
            _ => Some(Slot::Int(result)),
        }
    }

    pub fn code_len(&self) -> usize {
        self.page.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::CodePage;
    use reactor::builder::Builder;
    use reactor::ir::Function;
    use reactor::ty::Type;

    fn trivial_routine(generation: Rc<Generation>) -> Routine {
        let mut func = Function::new("identity", vec![Type::Int], Type::Int);
        let mut b = Builder::new(&mut func);
        let p = b.param(0);
        b.terminate(reactor::ir::Terminator::Return(Some(p)));
        let page = CodePage::alloc(16).unwrap();
        Routine::new(func, page, generation)
    }

    #[test]
    fn invoking_after_release_trips_the_debug_assertion() {
        let generation = Generation::new();
        let routine = trivial_routine(generation.clone());
        assert_eq!(routine.invoke(vec![Slot::Int(7)]).map(|s| matches!(s, Slot::Int(7))), Some(true));
        generation.release();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| routine.invoke(vec![Slot::Int(7)])));
        assert!(result.is_err(), "expected debug_assert_eq! to panic after release()");
    }
}
