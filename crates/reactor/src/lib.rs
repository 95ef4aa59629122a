//! An embedded SSA-construction DSL (spec §4.4). Expressions written
//! against `Builder`/`RValue<T>` build a typed SSA `Function` that
//! `reactor-jit` optimizes and lowers to native machine code; nothing in
//! this crate talks to a GL state vector or a shader IR opcode — that
//! translation lives in `sw-pipeline`, which is the only consumer of this
//! crate's public surface besides `reactor-jit` itself.

pub mod atomic;
pub mod builder;
pub mod composite;
pub mod control;
pub mod intrinsics;
pub mod ir;
pub mod lvalue;
pub mod pointer;
pub mod ty;
pub mod value;
pub mod verify;

pub use builder::Builder;
pub use ir::{Function, MemoryOrder, Module, Op, Terminator, Type};
pub use value::{Bool, Float, Float4, Int, Int4, RValue, ReactorType, UInt};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Terminator;
    use crate::value::ops;

    #[test]
    fn builds_a_function_that_adds_two_floats_and_returns() {
        let mut f = Function::new("add", vec![Type::Float, Type::Float], Type::Float);
        let mut b = Builder::new(&mut f);
        let a = RValue::<Float>::from_id(b.param(0));
        let c = RValue::<Float>::from_id(b.param(1));
        let sum = ops::add_float(&mut b, a, c);
        b.terminate(Terminator::Return(Some(sum.id)));
        assert!(verify::verify(&f).is_ok());
    }

    #[test]
    fn unmaterialized_lvalue_redirects_writes_to_pending_value() {
        use lvalue::LValueTable;
        let mut f = Function::new("id", vec![Type::Int], Type::Int);
        let mut b = Builder::new(&mut f);
        let mut table = LValueTable::new();
        let p = b.param(0);
        let var = table.declare(&mut b, Type::Int, p);
        assert!(!table.is_materialized(var));
        let read = table.read(&mut b, var);
        assert_eq!(read, p);
        b.terminate(Terminator::Return(Some(read)));
    }

    #[test]
    fn materializing_an_lvalue_allocates_a_stack_slot() {
        use lvalue::LValueTable;
        let mut f = Function::new("addr_of", vec![Type::Int], Type::Void);
        let mut b = Builder::new(&mut f);
        let mut table = LValueTable::new();
        let p = b.param(0);
        let var = table.declare(&mut b, Type::Int, p);
        table.materialize(&mut b, var);
        assert!(table.is_materialized(var));
        b.terminate(Terminator::Return(None));
    }

    #[test]
    fn swizzle_packs_lane0_in_high_nibble() {
        let packed = composite::pack_swizzle(3, 2, 1, 0);
        assert_eq!((packed >> 14) & 0b11, 3);
        assert_eq!(composite::unpack_swizzle(packed), [3, 2, 1, 0]);
    }

    #[test]
    fn if_else_materializes_live_lvalues_on_both_arms() {
        use lvalue::LValueTable;
        let mut f = Function::new("branchy", vec![Type::Bool, Type::Int], Type::Int);
        let mut b = Builder::new(&mut f);
        let mut table = LValueTable::new();
        let cond = RValue::<Bool>::from_id(b.param(0));
        let initial = b.param(1);
        let var = table.declare(&mut b, Type::Int, initial);

        control::if_then_else(
            &mut b,
            &mut table,
            &[var],
            cond,
            |b, table| {
                let one = crate::value::constant_int(b, 1);
                table.write(b, var, one.id);
            },
            Some(|b: &mut Builder, table: &mut LValueTable| {
                let two = crate::value::constant_int(b, 2);
                table.write(b, var, two.id);
            }),
        );

        assert!(table.is_materialized(var));
        let result = table.read(&mut b, var);
        b.terminate(Terminator::Return(Some(result)));
        assert!(verify::verify(&f).is_ok());
    }
}
