//! `If`/`Else`, `While`, `For`, and `Do/Until` control-flow builders (spec
//! §4.4). Each emits basic blocks and conditional branches and forces
//! materialization of every live `LValue` at the block boundaries it
//! introduces, since a value written on only one incoming edge can no
//! longer be represented as a single pending SSA value.

use crate::builder::Builder;
use crate::ir::Terminator;
use crate::lvalue::{LValueId, LValueTable};
use crate::value::{Bool, RValue};

/// Materializes every `LValue` named in `live` before a branch, so the
/// block it lands in can read a consistent value regardless of which
/// predecessor reached it.
fn materialize_all(table: &mut LValueTable, b: &mut Builder, live: &[LValueId]) {
    for &id in live {
        table.materialize(b, id);
    }
}

pub fn if_then_else(
    b: &mut Builder,
    table: &mut LValueTable,
    live: &[LValueId],
    cond: RValue<Bool>,
    then_branch: impl FnOnce(&mut Builder, &mut LValueTable),
    else_branch: Option<impl FnOnce(&mut Builder, &mut LValueTable)>,
) {
    materialize_all(table, b, live);
    let then_block = b.create_block();
    let else_block = b.create_block();
    let merge_block = b.create_block();

    b.terminate(Terminator::CondBranch(cond.id, then_block, else_block));

    b.switch_to(then_block);
    then_branch(b, table);
    if !b.is_terminated() {
        b.terminate(Terminator::Branch(merge_block));
    }

    b.switch_to(else_block);
    if let Some(else_fn) = else_branch {
        else_fn(b, table);
    }
    if !b.is_terminated() {
        b.terminate(Terminator::Branch(merge_block));
    }

    b.switch_to(merge_block);
}

/// `while (cond) { body }`: the condition is re-evaluated in its own
/// block so the loop can branch back to it from the body's end.
pub fn while_loop(
    b: &mut Builder,
    table: &mut LValueTable,
    live: &[LValueId],
    mut cond: impl FnMut(&mut Builder, &mut LValueTable) -> RValue<Bool>,
    body: impl FnOnce(&mut Builder, &mut LValueTable),
) {
    materialize_all(table, b, live);
    let cond_block = b.create_block();
    let body_block = b.create_block();
    let exit_block = b.create_block();

    b.terminate(Terminator::Branch(cond_block));
    b.switch_to(cond_block);
    let c = cond(b, table);
    b.terminate(Terminator::CondBranch(c.id, body_block, exit_block));

    b.switch_to(body_block);
    body(b, table);
    if !b.is_terminated() {
        materialize_all(table, b, live);
        b.terminate(Terminator::Branch(cond_block));
    }

    b.switch_to(exit_block);
}

/// `for (init; cond; step) { body }`, built directly out of `while_loop`
/// plus an init/step the caller supplies as closures over the same
/// `LValueTable` (the loop index is typically one of `live`).
pub fn for_loop(
    b: &mut Builder,
    table: &mut LValueTable,
    live: &[LValueId],
    init: impl FnOnce(&mut Builder, &mut LValueTable),
    cond: impl FnMut(&mut Builder, &mut LValueTable) -> RValue<Bool>,
    mut step: impl FnMut(&mut Builder, &mut LValueTable),
    body: impl FnOnce(&mut Builder, &mut LValueTable),
) {
    init(b, table);
    // `step` must run after `body` but `while_loop`'s `body` closure is
    // `FnOnce`, so fold both into one closure here.
    let mut body_opt = Some(body);
    while_loop(
        b,
        table,
        live,
        cond,
        |b, table| {
            if let Some(body) = body_opt.take() {
                body(b, table);
            }
            step(b, table);
        },
    );
}

/// `do { body } while (cond)`: the body runs once unconditionally before
/// the condition is ever tested.
pub fn do_until(
    b: &mut Builder,
    table: &mut LValueTable,
    live: &[LValueId],
    body: impl Fn(&mut Builder, &mut LValueTable),
    until: impl Fn(&mut Builder, &mut LValueTable) -> RValue<Bool>,
) {
    materialize_all(table, b, live);
    let body_block = b.create_block();
    let exit_block = b.create_block();

    b.terminate(Terminator::Branch(body_block));
    b.switch_to(body_block);
    body(b, table);
    materialize_all(table, b, live);
    let c = until(b, table);
    b.terminate(Terminator::CondBranch(c.id, exit_block, body_block));

    b.switch_to(exit_block);
}
