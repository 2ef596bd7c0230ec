//! Comparison, boolean and branching builtins
//!
//! Ordering and equality return 0/1 numbers. `&&` and `||` short-circuit
//! over values only: both operands are eagerly evaluated before the
//! builtin runs, then the first operand decides which value is returned.
//! `if` retags the chosen quoted branch to an active list and evaluates
//! it.

use qsp_core::{EnvRef, HeapResult, Kind, ValRef};

use crate::interp::Interp;

pub fn lt(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ord(interp, args, "<")
}

pub fn le(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ord(interp, args, "<=")
}

pub fn gt(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ord(interp, args, ">")
}

pub fn ge(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ord(interp, args, ">=")
}

fn ord(interp: &mut Interp, args: ValRef, name: &str) -> HeapResult<ValRef> {
    ensure_arity!(interp, name, args, 2);
    ensure_type!(interp, name, args, 0, Kind::Num);
    ensure_type!(interp, name, args, 1, Kind::Num);

    let a = interp.heap.num_val(interp.heap.list_child(args, 0));
    let b = interp.heap.num_val(interp.heap.list_child(args, 1));
    let r = match name {
        "<" => a < b,
        "<=" => a <= b,
        ">" => a > b,
        ">=" => a >= b,
        _ => unreachable!("unknown ordering {name}"),
    };
    interp.heap.release(args);
    interp.heap.num(i64::from(r))
}

pub fn eq(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    cmp(interp, args, "==")
}

pub fn ne(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    cmp(interp, args, "!=")
}

fn cmp(interp: &mut Interp, args: ValRef, name: &str) -> HeapResult<ValRef> {
    ensure_arity!(interp, name, args, 2);

    let same = interp
        .heap
        .equal(interp.heap.list_child(args, 0), interp.heap.list_child(args, 1));
    let r = if name == "==" { same } else { !same };
    interp.heap.release(args);
    interp.heap.num(i64::from(r))
}

/// `&&`: the first operand when it is 0, otherwise the second.
pub fn and(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "&&", args, 2);
    ensure_type!(interp, "&&", args, 0, Kind::Num);
    ensure_type!(interp, "&&", args, 1, Kind::Num);

    let x = interp.heap.list_pop(args, 0);
    if interp.heap.num_val(x) != 0 {
        let y = interp.heap.list_pop(args, 0);
        interp.heap.release(args);
        interp.heap.release(x);
        Ok(y)
    } else {
        interp.heap.release(args);
        Ok(x)
    }
}

/// `||`: the first operand when it is non-zero, otherwise the second.
pub fn or(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "||", args, 2);
    ensure_type!(interp, "||", args, 0, Kind::Num);
    ensure_type!(interp, "||", args, 1, Kind::Num);

    let x = interp.heap.list_pop(args, 0);
    if interp.heap.num_val(x) == 0 {
        let y = interp.heap.list_pop(args, 0);
        interp.heap.release(args);
        interp.heap.release(x);
        Ok(y)
    } else {
        interp.heap.release(args);
        Ok(x)
    }
}

pub fn not(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "!", args, 1);
    ensure_type!(interp, "!", args, 0, Kind::Num);

    let x = interp.heap.num_val(interp.heap.list_child(args, 0));
    interp.heap.release(args);
    interp.heap.num(i64::from(x == 0))
}

/// `(if COND {THEN} {ELSE})`: evaluates the chosen branch as an active
/// expression.
pub fn if_(interp: &mut Interp, env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "if", args, 3);
    ensure_type!(interp, "if", args, 0, Kind::Num);
    ensure_type!(interp, "if", args, 1, Kind::Qexpr);
    ensure_type!(interp, "if", args, 2, Kind::Qexpr);

    let cond = interp.heap.num_val(interp.heap.list_child(args, 0));
    let branch = interp.heap.list_pop(args, if cond != 0 { 1 } else { 2 });
    interp.heap.release(args);

    // the branch may be shared through a binding; never retag in place
    let branch = interp.heap.make_unique(branch)?;
    interp.heap.retag(branch, Kind::Sexpr);
    interp.eval(env, branch)
}
