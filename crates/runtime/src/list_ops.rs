//! Quoted-list builtins: `list head tail init join cons len eval`
//!
//! Results are fresh lists whose elements are shared with the inputs;
//! inputs reachable through environment bindings are never mutated.
//! `eval` is the one bridge back to active code: it retags a quoted list
//! (a private copy if shared) and hands it to the evaluator.

use qsp_core::{EnvRef, HeapResult, Kind, ValRef};

use crate::interp::Interp;

/// Retags the evaluated arguments into a quoted list.
pub fn list(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    interp.heap.retag(args, Kind::Qexpr);
    Ok(args)
}

/// Quoted list holding only the first element.
pub fn head(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "head", args, 1);
    ensure_type!(interp, "head", args, 0, Kind::Qexpr);
    ensure_not_empty!(interp, "head", args, 0);

    let h = interp.heap.list_take(args, 0);
    let q = interp.heap.qexpr()?;
    let first = interp.heap.list_child(h, 0);
    let first = interp.heap.share(first);
    interp.heap.list_add(q, first);
    interp.heap.release(h);
    Ok(q)
}

/// Quoted list of everything but the first element.
pub fn tail(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "tail", args, 1);
    ensure_type!(interp, "tail", args, 0, Kind::Qexpr);
    ensure_not_empty!(interp, "tail", args, 0);

    let h = interp.heap.list_take(args, 0);
    let q = interp.heap.qexpr()?;
    for i in 1..interp.heap.list_len(h) {
        let kid = interp.heap.list_child(h, i);
        let kid = interp.heap.share(kid);
        interp.heap.list_add(q, kid);
    }
    interp.heap.release(h);
    Ok(q)
}

/// Quoted list of everything but the last element.
pub fn init(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "init", args, 1);
    ensure_type!(interp, "init", args, 0, Kind::Qexpr);
    ensure_not_empty!(interp, "init", args, 0);

    let h = interp.heap.list_take(args, 0);
    let q = interp.heap.qexpr()?;
    for i in 0..interp.heap.list_len(h) - 1 {
        let kid = interp.heap.list_child(h, i);
        let kid = interp.heap.share(kid);
        interp.heap.list_add(q, kid);
    }
    interp.heap.release(h);
    Ok(q)
}

/// Concatenates one or more quoted lists in order.
pub fn join(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    let count = interp.heap.list_len(args);
    ensure!(
        interp,
        args,
        count >= 1,
        "Function '{}' passed incorrect number of arguments. Got {}, expected {}.",
        "join",
        count,
        1
    );
    for i in 0..count {
        ensure_type!(interp, "join", args, i, Kind::Qexpr);
    }

    let x = interp.heap.list_pop(args, 0);
    let x = interp.heap.make_unique(x)?;
    while interp.heap.list_len(args) > 0 {
        let y = interp.heap.list_pop(args, 0);
        for i in 0..interp.heap.list_len(y) {
            let kid = interp.heap.list_child(y, i);
            let kid = interp.heap.share(kid);
            interp.heap.list_add(x, kid);
        }
        interp.heap.release(y);
    }
    interp.heap.release(args);
    Ok(x)
}

/// Prepends a number to a quoted list.
pub fn cons(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "cons", args, 2);
    ensure_type!(interp, "cons", args, 0, Kind::Num);
    ensure_type!(interp, "cons", args, 1, Kind::Qexpr);

    let x = interp.heap.list_pop(args, 0);
    let q = interp.heap.qexpr()?;
    interp.heap.list_add(q, x);

    let rest = interp.heap.list_pop(args, 0);
    for i in 0..interp.heap.list_len(rest) {
        let kid = interp.heap.list_child(rest, i);
        let kid = interp.heap.share(kid);
        interp.heap.list_add(q, kid);
    }
    interp.heap.release(rest);
    interp.heap.release(args);
    Ok(q)
}

/// Element count of a quoted list.
pub fn len(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "len", args, 1);
    ensure_type!(interp, "len", args, 0, Kind::Qexpr);

    let n = interp.heap.list_len(interp.heap.list_child(args, 0));
    interp.heap.release(args);
    interp.heap.num(n as i64)
}

/// Retags a quoted list to an active one and evaluates it in the caller's
/// environment.
pub fn eval(interp: &mut Interp, env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "eval", args, 1);
    ensure_type!(interp, "eval", args, 0, Kind::Qexpr);

    let h = interp.heap.list_take(args, 0);
    // reduction consumes the expression; a shared one must be copied first
    let h = interp.heap.make_unique(h)?;
    interp.heap.retag(h, Kind::Sexpr);
    interp.eval(env, h)
}
