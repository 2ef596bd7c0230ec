//! Definition builtins: `\` (lambda), `def` and `=`
//!
//! `\` builds a lambda from a formal list and a body, both quoted. `def`
//! binds in the global scope, `=` in the current one; both accept several
//! symbols at once, pairing `{a b}` with the following values.

use qsp_core::{EnvRef, HeapResult, Kind, ValRef};

use crate::interp::Interp;

/// `(\ {FORMALS} {BODY})`: lambda with a fresh captured scope.
pub fn lambda(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "\\", args, 2);
    ensure_type!(interp, "\\", args, 0, Kind::Qexpr);
    ensure_type!(interp, "\\", args, 1, Kind::Qexpr);

    // the formal list may hold symbols only
    let formals = interp.heap.list_child(args, 0);
    for i in 0..interp.heap.list_len(formals) {
        let kind = interp.heap.kind(interp.heap.list_child(formals, i));
        ensure!(
            interp,
            args,
            kind == Kind::Sym,
            "Cannot define non-symbol. Got {}, expected {}.",
            kind.name(),
            Kind::Sym.name()
        );
    }

    let formals = interp.heap.list_pop(args, 0);
    let body = interp.heap.list_pop(args, 0);
    interp.heap.release(args);
    interp.heap.lambda(formals, body)
}

pub fn def(interp: &mut Interp, env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    var(interp, env, args, "def")
}

pub fn put(interp: &mut Interp, env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    var(interp, env, args, "=")
}

fn var(interp: &mut Interp, env: EnvRef, args: ValRef, name: &str) -> HeapResult<ValRef> {
    let count = interp.heap.list_len(args);
    ensure!(
        interp,
        args,
        count >= 1,
        "Function '{}' passed incorrect number of arguments. Got {}, expected {}.",
        name,
        count,
        1
    );
    ensure_type!(interp, name, args, 0, Kind::Qexpr);

    let syms = interp.heap.list_child(args, 0);
    for i in 0..interp.heap.list_len(syms) {
        let kind = interp.heap.kind(interp.heap.list_child(syms, i));
        ensure!(
            interp,
            args,
            kind == Kind::Sym,
            "Function '{}' cannot define non-symbol! Got {}, expected {}.",
            name,
            kind.name(),
            Kind::Sym.name()
        );
    }

    let sym_count = interp.heap.list_len(syms);
    ensure!(
        interp,
        args,
        sym_count == count - 1,
        "Function '{}' passed too many arguments for symbols. Got {}, expected {}.",
        name,
        sym_count,
        count - 1
    );

    for i in 0..sym_count {
        let sym = interp.heap.list_child(syms, i);
        let val = interp.heap.list_child(args, i + 1);
        if name == "def" {
            interp.heap.env_def(env, sym, val);
        } else {
            interp.heap.env_put(env, sym, val);
        }
    }

    interp.heap.release(args);
    interp.heap.sexpr()
}
