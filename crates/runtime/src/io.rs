//! Printing and file loading builtins
//!
//! `print` writes to stdout and returns `()`. `error` lifts a string into
//! an error value. `load` parses a file and evaluates its top-level forms
//! in order, printing any error values as it goes; a file that fails to
//! open or parse becomes a `Could not load library …` error value.

use qsp_core::{EnvRef, HeapResult, Kind, ValRef};
use tracing::debug;

use crate::interp::Interp;
use crate::reader;

pub fn print(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    for i in 0..interp.heap.list_len(args) {
        print!("{} ", interp.heap.display(interp.heap.list_child(args, i)));
    }
    println!();
    interp.heap.release(args);
    interp.heap.sexpr()
}

pub fn error(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "error", args, 1);
    ensure_type!(interp, "error", args, 0, Kind::Str);

    let msg = interp.heap.str_val(interp.heap.list_child(args, 0)).to_string();
    interp.heap.release(args);
    interp.heap.err(msg)
}

pub fn load(interp: &mut Interp, env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    ensure_arity!(interp, "load", args, 1);
    ensure_type!(interp, "load", args, 0, Kind::Str);

    let filename = interp.heap.str_val(interp.heap.list_child(args, 0)).to_string();
    interp.heap.release(args);
    debug!(file = %filename, "loading source file");

    let source = match std::fs::read_to_string(&filename) {
        Ok(source) => source,
        Err(e) => {
            return interp.heap.err(format!("Could not load library {filename}: {e}"));
        }
    };

    let tree = match qsp_parser::parse(&source) {
        Ok(tree) => tree,
        Err(msg) => {
            return interp.heap.err(format!("Could not load library {msg}"));
        }
    };

    // evaluate each top-level form in order, surfacing errors as output
    let forms = reader::read(&mut interp.heap, &tree)?;
    while interp.heap.list_len(forms) > 0 {
        let form = interp.heap.list_pop(forms, 0);
        let res = interp.eval(env, form)?;
        if interp.heap.kind(res) == Kind::Err {
            println!("{}", interp.heap.display(res));
        }
        interp.heap.release(res);
    }
    interp.heap.release(forms);
    interp.heap.sexpr()
}
