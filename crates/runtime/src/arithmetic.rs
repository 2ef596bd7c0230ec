//! Arithmetic builtins: `+ - * /`
//!
//! Left folds over one or more numbers with wrapping 64-bit semantics.
//! `-` with a single operand negates. Division is truncating; a zero
//! divisor aborts the fold with an error value.

use qsp_core::{EnvRef, HeapResult, Kind, ValRef};

use crate::interp::Interp;

pub fn add(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    op(interp, args, "+")
}

pub fn sub(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    op(interp, args, "-")
}

pub fn mul(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    op(interp, args, "*")
}

pub fn div(interp: &mut Interp, _env: EnvRef, args: ValRef) -> HeapResult<ValRef> {
    op(interp, args, "/")
}

fn op(interp: &mut Interp, args: ValRef, name: &str) -> HeapResult<ValRef> {
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
    for i in 0..count {
        ensure_type!(interp, name, args, i, Kind::Num);
    }

    let x = interp.heap.list_pop(args, 0);
    let mut acc = interp.heap.num_val(x);
    interp.heap.release(x);

    // unary negation
    if name == "-" && interp.heap.list_len(args) == 0 {
        acc = acc.wrapping_neg();
    }

    while interp.heap.list_len(args) > 0 {
        let y = interp.heap.list_pop(args, 0);
        let n = interp.heap.num_val(y);
        interp.heap.release(y);

        match name {
            "+" => acc = acc.wrapping_add(n),
            "-" => acc = acc.wrapping_sub(n),
            "*" => acc = acc.wrapping_mul(n),
            "/" => {
                if n == 0 {
                    interp.heap.release(args);
                    return interp.heap.err("Division by zero!");
                }
                acc = acc.wrapping_div(n);
            }
            _ => unreachable!("unknown operator {name}"),
        }
    }

    interp.heap.release(args);
    interp.heap.num(acc)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(interp: &mut Interp, src: &str) -> String {
        let tree = qsp_parser::parse(src).expect("parse failure");
        let v = crate::reader::read(&mut interp.heap, &tree).expect("read failure");
        let res = interp.eval(interp.global, v).expect("heap exhausted");
        let out = interp.heap.display(res).to_string();
        interp.heap.release(res);
        out
    }

    #[test]
    fn folds_left_over_all_operands() {
        let mut interp = Interp::new().unwrap();
        assert_eq!(run(&mut interp, "(+ 1 2 3)"), "6");
        assert_eq!(run(&mut interp, "(- 10 3 2)"), "5");
        assert_eq!(run(&mut interp, "(* 2 3 4)"), "24");
        assert_eq!(run(&mut interp, "(/ 100 5 2)"), "10");
    }

    #[test]
    fn single_minus_negates() {
        let mut interp = Interp::new().unwrap();
        assert_eq!(run(&mut interp, "(- 5)"), "-5");
        assert_eq!(run(&mut interp, "(- -5)"), "5");
        assert_eq!(run(&mut interp, "(+ 5)"), "5");
    }

    #[test]
    fn division_truncates_toward_zero() {
        let mut interp = Interp::new().unwrap();
        assert_eq!(run(&mut interp, "(/ 7 2)"), "3");
        assert_eq!(run(&mut interp, "(/ -7 2)"), "-3");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let mut interp = Interp::new().unwrap();
        assert_eq!(run(&mut interp, "(/ 1 0)"), "Error: Division by zero!");
        assert_eq!(run(&mut interp, "(+ 1 (/ 1 0))"), "Error: Division by zero!");
    }

    #[test]
    fn non_numbers_are_rejected() {
        let mut interp = Interp::new().unwrap();
        assert_eq!(
            run(&mut interp, "(+ 1 {2})"),
            "Error: Function '+' passed incorrect type for argument 1. Got Q-Expression, expected Number."
        );
    }

    #[test]
    fn empty_operand_list_is_rejected() {
        // Unreachable from the language (the singleton rule collapses
        // `(+)` to the builtin itself) but embedders can call in directly.
        let mut interp = Interp::new().unwrap();
        let args = interp.heap.sexpr().unwrap();
        let global = interp.global;
        let res = add(&mut interp, global, args).unwrap();
        assert_eq!(
            interp.heap.display(res).to_string(),
            "Error: Function '+' passed incorrect number of arguments. Got 0, expected 1."
        );
        interp.heap.release(res);
    }
}
