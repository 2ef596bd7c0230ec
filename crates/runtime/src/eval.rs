//! S-expression reduction and function application
//!
//! Evaluation is eager and strictly left-to-right. Symbols resolve through
//! the environment chain; S-expressions reduce by evaluating every child,
//! surfacing the first error, then applying the head to the rest.
//!
//! Lambda calls bind formals into a fresh scope copied from the captured
//! environment, so the stored lambda value is never mutated: repeated or
//! recursive applications each see their own bindings. A partial
//! application packages the accumulated scope, the remaining formals and
//! the body into a new lambda value.

use qsp_core::{EnvRef, Fun, HeapResult, Kind, Lambda, ValRef};
use tracing::trace;

use crate::interp::Interp;

impl Interp {
    pub fn eval(&mut self, env: EnvRef, v: ValRef) -> HeapResult<ValRef> {
        match self.heap.kind(v) {
            Kind::Sym => {
                let x = self.heap.env_get(env, v)?;
                self.heap.release(v);
                Ok(x)
            }
            Kind::Sexpr => self.eval_sexpr(env, v),
            _ => Ok(v),
        }
    }

    fn eval_sexpr(&mut self, env: EnvRef, v: ValRef) -> HeapResult<ValRef> {
        // evaluate children in index order
        for i in 0..self.heap.list_len(v) {
            let child = self.heap.list_child(v, i);
            let evaluated = self.eval(env, child)?;
            self.heap.list_replace(v, i, evaluated);
        }

        // surface the first error, discarding the rest of the expression
        for i in 0..self.heap.list_len(v) {
            if self.heap.kind(self.heap.list_child(v, i)) == Kind::Err {
                return Ok(self.heap.list_take(v, i));
            }
        }

        match self.heap.list_len(v) {
            // empty expression evaluates to itself
            0 => Ok(v),
            // single expression collapses to its element
            1 => Ok(self.heap.list_take(v, 0)),
            _ => {
                let f = self.heap.list_pop(v, 0);
                if self.heap.kind(f) != Kind::Fun {
                    let msg = format!(
                        "S-Expression starts with incorrect type! Got {}, expected {}",
                        self.heap.kind(f).name(),
                        Kind::Fun.name()
                    );
                    self.heap.release(f);
                    self.heap.release(v);
                    return self.heap.err(msg);
                }
                let res = self.call(env, f, v);
                self.heap.release(f);
                res
            }
        }
    }

    /// Applies `f` to `args`, consuming `args`.
    fn call(&mut self, env: EnvRef, f: ValRef, args: ValRef) -> HeapResult<ValRef> {
        match self.heap.fun_val(f) {
            Fun::Builtin(id) => {
                trace!(builtin = self.builtin_name(id), "builtin call");
                (self.builtin_fn(id))(self, env, args)
            }
            Fun::Lambda(lam) => self.call_lambda(env, lam, args),
        }
    }

    fn call_lambda(&mut self, env: EnvRef, lam: Lambda, args: ValRef) -> HeapResult<ValRef> {
        let given = self.heap.list_len(args);
        let total = self.heap.list_len(lam.formals);

        // fresh binding scope per call
        let call_env = self.heap.env_copy(lam.env);
        let mut next = 0;

        while self.heap.list_len(args) > 0 {
            if next == total {
                self.heap.release(args);
                self.heap.env_del(call_env);
                return self.heap.err(format!(
                    "Function passed too many arguments. Got {given}, expected {total}."
                ));
            }
            let sym = self.heap.list_child(lam.formals, next);
            next += 1;

            if self.heap.sym_name(sym) == "&" {
                // the marker must be followed by exactly one symbol
                if total - next != 1 {
                    self.heap.release(args);
                    self.heap.env_del(call_env);
                    return self
                        .heap
                        .err("Function format invalid. Symbol '&' not followed by single symbol");
                }
                let rest_sym = self.heap.list_child(lam.formals, next);
                next += 1;
                // remaining actuals become one quoted list
                self.heap.retag(args, Kind::Qexpr);
                self.heap.env_put(call_env, rest_sym, args);
                break;
            }

            let val = self.heap.list_pop(args, 0);
            self.heap.env_put(call_env, sym, val);
            self.heap.release(val);
        }
        self.heap.release(args);

        // a trailing '&' with no actuals left binds its symbol to {}
        if next < total && self.heap.sym_name(self.heap.list_child(lam.formals, next)) == "&" {
            if total - next != 2 {
                self.heap.env_del(call_env);
                return self
                    .heap
                    .err("Function format invalid. Symbol '&' not followed by a single symbol.");
            }
            let rest_sym = self.heap.list_child(lam.formals, next + 1);
            let empty = self.heap.qexpr()?;
            self.heap.env_put(call_env, rest_sym, empty);
            self.heap.release(empty);
            next = total;
        }

        if next == total {
            // all formals bound: graft the call scope onto the caller and
            // run a private copy of the body as an active expression
            self.heap.env_set_parent(call_env, Some(env));
            let body = self.heap.deep_copy(lam.body)?;
            self.heap.retag(body, Kind::Sexpr);
            let res = self.eval(call_env, body);
            self.heap.env_del(call_env);
            res
        } else {
            // partial application: carry the bindings forward
            let rest = self.heap.qexpr()?;
            for i in next..total {
                let sym = self.heap.list_child(lam.formals, i);
                let shared = self.heap.share(sym);
                self.heap.list_add(rest, shared);
            }
            let body = self.heap.share(lam.body);
            self.heap.lambda_with_env(call_env, rest, body)
        }
    }
}
