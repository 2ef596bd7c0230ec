//! Interpreter state: heap, global scope and builtin dispatch table
//!
//! Builtin values carry a table index instead of a function pointer; the
//! index is the function's identity for equality and hashing, and the
//! table resolves it to the Rust implementation at call time.

use qsp_core::{EnvRef, Heap, HeapResult, ValRef};

use crate::{arithmetic, bindings, cond, io, list_ops};

/// Every builtin consumes its argument list (an S-expression of evaluated
/// values) and returns a fresh value.
pub type BuiltinFn = fn(&mut Interp, EnvRef, ValRef) -> HeapResult<ValRef>;

struct BuiltinEntry {
    name: &'static str,
    func: BuiltinFn,
}

pub struct Interp {
    pub heap: Heap,
    pub global: EnvRef,
    builtins: Vec<BuiltinEntry>,
}

impl Interp {
    /// Fresh interpreter with every builtin bound in the global scope.
    pub fn new() -> HeapResult<Interp> {
        let mut heap = Heap::new();
        let global = heap.env_new(None);
        let mut interp = Interp {
            heap,
            global,
            builtins: Vec::new(),
        };
        interp.register_builtins()?;
        Ok(interp)
    }

    pub(crate) fn builtin_fn(&self, id: u32) -> BuiltinFn {
        self.builtins[id as usize].func
    }

    pub(crate) fn builtin_name(&self, id: u32) -> &'static str {
        self.builtins[id as usize].name
    }

    fn register(&mut self, name: &'static str, func: BuiltinFn) -> HeapResult<()> {
        let id = self.builtins.len() as u32;
        self.builtins.push(BuiltinEntry { name, func });
        let k = self.heap.sym(name)?;
        let v = self.heap.builtin(id)?;
        self.heap.env_put(self.global, k, v);
        self.heap.release(k);
        self.heap.release(v);
        Ok(())
    }

    fn register_builtins(&mut self) -> HeapResult<()> {
        self.register("+", arithmetic::add)?;
        self.register("-", arithmetic::sub)?;
        self.register("*", arithmetic::mul)?;
        self.register("/", arithmetic::div)?;

        self.register("if", cond::if_)?;
        self.register("==", cond::eq)?;
        self.register("!=", cond::ne)?;
        self.register(">", cond::gt)?;
        self.register(">=", cond::ge)?;
        self.register("<", cond::lt)?;
        self.register("<=", cond::le)?;
        self.register("||", cond::or)?;
        self.register("&&", cond::and)?;
        self.register("!", cond::not)?;

        self.register("\\", bindings::lambda)?;
        self.register("def", bindings::def)?;
        self.register("=", bindings::put)?;
        self.register("list", list_ops::list)?;
        self.register("head", list_ops::head)?;
        self.register("tail", list_ops::tail)?;
        self.register("join", list_ops::join)?;
        self.register("len", list_ops::len)?;
        self.register("cons", list_ops::cons)?;
        self.register("init", list_ops::init)?;
        self.register("eval", list_ops::eval)?;
        self.register("print", io::print)?;
        self.register("error", io::error)?;
        self.register("load", io::load)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsp_core::Kind;

    #[test]
    fn builtins_are_bound_in_the_global_scope() {
        let mut interp = Interp::new().unwrap();
        for name in ["+", "if", "\\", "def", "head", "load"] {
            let k = interp.heap.sym(name).unwrap();
            let v = interp.heap.env_get(interp.global, k).unwrap();
            assert_eq!(interp.heap.kind(v), Kind::Fun, "missing builtin {name}");
            interp.heap.release(v);
            interp.heap.release(k);
        }
    }

    #[test]
    fn distinct_builtins_have_distinct_identities() {
        let mut interp = Interp::new().unwrap();
        let ka = interp.heap.sym("+").unwrap();
        let kb = interp.heap.sym("-").unwrap();
        let a = interp.heap.env_get(interp.global, ka).unwrap();
        let b = interp.heap.env_get(interp.global, kb).unwrap();
        assert!(!interp.heap.equal(a, b));
        assert!(interp.heap.equal(a, a));
        for v in [a, b, ka, kb] {
            interp.heap.release(v);
        }
    }
}
