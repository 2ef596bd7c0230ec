//! Tagged value model
//!
//! A value is a cell holding a reference count, a 32-bit structural hash
//! and a payload discriminated by kind. Seven kinds are visible to the
//! language (numbers, strings, symbols, errors, functions, S- and
//! Q-expressions); `Undef` marks free pool cells and never escapes the
//! heap.
//!
//! Sharing is `share` (bump the count); copying is `deep_copy` (recursive
//! clone, lambda environments copied with shared bindings). The only
//! post-construction kind change is the S/Q-expression retag performed by
//! `list`, `eval` and `if`, which never alters the payload shape.

use std::fmt;

use crate::env::EnvRef;
use crate::heap::{Heap, HeapResult, ValRef};
use crate::hmap;

/// Value kind tag, in the original declaration order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Undef,
    Num,
    Str,
    Fun,
    Err,
    Sym,
    Qexpr,
    Sexpr,
}

impl Kind {
    /// Human-readable name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Kind::Undef => "Unknown",
            Kind::Num => "Number",
            Kind::Str => "String",
            Kind::Fun => "Function",
            Kind::Err => "Error",
            Kind::Sym => "Symbol",
            Kind::Qexpr => "Q-Expression",
            Kind::Sexpr => "S-Expression",
        }
    }
}

/// Function payload: a builtin table index or a lambda triple.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Fun {
    Builtin(u32),
    Lambda(Lambda),
}

/// User-defined function: captured scope, formal list (Q-expression of
/// symbols) and body (Q-expression).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Lambda {
    pub env: EnvRef,
    pub formals: ValRef,
    pub body: ValRef,
}

#[derive(Debug)]
pub(crate) enum Payload {
    Undef,
    Num(i64),
    Str(String),
    Sym(String),
    Err(String),
    Fun(Fun),
    Sexpr(Vec<ValRef>),
    Qexpr(Vec<ValRef>),
}

#[derive(Debug)]
pub(crate) struct Cell {
    pub refs: u32,
    pub hash: u32,
    pub val: Payload,
}

impl Cell {
    pub fn undef() -> Cell {
        Cell {
            refs: 0,
            hash: 0,
            val: Payload::Undef,
        }
    }
}

impl Heap {
    // Constructors. Each acquires a cell and derives the structural hash
    // from the payload.

    pub fn num(&mut self, x: i64) -> HeapResult<ValRef> {
        self.alloc(Payload::Num(x), hmap::int_hash(x))
    }

    pub fn string(&mut self, s: impl Into<String>) -> HeapResult<ValRef> {
        let s = s.into();
        let hash = hmap::str_hash(&s);
        self.alloc(Payload::Str(s), hash)
    }

    pub fn sym(&mut self, s: impl Into<String>) -> HeapResult<ValRef> {
        let s = s.into();
        let hash = hmap::str_hash(&s);
        self.alloc(Payload::Sym(s), hash)
    }

    pub fn err(&mut self, msg: impl Into<String>) -> HeapResult<ValRef> {
        let msg = msg.into();
        let hash = hmap::str_hash(&msg);
        self.alloc(Payload::Err(msg), hash)
    }

    /// Builtin function value; `id` indexes the interpreter's dispatch
    /// table and doubles as the function identity.
    pub fn builtin(&mut self, id: u32) -> HeapResult<ValRef> {
        self.alloc(Payload::Fun(Fun::Builtin(id)), hmap::int_hash(i64::from(id)))
    }

    /// Lambda with a fresh, empty captured scope.
    pub fn lambda(&mut self, formals: ValRef, body: ValRef) -> HeapResult<ValRef> {
        let env = self.env_new(None);
        self.lambda_with_env(env, formals, body)
    }

    /// Lambda owning an existing scope; used by partial application and
    /// deep copies.
    pub fn lambda_with_env(
        &mut self,
        env: EnvRef,
        formals: ValRef,
        body: ValRef,
    ) -> HeapResult<ValRef> {
        let hash = self.hash(formals) ^ self.hash(body);
        self.alloc(Payload::Fun(Fun::Lambda(Lambda { env, formals, body })), hash)
    }

    pub fn sexpr(&mut self) -> HeapResult<ValRef> {
        self.alloc(Payload::Sexpr(Vec::new()), hmap::list_hash(std::iter::empty()))
    }

    pub fn qexpr(&mut self) -> HeapResult<ValRef> {
        self.alloc(Payload::Qexpr(Vec::new()), hmap::list_hash(std::iter::empty()))
    }

    // Accessors. Reading the wrong arm is a programmer error and panics.

    pub fn kind(&self, v: ValRef) -> Kind {
        match &self.cell(v).val {
            Payload::Undef => Kind::Undef,
            Payload::Num(_) => Kind::Num,
            Payload::Str(_) => Kind::Str,
            Payload::Sym(_) => Kind::Sym,
            Payload::Err(_) => Kind::Err,
            Payload::Fun(_) => Kind::Fun,
            Payload::Sexpr(_) => Kind::Sexpr,
            Payload::Qexpr(_) => Kind::Qexpr,
        }
    }

    pub fn num_val(&self, v: ValRef) -> i64 {
        match &self.cell(v).val {
            Payload::Num(x) => *x,
            other => panic!("num_val on {other:?}"),
        }
    }

    pub fn str_val(&self, v: ValRef) -> &str {
        match &self.cell(v).val {
            Payload::Str(s) => s,
            other => panic!("str_val on {other:?}"),
        }
    }

    pub fn sym_name(&self, v: ValRef) -> &str {
        match &self.cell(v).val {
            Payload::Sym(s) => s,
            other => panic!("sym_name on {other:?}"),
        }
    }

    pub fn err_msg(&self, v: ValRef) -> &str {
        match &self.cell(v).val {
            Payload::Err(s) => s,
            other => panic!("err_msg on {other:?}"),
        }
    }

    pub fn fun_val(&self, v: ValRef) -> Fun {
        match &self.cell(v).val {
            Payload::Fun(f) => *f,
            other => panic!("fun_val on {other:?}"),
        }
    }

    // List operations. Hashes are recomputed on every structural change so
    // that equal lists always carry equal hashes.

    pub fn list_len(&self, v: ValRef) -> usize {
        self.list_children(v).len()
    }

    /// Child at `i`, borrowed: no reference count change.
    pub fn list_child(&self, v: ValRef, i: usize) -> ValRef {
        self.list_children(v)[i]
    }

    /// Appends `x`, transferring ownership of one reference into the list.
    pub fn list_add(&mut self, v: ValRef, x: ValRef) {
        self.list_children_mut(v).push(x);
        self.recompute_list_hash(v);
    }

    /// Removes and returns the child at `i`; ownership moves to the caller.
    pub fn list_pop(&mut self, v: ValRef, i: usize) -> ValRef {
        let x = self.list_children_mut(v).remove(i);
        self.recompute_list_hash(v);
        x
    }

    /// Removes the child at `i` and releases the rest of the list.
    pub fn list_take(&mut self, v: ValRef, i: usize) -> ValRef {
        let x = self.list_pop(v, i);
        self.release(v);
        x
    }

    /// Overwrites the slot at `i`. The previous occupant must already have
    /// been consumed by the caller.
    pub fn list_replace(&mut self, v: ValRef, i: usize, x: ValRef) {
        self.list_children_mut(v)[i] = x;
        self.recompute_list_hash(v);
    }

    fn list_children(&self, v: ValRef) -> &[ValRef] {
        match &self.cell(v).val {
            Payload::Sexpr(kids) | Payload::Qexpr(kids) => kids,
            other => panic!("list access on {other:?}"),
        }
    }

    fn list_children_mut(&mut self, v: ValRef) -> &mut Vec<ValRef> {
        match &mut self.cell_mut(v).val {
            Payload::Sexpr(kids) | Payload::Qexpr(kids) => kids,
            other => panic!("list access on {other:?}"),
        }
    }

    fn recompute_list_hash(&mut self, v: ValRef) {
        let hash = hmap::list_hash(
            self.list_children(v)
                .iter()
                .map(|&k| self.hash(k))
                .collect::<Vec<_>>(),
        );
        self.cell_mut(v).hash = hash;
    }

    /// Retags between S- and Q-expression. Payload and hash are unchanged.
    pub fn retag(&mut self, v: ValRef, kind: Kind) {
        let val = &mut self.cell_mut(v).val;
        let kids = match std::mem::replace(val, Payload::Undef) {
            Payload::Sexpr(kids) | Payload::Qexpr(kids) => kids,
            other => panic!("retag on {other:?}"),
        };
        *val = match kind {
            Kind::Sexpr => Payload::Sexpr(kids),
            Kind::Qexpr => Payload::Qexpr(kids),
            other => panic!("retag to {other:?}"),
        };
    }

    /// Recursive structural clone. Lambdas copy their captured scope with
    /// shared bindings.
    pub fn deep_copy(&mut self, v: ValRef) -> HeapResult<ValRef> {
        let hash = self.hash(v);
        match &self.cell(v).val {
            Payload::Undef => panic!("deep_copy of a free cell"),
            Payload::Num(x) => {
                let x = *x;
                self.alloc(Payload::Num(x), hash)
            }
            Payload::Str(s) => {
                let s = s.clone();
                self.alloc(Payload::Str(s), hash)
            }
            Payload::Sym(s) => {
                let s = s.clone();
                self.alloc(Payload::Sym(s), hash)
            }
            Payload::Err(s) => {
                let s = s.clone();
                self.alloc(Payload::Err(s), hash)
            }
            Payload::Fun(Fun::Builtin(id)) => {
                let id = *id;
                self.alloc(Payload::Fun(Fun::Builtin(id)), hash)
            }
            Payload::Fun(Fun::Lambda(l)) => {
                let l = *l;
                let env = self.env_copy(l.env);
                let formals = self.deep_copy(l.formals)?;
                let body = self.deep_copy(l.body)?;
                self.lambda_with_env(env, formals, body)
            }
            Payload::Sexpr(kids) => {
                let kids = kids.clone();
                let mut copies = Vec::with_capacity(kids.len());
                for k in kids {
                    copies.push(self.deep_copy(k)?);
                }
                self.alloc(Payload::Sexpr(copies), hash)
            }
            Payload::Qexpr(kids) => {
                let kids = kids.clone();
                let mut copies = Vec::with_capacity(kids.len());
                for k in kids {
                    copies.push(self.deep_copy(k)?);
                }
                self.alloc(Payload::Qexpr(copies), hash)
            }
        }
    }

    /// Copy-on-write guard: returns `v` when this is the only reference,
    /// otherwise trades it for a private deep copy.
    pub fn make_unique(&mut self, v: ValRef) -> HeapResult<ValRef> {
        if self.refs(v) == 1 {
            return Ok(v);
        }
        let copy = self.deep_copy(v)?;
        self.release(v);
        Ok(copy)
    }

    /// Structural equality. Kinds must match; lambdas compare formals and
    /// body, builtins compare identity.
    pub fn equal(&self, x: ValRef, y: ValRef) -> bool {
        match (&self.cell(x).val, &self.cell(y).val) {
            (Payload::Num(a), Payload::Num(b)) => a == b,
            (Payload::Str(a), Payload::Str(b)) => a == b,
            (Payload::Sym(a), Payload::Sym(b)) => a == b,
            (Payload::Err(a), Payload::Err(b)) => a == b,
            (Payload::Fun(Fun::Builtin(a)), Payload::Fun(Fun::Builtin(b))) => a == b,
            (Payload::Fun(Fun::Lambda(a)), Payload::Fun(Fun::Lambda(b))) => {
                let (a, b) = (*a, *b);
                self.equal(a.formals, b.formals) && self.equal(a.body, b.body)
            }
            (Payload::Sexpr(a), Payload::Sexpr(b)) | (Payload::Qexpr(a), Payload::Qexpr(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(&p, &q)| self.equal(p, q))
            }
            _ => false,
        }
    }

    /// Printable view of `v`.
    pub fn display(&self, v: ValRef) -> DisplayVal<'_> {
        DisplayVal { heap: self, v }
    }

    fn fmt_val(&self, v: ValRef, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cell(v).val {
            Payload::Undef => f.write_str("<undef>"),
            Payload::Num(x) => write!(f, "{x}"),
            Payload::Str(s) => write!(f, "\"{}\"", escape_str(s)),
            Payload::Sym(s) => f.write_str(s),
            Payload::Err(msg) => write!(f, "Error: {msg}"),
            Payload::Fun(Fun::Builtin(_)) => f.write_str("<builtin>"),
            Payload::Fun(Fun::Lambda(l)) => {
                let l = *l;
                f.write_str("(\\")?;
                self.fmt_val(l.formals, f)?;
                f.write_str(" ")?;
                self.fmt_val(l.body, f)?;
                f.write_str(")")
            }
            Payload::Sexpr(kids) => self.fmt_list(kids, '(', ')', f),
            Payload::Qexpr(kids) => self.fmt_list(kids, '{', '}', f),
        }
    }

    fn fmt_list(
        &self,
        kids: &[ValRef],
        open: char,
        close: char,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{open}")?;
        for (i, &k) in kids.iter().enumerate() {
            self.fmt_val(k, f)?;
            if i != kids.len() - 1 {
                f.write_str(" ")?;
            }
        }
        write!(f, "{close}")
    }
}

pub struct DisplayVal<'a> {
    heap: &'a Heap,
    v: ValRef,
}

impl fmt::Display for DisplayVal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.heap.fmt_val(self.v, f)
    }
}

/// C-style escaping for the string printer.
fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_structural() {
        let mut heap = Heap::new();
        let a = heap.sym("foo").unwrap();
        let b = heap.sym("foo").unwrap();
        assert_eq!(heap.hash(a), heap.hash(b));

        let s = heap.string("foo").unwrap();
        // Same byte hash regardless of kind; equality still distinguishes.
        assert_eq!(heap.hash(a), heap.hash(s));
        assert!(!heap.equal(a, s));
    }

    #[test]
    fn list_hash_tracks_contents() {
        let mut heap = Heap::new();
        let p = heap.qexpr().unwrap();
        let q = heap.qexpr().unwrap();
        assert_eq!(heap.hash(p), heap.hash(q));

        let one = heap.num(1).unwrap();
        let two = heap.num(2).unwrap();
        heap.list_add(p, one);
        heap.list_add(p, two);
        let one_q = heap.num(1).unwrap();
        let two_q = heap.num(2).unwrap();
        heap.list_add(q, one_q);
        heap.list_add(q, two_q);
        assert_eq!(heap.hash(p), heap.hash(q));

        // Removing from one changes its hash away from the other.
        let popped = heap.list_pop(p, 1);
        heap.release(popped);
        assert_ne!(heap.hash(p), heap.hash(q));
    }

    #[test]
    fn retag_keeps_payload_and_hash() {
        let mut heap = Heap::new();
        let v = heap.sexpr().unwrap();
        let x = heap.num(9).unwrap();
        heap.list_add(v, x);
        let before = heap.hash(v);
        heap.retag(v, Kind::Qexpr);
        assert_eq!(heap.kind(v), Kind::Qexpr);
        assert_eq!(heap.hash(v), before);
        assert_eq!(heap.list_len(v), 1);
    }

    #[test]
    fn deep_copy_equals_original() {
        let mut heap = Heap::new();
        let list = heap.qexpr().unwrap();
        let n = heap.num(3).unwrap();
        let s = heap.string("hi\n").unwrap();
        heap.list_add(list, n);
        heap.list_add(list, s);

        let copy = heap.deep_copy(list).unwrap();
        assert!(heap.equal(copy, list));
        assert_eq!(heap.hash(copy), heap.hash(list));
        assert_ne!(copy, list);

        // The copy is structurally independent.
        let popped = heap.list_pop(copy, 0);
        heap.release(popped);
        assert!(!heap.equal(copy, list));
        assert_eq!(heap.list_len(list), 2);

        heap.release(copy);
        heap.release(list);
        assert_eq!(heap.free_count(), heap.cell_count());
    }

    #[test]
    fn make_unique_copies_only_when_shared() {
        let mut heap = Heap::new();
        let v = heap.qexpr().unwrap();
        let same = heap.make_unique(v).unwrap();
        assert_eq!(same, v);

        heap.share(v);
        let copy = heap.make_unique(v).unwrap();
        assert_ne!(copy, v);
        assert_eq!(heap.refs(v), 1);
        heap.release(copy);
        heap.release(v);
    }

    #[test]
    fn equality_is_structural() {
        let mut heap = Heap::new();
        let a = heap.num(5).unwrap();
        let b = heap.num(5).unwrap();
        let c = heap.num(6).unwrap();
        assert!(heap.equal(a, b));
        assert!(!heap.equal(a, c));

        let s = heap.string("5").unwrap();
        assert!(!heap.equal(a, s));

        let f1 = heap.builtin(0).unwrap();
        let f2 = heap.builtin(0).unwrap();
        let f3 = heap.builtin(1).unwrap();
        assert!(heap.equal(f1, f2));
        assert!(!heap.equal(f1, f3));
    }

    #[test]
    fn lambda_equality_ignores_environment() {
        let mut heap = Heap::new();
        let mk = |heap: &mut Heap| {
            let formals = heap.qexpr().unwrap();
            let x = heap.sym("x").unwrap();
            heap.list_add(formals, x);
            let body = heap.qexpr().unwrap();
            let bx = heap.sym("x").unwrap();
            heap.list_add(body, bx);
            heap.lambda(formals, body).unwrap()
        };
        let f = mk(&mut heap);
        let g = mk(&mut heap);
        assert!(heap.equal(f, g));
        assert_eq!(heap.hash(f), heap.hash(g));
    }

    #[test]
    fn printer_formats_each_kind() {
        let mut heap = Heap::new();
        let n = heap.num(-42).unwrap();
        assert_eq!(heap.display(n).to_string(), "-42");

        let s = heap.string("a\"b\n").unwrap();
        assert_eq!(heap.display(s).to_string(), "\"a\\\"b\\n\"");

        let y = heap.sym("join").unwrap();
        assert_eq!(heap.display(y).to_string(), "join");

        let e = heap.err("Division by zero!").unwrap();
        assert_eq!(heap.display(e).to_string(), "Error: Division by zero!");

        let b = heap.builtin(3).unwrap();
        assert_eq!(heap.display(b).to_string(), "<builtin>");

        let q = heap.qexpr().unwrap();
        let one = heap.num(1).unwrap();
        let two = heap.num(2).unwrap();
        heap.list_add(q, one);
        heap.list_add(q, two);
        assert_eq!(heap.display(q).to_string(), "{1 2}");

        let p = heap.sexpr().unwrap();
        assert_eq!(heap.display(p).to_string(), "()");
    }

    #[test]
    fn printer_formats_lambdas() {
        let mut heap = Heap::new();
        let formals = heap.qexpr().unwrap();
        let x = heap.sym("x").unwrap();
        heap.list_add(formals, x);
        let body = heap.qexpr().unwrap();
        let plus = heap.sym("+").unwrap();
        let bx = heap.sym("x").unwrap();
        let one = heap.num(1).unwrap();
        heap.list_add(body, plus);
        heap.list_add(body, bx);
        heap.list_add(body, one);
        let f = heap.lambda(formals, body).unwrap();
        assert_eq!(heap.display(f).to_string(), "(\\{x} {+ x 1})");
    }
}
