//! Reader: parse tree to heap values
//!
//! Leaf lexemes are converted here, not in the parser: numbers through
//! radix-10 conversion (overflow becomes an `invalid number` error value),
//! strings by stripping the quotes and unescaping. Comment children are
//! skipped; the program root becomes an S-expression of its forms.

use qsp_core::{Heap, HeapResult, ValRef};
use qsp_parser::Node;

pub fn read(heap: &mut Heap, node: &Node) -> HeapResult<ValRef> {
    match node {
        Node::Number(text) => match text.parse::<i64>() {
            Ok(x) => heap.num(x),
            Err(_) => heap.err("invalid number"),
        },
        Node::Symbol(name) => heap.sym(name.as_str()),
        Node::Str(raw) => {
            let inner = &raw[1..raw.len() - 1];
            heap.string(unescape(inner))
        }
        // comments never reach the value level
        Node::Comment(_) => heap.sexpr(),
        Node::Sexpr(kids) | Node::Program(kids) => {
            let list = heap.sexpr()?;
            read_children(heap, list, kids)
        }
        Node::Qexpr(kids) => {
            let list = heap.qexpr()?;
            read_children(heap, list, kids)
        }
    }
}

fn read_children(heap: &mut Heap, list: ValRef, kids: &[Node]) -> HeapResult<ValRef> {
    for kid in kids {
        if matches!(kid, Node::Comment(_)) {
            continue;
        }
        let v = read(heap, kid)?;
        heap.list_add(list, v);
    }
    Ok(list)
}

/// Reverse of the printer's escaping. Unknown escapes keep the escaped
/// character.
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('v') => out.push('\x0b'),
            Some('0') => out.push('\0'),
            Some(c) => out.push(c),
            None => out.push('\\'),
        }
    }
    out
}
