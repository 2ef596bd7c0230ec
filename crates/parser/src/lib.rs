//! Surface-syntax parser for Qsp
//!
//! Turns source text into the parse tree consumed by the runtime's reader.
//! The parser knows nothing about values or evaluation; it only enforces
//! the grammar and reports positions.

pub mod ast;
pub mod parser;

pub use ast::Node;
pub use parser::{Parser, Token, tokenize};

/// Parse a whole source text into a `Node::Program`.
pub fn parse(source: &str) -> Result<Node, String> {
    Parser::new(source).parse()
}
