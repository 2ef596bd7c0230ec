//! Tokenizer and recursive-descent parser for Qsp syntax
//!
//! Grammar:
//! ```text
//! number  : /-?[0-9]+/
//! symbol  : /[a-zA-Z0-9_+\-*\/\\=<>!&]+/
//! string  : /"(\\.|[^"])*"/
//! comment : /;[^\r\n]*/
//! sexpr   : '(' expr* ')'
//! qexpr   : '{' expr* '}'
//! expr    : number | symbol | string | comment | sexpr | qexpr
//! program : expr*
//! ```

use crate::ast::Node;

/// Placeholder token emitted when a string literal never closes; the
/// parser turns it into a diagnostic with the opening quote's position.
const UNCLOSED_STRING: &str = "<<<UNCLOSED_STRING>>>";

/// A token with source position information
#[derive(Debug, Clone)]
pub struct Token {
    pub text: String,
    /// Line number (0-indexed)
    pub line: usize,
    /// Column number (0-indexed)
    pub column: usize,
}

impl Token {
    fn new(text: String, line: usize, column: usize) -> Self {
        Token { text, line, column }
    }
}

impl PartialEq<&str> for Token {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl PartialEq<str> for Token {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_+-*/\\=<>!&".contains(c)
}

fn is_number(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

pub fn tokenize(source: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let chars: Vec<char> = source.chars().collect();
    let mut i = 0;
    let mut line = 0;
    let mut column = 0;

    while i < chars.len() {
        let c = chars[i];

        if c == '\n' {
            line += 1;
            column = 0;
            i += 1;
            continue;
        }
        if c.is_whitespace() {
            column += 1;
            i += 1;
            continue;
        }

        let (start_line, start_column) = (line, column);

        if c == ';' {
            // Line comment: kept as a token so the tree records it.
            let mut text = String::new();
            while i < chars.len() && chars[i] != '\n' && chars[i] != '\r' {
                text.push(chars[i]);
                i += 1;
                column += 1;
            }
            tokens.push(Token::new(text, start_line, start_column));
            continue;
        }

        if c == '"' {
            let mut text = String::from('"');
            i += 1;
            column += 1;
            let mut closed = false;
            while i < chars.len() {
                let c = chars[i];
                text.push(c);
                i += 1;
                if c == '\n' {
                    line += 1;
                    column = 0;
                } else {
                    column += 1;
                }
                if c == '\\' && i < chars.len() {
                    text.push(chars[i]);
                    if chars[i] == '\n' {
                        line += 1;
                        column = 0;
                    } else {
                        column += 1;
                    }
                    i += 1;
                    continue;
                }
                if c == '"' {
                    closed = true;
                    break;
                }
            }
            if closed {
                tokens.push(Token::new(text, start_line, start_column));
            } else {
                tokens.push(Token::new(
                    UNCLOSED_STRING.to_string(),
                    start_line,
                    start_column,
                ));
            }
            continue;
        }

        if is_symbol_char(c) {
            let mut text = String::new();
            while i < chars.len() && is_symbol_char(chars[i]) {
                text.push(chars[i]);
                i += 1;
                column += 1;
            }
            tokens.push(Token::new(text, start_line, start_column));
            continue;
        }

        // Punctuation and anything illegal become single-char tokens; the
        // parser rejects what the grammar does not know.
        tokens.push(Token::new(c.to_string(), start_line, start_column));
        i += 1;
        column += 1;
    }

    tokens
}

pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: &str) -> Self {
        let tokens = tokenize(source);
        Parser { tokens, pos: 0 }
    }

    pub fn parse(&mut self) -> Result<Node, String> {
        // Check for unclosed string error from tokenizer
        if let Some(error_token) = self.tokens.iter().find(|t| *t == UNCLOSED_STRING) {
            return Err(format!(
                "Unclosed string literal at line {}, column {} - missing closing quote",
                error_token.line + 1,
                error_token.column + 1
            ));
        }

        let mut exprs = Vec::new();
        while !self.is_at_end() {
            exprs.push(self.parse_expr()?);
        }
        Ok(Node::Program(exprs))
    }

    fn parse_expr(&mut self) -> Result<Node, String> {
        let token = match self.advance() {
            Some(t) => t.clone(),
            None => return Err("Unexpected end of input".to_string()),
        };

        if token == "(" {
            let children = self.parse_list(")", &token)?;
            return Ok(Node::Sexpr(children));
        }
        if token == "{" {
            let children = self.parse_list("}", &token)?;
            return Ok(Node::Qexpr(children));
        }
        if token == ")" || token == "}" {
            return Err(format!(
                "Unexpected '{}' at line {}, column {}",
                token.text,
                token.line + 1,
                token.column + 1
            ));
        }
        if token.text.starts_with('"') {
            return Ok(Node::Str(token.text));
        }
        if token.text.starts_with(';') {
            return Ok(Node::Comment(token.text));
        }
        if is_number(&token.text) {
            return Ok(Node::Number(token.text));
        }
        if token.text.chars().all(is_symbol_char) && !token.text.is_empty() {
            return Ok(Node::Symbol(token.text));
        }

        Err(format!(
            "Unexpected character '{}' at line {}, column {}",
            token.text,
            token.line + 1,
            token.column + 1
        ))
    }

    /// Parse expressions until `close`; `open` is reported when the file
    /// ends before the list does.
    fn parse_list(&mut self, close: &str, open: &Token) -> Result<Vec<Node>, String> {
        let mut children = Vec::new();
        loop {
            match self.current_token() {
                Some(t) if t == close => {
                    self.pos += 1;
                    return Ok(children);
                }
                Some(_) => children.push(self.parse_expr()?),
                None => {
                    return Err(format!(
                        "Expected '{}' to close '{}' opened at line {}, column {}",
                        close,
                        open.text,
                        open.line + 1,
                        open.column + 1
                    ));
                }
            }
        }
    }

    fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }
}
