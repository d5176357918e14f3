//! Recursive-descent parser for hypertext
//!
//! ```text
//! hypertext := (literal | pointer | "[" hypertext "]")*
//! pointer   := "$" [aqw]? [1-9][0-9]*
//! literal   := any run of characters other than "[", "]", "$"
//! ```

use crate::error::HypertextError;

/// A parsed but not yet stored piece of hypertext
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Piece {
    /// Literal text
    Text(String),
    /// A locked reference such as `$a1` or `$3`
    Pointer { name: String, offset: usize },
    /// A bracketed sub-hypertext, stored as its own page
    Expanded(Vec<Piece>),
}

/// Parse hypertext into a tree of pieces
pub fn parse(input: &str) -> Result<Vec<Piece>, HypertextError> {
    let mut parser = Parser { input, pos: 0 };
    let pieces = parser.hypertext()?;
    if parser.pos < input.len() {
        // hypertext() only stops early on a closing bracket.
        return Err(parser.error("unmatched ']'"));
    }
    Ok(pieces)
}

/// Whether `name` is a well-formed pointer name, `$` included
pub fn is_pointer_name(name: &str) -> bool {
    let mut parser = Parser {
        input: name,
        pos: 0,
    };
    matches!(parser.pointer(), Ok(_)) && parser.pos == name.len()
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn error(&self, message: &str) -> HypertextError {
        HypertextError::Syntax {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn hypertext(&mut self) -> Result<Vec<Piece>, HypertextError> {
        let mut pieces = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                ']' => break,
                '[' => {
                    self.pos += 1;
                    let inner = self.hypertext()?;
                    if self.peek() != Some(']') {
                        return Err(self.error("expected ']'"));
                    }
                    self.pos += 1;
                    pieces.push(Piece::Expanded(inner));
                }
                '$' => pieces.push(self.pointer()?),
                _ => pieces.push(Piece::Text(self.literal())),
            }
        }
        Ok(pieces)
    }

    fn literal(&mut self) -> String {
        let rest = self.rest();
        let end = rest
            .find(|c: char| matches!(c, '[' | ']' | '$'))
            .unwrap_or(rest.len());
        self.pos += end;
        rest[..end].to_string()
    }

    fn pointer(&mut self) -> Result<Piece, HypertextError> {
        let start = self.pos;
        let bytes = self.input.as_bytes();
        if bytes.get(start) != Some(&b'$') {
            return Err(self.error("expected '$'"));
        }
        let mut end = start + 1;

        if matches!(bytes.get(end), Some(b'a' | b'q' | b'w')) {
            end += 1;
        }
        match bytes.get(end) {
            Some(b'1'..=b'9') => end += 1,
            _ => return Err(self.error("expected a pointer name after '$'")),
        }
        while matches!(bytes.get(end), Some(b'0'..=b'9')) {
            end += 1;
        }

        self.pos = end;
        Ok(Piece::Pointer {
            name: self.input[start..end].to_string(),
            offset: start,
        })
    }
}
