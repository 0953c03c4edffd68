//! Content stream tokenization into operator/operand groups.

use crate::parser::lexer::{self, Token};
use crate::parser::object::{find_subslice, Object, ObjectParser};

/// Operand lists longer than this are discarded as garbage.
const MAX_OPERANDS: usize = 64;

/// One content stream operation: an operator and the operands before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub operator: String,
    pub operands: Vec<Object>,
}

impl Operation {
    pub fn new(operator: impl Into<String>, operands: Vec<Object>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }

    /// Operand `i` as a number.
    pub fn number(&self, i: usize) -> Option<f64> {
        self.operands.get(i).and_then(Object::as_f64)
    }

    /// All operands as numbers, or `None` if any is not numeric.
    pub fn numbers<const N: usize>(&self) -> Option<[f64; N]> {
        if self.operands.len() < N {
            return None;
        }
        let start = self.operands.len() - N;
        let mut out = [0.0; N];
        for (slot, operand) in out.iter_mut().zip(&self.operands[start..]) {
            *slot = operand.as_f64()?;
        }
        Some(out)
    }
}

/// Split content stream bytes into operations.
///
/// Never fails. Bytes that cannot be tokenized are skipped and the pending
/// operands discarded; inline image data is skipped whole.
pub fn parse_operations(data: &[u8]) -> Vec<Operation> {
    let mut ops = Vec::new();
    let mut operands: Vec<Object> = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let rest = &data[pos..];
        let Some((token, len)) = lexer::token_len(rest) else {
            let trimmed = lexer::skip_whitespace(rest);
            if trimmed.is_empty() {
                break;
            }
            pos = data.len() - trimmed.len() + 1;
            operands.clear();
            continue;
        };

        let operand = match token {
            Token::Integer(v) => Object::Integer(v),
            Token::Real(v) => Object::Real(v),
            Token::LiteralString(b) | Token::HexString(b) => Object::String(b),
            Token::Name(n) => Object::Name(n),
            Token::ArrayStart | Token::DictStart => {
                let mut parser = ObjectParser::at(data, pos);
                match parser.parse_object() {
                    Ok(obj) => {
                        pos = parser.position();
                        push_operand(&mut operands, obj);
                    }
                    Err(_) => {
                        pos += len;
                        operands.clear();
                    }
                }
                continue;
            }
            Token::ArrayEnd | Token::DictEnd => {
                pos += len;
                operands.clear();
                continue;
            }
            Token::Keyword(b"true") => Object::Boolean(true),
            Token::Keyword(b"false") => Object::Boolean(false),
            Token::Keyword(b"null") => Object::Null,
            Token::Keyword(b"BI") => {
                pos += len;
                pos = skip_inline_image(data, pos);
                operands.clear();
                continue;
            }
            Token::Keyword(op) => {
                pos += len;
                let operator = String::from_utf8_lossy(op).into_owned();
                ops.push(Operation::new(operator, std::mem::take(&mut operands)));
                continue;
            }
        };
        pos += len;
        push_operand(&mut operands, operand);
    }
    ops
}

fn push_operand(operands: &mut Vec<Object>, operand: Object) {
    if operands.len() >= MAX_OPERANDS {
        operands.clear();
    }
    operands.push(operand);
}

/// Skip `... ID <data> EI` after a `BI` keyword. Returns the position after `EI`.
fn skip_inline_image(data: &[u8], pos: usize) -> usize {
    let Some(id) = find_keyword(data, pos, b"ID") else {
        return data.len();
    };
    // One whitespace byte separates ID from the image data.
    let mut cursor = id + 3;
    while cursor < data.len() {
        let Some(found) = find_subslice(&data[cursor..], b"EI") else {
            return data.len();
        };
        let at = cursor + found;
        let before_ok = at == 0 || lexer::is_whitespace(data[at - 1]);
        let after_ok = data.get(at + 2).map_or(true, |&c| !lexer::is_regular(c));
        if before_ok && after_ok {
            return at + 2;
        }
        cursor = at + 2;
    }
    data.len()
}

/// Position of a standalone keyword at or after `from`.
fn find_keyword(data: &[u8], from: usize, keyword: &[u8]) -> Option<usize> {
    let mut cursor = from;
    while cursor < data.len() {
        let at = cursor + find_subslice(&data[cursor..], keyword)?;
        let before_ok = at == 0 || !lexer::is_regular(data[at - 1]);
        let after_ok = data
            .get(at + keyword.len())
            .map_or(true, |&c| !lexer::is_regular(c));
        if before_ok && after_ok {
            return Some(at);
        }
        cursor = at + keyword.len();
    }
    None
}
