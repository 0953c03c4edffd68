//! PDF object model and the object parser.

use super::lexer::{self, Token};
use crate::error::{Error, Result};
use std::collections::HashMap;

/// Object number and generation of an indirect object.
pub type ObjectId = (u32, u16);

/// PDF dictionary. Keys are names without the leading slash.
pub type Dictionary = HashMap<String, Object>;

/// Nesting limit for arrays and dictionaries.
const MAX_DEPTH: usize = 256;

/// A stream object: its dictionary plus the raw, still-encoded bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct Stream {
    pub dict: Dictionary,
    pub data: Vec<u8>,
}

/// PDF object.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Object {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(Vec<u8>),
    Name(String),
    Array(Vec<Object>),
    Dictionary(Dictionary),
    Stream(Stream),
    Reference(ObjectId),
}

impl Object {
    /// Human-readable type name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Object::Null => "null",
            Object::Boolean(_) => "boolean",
            Object::Integer(_) => "integer",
            Object::Real(_) => "real",
            Object::String(_) => "string",
            Object::Name(_) => "name",
            Object::Array(_) => "array",
            Object::Dictionary(_) => "dictionary",
            Object::Stream(_) => "stream",
            Object::Reference(_) => "reference",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Object::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Object::Integer(i) => Some(*i),
            Object::Real(r) if r.is_finite() => Some(*r as i64),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Object::Integer(i) => Some(*i as f64),
            Object::Real(r) => Some(*r),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Object::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Object::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Object]> {
        match self {
            Object::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Dictionary of a dictionary or stream object.
    pub fn as_dict(&self) -> Option<&Dictionary> {
        match self {
            Object::Dictionary(d) => Some(d),
            Object::Stream(s) => Some(&s.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&Stream> {
        match self {
            Object::Stream(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            Object::Reference(id) => Some(*id),
            _ => None,
        }
    }
}

/// Read a name-typed entry such as `/Type` or `/Subtype`.
pub fn dict_name<'a>(dict: &'a Dictionary, key: &str) -> Option<&'a str> {
    dict.get(key).and_then(Object::as_name)
}

/// Recursive-descent parser over a byte buffer.
///
/// The parser never reads past the end of `data`; truncated input yields
/// [`Error::MalformedDocument`].
pub struct ObjectParser<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ObjectParser<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Start parsing at `pos`.
    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self {
            data,
            pos: pos.min(data.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    /// Next token, advancing past it.
    pub fn next_token(&mut self) -> Option<Token<'a>> {
        let rest: &'a [u8] = &self.data[self.pos..];
        let (tok, len) = lexer::token_len(rest)?;
        self.pos += len;
        Some(tok)
    }

    /// Next token without advancing.
    pub fn peek_token(&self) -> Option<Token<'a>> {
        lexer::token_len(&self.data[self.pos..]).map(|(tok, _)| tok)
    }

    fn error(&self, what: &str) -> Error {
        Error::malformed(format!("{what} at offset {}", self.pos))
    }

    /// Consume a bare keyword such as `obj` or `trailer`.
    pub fn expect_keyword(&mut self, keyword: &[u8]) -> Result<()> {
        match self.next_token() {
            Some(Token::Keyword(k)) if k == keyword => Ok(()),
            _ => Err(self.error(&format!(
                "expected '{}'",
                String::from_utf8_lossy(keyword)
            ))),
        }
    }

    /// Parse one direct object. `n g R` triples become references.
    pub fn parse_object(&mut self) -> Result<Object> {
        self.parse_nested(0)
    }

    fn parse_nested(&mut self, depth: usize) -> Result<Object> {
        if depth > MAX_DEPTH {
            return Err(self.error("objects nested too deeply"));
        }
        let start = self.pos;
        let token = self
            .next_token()
            .ok_or_else(|| self.error("unexpected end of data"))?;

        match token {
            Token::Integer(value) => {
                if let Ok((rest, id)) = lexer::reference(&self.data[start..]) {
                    self.pos = self.data.len() - rest.len();
                    return Ok(Object::Reference(id));
                }
                Ok(Object::Integer(value))
            }
            Token::Real(value) => Ok(Object::Real(value)),
            Token::LiteralString(bytes) | Token::HexString(bytes) => Ok(Object::String(bytes)),
            Token::Name(name) => Ok(Object::Name(name)),
            Token::ArrayStart => {
                let mut items = Vec::new();
                loop {
                    match self.peek_token() {
                        Some(Token::ArrayEnd) => {
                            self.next_token();
                            break;
                        }
                        Some(_) => items.push(self.parse_nested(depth + 1)?),
                        None => return Err(self.error("unterminated array")),
                    }
                }
                Ok(Object::Array(items))
            }
            Token::DictStart => Ok(Object::Dictionary(self.parse_dict_body(depth)?)),
            Token::Keyword(b"true") => Ok(Object::Boolean(true)),
            Token::Keyword(b"false") => Ok(Object::Boolean(false)),
            Token::Keyword(b"null") => Ok(Object::Null),
            Token::Keyword(other) => Err(Error::malformed(format!(
                "unexpected keyword '{}' at offset {start}",
                String::from_utf8_lossy(other)
            ))),
            Token::ArrayEnd | Token::DictEnd => {
                Err(Error::malformed(format!("unexpected delimiter at offset {start}")))
            }
        }
    }

    /// Parse dictionary entries after the opening `<<`.
    fn parse_dict_body(&mut self, depth: usize) -> Result<Dictionary> {
        let mut dict = Dictionary::new();
        loop {
            match self.next_token() {
                Some(Token::DictEnd) => return Ok(dict),
                Some(Token::Name(key)) => {
                    if matches!(self.peek_token(), Some(Token::DictEnd)) {
                        // Key without a value; treat as null.
                        continue;
                    }
                    let value = self.parse_nested(depth + 1)?;
                    dict.insert(key, value);
                }
                Some(_) => return Err(self.error("dictionary key is not a name")),
                None => return Err(self.error("unterminated dictionary")),
            }
        }
    }

    /// Parse `n g obj ... endobj` starting at the current position.
    ///
    /// `resolve_length` looks up indirect `/Length` values.
    pub fn parse_indirect_object(
        &mut self,
        resolve_length: &dyn Fn(ObjectId) -> Option<i64>,
    ) -> Result<(ObjectId, Object)> {
        let number = match self.next_token() {
            Some(Token::Integer(n)) if n >= 0 => n as u32,
            _ => return Err(self.error("expected object number")),
        };
        let generation = match self.next_token() {
            Some(Token::Integer(g)) if (0..=i64::from(u16::MAX)).contains(&g) => g as u16,
            _ => return Err(self.error("expected generation number")),
        };
        self.expect_keyword(b"obj")?;
        let object = self.parse_object()?;

        let object = match (object, self.peek_token()) {
            (Object::Dictionary(dict), Some(Token::Keyword(b"stream"))) => {
                self.next_token();
                let data = self.read_stream_data(&dict, resolve_length)?;
                Object::Stream(Stream { dict, data })
            }
            (object, _) => object,
        };

        Ok(((number, generation), object))
    }

    fn read_stream_data(
        &mut self,
        dict: &Dictionary,
        resolve_length: &dyn Fn(ObjectId) -> Option<i64>,
    ) -> Result<Vec<u8>> {
        // The keyword is followed by CRLF or LF (a lone CR is tolerated).
        let mut start = self.pos;
        if self.data.get(start) == Some(&b'\r') {
            start += 1;
        }
        if self.data.get(start) == Some(&b'\n') {
            start += 1;
        }

        let declared = match dict.get("Length") {
            Some(Object::Reference(id)) => resolve_length(*id),
            Some(other) => other.as_i64(),
            None => None,
        };

        if let Some(length) = declared.and_then(|l| usize::try_from(l).ok()) {
            if let Some(end) = start.checked_add(length).filter(|&e| e <= self.data.len()) {
                let after = lexer::skip_whitespace(&self.data[end..]);
                if after.starts_with(b"endstream") {
                    self.pos = self.data.len() - after.len() + b"endstream".len();
                    return Ok(self.data[start..end].to_vec());
                }
            }
        }

        let end = find_subslice(&self.data[start..], b"endstream")
            .map(|rel| start + rel)
            .ok_or_else(|| self.error("stream without endstream"))?;
        log::debug!(
            "stream at offset {start}: /Length {declared:?} unusable, recovered by scanning"
        );
        let mut data_end = end;
        if data_end > start && self.data[data_end - 1] == b'\n' {
            data_end -= 1;
        }
        if data_end > start && self.data[data_end - 1] == b'\r' {
            data_end -= 1;
        }
        self.pos = end + b"endstream".len();
        Ok(self.data[start..data_end].to_vec())
    }
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Position of the last occurrence of `needle` in `haystack`.
pub(crate) fn rfind_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &[u8]) -> Object {
        ObjectParser::new(input).parse_object().unwrap()
    }

    fn no_refs(_: ObjectId) -> Option<i64> {
        None
    }

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse(b"42"), Object::Integer(42));
        assert_eq!(parse(b"true"), Object::Boolean(true));
        assert_eq!(parse(b"null"), Object::Null);
        assert_eq!(parse(b"(hi)"), Object::String(b"hi".to_vec()));
        assert_eq!(parse(b"/Font"), Object::Name("Font".into()));
    }

    #[test]
    fn test_parse_reference_vs_integers() {
        assert_eq!(parse(b"5 0 R"), Object::Reference((5, 0)));
        assert_eq!(
            parse(b"[1 2 3 0 R 4]"),
            Object::Array(vec![
                Object::Integer(1),
                Object::Integer(2),
                Object::Reference((3, 0)),
                Object::Integer(4),
            ])
        );
    }

    #[test]
    fn test_parse_dictionary() {
        let obj = parse(b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] >>");
        let dict = obj.as_dict().unwrap();
        assert_eq!(dict_name(dict, "Type"), Some("Page"));
        assert_eq!(dict.get("Parent"), Some(&Object::Reference((2, 0))));
        assert_eq!(dict.get("MediaBox").and_then(Object::as_array).map(<[_]>::len), Some(4));
    }

    #[test]
    fn test_unterminated_dictionary_is_malformed() {
        let result = ObjectParser::new(b"<< /Type /Page").parse_object();
        assert!(matches!(result, Err(Error::MalformedDocument(_))));
    }

    #[test]
    fn test_indirect_stream_with_length() {
        let data = b"7 0 obj\n<< /Length 5 >>\nstream\nHello\nendstream\nendobj";
        let (id, obj) = ObjectParser::new(data)
            .parse_indirect_object(&no_refs)
            .unwrap();
        assert_eq!(id, (7, 0));
        assert_eq!(obj.as_stream().unwrap().data, b"Hello");
    }

    #[test]
    fn test_indirect_stream_with_wrong_length() {
        let data = b"7 0 obj\n<< /Length 99 >>\nstream\r\nHello\r\nendstream\nendobj";
        let (_, obj) = ObjectParser::new(data)
            .parse_indirect_object(&no_refs)
            .unwrap();
        assert_eq!(obj.as_stream().unwrap().data, b"Hello");
    }

    #[test]
    fn test_indirect_length_reference() {
        let data = b"3 0 obj << /Length 8 0 R >> stream\nabc\nendstream endobj";
        let resolve = |id: ObjectId| (id == (8, 0)).then_some(3);
        let (_, obj) = ObjectParser::new(data)
            .parse_indirect_object(&resolve)
            .unwrap();
        assert_eq!(obj.as_stream().unwrap().data, b"abc");
    }
}
