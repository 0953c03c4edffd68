//! Tokenizer for PDF object syntax and content streams.
//!
//! Tokens are produced one at a time from a byte slice with [`token`].
//! Whitespace and `%` comments before a token are skipped. String escapes and
//! `#XX` name escapes are decoded here so the object parser only deals with
//! values.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till, take_while, take_while1},
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map, opt, recognize},
    sequence::{pair, preceded, tuple},
    IResult,
};

/// A single lexical token.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    Integer(i64),
    Real(f64),
    /// Literal string with escapes already resolved.
    LiteralString(Vec<u8>),
    /// Hex string, decoded to bytes.
    HexString(Vec<u8>),
    /// Name without the leading slash, `#XX` escapes resolved.
    Name(String),
    ArrayStart,
    ArrayEnd,
    DictStart,
    DictEnd,
    /// Any bare word: `true`, `obj`, `R`, content operators such as `Tj` or `T*`.
    Keyword(&'a [u8]),
}

/// PDF whitespace characters.
pub fn is_whitespace(c: u8) -> bool {
    matches!(c, b' ' | b'\t' | b'\r' | b'\n' | 0x00 | 0x0C)
}

/// PDF delimiter characters.
pub fn is_delimiter(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

/// Characters that may appear inside names, numbers and keywords.
pub fn is_regular(c: u8) -> bool {
    !is_whitespace(c) && !is_delimiter(c)
}

fn lex_error(input: &[u8], kind: nom::error::ErrorKind) -> nom::Err<nom::error::Error<&[u8]>> {
    nom::Err::Error(nom::error::Error::new(input, kind))
}

/// Skip whitespace and comments, returning the remaining input.
pub fn skip_whitespace(mut input: &[u8]) -> &[u8] {
    loop {
        let trimmed = match input.iter().position(|&c| !is_whitespace(c)) {
            Some(pos) => &input[pos..],
            None => return &[],
        };
        if trimmed.first() == Some(&b'%') {
            let end = trimmed
                .iter()
                .position(|&c| c == b'\r' || c == b'\n')
                .unwrap_or(trimmed.len());
            input = &trimmed[end..];
        } else {
            return trimmed;
        }
    }
}

fn number(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, text) = recognize(pair(
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
    ))(input)?;

    // "12abc" is a keyword, not a number followed by one.
    if rest.first().is_some_and(|&c| is_regular(c) && c != b'-' && c != b'+') {
        return Err(lex_error(input, nom::error::ErrorKind::Digit));
    }

    let text = std::str::from_utf8(text).map_err(|_| lex_error(input, nom::error::ErrorKind::Digit))?;
    let token = if text.contains('.') {
        Token::Real(parse_real(text).ok_or_else(|| lex_error(input, nom::error::ErrorKind::Float))?)
    } else {
        match text.parse::<i64>() {
            Ok(value) => Token::Integer(value),
            // Out of i64 range; keep the magnitude.
            Err(_) => Token::Real(parse_real(text).ok_or_else(|| lex_error(input, nom::error::ErrorKind::Digit))?),
        }
    };
    Ok((rest, token))
}

fn parse_real(text: &str) -> Option<f64> {
    let text = text.strip_prefix('+').unwrap_or(text);
    text.parse::<f64>().ok()
}

fn name(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    map(preceded(char('/'), take_while(is_regular)), |raw: &[u8]| {
        Token::Name(decode_name(raw))
    })(input)
}

/// Resolve `#XX` escapes in a raw name. Malformed escapes are kept literally.
pub fn decode_name(raw: &[u8]) -> String {
    if !raw.contains(&b'#') {
        return String::from_utf8_lossy(raw).into_owned();
    }
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'#' && i + 2 < raw.len() {
            if let (Some(h), Some(l)) = (hex_value(raw[i + 1]), hex_value(raw[i + 2])) {
                out.push(h << 4 | l);
                i += 3;
                continue;
            }
        }
        out.push(raw[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

pub(crate) fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Literal string with balanced parentheses.
fn literal_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (body, _) = char('(')(input)?;
    let mut out = Vec::new();
    let mut depth = 1usize;
    let mut i = 0;

    while i < body.len() {
        let c = body[i];
        match c {
            b'\\' => {
                i += 1;
                let Some(&escaped) = body.get(i) else { break };
                match escaped {
                    b'n' => out.push(b'\n'),
                    b'r' => out.push(b'\r'),
                    b't' => out.push(b'\t'),
                    b'b' => out.push(0x08),
                    b'f' => out.push(0x0C),
                    b'0'..=b'7' => {
                        let mut value: u32 = 0;
                        let mut digits = 0;
                        while digits < 3 {
                            match body.get(i) {
                                Some(&d @ b'0'..=b'7') => {
                                    value = value * 8 + u32::from(d - b'0');
                                    i += 1;
                                    digits += 1;
                                }
                                _ => break,
                            }
                        }
                        out.push((value & 0xFF) as u8);
                        continue;
                    }
                    // Line continuation.
                    b'\r' => {
                        if body.get(i + 1) == Some(&b'\n') {
                            i += 1;
                        }
                    }
                    b'\n' => {}
                    other => out.push(other),
                }
                i += 1;
            }
            b'(' => {
                depth += 1;
                out.push(c);
                i += 1;
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&body[i + 1..], Token::LiteralString(out)));
                }
                out.push(c);
                i += 1;
            }
            // Bare end-of-line sequences read as a single LF.
            b'\r' => {
                out.push(b'\n');
                if body.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                i += 1;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Err(lex_error(input, nom::error::ErrorKind::Char))
}

fn hex_string(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let (rest, _) = char('<')(input)?;
    if rest.first() == Some(&b'<') {
        return Err(lex_error(input, nom::error::ErrorKind::Char));
    }
    let (rest, digits) = take_till(|c| c == b'>')(rest)?;
    let (rest, _) = char('>')(rest)?;
    Ok((rest, Token::HexString(decode_hex(digits))))
}

/// Decode hex digits, ignoring anything else. An odd trailing digit is padded with 0.
pub fn decode_hex(digits: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(digits.len() / 2 + 1);
    let mut high: Option<u8> = None;
    for value in digits.iter().filter_map(|&c| hex_value(c)) {
        match high.take() {
            Some(h) => out.push(h << 4 | value),
            None => high = Some(value),
        }
    }
    if let Some(h) = high {
        out.push(h << 4);
    }
    out
}

fn delimiters(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    alt((
        map(tag(&b"<<"[..]), |_| Token::DictStart),
        map(tag(&b">>"[..]), |_| Token::DictEnd),
        map(char('['), |_| Token::ArrayStart),
        map(char(']'), |_| Token::ArrayEnd),
    ))(input)
}

fn keyword(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    map(
        alt((take_while1(is_regular), recognize(one_of("{}")))),
        Token::Keyword,
    )(input)
}

/// Parse one token after skipping leading whitespace and comments.
pub fn token(input: &[u8]) -> IResult<&[u8], Token<'_>> {
    let input = skip_whitespace(input);
    alt((delimiters, name, number, literal_string, hex_string, keyword))(input)
}

/// Parse a token and report how many bytes of `input` it consumed.
pub fn token_len(input: &[u8]) -> Option<(Token<'_>, usize)> {
    let (rest, tok) = token(input).ok()?;
    Some((tok, input.len() - rest.len()))
}

/// Recognize the `n g R` triple, used by callers that look ahead for references.
pub(crate) fn reference(input: &[u8]) -> IResult<&[u8], (u32, u16)> {
    let start = skip_whitespace(input);
    let (rest, (num, _, generation, _, _)) = tuple((
        digit1,
        take_while1(is_whitespace),
        digit1,
        take_while1(is_whitespace),
        char('R'),
    ))(start)?;
    if rest.first().is_some_and(|&c| is_regular(c)) {
        return Err(lex_error(input, nom::error::ErrorKind::Char));
    }
    let num = std::str::from_utf8(num).ok().and_then(|s| s.parse::<u32>().ok());
    let generation = std::str::from_utf8(generation)
        .ok()
        .and_then(|s| s.parse::<u32>().ok());
    match (num, generation) {
        (Some(n), Some(g)) => Ok((rest, (n, u16::try_from(g).unwrap_or(u16::MAX)))),
        _ => Err(lex_error(input, nom::error::ErrorKind::Digit)),
    }
}
