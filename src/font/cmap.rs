//! CMap parsing: ToUnicode maps and embedded CID CMaps.

use crate::parser::lexer::{self, Token};
use std::collections::HashMap;

/// Largest range expanded from a single `bfrange`/`cidrange` line.
const MAX_RANGE: u32 = 0x1_0000;

/// One `codespacerange` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CodespaceRange {
    low: Vec<u8>,
    high: Vec<u8>,
}

impl CodespaceRange {
    fn matches(&self, bytes: &[u8]) -> bool {
        bytes.len() == self.low.len()
            && bytes
                .iter()
                .zip(self.low.iter().zip(&self.high))
                .all(|(b, (lo, hi))| lo <= b && b <= hi)
    }
}

/// A parsed CMap.
///
/// The same structure serves ToUnicode maps (code to text) and embedded
/// encoding CMaps (code to CID).
#[derive(Debug, Clone, Default)]
pub struct CMap {
    codespace: Vec<CodespaceRange>,
    unicode: HashMap<u32, String>,
    cids: HashMap<u32, u32>,
    cid_ranges: Vec<(u32, u32, u32)>,
}

impl CMap {
    /// Parse CMap source. Unparseable sections are skipped.
    pub fn parse(data: &[u8]) -> Self {
        let mut cmap = CMap::default();
        let mut rest = data;

        while !rest.is_empty() {
            let Some((token, len)) = lexer::token_len(rest) else {
                rest = &rest[1..];
                continue;
            };
            rest = &rest[len..];

            match token {
                Token::Keyword(b"begincodespacerange") => {
                    let (entries, after) = collect_until(rest, b"endcodespacerange");
                    rest = after;
                    for pair in entries.chunks_exact(2) {
                        if let (Some(low), Some(high)) = (bytes_of(&pair[0]), bytes_of(&pair[1])) {
                            if low.len() == high.len() && !low.is_empty() {
                                cmap.codespace.push(CodespaceRange {
                                    low: low.to_vec(),
                                    high: high.to_vec(),
                                });
                            }
                        }
                    }
                }
                Token::Keyword(b"beginbfchar") => {
                    let (entries, after) = collect_until(rest, b"endbfchar");
                    rest = after;
                    for pair in entries.chunks_exact(2) {
                        let Some(src) = bytes_of(&pair[0]) else { continue };
                        if let Some(text) = destination_text(&pair[1]) {
                            log::trace!("bfchar <{}> -> {text:?}", hex(src));
                            cmap.unicode.insert(code_value(src), text);
                        }
                    }
                }
                Token::Keyword(b"beginbfrange") => {
                    let (entries, after) = collect_until(rest, b"endbfrange");
                    rest = after;
                    cmap.add_bf_ranges(&entries);
                }
                Token::Keyword(b"begincidchar") => {
                    let (entries, after) = collect_until(rest, b"endcidchar");
                    rest = after;
                    for pair in entries.chunks_exact(2) {
                        if let (Some(src), Token::Integer(cid)) = (bytes_of(&pair[0]), &pair[1]) {
                            cmap.cids.insert(code_value(src), (*cid).max(0) as u32);
                        }
                    }
                }
                Token::Keyword(b"begincidrange") => {
                    let (entries, after) = collect_until(rest, b"endcidrange");
                    rest = after;
                    for triple in entries.chunks_exact(3) {
                        if let (Some(lo), Some(hi), Token::Integer(cid)) =
                            (bytes_of(&triple[0]), bytes_of(&triple[1]), &triple[2])
                        {
                            cmap.cid_ranges
                                .push((code_value(lo), code_value(hi), (*cid).max(0) as u32));
                        }
                    }
                }
                // usecmap, def and the PostScript wrapper are not needed.
                _ => {}
            }
        }
        cmap
    }

    /// Entries are `lo hi dst` where dst is a string or an array of strings.
    ///
    /// Arrays arrive flattened from [`collect_until`] as `ArrayStart ... ArrayEnd`.
    fn add_bf_ranges(&mut self, entries: &[Token<'_>]) {
        let mut i = 0;
        while i + 2 < entries.len() {
            let (Some(lo), Some(hi)) = (bytes_of(&entries[i]), bytes_of(&entries[i + 1])) else {
                i += 1;
                continue;
            };
            let (lo, hi) = (code_value(lo), code_value(hi));
            if hi < lo || hi - lo > MAX_RANGE {
                i += 3;
                continue;
            }

            match &entries[i + 2] {
                Token::ArrayStart => {
                    let mut j = i + 3;
                    let mut code = lo;
                    while j < entries.len() && entries[j] != Token::ArrayEnd {
                        if let Some(text) = destination_text(&entries[j]) {
                            if code <= hi {
                                self.unicode.insert(code, text);
                            }
                        }
                        code = code.saturating_add(1);
                        j += 1;
                    }
                    i = j + 1;
                }
                dst => {
                    if let Some(base) = bytes_of(dst) {
                        let units = utf16_units(base);
                        for offset in 0..=(hi - lo) {
                            if let Some(text) = offset_text(&units, offset) {
                                self.unicode.insert(lo + offset, text);
                            }
                        }
                    }
                    i += 3;
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.unicode.is_empty() && self.cids.is_empty() && self.cid_ranges.is_empty()
    }

    pub fn has_codespace(&self) -> bool {
        !self.codespace.is_empty()
    }

    /// Unicode text for a character code.
    pub fn lookup(&self, code: u32) -> Option<&str> {
        self.unicode.get(&code).map(String::as_str)
    }

    /// CID for a character code, from `cidchar`/`cidrange` entries.
    pub fn cid(&self, code: u32) -> Option<u32> {
        if let Some(&cid) = self.cids.get(&code) {
            return Some(cid);
        }
        self.cid_ranges
            .iter()
            .find(|(lo, hi, _)| (*lo..=*hi).contains(&code))
            .and_then(|(lo, _, start)| start.checked_add(code - lo))
    }

    /// Split the next character code off `bytes` using the codespace ranges.
    ///
    /// Returns the code and the number of bytes it occupies. Without a
    /// codespace, `default_len` bytes are taken.
    pub fn next_code(&self, bytes: &[u8], default_len: usize) -> (u32, usize) {
        if !self.codespace.is_empty() {
            for len in 1..=4.min(bytes.len()) {
                let candidate = &bytes[..len];
                if self.codespace.iter().any(|r| r.matches(candidate)) {
                    return (code_value(candidate), len);
                }
            }
            // No range matched: consume the shortest declared length.
            let len = self
                .codespace
                .iter()
                .map(|r| r.low.len())
                .min()
                .unwrap_or(1)
                .min(bytes.len())
                .max(1);
            return (code_value(&bytes[..len]), len);
        }
        let len = default_len.clamp(1, 4).min(bytes.len()).max(1);
        (code_value(&bytes[..len]), len)
    }
}

/// Tokens up to (not including) `end`, and the input after `end`.
fn collect_until<'a>(mut rest: &'a [u8], end: &[u8]) -> (Vec<Token<'a>>, &'a [u8]) {
    let mut tokens = Vec::new();
    while !rest.is_empty() {
        let Some((token, len)) = lexer::token_len(rest) else {
            rest = &rest[1..];
            continue;
        };
        rest = &rest[len..];
        if matches!(token, Token::Keyword(k) if k == end) {
            break;
        }
        tokens.push(token);
    }
    (tokens, rest)
}

fn bytes_of<'t>(token: &'t Token<'_>) -> Option<&'t [u8]> {
    match token {
        Token::HexString(b) | Token::LiteralString(b) => Some(b),
        _ => None,
    }
}

fn code_value(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(4)
        .fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

fn utf16_units(bytes: &[u8]) -> Vec<u16> {
    if bytes.len() == 1 {
        return vec![u16::from(bytes[0])];
    }
    bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [only] => u16::from(*only),
            _ => 0,
        })
        .collect()
}

/// Destination of a `bfchar`: UTF-16BE bytes or a glyph name.
fn destination_text(token: &Token<'_>) -> Option<String> {
    match token {
        Token::Name(name) => super::encoding::glyph_name_to_unicode(name),
        other => bytes_of(other).map(|b| String::from_utf16_lossy(&utf16_units(b))),
    }
}

/// Text for `base + offset`, incrementing the final UTF-16 unit.
fn offset_text(units: &[u16], offset: u32) -> Option<String> {
    let (last, head) = units.split_last()?;
    let bumped = u32::from(*last) + offset;
    let mut out: Vec<u16> = head.to_vec();
    if bumped > 0xFFFF {
        let c = char::from_u32(bumped)?;
        let mut buf = [0u16; 2];
        out.extend_from_slice(c.encode_utf16(&mut buf));
    } else {
        out.push(bumped as u16);
    }
    Some(String::from_utf16_lossy(&out))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TO_UNICODE: &[u8] = b"/CIDInit /ProcSet findresource begin
12 dict begin
begincmap
/CMapName /Adobe-Identity-UCS def
1 begincodespacerange
<0000> <FFFF>
endcodespacerange
3 beginbfchar
<0003> <0020>
<0011> <00660069>
<0012> <D835DF0C>
endbfchar
2 beginbfrange
<0024> <0026> <0041>
<0030> <0031> [<0078> <0079>]
endbfrange
endcmap
CMapName currentdict /CMap defineresource pop
end
end";

    #[test]
    fn test_bfchar_and_ligature() {
        let cmap = CMap::parse(TO_UNICODE);
        assert_eq!(cmap.lookup(0x03), Some(" "));
        assert_eq!(cmap.lookup(0x11), Some("fi"));
        assert_eq!(cmap.lookup(0x12), Some("\u{1D70C}"));
    }

    #[test]
    fn test_bfrange_forms() {
        let cmap = CMap::parse(TO_UNICODE);
        assert_eq!(cmap.lookup(0x24), Some("A"));
        assert_eq!(cmap.lookup(0x26), Some("C"));
        assert_eq!(cmap.lookup(0x30), Some("x"));
        assert_eq!(cmap.lookup(0x31), Some("y"));
        assert_eq!(cmap.lookup(0x27), None);
    }

    #[test]
    fn test_codespace_splits_codes() {
        let cmap = CMap::parse(TO_UNICODE);
        assert_eq!(cmap.next_code(&[0x00, 0x24, 0x00], 1), (0x0024, 2));
    }

    #[test]
    fn test_mixed_width_codespace() {
        let cmap = CMap::parse(
            b"2 begincodespacerange <00> <80> <8140> <9FFC> endcodespacerange",
        );
        assert_eq!(cmap.next_code(&[0x41, 0x81, 0x40], 2), (0x41, 1));
        assert_eq!(cmap.next_code(&[0x81, 0x40], 2), (0x8140, 2));
    }

    #[test]
    fn test_cid_ranges() {
        let cmap = CMap::parse(
            b"1 begincidrange <0020> <007E> 1 endcidrange 1 begincidchar <00A0> 500 endcidchar",
        );
        assert_eq!(cmap.cid(0x20), Some(1));
        assert_eq!(cmap.cid(0x41), Some(34));
        assert_eq!(cmap.cid(0xA0), Some(500));
        assert_eq!(cmap.cid(0x10), None);
    }

    #[test]
    fn test_cid_range_past_u32_max_has_no_cid() {
        let cmap = CMap::parse(b"1 begincidrange <0000> <FFFF> 4294967295 endcidrange");
        assert_eq!(cmap.cid(0x0000), Some(u32::MAX));
        assert_eq!(cmap.cid(0x0001), None);
        assert_eq!(cmap.cid(0xFFFF), None);
    }

    #[test]
    fn test_garbage_is_empty() {
        assert!(CMap::parse(b"\x00\xff garbage ) ( ]").is_empty());
    }
}
