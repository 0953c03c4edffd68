//! Cross-reference tables and streams.
//!
//! Sections are read from the last `startxref` backwards through `/Prev`
//! links. The newest definition of an object wins.

use super::filters;
use super::lexer::Token;
use super::object::{rfind_subslice, Dictionary, Object, ObjectParser};
use crate::error::{Error, Result};
use std::collections::{HashMap, HashSet};

/// Bytes at the end of the file searched for `startxref`.
const TAIL_WINDOW: usize = 2048;
/// Upper bound on `/Prev` hops, guards against cycles the visited set misses.
const MAX_SECTIONS: usize = 512;

/// Location of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XrefEntry {
    Free,
    InUse { offset: usize, generation: u16 },
    /// Stored as the `index`-th object of object stream `stream`.
    Compressed { stream: u32, index: u32 },
}

/// Merged cross-reference information for a whole file.
#[derive(Debug, Clone, Default)]
pub struct Xref {
    entries: HashMap<u32, XrefEntry>,
    trailer: Dictionary,
}

impl Xref {
    pub fn get(&self, number: u32) -> Option<&XrefEntry> {
        self.entries.get(&number)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Trailer dictionary, newest keys first.
    pub fn trailer(&self) -> &Dictionary {
        &self.trailer
    }

    fn merge(&mut self, entries: Vec<(u32, XrefEntry)>, trailer: Option<Dictionary>) {
        for (number, entry) in entries {
            self.entries.entry(number).or_insert(entry);
        }
        for (key, value) in trailer.into_iter().flatten() {
            self.trailer.entry(key).or_insert(value);
        }
    }
}

/// Locate the byte offset named by the final `startxref`.
pub fn find_startxref(data: &[u8]) -> Result<usize> {
    let tail_start = data.len().saturating_sub(TAIL_WINDOW);
    let tail = &data[tail_start..];
    let pos = rfind_subslice(tail, b"startxref")
        .ok_or_else(|| Error::malformed("startxref not found"))?;

    let mut parser = ObjectParser::at(data, tail_start + pos + b"startxref".len());
    match parser.next_token() {
        Some(Token::Integer(offset)) => usize::try_from(offset)
            .ok()
            .filter(|&o| o < data.len())
            .ok_or_else(|| Error::malformed(format!("startxref offset {offset} out of range"))),
        _ => Err(Error::malformed("startxref is not followed by an offset")),
    }
}

/// Read every cross-reference section reachable from `startxref`.
pub fn load(data: &[u8]) -> Result<Xref> {
    let mut xref = Xref::default();
    let mut visited = HashSet::new();
    let mut next = Some(find_startxref(data)?);

    while let Some(offset) = next.take() {
        if !visited.insert(offset) || visited.len() > MAX_SECTIONS {
            log::debug!("xref chain revisits offset {offset}, stopping");
            break;
        }
        let section = read_section(data, offset)?;

        next = section
            .trailer
            .get("Prev")
            .and_then(Object::as_i64)
            .and_then(|p| usize::try_from(p).ok());

        // Hybrid files: the stream's entries override the table's free markers.
        if let Some(stm) = section
            .trailer
            .get("XRefStm")
            .and_then(Object::as_i64)
            .and_then(|p| usize::try_from(p).ok())
        {
            if visited.insert(stm) {
                match read_section(data, stm) {
                    Ok(hybrid) => xref.merge(hybrid.entries, None),
                    Err(e) => log::debug!("ignoring unreadable /XRefStm at {stm}: {e}"),
                }
            }
        }

        xref.merge(section.entries, Some(section.trailer));
    }

    if !xref.trailer.contains_key("Root") {
        return Err(Error::malformed("trailer has no /Root"));
    }
    Ok(xref)
}

struct Section {
    entries: Vec<(u32, XrefEntry)>,
    trailer: Dictionary,
}

fn read_section(data: &[u8], offset: usize) -> Result<Section> {
    if offset >= data.len() {
        return Err(Error::malformed(format!("xref offset {offset} out of range")));
    }
    let mut parser = ObjectParser::at(data, offset);
    match parser.peek_token() {
        Some(Token::Keyword(b"xref")) => {
            parser.next_token();
            read_table(&mut parser)
        }
        Some(Token::Integer(_)) => read_stream(&mut parser),
        _ => Err(Error::malformed(format!(
            "no cross-reference section at offset {offset}"
        ))),
    }
}

fn read_table(parser: &mut ObjectParser<'_>) -> Result<Section> {
    let mut entries = Vec::new();
    loop {
        match parser.next_token() {
            Some(Token::Keyword(b"trailer")) => break,
            Some(Token::Integer(start)) => {
                let count = match parser.next_token() {
                    Some(Token::Integer(c)) if c >= 0 => c,
                    _ => return Err(corrupt_table(parser)),
                };
                let start = u32::try_from(start).map_err(|_| corrupt_table(parser))?;
                for i in 0..count {
                    let entry = read_table_entry(parser)?;
                    let number = start
                        .checked_add(u32::try_from(i).map_err(|_| corrupt_table(parser))?)
                        .ok_or_else(|| corrupt_table(parser))?;
                    entries.push((number, entry));
                }
            }
            _ => return Err(corrupt_table(parser)),
        }
    }

    let trailer = match parser.parse_object()? {
        Object::Dictionary(dict) => dict,
        other => {
            return Err(Error::malformed(format!(
                "trailer is a {}, not a dictionary",
                other.type_name()
            )))
        }
    };
    Ok(Section { entries, trailer })
}

fn read_table_entry(parser: &mut ObjectParser<'_>) -> Result<XrefEntry> {
    let offset = match parser.next_token() {
        Some(Token::Integer(o)) if o >= 0 => o,
        _ => return Err(corrupt_table(parser)),
    };
    let generation = match parser.next_token() {
        Some(Token::Integer(g)) if g >= 0 => u16::try_from(g).unwrap_or(u16::MAX),
        _ => return Err(corrupt_table(parser)),
    };
    match parser.next_token() {
        Some(Token::Keyword(b"n")) if offset > 0 => Ok(XrefEntry::InUse {
            offset: offset as usize,
            generation,
        }),
        Some(Token::Keyword(b"n")) | Some(Token::Keyword(b"f")) => Ok(XrefEntry::Free),
        _ => Err(corrupt_table(parser)),
    }
}

fn corrupt_table(parser: &ObjectParser<'_>) -> Error {
    Error::malformed(format!(
        "corrupt cross-reference table near offset {}",
        parser.position()
    ))
}

fn read_stream(parser: &mut ObjectParser<'_>) -> Result<Section> {
    let (_, object) = parser.parse_indirect_object(&|_| None)?;
    let stream = match object {
        Object::Stream(s) if s.dict.get("Type").and_then(Object::as_name) == Some("XRef") => s,
        _ => return Err(Error::malformed("expected a cross-reference stream")),
    };

    let chain = filters::filter_chain(stream.dict.get("Filter"), stream.dict.get("DecodeParms"));
    let data = filters::decode(&stream.data, &chain)
        .map_err(|e| Error::malformed(format!("cross-reference stream: {e}")))?;

    let widths: Vec<usize> = stream
        .dict
        .get("W")
        .and_then(Object::as_array)
        .map(|w| {
            w.iter()
                .map(|v| v.as_i64().and_then(|v| usize::try_from(v).ok()).unwrap_or(0))
                .collect()
        })
        .unwrap_or_default();
    if widths.len() != 3 || widths.iter().any(|&w| w > 8) {
        return Err(Error::malformed("cross-reference stream has an invalid /W"));
    }
    let row_len: usize = widths.iter().sum();
    if row_len == 0 {
        return Err(Error::malformed("cross-reference stream has empty rows"));
    }

    let size = stream.dict.get("Size").and_then(Object::as_i64).unwrap_or(0);
    let index: Vec<i64> = match stream.dict.get("Index").and_then(Object::as_array) {
        Some(items) => items.iter().filter_map(Object::as_i64).collect(),
        None => vec![0, size],
    };

    let mut entries = Vec::new();
    let mut rows = data.chunks_exact(row_len);
    for pair in index.chunks_exact(2) {
        let (start, count) = (pair[0], pair[1]);
        for i in 0..count.max(0) {
            let Some(row) = rows.next() else { break };
            let Ok(number) = u32::try_from(start + i) else { continue };

            let (f1, rest) = row.split_at(widths[0]);
            let (f2, f3) = rest.split_at(widths[1]);
            let kind = if widths[0] == 0 { 1 } else { be_int(f1) };
            let entry = match kind {
                0 => XrefEntry::Free,
                1 => XrefEntry::InUse {
                    offset: be_int(f2) as usize,
                    generation: u16::try_from(be_int(f3)).unwrap_or(0),
                },
                2 => XrefEntry::Compressed {
                    stream: be_int(f2) as u32,
                    index: be_int(f3) as u32,
                },
                // Unknown types are references to the null object.
                _ => XrefEntry::Free,
            };
            entries.push((number, entry));
        }
    }

    Ok(Section {
        entries,
        trailer: stream.dict,
    })
}

fn be_int(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_file() -> Vec<u8> {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        let obj1 = pdf.len();
        pdf.extend_from_slice(b"1 0 obj\n<< /Type /Catalog >>\nendobj\n");
        let xref_at = pdf.len();
        pdf.extend_from_slice(
            format!(
                "xref\n0 2\n0000000000 65535 f \n{obj1:010} 00000 n \ntrailer\n<< /Size 2 /Root 1 0 R >>\nstartxref\n{xref_at}\n%%EOF\n"
            )
            .as_bytes(),
        );
        pdf
    }

    #[test]
    fn test_traditional_table() {
        let xref = load(&minimal_file()).unwrap();
        assert_eq!(xref.get(0), Some(&XrefEntry::Free));
        assert_eq!(
            xref.get(1),
            Some(&XrefEntry::InUse {
                offset: 9,
                generation: 0
            })
        );
        assert_eq!(xref.trailer().get("Root"), Some(&Object::Reference((1, 0))));
    }

    #[test]
    fn test_missing_startxref() {
        let err = load(b"%PDF-1.4\n1 0 obj << >> endobj\n").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_corrupt_table_entries() {
        let pdf = String::from_utf8(minimal_file())
            .unwrap()
            .replace("00000 n", "zzzzz n");
        let err = load(pdf.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_offset_pointing_at_garbage() {
        let pdf = String::from_utf8(minimal_file()).unwrap().replace("\nxref\n", "\nxxxx\n");
        let err = load(pdf.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument(_)));
    }

    #[test]
    fn test_be_int() {
        assert_eq!(be_int(&[]), 0);
        assert_eq!(be_int(&[0x01, 0x02]), 0x0102);
    }
}
