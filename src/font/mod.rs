//! Fonts: mapping character codes to Unicode and glyph widths.
//!
//! A [`Font`] is decoded once per document (see [`FontCache`]) and then only
//! read. Loading never fails: anything unreadable in a font dictionary falls
//! back to defaults so that text extraction can continue.

pub mod cache;
pub mod cmap;
pub mod encoding;
pub mod metrics;

pub use cache::{FontCache, FontKey};
pub use cmap::CMap;
pub use encoding::{glyph_name_to_unicode, BaseEncoding};

use crate::parser::object::{dict_name, Dictionary, Object};
use crate::parser::Document;
use std::collections::HashMap;

/// Glyph width used when a font declares none.
const DEFAULT_WIDTH: f64 = 500.0;
const MONOSPACE_WIDTH: f64 = 600.0;
const DEFAULT_CID_WIDTH: f64 = 1000.0;

/// Font dictionary `/Subtype`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontKind {
    Type1,
    TrueType,
    Type3,
    Type0,
    Unknown,
}

impl FontKind {
    fn from_subtype(subtype: Option<&str>) -> Self {
        match subtype {
            Some("Type1") | Some("MMType1") => FontKind::Type1,
            Some("TrueType") => FontKind::TrueType,
            Some("Type3") => FontKind::Type3,
            Some("Type0") => FontKind::Type0,
            _ => FontKind::Unknown,
        }
    }
}

/// How character codes are read and mapped.
#[derive(Debug, Clone)]
enum Encoding {
    /// One byte per code.
    Simple {
        table: Box<[Option<char>; 256]>,
        differences: HashMap<u8, String>,
    },
    /// Multi-byte codes of a composite font.
    Composite {
        cmap: Option<CMap>,
        /// Codes are UTF-16 code units (`Uni*-UCS2-*`, `*-UTF16-*` CMaps).
        unicode_codes: bool,
    },
}

#[derive(Debug, Clone)]
enum Widths {
    Simple {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    Composite {
        ranges: Vec<(u32, u32, f64)>,
        singles: HashMap<u32, f64>,
        default: f64,
    },
}

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    pub code: u32,
    /// Unicode text; empty when the code has no known mapping.
    pub text: String,
    /// Horizontal advance in text space units per unit of font size.
    pub width: f64,
    /// Single-byte code 32, which word spacing applies to.
    pub is_word_space: bool,
}

/// A decoded font.
#[derive(Debug, Clone)]
pub struct Font {
    base_font: String,
    kind: FontKind,
    encoding: Encoding,
    to_unicode: Option<CMap>,
    widths: Widths,
    /// Glyph space to text space (0.001 except for Type 3 fonts).
    scale: f64,
    average_width: f64,
}

impl Font {
    /// Decode a font dictionary.
    pub fn load(doc: &Document, dict: &Dictionary) -> Font {
        let kind = FontKind::from_subtype(dict_name(dict, "Subtype"));
        let base_font = dict_name(dict, "BaseFont").unwrap_or_default().to_string();
        log::debug!("decoding font {base_font:?} ({kind:?})");

        let to_unicode = load_to_unicode(doc, dict);
        let scale = font_matrix_scale(doc, dict, kind);

        let (encoding, widths) = if kind == FontKind::Type0 {
            let descendant = descendant_font(doc, dict);
            (
                composite_encoding(doc, dict),
                composite_widths(doc, &descendant),
            )
        } else {
            let descriptor = resolved_dict(doc, dict, "FontDescriptor");
            (
                simple_encoding(doc, dict, kind, &base_font, &descriptor),
                simple_widths(doc, dict, &base_font, &descriptor),
            )
        };

        let mut font = Font {
            base_font,
            kind,
            encoding,
            to_unicode,
            widths,
            scale,
            average_width: 0.0,
        };
        font.average_width = font.compute_average_width();
        font
    }

    /// Font used when `Tf` names a missing resource: WinAnsi, default widths.
    pub fn fallback() -> Font {
        Font {
            base_font: String::new(),
            kind: FontKind::Unknown,
            encoding: Encoding::Simple {
                table: Box::new(BaseEncoding::WinAnsi.table()),
                differences: HashMap::new(),
            },
            to_unicode: None,
            widths: Widths::Simple {
                first_char: 0,
                widths: Vec::new(),
                missing: DEFAULT_WIDTH,
            },
            scale: 0.001,
            average_width: DEFAULT_WIDTH * 0.001,
        }
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    pub fn kind(&self) -> FontKind {
        self.kind
    }

    /// Mean advance of the font's glyphs, in text space per unit font size.
    pub fn average_width(&self) -> f64 {
        self.average_width
    }

    /// Split a shown string into glyphs.
    pub fn decode(&self, bytes: &[u8]) -> Vec<Glyph> {
        match &self.encoding {
            Encoding::Simple { table, differences } => bytes
                .iter()
                .map(|&b| {
                    let code = u32::from(b);
                    let text = self
                        .to_unicode
                        .as_ref()
                        .and_then(|cmap| cmap.lookup(code))
                        .map(str::to_string)
                        .or_else(|| differences.get(&b).cloned())
                        .or_else(|| table[usize::from(b)].map(String::from))
                        .unwrap_or_default();
                    Glyph {
                        code,
                        text,
                        width: self.width_of(code),
                        is_word_space: b == b' ',
                    }
                })
                .collect(),
            Encoding::Composite { cmap, unicode_codes } => {
                let splitter = cmap.as_ref().or(self.to_unicode.as_ref());
                let mut glyphs = Vec::with_capacity(bytes.len() / 2);
                let mut rest = bytes;
                while !rest.is_empty() {
                    let (code, len) = match splitter {
                        Some(map) if map.has_codespace() => map.next_code(rest, 2),
                        _ => {
                            let len = 2.min(rest.len());
                            (rest[..len].iter().fold(0u32, |acc, &b| acc << 8 | u32::from(b)), len)
                        }
                    };
                    rest = &rest[len..];

                    let text = match self.to_unicode.as_ref().and_then(|m| m.lookup(code)) {
                        Some(text) => text.to_string(),
                        None if *unicode_codes => u16::try_from(code)
                            .ok()
                            .map(|unit| String::from_utf16_lossy(&[unit]))
                            .unwrap_or_default(),
                        None => String::new(),
                    };
                    let cid = cmap.as_ref().and_then(|m| m.cid(code)).unwrap_or(code);
                    glyphs.push(Glyph {
                        code,
                        text,
                        width: self.width_of(cid),
                        is_word_space: len == 1 && code == 32,
                    });
                }
                glyphs
            }
        }
    }

    /// Advance for a code (simple fonts) or CID (composite fonts).
    fn width_of(&self, code: u32) -> f64 {
        let raw = match &self.widths {
            Widths::Simple {
                first_char,
                widths,
                missing,
            } => code
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Composite {
                ranges,
                singles,
                default,
            } => singles
                .get(&code)
                .copied()
                .or_else(|| {
                    ranges
                        .iter()
                        .find(|(lo, hi, _)| (*lo..=*hi).contains(&code))
                        .map(|(_, _, w)| *w)
                })
                .unwrap_or(*default),
        };
        raw * self.scale
    }

    fn compute_average_width(&self) -> f64 {
        let (sum, count) = match &self.widths {
            Widths::Simple { widths, missing, .. } => {
                let nonzero: Vec<f64> = widths.iter().copied().filter(|w| *w > 0.0).collect();
                if nonzero.is_empty() {
                    (*missing, 1)
                } else {
                    (nonzero.iter().sum(), nonzero.len())
                }
            }
            Widths::Composite {
                ranges,
                singles,
                default,
            } => {
                let values: Vec<f64> = singles
                    .values()
                    .copied()
                    .chain(ranges.iter().map(|(_, _, w)| *w))
                    .filter(|w| *w > 0.0)
                    .collect();
                if values.is_empty() {
                    (*default, 1)
                } else {
                    (values.iter().sum(), values.len())
                }
            }
        };
        let average = sum / count as f64 * self.scale;
        if average > 0.0 {
            average
        } else {
            DEFAULT_WIDTH * 0.001
        }
    }
}

fn resolved_dict(doc: &Document, dict: &Dictionary, key: &str) -> Dictionary {
    match doc.resolve_entry(dict, key) {
        Ok(Some(obj)) => obj.as_dict().cloned().unwrap_or_default(),
        Ok(None) => Dictionary::new(),
        Err(e) => {
            log::debug!("font /{key} unreadable: {e}");
            Dictionary::new()
        }
    }
}

fn resolved_numbers(doc: &Document, dict: &Dictionary, key: &str) -> Option<Vec<f64>> {
    let obj = doc.resolve_entry(dict, key).ok().flatten()?;
    let items = obj.as_array()?;
    Some(
        items
            .iter()
            .map(|item| {
                doc.resolve(item)
                    .ok()
                    .and_then(|v| v.as_f64())
                    .unwrap_or(0.0)
            })
            .collect(),
    )
}

fn load_to_unicode(doc: &Document, dict: &Dictionary) -> Option<CMap> {
    let obj = doc.resolve_entry(dict, "ToUnicode").ok().flatten()?;
    let stream = obj.as_stream()?;
    match doc.decode_stream(stream) {
        Ok(data) => Some(CMap::parse(&data)).filter(|cmap| !cmap.is_empty()),
        Err(e) => {
            log::debug!("ToUnicode CMap unreadable: {e}");
            None
        }
    }
}

fn font_matrix_scale(doc: &Document, dict: &Dictionary, kind: FontKind) -> f64 {
    if kind != FontKind::Type3 {
        return 0.001;
    }
    resolved_numbers(doc, dict, "FontMatrix")
        .and_then(|m| m.first().copied())
        .filter(|a| a.is_finite() && *a != 0.0)
        .map(f64::abs)
        .unwrap_or(0.001)
}

fn descendant_font(doc: &Document, dict: &Dictionary) -> Dictionary {
    let Ok(Some(array)) = doc.resolve_entry(dict, "DescendantFonts") else {
        return Dictionary::new();
    };
    array
        .as_array()
        .and_then(|items| items.first())
        .and_then(|first| doc.resolve(first).ok())
        .and_then(|d| d.as_dict().cloned())
        .unwrap_or_default()
}

fn composite_encoding(doc: &Document, dict: &Dictionary) -> Encoding {
    match doc.resolve_entry(dict, "Encoding").ok().flatten().as_deref() {
        Some(Object::Name(name)) => Encoding::Composite {
            cmap: None,
            unicode_codes: name.contains("UCS2") || name.contains("UTF16"),
        },
        Some(Object::Stream(stream)) => {
            let cmap = doc
                .decode_stream(stream)
                .map(|data| CMap::parse(&data))
                .map_err(|e| log::debug!("embedded CMap unreadable: {e}"))
                .ok();
            Encoding::Composite {
                cmap,
                unicode_codes: false,
            }
        }
        _ => Encoding::Composite {
            cmap: None,
            unicode_codes: false,
        },
    }
}

fn composite_widths(doc: &Document, descendant: &Dictionary) -> Widths {
    let default = doc
        .resolve_entry(descendant, "DW")
        .ok()
        .flatten()
        .and_then(|v| v.as_f64())
        .unwrap_or(DEFAULT_CID_WIDTH);

    let mut ranges = Vec::new();
    let mut singles = HashMap::new();
    if let Ok(Some(w)) = doc.resolve_entry(descendant, "W") {
        let items = w.as_array().unwrap_or_default();
        let mut i = 0;
        // Entries are `c [w1 w2 ...]` or `c_first c_last w`.
        while i < items.len() {
            let Some(start) = items[i].as_i64().and_then(|v| u32::try_from(v).ok()) else {
                i += 1;
                continue;
            };
            let next = items.get(i + 1).and_then(|o| doc.resolve(o).ok());
            match next.as_deref() {
                Some(Object::Array(list)) => {
                    for (offset, width) in list.iter().enumerate() {
                        if let Some(w) = width.as_f64() {
                            singles.insert(start.saturating_add(offset as u32), w);
                        }
                    }
                    i += 2;
                }
                Some(end) => {
                    let end = end.as_i64().and_then(|v| u32::try_from(v).ok());
                    let width = items.get(i + 2).and_then(Object::as_f64);
                    if let (Some(end), Some(width)) = (end, width) {
                        ranges.push((start, end, width));
                    }
                    i += 3;
                }
                None => break,
            }
        }
    }

    Widths::Composite {
        ranges,
        singles,
        default,
    }
}

fn is_symbolic(descriptor: &Dictionary) -> bool {
    descriptor
        .get("Flags")
        .and_then(Object::as_i64)
        .is_some_and(|flags| flags & 0b100 != 0 && flags & 0b10_0000 == 0)
}

fn simple_encoding(
    doc: &Document,
    dict: &Dictionary,
    kind: FontKind,
    base_font: &str,
    descriptor: &Dictionary,
) -> Encoding {
    let builtin_symbol = base_font.contains("Symbol") || base_font.contains("Dingbats");
    let mut base = match kind {
        _ if builtin_symbol || is_symbolic(descriptor) => BaseEncoding::Latin1,
        FontKind::TrueType | FontKind::Unknown => BaseEncoding::WinAnsi,
        _ => BaseEncoding::Standard,
    };
    let mut differences = HashMap::new();

    match doc.resolve_entry(dict, "Encoding").ok().flatten().as_deref() {
        Some(Object::Name(name)) => {
            if let Some(named) = BaseEncoding::from_name(name) {
                base = named;
            }
        }
        Some(Object::Dictionary(enc)) => {
            if let Some(named) = dict_name(enc, "BaseEncoding").and_then(BaseEncoding::from_name) {
                base = named;
            }
            if let Ok(Some(diffs)) = doc.resolve_entry(enc, "Differences") {
                let mut code: Option<u32> = None;
                for item in diffs.as_array().unwrap_or_default() {
                    match item {
                        Object::Integer(c) => code = u32::try_from(*c).ok(),
                        Object::Name(name) => {
                            if let Some(c) = code.and_then(|c| u8::try_from(c).ok()) {
                                if let Some(text) = glyph_name_to_unicode(name) {
                                    differences.insert(c, text);
                                }
                            }
                            code = code.and_then(|c| c.checked_add(1));
                        }
                        _ => {}
                    }
                }
            }
        }
        _ => {}
    }

    Encoding::Simple {
        table: Box::new(base.table()),
        differences,
    }
}

fn simple_widths(
    doc: &Document,
    dict: &Dictionary,
    base_font: &str,
    descriptor: &Dictionary,
) -> Widths {
    let first_char = doc
        .resolve_entry(dict, "FirstChar")
        .ok()
        .flatten()
        .and_then(|v| v.as_i64())
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(0);
    let widths = resolved_numbers(doc, dict, "Widths").unwrap_or_default();

    let monospace = base_font.contains("Courier")
        || descriptor
            .get("Flags")
            .and_then(Object::as_i64)
            .is_some_and(|f| f & 1 != 0);
    let missing = descriptor
        .get("MissingWidth")
        .and_then(Object::as_f64)
        .filter(|w| *w > 0.0)
        .unwrap_or(if monospace { MONOSPACE_WIDTH } else { DEFAULT_WIDTH });

    if widths.is_empty() {
        if let Some(table) = metrics::standard_widths(base_font) {
            return Widths::Simple {
                first_char: metrics::FIRST_CODE,
                widths: table.iter().map(|&w| f64::from(w)).collect(),
                missing,
            };
        }
    }

    Widths::Simple {
        first_char,
        widths,
        missing,
    }
}
