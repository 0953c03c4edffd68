//! Document metadata from the trailer `/Info` dictionary.

use crate::parser::object::{Dictionary, Object};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version from the header, or the catalog's `/Version` when newer
    pub pdf_version: String,

    /// Total number of pages
    pub page_count: u32,

    /// Whether the trailer carries an `/Encrypt` dictionary
    pub encrypted: bool,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }

    /// Fill the descriptive fields from an `/Info` dictionary whose values
    /// are already resolved.
    pub fn read_info(&mut self, info: &Dictionary) {
        let text = |key: &str| {
            info.get(key)
                .and_then(Object::as_bytes)
                .map(decode_text_string)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };
        self.title = text("Title");
        self.author = text("Author");
        self.subject = text("Subject");
        self.keywords = text("Keywords");
        self.creator = text("Creator");
        self.producer = text("Producer");
        self.created = text("CreationDate").and_then(|s| parse_pdf_date(&s));
        self.modified = text("ModDate").and_then(|s| parse_pdf_date(&s));
    }
}

/// Decode a PDF text string: UTF-16BE or UTF-8 with BOM, else PDFDocEncoding.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(body) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(body) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(body).into_owned();
    }
    bytes.iter().map(|&b| pdf_doc_char(b)).collect()
}

/// PDFDocEncoding agrees with Latin-1 except in 0x18..=0x1F and 0x80..=0xA0.
fn pdf_doc_char(b: u8) -> char {
    match b {
        0x18 => '\u{02D8}',
        0x19 => '\u{02C7}',
        0x1A => '\u{02C6}',
        0x1B => '\u{02D9}',
        0x1C => '\u{02DD}',
        0x1D => '\u{02DB}',
        0x1E => '\u{02DA}',
        0x1F => '\u{02DC}',
        0x80 => '\u{2022}',
        0x81 => '\u{2020}',
        0x82 => '\u{2021}',
        0x83 => '\u{2026}',
        0x84 => '\u{2014}',
        0x85 => '\u{2013}',
        0x86 => '\u{0192}',
        0x87 => '\u{2044}',
        0x88 => '\u{2039}',
        0x89 => '\u{203A}',
        0x8A => '\u{2212}',
        0x8B => '\u{2030}',
        0x8C => '\u{201E}',
        0x8D => '\u{201C}',
        0x8E => '\u{201D}',
        0x8F => '\u{2018}',
        0x90 => '\u{2019}',
        0x91 => '\u{201A}',
        0x92 => '\u{2122}',
        0x93 => '\u{FB01}',
        0x94 => '\u{FB02}',
        0x95 => '\u{0141}',
        0x96 => '\u{0152}',
        0x97 => '\u{0160}',
        0x98 => '\u{0178}',
        0x99 => '\u{017D}',
        0x9A => '\u{0131}',
        0x9B => '\u{0142}',
        0x9C => '\u{0153}',
        0x9D => '\u{0161}',
        0x9E => '\u{017E}',
        0xA0 => '\u{20AC}',
        other => char::from(other),
    }
}

/// Parse a PDF date string (`D:YYYYMMDDHHmmSSOHH'mm'`).
///
/// Everything after the year is optional. The result is normalized to UTC.
pub fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    let s = s.strip_prefix("D:").unwrap_or(s);
    if s.len() < 4 {
        return None;
    }

    let field = |range: std::ops::Range<usize>, default: u32| -> u32 {
        s.get(range)
            .filter(|f| f.bytes().all(|b| b.is_ascii_digit()))
            .and_then(|f| f.parse().ok())
            .unwrap_or(default)
    };
    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month = field(4..6, 1);
    let day = field(6..8, 1);
    let hour = field(8..10, 0);
    let minute = field(10..12, 0);
    let second = field(12..14, 0);

    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;

    let offset_seconds = match s.get(14..15) {
        Some(sign @ ("+" | "-")) => {
            let digits: String = s[15..].chars().filter(char::is_ascii_digit).collect();
            let hours: i32 = digits.get(0..2).and_then(|h| h.parse().ok()).unwrap_or(0);
            let minutes: i32 = digits.get(2..4).and_then(|m| m.parse().ok()).unwrap_or(0);
            let total = hours * 3600 + minutes * 60;
            if sign == "-" {
                -total
            } else {
                total
            }
        }
        _ => 0,
    };

    let offset = FixedOffset::east_opt(offset_seconds)?;
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_pdf_date() {
        let date = parse_pdf_date("D:20240115103045").unwrap();
        assert_eq!(date.year(), 2024);
        assert_eq!(date.month(), 1);
        assert_eq!(date.day(), 15);
        assert_eq!(date.hour(), 10);
    }

    #[test]
    fn test_parse_pdf_date_minimal() {
        let date = parse_pdf_date("D:2024").unwrap();
        assert_eq!((date.year(), date.month(), date.day()), (2024, 1, 1));
    }

    #[test]
    fn test_parse_pdf_date_with_offset() {
        let date = parse_pdf_date("D:20240115103045+02'00'").unwrap();
        assert_eq!(date.hour(), 8);
        let date = parse_pdf_date("D:20240115103045-05'30").unwrap();
        assert_eq!((date.hour(), date.minute()), (16, 0));
    }

    #[test]
    fn test_parse_pdf_date_invalid() {
        assert!(parse_pdf_date("D:20").is_none());
        assert!(parse_pdf_date("yesterday").is_none());
    }

    #[test]
    fn test_decode_text_string() {
        assert_eq!(decode_text_string(b"\xFE\xFF\x00H\x00i"), "Hi");
        assert_eq!(decode_text_string(b"Caf\xe9"), "Caf\u{e9}");
        assert_eq!(decode_text_string(b"\x93x"), "\u{FB01}x");
    }

    #[test]
    fn test_read_info() {
        let mut info = Dictionary::new();
        info.insert("Title".into(), Object::String(b"Quarterly report".to_vec()));
        info.insert("Author".into(), Object::String(b"  ".to_vec()));
        info.insert("CreationDate".into(), Object::String(b"D:20230301".to_vec()));

        let mut metadata = Metadata::with_version("1.7");
        metadata.read_info(&info);
        assert_eq!(metadata.title.as_deref(), Some("Quarterly report"));
        assert_eq!(metadata.author, None);
        assert_eq!(metadata.created.map(|d| d.month()), Some(3));
    }
}
