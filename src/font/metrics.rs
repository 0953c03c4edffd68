//! Advance widths of the standard 14 fonts.
//!
//! Simple fonts that name a standard font and carry no `/Widths` array are
//! measured with these AFM widths. Only the printable ASCII codes (32..=126,
//! in StandardEncoding order) are tabulated; other codes use the font's
//! missing width.

/// First code covered by the tables.
pub const FIRST_CODE: u32 = 32;

type WidthTable = [u16; 95];

const HELVETICA: WidthTable = [
    278, 278, 355, 556, 556, 889, 667, 222, 333, 333, 389, 584, 278, 333, 278, 278, // space ../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // : ; < = > ? @
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A-M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N-Z
    278, 278, 278, 469, 556, 222, // [ \ ] ^ _ `
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a-m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n-z
    334, 260, 334, 584, // { | } ~
];

const HELVETICA_BOLD: WidthTable = [
    278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 278,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const TIMES_ROMAN: WidthTable = [
    250, 333, 408, 500, 500, 833, 778, 333, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

const TIMES_BOLD: WidthTable = [
    250, 333, 555, 500, 500, 1000, 833, 333, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

const TIMES_ITALIC: WidthTable = [
    250, 333, 420, 500, 500, 833, 778, 333, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 675, 675, 675, 500, 920,
    611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833,
    667, 722, 611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556,
    389, 278, 389, 422, 500, 333,
    500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722,
    500, 500, 500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389,
    400, 275, 400, 541,
];

const TIMES_BOLD_ITALIC: WidthTable = [
    250, 389, 555, 500, 500, 833, 778, 333, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 832,
    667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889,
    722, 722, 611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611,
    333, 278, 333, 570, 500, 333,
    500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778,
    556, 500, 500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389,
    348, 220, 348, 570,
];

const COURIER: WidthTable = [600; 95];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Helvetica,
    Times,
    Courier,
}

/// Strip a subset tag (`ABCDEF+`) and separators from a `/BaseFont` name.
fn canonical_name(base_font: &str) -> String {
    let name = match base_font.split_once('+') {
        Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
        _ => base_font,
    };
    name.chars().filter(|c| !matches!(c, ' ' | ',' | '-')).collect()
}

fn family(name: &str) -> Option<Family> {
    if name.starts_with("Helvetica") || name.starts_with("Arial") {
        Some(Family::Helvetica)
    } else if name.starts_with("Times") {
        Some(Family::Times)
    } else if name.starts_with("Courier") {
        Some(Family::Courier)
    } else {
        None
    }
}

/// AFM widths for a standard font or one of its common aliases (Arial,
/// Times New Roman, Courier New), indexed from [`FIRST_CODE`].
///
/// `None` for any other font, including Symbol and ZapfDingbats.
pub fn standard_widths(base_font: &str) -> Option<&'static [u16]> {
    let name = canonical_name(base_font);
    let bold = name.contains("Bold");
    let italic = name.contains("Italic") || name.contains("Oblique");
    let table = match (family(&name)?, bold, italic) {
        (Family::Helvetica, false, _) => &HELVETICA,
        (Family::Helvetica, true, _) => &HELVETICA_BOLD,
        (Family::Times, false, false) => &TIMES_ROMAN,
        (Family::Times, true, false) => &TIMES_BOLD,
        (Family::Times, false, true) => &TIMES_ITALIC,
        (Family::Times, true, true) => &TIMES_BOLD_ITALIC,
        (Family::Courier, _, _) => &COURIER,
    };
    Some(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn width(base_font: &str, c: char) -> u16 {
        standard_widths(base_font).unwrap()[(c as u32 - FIRST_CODE) as usize]
    }

    #[test]
    fn test_helvetica_widths() {
        assert_eq!(width("Helvetica", ' '), 278);
        assert_eq!(width("Helvetica", 'S'), 667);
        assert_eq!(width("Helvetica", 'm'), 833);
        assert_eq!(width("Helvetica", '~'), 584);
        assert_eq!(width("Helvetica-Bold", 'b'), 611);
        assert_eq!(width("Helvetica-Oblique", 'i'), 222);
    }

    #[test]
    fn test_times_styles() {
        assert_eq!(width("Times-Roman", 'a'), 444);
        assert_eq!(width("Times-Bold", 'W'), 1000);
        assert_eq!(width("Times-Italic", 'A'), 611);
        assert_eq!(width("Times-BoldItalic", 'z'), 389);
    }

    #[test]
    fn test_aliases_and_subset_tags() {
        assert_eq!(width("ArialMT", 'e'), 556);
        assert_eq!(width("Arial,Bold", 'e'), 556);
        assert_eq!(width("Arial-BoldMT", 'f'), 333);
        assert_eq!(width("ABCDEF+TimesNewRomanPSMT", 'a'), 444);
        assert_eq!(width("Courier New", 'W'), 600);
    }

    #[test]
    fn test_other_fonts_have_no_table() {
        assert!(standard_widths("Symbol").is_none());
        assert!(standard_widths("ZapfDingbats").is_none());
        assert!(standard_widths("Calibri").is_none());
        assert!(standard_widths("").is_none());
    }
}
