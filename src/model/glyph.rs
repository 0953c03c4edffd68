//! Glyph runs: decoded text from one text-show operation.

/// Text from one text-show operator, positioned in user space.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphRun {
    /// Decoded Unicode text.
    pub text: String,
    /// Start of the run.
    pub x: f64,
    pub y: f64,
    /// Horizontal advance of the whole run.
    pub advance: f64,
    /// Font size after the text and current transformation matrices.
    pub font_size: f64,
    /// Average glyph advance of the font at `font_size`.
    pub glyph_width: f64,
}

impl GlyphRun {
    /// Where the next run would start if it continued this one.
    pub fn end_x(&self) -> f64 {
        self.x + self.advance
    }
}

/// Scripts written without spaces between words.
///
/// Chinese and Japanese don't use word spaces; Korean does, so Hangul is
/// not included.
pub fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and Extension A
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    // Extensions B-F
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana and Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK Symbols and Punctuation
    || (0x3000..=0x303F).contains(&code)
    // Halfwidth and Fullwidth Forms
    || (0xFF00..=0xFFEF).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spaceless_scripts() {
        assert!(is_spaceless_script_char('中'));
        assert!(is_spaceless_script_char('カ'));
        assert!(is_spaceless_script_char('。'));
        assert!(!is_spaceless_script_char('한'));
        assert!(!is_spaceless_script_char('a'));
    }

    #[test]
    fn test_end_x() {
        let run = GlyphRun {
            text: "ab ".into(),
            x: 10.0,
            y: 700.0,
            advance: 15.0,
            font_size: 12.0,
            glyph_width: 6.0,
        };
        assert_eq!(run.end_x(), 25.0);
    }
}
