//! Optional text normalization applied to each page segment.

use crate::error::{Error, Result};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Cleanup preset levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPreset {
    /// Unicode NFC normalization and space collapsing only
    Minimal,
    /// Minimal plus ligature expansion, hyphenation repair and page numbers
    #[default]
    Standard,
    /// Everything, including private-use characters and CJK line joins
    Aggressive,
}

/// Options for text cleanup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupOptions {
    /// Normalize Unicode to NFC form
    pub normalize_unicode: bool,

    /// Expand ligature code points (ﬁ, ﬂ, ...) into letters
    pub fix_ligatures: bool,

    /// Join words hyphenated across line breaks
    pub fix_hyphenation: bool,

    /// Remove lines consisting only of a page number
    pub remove_page_numbers: bool,

    /// Remove Private Use Area characters (unmapped symbol glyphs)
    pub remove_pua: bool,

    /// Remove U+FFFD
    pub remove_replacement_char: bool,

    /// Join Chinese/Japanese text split across single line breaks
    pub merge_cjk_lines: bool,

    /// Collapse runs of spaces and tabs to one space
    pub collapse_spaces: bool,

    /// Maximum consecutive newlines (0 = unlimited)
    pub max_consecutive_newlines: u8,
}

impl CleanupOptions {
    /// Create options from a preset.
    pub fn from_preset(preset: CleanupPreset) -> Self {
        match preset {
            CleanupPreset::Minimal => Self::minimal(),
            CleanupPreset::Standard => Self::standard(),
            CleanupPreset::Aggressive => Self::aggressive(),
        }
    }

    pub fn minimal() -> Self {
        Self {
            normalize_unicode: true,
            fix_ligatures: false,
            fix_hyphenation: false,
            remove_page_numbers: false,
            remove_pua: false,
            remove_replacement_char: false,
            merge_cjk_lines: false,
            collapse_spaces: true,
            max_consecutive_newlines: 0,
        }
    }

    pub fn standard() -> Self {
        Self {
            fix_ligatures: true,
            fix_hyphenation: true,
            remove_page_numbers: true,
            remove_replacement_char: true,
            max_consecutive_newlines: 2,
            ..Self::minimal()
        }
    }

    pub fn aggressive() -> Self {
        Self {
            remove_pua: true,
            merge_cjk_lines: true,
            max_consecutive_newlines: 1,
            ..Self::standard()
        }
    }
}

impl Default for CleanupOptions {
    fn default() -> Self {
        Self::standard()
    }
}

const LIGATURES: [(char, &str); 7] = [
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
    ('\u{FB05}', "st"),
    ('\u{FB06}', "st"),
];

/// Text cleanup pipeline with its patterns compiled once.
#[derive(Debug, Clone)]
pub struct CleanupPipeline {
    options: CleanupOptions,
    page_number: Regex,
    hyphenation: Regex,
    spaces: Regex,
    cjk_break: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Render(format!("cleanup pattern: {e}")))
}

impl CleanupPipeline {
    pub fn new(options: CleanupOptions) -> Result<Self> {
        Ok(Self {
            options,
            page_number: compile(r"(?m)^[ \t]*(?:[-–—][ \t]*)?(?:[Pp]age[ \t]+)?\d{1,4}(?:[ \t]*(?:of|/)[ \t]*\d{1,4})?(?:[ \t]*[-–—])?[ \t]*$\n?")?,
            hyphenation: compile(r"(\p{Ll})-\n[ \t]*(\p{Ll})")?,
            spaces: compile(r"[ \t]{2,}")?,
            cjk_break: compile(
                r"([\p{Han}\p{Hiragana}\p{Katakana}])\n([\p{Han}\p{Hiragana}\p{Katakana}])",
            )?,
        })
    }

    pub fn from_preset(preset: CleanupPreset) -> Result<Self> {
        Self::new(CleanupOptions::from_preset(preset))
    }

    pub fn options(&self) -> &CleanupOptions {
        &self.options
    }

    /// Clean one page segment.
    pub fn process(&self, text: &str) -> String {
        let mut result = if self.options.normalize_unicode {
            text.nfc().collect::<String>()
        } else {
            text.to_string()
        };

        if self.options.fix_ligatures && result.contains(|c: char| ('\u{FB00}'..='\u{FB06}').contains(&c)) {
            for (ligature, letters) in LIGATURES {
                result = result.replace(ligature, letters);
            }
        }

        if self.options.remove_pua || self.options.remove_replacement_char {
            result.retain(|c| {
                !(self.options.remove_replacement_char && c == '\u{FFFD}')
                    && !(self.options.remove_pua && is_private_use(c))
            });
        }

        if self.options.remove_page_numbers {
            result = self.page_number.replace_all(&result, "").into_owned();
        }

        if self.options.fix_hyphenation {
            result = self.hyphenation.replace_all(&result, "$1$2").into_owned();
        }

        if self.options.merge_cjk_lines {
            result = self.cjk_break.replace_all(&result, "$1$2").into_owned();
        }

        if self.options.collapse_spaces {
            result = self.spaces.replace_all(&result, " ").into_owned();
        }

        if self.options.max_consecutive_newlines > 0 {
            result = limit_newlines(&result, self.options.max_consecutive_newlines as usize);
        }

        result.trim().to_string()
    }
}

fn is_private_use(c: char) -> bool {
    let code = c as u32;
    (0xE000..=0xF8FF).contains(&code)
        || (0xF0000..=0xFFFFD).contains(&code)
        || (0x100000..=0x10FFFD).contains(&code)
}

/// Cap runs of blank lines. Lines holding only spaces count as blank.
fn limit_newlines(text: &str, max: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for line in text.split('\n') {
        if line.trim().is_empty() {
            newlines += 1;
            continue;
        }
        if !out.is_empty() {
            let run = (newlines + 1).min(max);
            out.extend(std::iter::repeat('\n').take(run));
        }
        newlines = 0;
        out.push_str(line);
    }
    out
}
