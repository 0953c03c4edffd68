//! Text assembly: merging glyph runs into lines and words.

use super::TextOptions;
use crate::model::glyph::is_spaceless_script_char;
use crate::model::GlyphRun;

/// Font sizes below this are treated as this size when measuring line breaks.
const MIN_FONT_SIZE: f64 = 1.0;
/// A run starting this many glyph widths left of the previous run's end is
/// treated as a separate word.
const BACKWARD_JUMP_GLYPHS: f64 = 4.0;

/// The last run appended, as far as spacing decisions need it.
#[derive(Debug, Clone, Copy)]
struct Cursor {
    y: f64,
    end_x: f64,
    glyph_width: f64,
    last_char: char,
}

/// Accumulates glyph runs of one page into text.
///
/// Runs are consumed in emission order; the assembler never reorders them.
#[derive(Debug)]
pub struct TextAssembler {
    line_break_ratio: f64,
    word_gap_ratio: f64,
    output: String,
    cursor: Option<Cursor>,
}

impl TextAssembler {
    pub fn new(options: &TextOptions) -> Self {
        Self {
            line_break_ratio: options.line_break_ratio,
            word_gap_ratio: options.word_gap_ratio,
            output: String::new(),
            cursor: None,
        }
    }

    /// Append a run, inserting a newline or space before it when its
    /// position calls for one.
    pub fn push(&mut self, run: &GlyphRun) {
        let Some(first_char) = run.text.chars().next() else {
            return;
        };

        if let Some(prev) = self.cursor {
            let size = run.font_size.max(MIN_FONT_SIZE);
            let dy = (run.y - prev.y).abs();
            if dy > self.line_break_ratio * size {
                self.break_line();
            } else if self.needs_space(&prev, run) {
                let explicit = prev.last_char.is_whitespace() || first_char.is_whitespace();
                let spaceless =
                    is_spaceless_script_char(prev.last_char) || is_spaceless_script_char(first_char);
                if !explicit && !spaceless {
                    self.output.push(' ');
                }
            }
        }

        self.output.push_str(&run.text);
        if let Some(last_char) = run.text.chars().last() {
            self.cursor = Some(Cursor {
                y: run.y,
                end_x: run.end_x(),
                glyph_width: run.glyph_width,
                last_char,
            });
        }
    }

    fn needs_space(&self, prev: &Cursor, run: &GlyphRun) -> bool {
        let width = if prev.glyph_width > 0.0 {
            prev.glyph_width
        } else {
            run.glyph_width
        };
        if width <= 0.0 {
            return false;
        }
        let gap = run.x - prev.end_x;
        gap > self.word_gap_ratio * width || gap < -BACKWARD_JUMP_GLYPHS * width
    }

    fn break_line(&mut self) {
        let trimmed = self.output.trim_end_matches([' ', '\t']).len();
        self.output.truncate(trimmed);
        self.output.push('\n');
    }

    /// The page text: line ends trimmed, no blank lines at either end.
    pub fn finish(self) -> String {
        let lines: Vec<&str> = self.output.lines().map(str::trim_end).collect();
        let start = lines.iter().position(|l| !l.is_empty());
        let end = lines.iter().rposition(|l| !l.is_empty());
        match (start, end) {
            (Some(start), Some(end)) => lines[start..=end].join("\n"),
            _ => String::new(),
        }
    }
}

/// Assemble one page's runs into text.
pub fn assemble(runs: &[GlyphRun], options: &TextOptions) -> String {
    let mut assembler = TextAssembler::new(options);
    for run in runs {
        assembler.push(run);
    }
    assembler.finish()
}
