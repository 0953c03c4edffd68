//! Text-state machine over content stream operations.
//!
//! Only the operators that affect where and what text is shown are
//! executed. Everything else, including operators with missing or
//! mistyped operands, is skipped.

use super::operation::{parse_operations, Operation};
use crate::font::Font;
use crate::model::glyph::is_spaceless_script_char;
use crate::model::GlyphRun;
use crate::parser::object::{Object, ObjectId};
use crate::parser::{Document, Page, Resources};
use std::sync::Arc;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

/// A 2D affine transform `[a b c d e f]`, applied to row vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    pub const fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    fn from_array(values: [f64; 6]) -> Self {
        let [a, b, c, d, e, f] = values;
        Self::new(a, b, c, d, e, f)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn transform(&self, x: f64, y: f64) -> (f64, f64) {
        (
            x * self.a + y * self.c + self.e,
            x * self.b + y * self.d + self.f,
        )
    }

    /// Length of the transformed unit x vector.
    fn x_scale(&self) -> f64 {
        self.a.hypot(self.b)
    }

    /// Length of the transformed unit y vector.
    fn y_scale(&self) -> f64 {
        self.c.hypot(self.d)
    }
}

/// Text state parameters; saved and restored with the graphics state.
#[derive(Debug, Clone)]
struct TextState {
    font: Option<Arc<Font>>,
    size: f64,
    char_spacing: f64,
    word_spacing: f64,
    /// `Tz / 100`
    horizontal_scale: f64,
    leading: f64,
    rise: f64,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// A run being built by one show operator.
struct PendingRun {
    text: String,
    start: (f64, f64),
    font_size: f64,
    glyph_width: f64,
    space_pending: bool,
}

/// Executes content streams and collects the glyph runs they show.
pub struct Interpreter<'a> {
    doc: &'a Document,
    word_gap_ratio: f64,
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    /// Form XObjects currently being executed.
    active_forms: Vec<ObjectId>,
    fallback_font: Arc<Font>,
    runs: Vec<GlyphRun>,
}

impl<'a> Interpreter<'a> {
    /// `word_gap_ratio` decides when a `TJ` adjustment is wide enough to
    /// count as a space, as a fraction of the font's average glyph width.
    pub fn new(doc: &'a Document, word_gap_ratio: f64) -> Self {
        Self {
            doc,
            word_gap_ratio,
            state: GraphicsState::default(),
            saved: Vec::new(),
            text_matrix: Matrix::IDENTITY,
            line_matrix: Matrix::IDENTITY,
            active_forms: Vec::new(),
            fallback_font: Arc::new(Font::fallback()),
            runs: Vec::new(),
        }
    }

    /// Interpret a decoded page and return its glyph runs in emission order.
    ///
    /// Runs that fall entirely outside the page's media box are dropped.
    pub fn run_page(mut self, page: &Page) -> Vec<GlyphRun> {
        let ops = parse_operations(&page.content);
        self.execute(&ops, &page.resources, 0);
        self.runs.retain(|run| page.is_visible(run));
        self.runs
    }

    fn execute(&mut self, ops: &[Operation], resources: &Resources, depth: usize) {
        for op in ops {
            self.apply(op, resources, depth);
        }
    }

    fn apply(&mut self, op: &Operation, resources: &Resources, depth: usize) {
        match op.operator.as_str() {
            "q" => self.saved.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.state.ctm = Matrix::from_array(m).multiply(&self.state.ctm);
                }
            }
            "BT" => {
                self.text_matrix = Matrix::IDENTITY;
                self.line_matrix = Matrix::IDENTITY;
            }
            "ET" => {}
            "Tf" => {
                let (Some(name), Some(size)) = (
                    op.operands.first().and_then(Object::as_name),
                    op.number(1),
                ) else {
                    return;
                };
                let font = resources.font(self.doc, name);
                match &font {
                    Some(font) => log::trace!(
                        "Tf /{name}: {} ({:?}) at {size}",
                        font.base_font(),
                        font.kind()
                    ),
                    None => log::debug!("Tf /{name}: no such font resource, using the fallback font"),
                }
                self.state.text.font = font;
                self.state.text.size = size;
            }
            "Tc" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.state.text.char_spacing = v;
                }
            }
            "Tw" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.state.text.word_spacing = v;
                }
            }
            "Tz" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.state.text.horizontal_scale = v / 100.0;
                }
            }
            "TL" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.state.text.leading = v;
                }
            }
            "Ts" => {
                if let Some([v]) = op.numbers::<1>() {
                    self.state.text.rise = v;
                }
            }
            "Td" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let Some([tx, ty]) = op.numbers::<2>() {
                    self.state.text.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = op.numbers::<6>() {
                    self.line_matrix = Matrix::from_array(m);
                    self.text_matrix = self.line_matrix;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(bytes) = op.operands.last().and_then(Object::as_bytes) {
                    self.show(&[Object::String(bytes.to_vec())]);
                }
            }
            "TJ" => {
                if let Some(items) = op.operands.last().and_then(Object::as_array) {
                    self.show(items);
                }
            }
            "'" => {
                if let Some(bytes) = op.operands.last().and_then(Object::as_bytes) {
                    self.next_line();
                    self.show(&[Object::String(bytes.to_vec())]);
                }
            }
            "\"" => {
                let n = op.operands.len();
                if n < 3 {
                    return;
                }
                let (Some(aw), Some(ac), Some(bytes)) = (
                    op.operands[n - 3].as_f64(),
                    op.operands[n - 2].as_f64(),
                    op.operands[n - 1].as_bytes(),
                ) else {
                    return;
                };
                self.state.text.word_spacing = aw;
                self.state.text.char_spacing = ac;
                self.next_line();
                self.show(&[Object::String(bytes.to_vec())]);
            }
            "Do" => {
                if let Some(name) = op.operands.last().and_then(Object::as_name) {
                    self.run_form(name, resources, depth);
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = Matrix::translation(tx, ty).multiply(&self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    /// Execute a `TJ`-style array of strings and spacing adjustments as one run.
    fn show(&mut self, items: &[Object]) {
        let font = self
            .state
            .text
            .font
            .clone()
            .unwrap_or_else(|| Arc::clone(&self.fallback_font));
        let ts = &self.state.text;
        let (size, scale, tc, tw) = (ts.size, ts.horizontal_scale, ts.char_spacing, ts.word_spacing);

        let render = self.render_matrix();
        let mut run = PendingRun {
            text: String::new(),
            start: render.transform(0.0, 0.0),
            font_size: size * render.y_scale(),
            glyph_width: font.average_width() * size * render.x_scale(),
            space_pending: false,
        };
        // Gap threshold in unscaled text space.
        let space_threshold = self.word_gap_ratio * font.average_width() * size;

        for item in items {
            match item {
                Object::String(bytes) => {
                    for glyph in font.decode(bytes) {
                        if run.space_pending {
                            push_inferred_space(&mut run.text, &glyph.text);
                            run.space_pending = false;
                        }
                        run.text.push_str(&glyph.text);
                        let spacing = if glyph.is_word_space { tc + tw } else { tc };
                        let tx = (glyph.width * size + spacing) * scale;
                        self.text_matrix = Matrix::translation(tx, 0.0).multiply(&self.text_matrix);
                    }
                }
                other => {
                    let Some(adjust) = other.as_f64() else { continue };
                    let gap = -adjust / 1000.0 * size;
                    self.text_matrix =
                        Matrix::translation(gap * scale, 0.0).multiply(&self.text_matrix);
                    if gap > space_threshold && space_threshold > 0.0 {
                        run.space_pending = true;
                    }
                }
            }
        }

        if run.text.is_empty() {
            return;
        }
        let end = self.render_matrix().transform(0.0, 0.0);
        self.runs.push(GlyphRun {
            text: run.text,
            x: run.start.0,
            y: run.start.1,
            advance: end.0 - run.start.0,
            font_size: run.font_size.abs(),
            glyph_width: run.glyph_width.abs(),
        });
    }

    /// Text space to user space, including rise.
    fn render_matrix(&self) -> Matrix {
        Matrix::translation(0.0, self.state.text.rise)
            .multiply(&self.text_matrix)
            .multiply(&self.state.ctm)
    }

    fn run_form(&mut self, name: &str, resources: &Resources, depth: usize) {
        if depth >= MAX_FORM_DEPTH {
            return;
        }
        let Some((id, object)) = resources.xobject(self.doc, name) else {
            return;
        };
        let Some(stream) = object.as_stream() else { return };
        if stream.dict.get("Subtype").and_then(Object::as_name) != Some("Form") {
            return;
        }
        if let Some(id) = id {
            if self.active_forms.contains(&id) {
                return;
            }
        }

        let content = match self.doc.decode_stream(stream) {
            Ok(content) => content,
            Err(e) => {
                log::debug!("skipping form XObject /{name}: {e}");
                return;
            }
        };

        let form_resources = match self.doc.resolve_entry(&stream.dict, "Resources") {
            Ok(Some(dict)) => match dict.as_dict() {
                Some(own) => Resources::nested(own.clone(), id, resources),
                None => resources.clone(),
            },
            _ => resources.clone(),
        };

        let form_matrix = match self.doc.resolve_entry(&stream.dict, "Matrix") {
            Ok(Some(m)) => m
                .as_array()
                .and_then(|values| {
                    let nums: Vec<f64> = values.iter().filter_map(Object::as_f64).collect();
                    <[f64; 6]>::try_from(nums.as_slice()).ok()
                })
                .map(Matrix::from_array)
                .unwrap_or_default(),
            _ => Matrix::IDENTITY,
        };

        let saved_state = self.state.clone();
        let saved_matrices = (self.text_matrix, self.line_matrix);
        self.state.ctm = form_matrix.multiply(&self.state.ctm);
        self.active_forms.extend(id);

        let ops = parse_operations(&content);
        self.execute(&ops, &form_resources, depth + 1);

        if id.is_some() {
            self.active_forms.pop();
        }
        self.state = saved_state;
        (self.text_matrix, self.line_matrix) = saved_matrices;
    }
}

/// Insert a space for a wide `TJ` gap unless whitespace is already there or
/// either side is a spaceless script.
fn push_inferred_space(text: &mut String, next: &str) {
    let prev = text.chars().last();
    let next = next.chars().next();
    let blocked = |c: Option<char>| {
        c.map_or(true, |c| c.is_whitespace() || is_spaceless_script_char(c))
    };
    if !blocked(prev) && !blocked(next) {
        text.push(' ');
    }
}

/// Interpret a page's content with the given word-gap ratio.
pub fn interpret_page(doc: &Document, page: &Page, word_gap_ratio: f64) -> Vec<GlyphRun> {
    Interpreter::new(doc, word_gap_ratio).run_page(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::testing;

    fn page(content: &[u8], media_box: Option<[f64; 4]>) -> Page {
        Page {
            number: 1,
            content: content.to_vec(),
            resources: Resources::default(),
            media_box,
        }
    }

    /// Runs of a page without fonts; `Tf` falls back to the built-in font.
    fn runs(content: &[u8]) -> Vec<GlyphRun> {
        interpret_page(&testing::blank(), &page(content, None), 0.3)
    }

    #[test]
    fn test_runs_off_the_media_box_are_dropped() {
        let content = b"BT /F1 10 Tf 72 700 Td (in) Tj 1000 0 Td (right) Tj \
                        -1072 -800 Td (below) Tj -20 150 Td (partly) Tj ET";
        let page = page(content, Some([0.0, 0.0, 612.0, 792.0]));
        let texts: Vec<String> = interpret_page(&testing::blank(), &page, 0.3)
            .into_iter()
            .map(|run| run.text)
            .collect();
        assert_eq!(texts, ["in", "partly"]);
    }

    #[test]
    fn test_matrix_multiply() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let shift = Matrix::translation(10.0, 5.0);
        let m = shift.multiply(&scale);
        assert_eq!(m.transform(0.0, 0.0), (20.0, 10.0));
        let m = scale.multiply(&shift);
        assert_eq!(m.transform(1.0, 1.0), (12.0, 7.0));
    }

    #[test]
    fn test_one_run_per_show() {
        let runs = runs(b"BT /F1 10 Tf 72 700 Td (Hello) Tj 0 -14 Td (World) Tj ET");
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].text, "Hello");
        assert_eq!((runs[0].x, runs[0].y), (72.0, 700.0));
        assert_eq!(runs[0].font_size, 10.0);
        // Five glyphs of the 500-unit fallback width at 10pt.
        assert!((runs[0].advance - 25.0).abs() < 1e-9);
        assert_eq!((runs[1].x, runs[1].y), (72.0, 686.0));
    }

    #[test]
    fn test_tj_kerning_inserts_space() {
        let runs = runs(b"BT /F1 10 Tf [(Hello) -600 (World) -50 (!)] TJ ET");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "Hello World!");
    }

    #[test]
    fn test_ctm_and_text_matrix_scale_size() {
        let runs = runs(b"q 2 0 0 2 0 0 cm BT /F1 6 Tf 1 0 0 1 10 20 Tm (a) Tj ET Q");
        assert_eq!(runs[0].font_size, 12.0);
        assert_eq!((runs[0].x, runs[0].y), (20.0, 40.0));
    }

    #[test]
    fn test_leading_and_quote_operators() {
        let runs = runs(b"BT /F1 10 Tf 12 TL 0 100 Td (a) Tj (b) ' 2 1 (c) \" ET");
        let ys: Vec<f64> = runs.iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![100.0, 88.0, 76.0]);
    }

    #[test]
    fn test_underflow_and_unknown_operators_are_skipped() {
        let runs = runs(b"BT Td Tf /F1 10 Tf 5 Tm xyz 1 2 3 sh (ok) Tj Q Q ET");
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].text, "ok");
    }

    #[test]
    fn test_q_restores_font_size() {
        let runs = runs(b"BT /F1 10 Tf q /F1 30 Tf Q (x) Tj ET");
        assert_eq!(runs[0].font_size, 10.0);
    }

    #[test]
    fn test_no_space_between_cjk_segments() {
        let mut text = "中".to_string();
        push_inferred_space(&mut text, "文");
        assert_eq!(text, "中");
        let mut text = "a".to_string();
        push_inferred_space(&mut text, "b");
        assert_eq!(text, "a ");
    }
}
