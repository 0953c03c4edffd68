//! Output model: glyph runs, page text and document metadata.

pub mod glyph;
mod metadata;
mod text;

pub use glyph::GlyphRun;
pub use metadata::{decode_text_string, parse_pdf_date, Metadata};
pub use text::{ExtractedText, PageDiagnostic, PageText};
