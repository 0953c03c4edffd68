//! # plainpdf
//!
//! Plain text extraction from PDF documents.
//!
//! A document passes once through four stages: the loader parses the
//! cross-reference data and page tree, the page decoder inflates each page's
//! content streams, the interpreter runs the text operators and emits glyph
//! runs, and the assembler joins those runs into lines and words. Page
//! segments are joined with a page separator, in page order.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> plainpdf::Result<()> {
//!     let text = plainpdf::extract_text("document.pdf")?;
//!     println!("{}", text);
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! A malformed or encrypted document fails the whole call. A page whose
//! content cannot be decoded (for example, an unsupported filter) becomes an
//! empty segment; [`ExtractedText::diagnostics`] reports which pages were
//! affected and why.
//!
//! ## Features
//!
//! - **Modern files**: cross-reference streams, object streams, incremental updates
//! - **Fonts**: standard encodings, `/Differences`, CID fonts, ToUnicode CMaps
//! - **Parallel processing**: pages decoded on the Rayon pool, fonts decoded once
//! - **Cleanup pipeline**: optional Unicode and whitespace normalization
//! - **Async**: `extract_text_async` with the `async` feature

pub mod content;
pub mod detect;
pub mod error;
mod extract;
pub mod font;
pub mod model;
pub mod parser;
pub mod render;

pub use detect::{
    check_media_type, detect_format_from_bytes, detect_format_from_path, is_pdf, is_pdf_bytes,
    PdfFormat,
};
pub use error::{Error, ErrorKind, Result};
pub use extract::Extractor;
pub use model::{ExtractedText, GlyphRun, Metadata, PageDiagnostic, PageText};
pub use parser::{Document, ErrorMode, ParseOptions};
pub use render::{
    CleanupOptions, CleanupPreset, JsonFormat, PageSelection, TextOptions, DEFAULT_PAGE_SEPARATOR,
};

use std::io::Read;
use std::path::Path;

/// Extract plain text from a PDF file.
///
/// # Example
///
/// ```no_run
/// use plainpdf::extract_text;
///
/// let text = extract_text("document.pdf").unwrap();
/// println!("{}", text);
/// ```
pub fn extract_text<P: AsRef<Path>>(path: P) -> Result<String> {
    Ok(Extractor::new().extract_file(path)?.text())
}

/// Extract plain text from PDF bytes.
///
/// # Example
///
/// ```no_run
/// use plainpdf::extract_text_from_bytes;
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let text = extract_text_from_bytes(&data).unwrap();
/// ```
pub fn extract_text_from_bytes(data: &[u8]) -> Result<String> {
    Ok(extract_bytes(data)?.text())
}

/// Extract plain text from a reader.
pub fn extract_text_from_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(Extractor::new().extract_bytes(data)?.text())
}

/// Extract per-page text, metadata and diagnostics from PDF bytes.
pub fn extract_bytes(data: &[u8]) -> Result<ExtractedText> {
    Extractor::new().extract_bytes(data)
}

/// Extract with explicit loading and assembly options.
///
/// # Example
///
/// ```no_run
/// use plainpdf::{extract_bytes_with_options, ParseOptions, TextOptions, CleanupPreset};
///
/// let data = std::fs::read("document.pdf").unwrap();
/// let parse = ParseOptions::new().strict().sequential();
/// let text = TextOptions::new().with_cleanup_preset(CleanupPreset::Standard);
/// let extracted = extract_bytes_with_options(&data, parse, text).unwrap();
/// assert!(!extracted.is_degraded());
/// ```
pub fn extract_bytes_with_options(
    data: &[u8],
    parse: ParseOptions,
    text: TextOptions,
) -> Result<ExtractedText> {
    Extractor::new()
        .with_parse_options(parse)
        .with_text_options(text)
        .extract_bytes(data)
}

/// Load a document from bytes without extracting pages.
///
/// Useful for reading metadata or extracting pages selectively.
pub fn load_bytes(data: &[u8]) -> Result<Document> {
    Document::load(data.to_vec())
}

/// Load a document from a file without extracting pages.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    Document::load(std::fs::read(path)?)
}

/// Extract a PDF file and render it as JSON.
///
/// # Example
///
/// ```no_run
/// use plainpdf::{to_json, JsonFormat};
///
/// let json = to_json("document.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("output.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let extracted = Extractor::new().extract_file(path)?;
    render::to_json(&extracted, format)
}

/// Extract text on tokio's blocking pool.
///
/// Resolves to the same result as [`Extractor::extract_bytes`] with default
/// options.
#[cfg(feature = "async")]
pub async fn extract_text_async(data: Vec<u8>) -> Result<ExtractedText> {
    extract_async_with(Extractor::new(), data).await
}

/// Run a configured extractor on tokio's blocking pool.
#[cfg(feature = "async")]
pub async fn extract_async_with(extractor: Extractor, data: Vec<u8>) -> Result<ExtractedText> {
    tokio::task::spawn_blocking(move || extractor.extract_bytes(data))
        .await
        .map_err(std::io::Error::from)?
}
