//! The extraction pipeline: Loader, Page Decoder, Interpreter, Assembler.

use crate::content::interpret_page;
use crate::error::{Error, Result};
use crate::model::{ExtractedText, PageDiagnostic, PageText};
use crate::parser::{Document, ErrorMode, ParseOptions};
use crate::render::{assemble, CleanupOptions, CleanupPipeline, PageSelection, TextOptions};
use rayon::prelude::*;
use std::path::Path;

/// Configures and runs text extraction.
///
/// ```no_run
/// use plainpdf::Extractor;
///
/// let text = Extractor::new()
///     .sequential()
///     .with_page_separator("\n\n")
///     .extract_file("report.pdf")?;
/// println!("{text}");
/// # Ok::<(), plainpdf::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    parse: ParseOptions,
    text: TextOptions,
}

impl Extractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parse_options(mut self, options: ParseOptions) -> Self {
        self.parse = options;
        self
    }

    pub fn with_text_options(mut self, options: TextOptions) -> Self {
        self.text = options;
        self
    }

    /// Decode pages one after another on the calling thread.
    pub fn sequential(mut self) -> Self {
        self.parse = self.parse.sequential();
        self
    }

    /// Fail on the first page that cannot be decoded.
    pub fn strict(mut self) -> Self {
        self.parse = self.parse.strict();
        self
    }

    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.parse = self.parse.with_pages(pages);
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.parse = self.parse.with_password(password);
        self
    }

    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.text = self.text.with_cleanup(cleanup);
        self
    }

    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.text = self.text.with_page_separator(separator);
        self
    }

    pub fn with_line_break_ratio(mut self, ratio: f64) -> Self {
        self.text = self.text.with_line_break_ratio(ratio);
        self
    }

    pub fn with_word_gap_ratio(mut self, ratio: f64) -> Self {
        self.text = self.text.with_word_gap_ratio(ratio);
        self
    }

    pub fn parse_options(&self) -> &ParseOptions {
        &self.parse
    }

    pub fn text_options(&self) -> &TextOptions {
        &self.text
    }

    /// Load a document without extracting any page.
    pub fn load_bytes(&self, data: impl Into<Vec<u8>>) -> Result<Document> {
        Document::load_with_options(data.into(), &self.parse)
    }

    /// Load and extract a document held in memory.
    pub fn extract_bytes(&self, data: impl Into<Vec<u8>>) -> Result<ExtractedText> {
        let doc = self.load_bytes(data)?;
        self.extract_document(&doc)
    }

    /// Read, load and extract a file.
    pub fn extract_file<P: AsRef<Path>>(&self, path: P) -> Result<ExtractedText> {
        let data = std::fs::read(path)?;
        self.extract_bytes(data)
    }

    /// Extract the selected pages of a loaded document.
    pub fn extract_document(&self, doc: &Document) -> Result<ExtractedText> {
        if doc.is_encrypted() {
            return Err(Error::EncryptedDocument);
        }

        let numbers = self.parse.pages.resolve(doc.page_count())?;
        let cleanup = self
            .text
            .cleanup
            .as_ref()
            .map(|options| CleanupPipeline::new(options.clone()))
            .transpose()?;

        let run = |number: u32| self.extract_page(doc, number, cleanup.as_ref());
        let pages = if self.parse.use_parallel(numbers.len()) {
            numbers
                .par_iter()
                .map(|&n| run(n))
                .collect::<Result<Vec<_>>>()?
        } else {
            numbers.iter().map(|&n| run(n)).collect::<Result<Vec<_>>>()?
        };

        log::debug!(
            "extracted {} pages, {} fonts decoded",
            pages.len(),
            doc.fonts_decoded()
        );
        Ok(ExtractedText::new(
            doc.metadata().clone(),
            pages,
            self.text.page_separator.clone(),
        ))
    }

    fn extract_page(
        &self,
        doc: &Document,
        number: u32,
        cleanup: Option<&CleanupPipeline>,
    ) -> Result<PageText> {
        let page = match doc.decode_page(number) {
            Ok(page) => page,
            Err(e) => {
                return match PageDiagnostic::from_error(&e) {
                    Some(diagnostic) if self.parse.error_mode == ErrorMode::Lenient => {
                        log::warn!("page {number}: {e}; emitting an empty segment");
                        Ok(PageText::degraded(number, diagnostic))
                    }
                    _ => Err(e),
                };
            }
        };

        let runs = interpret_page(doc, &page, self.text.word_gap_ratio);
        let text = assemble(&runs, &self.text);
        let text = match cleanup {
            Some(pipeline) => pipeline.process(&text),
            None => text,
        };
        Ok(PageText::new(number, text))
    }
}
