//! PDF signature detection and media-type checks.
//!
//! The pipeline itself only ever sees bytes. Callers that receive files from
//! users are expected to reject non-PDF inputs before invoking it, which is what
//! [`check_media_type`] and [`media_type_from_path`] are for.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// PDF format information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFormat {
    /// PDF version from the header (e.g., "1.7", "2.0")
    pub version: String,
    /// Whether the file declares a linearization dictionary
    pub linearized: bool,
}

impl std::fmt::Display for PdfFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

/// PDF magic bytes: %PDF-
pub(crate) const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;
/// How far into the file the linearization dictionary may appear.
const LINEARIZED_WINDOW: usize = 1024;

/// Media type for PDF documents.
pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Detect PDF format from a file path.
///
/// Only the first kilobyte of the file is read.
///
/// # Example
/// ```no_run
/// use plainpdf::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("document.pdf").unwrap();
/// println!("PDF version: {}", format.version);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<PdfFormat> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(LINEARIZED_WINDOW);
    BufReader::new(file)
        .take(LINEARIZED_WINDOW as u64)
        .read_to_end(&mut head)?;
    detect_format_from_bytes(&head)
}

/// Detect PDF format from bytes.
///
/// The signature must sit at offset zero; leading garbage is rejected with
/// [`Error::MalformedDocument`].
pub fn detect_format_from_bytes(data: &[u8]) -> Result<PdfFormat> {
    if !data.starts_with(PDF_MAGIC) {
        return Err(Error::malformed("missing %PDF- signature"));
    }

    let version_bytes = data
        .get(PDF_MAGIC.len()..PDF_MAGIC.len() + VERSION_LEN)
        .ok_or_else(|| Error::malformed("truncated header"))?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::malformed(format!("invalid header version {version:?}")));
    }

    let window = &data[..data.len().min(LINEARIZED_WINDOW)];
    let linearized = window.windows(11).any(|w| w == b"/Linearized");

    Ok(PdfFormat {
        version,
        linearized,
    })
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == 3 && bytes[0].is_ascii_digit() && bytes[1] == b'.' && bytes[2].is_ascii_digit()
}

/// Check if a file is a PDF by its signature.
pub fn is_pdf<P: AsRef<Path>>(path: P) -> bool {
    detect_format_from_path(path).is_ok()
}

/// Check if bytes start with a PDF signature.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    detect_format_from_bytes(data).is_ok()
}

/// Whether a declared media type names a PDF.
///
/// Matches loosely, so `application/pdf`, `application/x-pdf` and
/// `application/pdf; charset=binary` are all accepted.
pub fn is_pdf_media_type(media_type: &str) -> bool {
    media_type.to_ascii_lowercase().contains("pdf")
}

/// Guess a media type from a file extension.
pub fn media_type_from_path<P: AsRef<Path>>(path: P) -> Option<&'static str> {
    let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
    let media_type = match ext.as_str() {
        "pdf" => PDF_MEDIA_TYPE,
        "txt" | "text" => "text/plain",
        "html" | "htm" => "text/html",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "application/octet-stream",
    };
    Some(media_type)
}

/// Reject inputs whose declared media type is not PDF.
pub fn check_media_type(media_type: &str) -> Result<()> {
    if is_pdf_media_type(media_type) {
        Ok(())
    } else {
        Err(Error::UnsupportedMediaType(media_type.to_string()))
    }
}
