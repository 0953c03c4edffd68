//! Error types for plainpdf library.

use std::io;
use thiserror::Error;

/// Result type alias for plainpdf operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF text extraction.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The document structure could not be parsed.
    #[error("Malformed PDF document: {0}")]
    MalformedDocument(String),

    /// The document is encrypted; decryption is not supported.
    #[error("Document is encrypted")]
    EncryptedDocument,

    /// A stream uses a filter this library cannot decode.
    #[error("Unsupported stream filter: {0}")]
    UnsupportedFilter(String),

    /// Compressed stream data is corrupt.
    #[error("Stream decoding error: {0}")]
    StreamDecode(String),

    /// The input was rejected before parsing because it is not a PDF.
    #[error("Invalid file type: please supply a PDF file (got {0})")]
    UnsupportedMediaType(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// A page range string could not be parsed.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error while rendering output (JSON).
    #[error("Rendering error: {0}")]
    Render(String),
}

/// Discriminant of an [`Error`], for callers that branch on the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Io,
    MalformedDocument,
    EncryptedDocument,
    UnsupportedFilter,
    StreamDecode,
    UnsupportedMediaType,
    PageOutOfRange,
    InvalidPageRange,
    Render,
}

impl Error {
    /// Shorthand for a [`Error::MalformedDocument`] with a formatted reason.
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Error::MalformedDocument(reason.into())
    }

    /// The kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Io(_) => ErrorKind::Io,
            Error::MalformedDocument(_) => ErrorKind::MalformedDocument,
            Error::EncryptedDocument => ErrorKind::EncryptedDocument,
            Error::UnsupportedFilter(_) => ErrorKind::UnsupportedFilter,
            Error::StreamDecode(_) => ErrorKind::StreamDecode,
            Error::UnsupportedMediaType(_) => ErrorKind::UnsupportedMediaType,
            Error::PageOutOfRange(..) => ErrorKind::PageOutOfRange,
            Error::InvalidPageRange(_) => ErrorKind::InvalidPageRange,
            Error::Render(_) => ErrorKind::Render,
        }
    }

    /// Whether this error only affects one page.
    ///
    /// Recoverable errors are absorbed by the extraction pipeline: the page
    /// contributes an empty segment and a diagnostic instead of failing the call.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::UnsupportedFilter(_) | Error::StreamDecode(_))
    }
}
