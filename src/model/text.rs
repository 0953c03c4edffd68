//! Extraction output: one text segment per page.

use super::Metadata;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a page produced an empty segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageDiagnostic {
    /// The page's content uses a filter this crate cannot decode.
    UnsupportedFilter { filter: String },
    /// The page's content stream is corrupt.
    DecodeFailed { reason: String },
}

impl PageDiagnostic {
    /// Diagnostic for a recoverable page error, `None` for fatal errors.
    pub fn from_error(error: &Error) -> Option<Self> {
        match error {
            Error::UnsupportedFilter(filter) => Some(PageDiagnostic::UnsupportedFilter {
                filter: filter.clone(),
            }),
            Error::StreamDecode(reason) => Some(PageDiagnostic::DecodeFailed {
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for PageDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageDiagnostic::UnsupportedFilter { filter } => write!(f, "unsupported filter {filter}"),
            PageDiagnostic::DecodeFailed { reason } => write!(f, "content decode failed: {reason}"),
        }
    }
}

/// Text of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageText {
    /// Page number (1-indexed)
    pub number: u32,

    /// Extracted text; empty for degraded pages
    pub text: String,

    /// Set when the page could not be decoded
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub diagnostic: Option<PageDiagnostic>,
}

impl PageText {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
            diagnostic: None,
        }
    }

    /// An empty segment standing in for a page that could not be decoded.
    pub fn degraded(number: u32, diagnostic: PageDiagnostic) -> Self {
        Self {
            number,
            text: String::new(),
            diagnostic: Some(diagnostic),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.diagnostic.is_some()
    }
}

/// The result of an extraction: page segments in page order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// Document metadata
    pub metadata: Metadata,

    /// One entry per extracted page, in page order
    pub pages: Vec<PageText>,

    /// Placed between consecutive page segments by [`ExtractedText::text`]
    pub separator: String,
}

impl ExtractedText {
    pub fn new(metadata: Metadata, pages: Vec<PageText>, separator: impl Into<String>) -> Self {
        Self {
            metadata,
            pages,
            separator: separator.into(),
        }
    }

    /// All page segments joined by the separator.
    ///
    /// N pages always yield N-1 separators, including around empty pages.
    pub fn text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join(&self.separator)
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Text of page `number` (1-indexed), if it was extracted.
    pub fn page(&self, number: u32) -> Option<&PageText> {
        self.pages.iter().find(|p| p.number == number)
    }

    /// Degraded pages and the reason for each.
    pub fn diagnostics(&self) -> Vec<(u32, &PageDiagnostic)> {
        self.pages
            .iter()
            .filter_map(|p| p.diagnostic.as_ref().map(|d| (p.number, d)))
            .collect()
    }

    /// Whether any page was replaced by an empty segment.
    pub fn is_degraded(&self) -> bool {
        self.pages.iter().any(PageText::is_degraded)
    }

    /// Total characters across all pages.
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

impl fmt::Display for ExtractedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}
