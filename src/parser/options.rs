//! Loading and extraction options.

use crate::render::PageSelection;

/// Pages below this count are decoded sequentially even when `parallel` is set.
pub const PARALLEL_PAGE_THRESHOLD: usize = 4;

/// Options for loading a document and decoding its pages.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// How recoverable per-page errors are handled
    pub error_mode: ErrorMode,

    /// Whether to decode pages in parallel
    pub parallel: bool,

    /// Which pages to extract
    pub pages: PageSelection,

    /// Password for encrypted documents
    pub password: Option<String>,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Fail the whole extraction on the first page error.
    pub fn strict(mut self) -> Self {
        self.error_mode = ErrorMode::Strict;
        self
    }

    /// Replace failing pages with empty segments (the default).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set password for encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Whether `page_count` pages should be spread over the thread pool.
    pub fn use_parallel(&self, page_count: usize) -> bool {
        self.parallel && page_count >= PARALLEL_PAGE_THRESHOLD
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Lenient,
            parallel: true,
            pages: PageSelection::All,
            password: None,
        }
    }
}

/// Error handling mode for per-page failures.
///
/// Document-level failures (malformed structure, encryption) are always
/// fatal regardless of mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// A page that cannot be decoded fails the whole extraction
    Strict,
    /// A page that cannot be decoded yields an empty segment
    #[default]
    Lenient,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .strict()
            .sequential()
            .with_password("secret")
            .with_pages(PageSelection::Pages(vec![2]));

        assert_eq!(options.error_mode, ErrorMode::Strict);
        assert!(!options.parallel);
        assert_eq!(options.password.as_deref(), Some("secret"));
        assert!(options.pages.includes(2));
        assert!(!options.pages.includes(1));
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert_eq!(options.error_mode, ErrorMode::Lenient);
        assert!(options.parallel);
        assert!(options.password.is_none());
    }

    #[test]
    fn test_parallel_threshold() {
        let options = ParseOptions::default();
        assert!(!options.use_parallel(3));
        assert!(options.use_parallel(4));
        assert!(!options.sequential().use_parallel(100));
    }
}
