//! Text assembly options and page selection.

use super::CleanupOptions;
use crate::error::{Error, Result};
use std::ops::RangeInclusive;

/// Separator placed between page segments: a form feed on its own line.
pub const DEFAULT_PAGE_SEPARATOR: &str = "\n\u{000C}\n";

/// Options for turning glyph runs into text.
#[derive(Debug, Clone)]
pub struct TextOptions {
    /// A vertical move larger than this fraction of the font size starts a new line
    pub line_break_ratio: f64,

    /// A horizontal gap larger than this fraction of the average glyph width
    /// inserts a space
    pub word_gap_ratio: f64,

    /// String placed between consecutive page segments
    pub page_separator: String,

    /// Post-processing applied to each page segment
    pub cleanup: Option<CleanupOptions>,
}

impl TextOptions {
    /// Create new text options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the line break threshold.
    pub fn with_line_break_ratio(mut self, ratio: f64) -> Self {
        self.line_break_ratio = ratio;
        self
    }

    /// Set the word gap threshold.
    pub fn with_word_gap_ratio(mut self, ratio: f64) -> Self {
        self.word_gap_ratio = ratio;
        self
    }

    /// Set the page separator.
    pub fn with_page_separator(mut self, separator: impl Into<String>) -> Self {
        self.page_separator = separator.into();
        self
    }

    /// Set cleanup options.
    pub fn with_cleanup(mut self, cleanup: CleanupOptions) -> Self {
        self.cleanup = Some(cleanup);
        self
    }

    /// Set cleanup preset.
    pub fn with_cleanup_preset(mut self, preset: super::CleanupPreset) -> Self {
        self.cleanup = Some(CleanupOptions::from_preset(preset));
        self
    }
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            line_break_ratio: 0.5,
            word_gap_ratio: 0.3,
            page_separator: DEFAULT_PAGE_SEPARATOR.to_string(),
            cleanup: None,
        }
    }
}

/// Page selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Page numbers selected from a document of `page_count` pages, in
    /// document order.
    ///
    /// Explicitly named pages past the end are an error; a range is clipped.
    pub fn resolve(&self, page_count: u32) -> Result<Vec<u32>> {
        match self {
            PageSelection::All => Ok((1..=page_count).collect()),
            PageSelection::Range(range) => {
                let start = (*range.start()).max(1);
                let end = (*range.end()).min(page_count);
                if *range.start() > page_count && page_count > 0 {
                    return Err(Error::PageOutOfRange(*range.start(), page_count));
                }
                Ok((start..=end).collect())
            }
            PageSelection::Pages(pages) => {
                let mut selected = Vec::with_capacity(pages.len());
                for &page in pages {
                    if page == 0 || page > page_count {
                        return Err(Error::PageOutOfRange(page, page_count));
                    }
                    if !selected.contains(&page) {
                        selected.push(page);
                    }
                }
                selected.sort_unstable();
                Ok(selected)
            }
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidPageRange(s.to_string());

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start == 0 || end < start {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| invalid())?;
                let end: u32 = end.trim().parse().map_err(|_| invalid())?;
                if start == 0 || end < start {
                    return Err(invalid());
                }
                for p in start..=end {
                    if !pages.contains(&p) {
                        pages.push(p);
                    }
                }
            } else {
                let p: u32 = part.parse().map_err(|_| invalid())?;
                if p == 0 {
                    return Err(invalid());
                }
                if !pages.contains(&p) {
                    pages.push(p);
                }
            }
        }

        pages.sort_unstable();
        Ok(PageSelection::Pages(pages))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_options_builder() {
        let options = TextOptions::new()
            .with_line_break_ratio(0.8)
            .with_word_gap_ratio(0.2)
            .with_page_separator("\n---\n");

        assert_eq!(options.line_break_ratio, 0.8);
        assert_eq!(options.word_gap_ratio, 0.2);
        assert_eq!(options.page_separator, "\n---\n");
        assert!(options.cleanup.is_none());
    }

    #[test]
    fn test_page_selection_includes() {
        let range = PageSelection::Range(5..=10);
        assert!(!range.includes(4));
        assert!(range.includes(5));
        assert!(range.includes(10));
        assert!(!range.includes(11));

        let pages = PageSelection::Pages(vec![1, 3]);
        assert!(pages.includes(3));
        assert!(!pages.includes(2));
    }

    #[test]
    fn test_page_selection_parse() {
        assert_eq!(PageSelection::parse("all").unwrap(), PageSelection::All);
        assert_eq!(PageSelection::parse("2-4").unwrap(), PageSelection::Range(2..=4));
        assert_eq!(
            PageSelection::parse("1,3,5-7,3").unwrap(),
            PageSelection::Pages(vec![1, 3, 5, 6, 7])
        );
        assert!(matches!(
            PageSelection::parse("x-2"),
            Err(Error::InvalidPageRange(_))
        ));
        assert!(PageSelection::parse("0").is_err());
        assert!(PageSelection::parse("5-2").is_err());
    }

    #[test]
    fn test_page_selection_resolve() {
        assert_eq!(PageSelection::All.resolve(3).unwrap(), vec![1, 2, 3]);
        assert_eq!(PageSelection::Range(2..=9).resolve(4).unwrap(), vec![2, 3, 4]);
        assert_eq!(
            PageSelection::Pages(vec![3, 1]).resolve(3).unwrap(),
            vec![1, 3]
        );
        assert!(matches!(
            PageSelection::Pages(vec![7]).resolve(3),
            Err(Error::PageOutOfRange(7, 3))
        ));
        assert!(PageSelection::All.resolve(0).unwrap().is_empty());
    }
}
