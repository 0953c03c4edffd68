//! Plain text rendering.

use super::{CleanupPipeline, TextOptions};
use crate::error::Result;
use crate::model::ExtractedText;

/// Render extracted pages as one string, using the separator and cleanup
/// from `options` rather than those the text was extracted with.
pub fn to_text(text: &ExtractedText, options: &TextOptions) -> Result<String> {
    let pipeline = options
        .cleanup
        .as_ref()
        .map(|cleanup| CleanupPipeline::new(cleanup.clone()))
        .transpose()?;

    let segments: Vec<String> = text
        .pages
        .iter()
        .map(|page| match &pipeline {
            Some(pipeline) => pipeline.process(&page.text),
            None => page.text.clone(),
        })
        .collect();

    Ok(segments.join(&options.page_separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, PageText};
    use crate::render::CleanupOptions;

    fn extracted() -> ExtractedText {
        ExtractedText::new(
            Metadata::default(),
            vec![PageText::new(1, "\u{FB01}rst"), PageText::new(2, "second")],
            "\n",
        )
    }

    #[test]
    fn test_to_text_uses_option_separator() {
        let options = TextOptions::default().with_page_separator(" | ");
        assert_eq!(to_text(&extracted(), &options).unwrap(), "\u{FB01}rst | second");
    }

    #[test]
    fn test_to_text_applies_cleanup_per_page() {
        let options = TextOptions::default()
            .with_page_separator("\n")
            .with_cleanup(CleanupOptions::standard());
        assert_eq!(to_text(&extracted(), &options).unwrap(), "first\nsecond");
    }
}
