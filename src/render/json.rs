//! JSON rendering of extracted text.

use crate::error::{Error, Result};
use crate::model::ExtractedText;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize metadata, page texts and diagnostics.
pub fn to_json(text: &ExtractedText, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(text),
        JsonFormat::Compact => serde_json::to_string(text),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}
