//! Text assembly and output rendering.

mod assembler;
mod cleanup;
mod json;
mod options;
mod text;

pub use assembler::{assemble, TextAssembler};
pub use cleanup::{CleanupOptions, CleanupPipeline, CleanupPreset};
pub use json::{to_json, JsonFormat};
pub use options::{PageSelection, TextOptions, DEFAULT_PAGE_SEPARATOR};
pub use text::to_text;
