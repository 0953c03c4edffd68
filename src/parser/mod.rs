//! PDF parsing: lexing, objects, cross-reference data, filters and pages.

mod document;
pub mod filters;
pub mod lexer;
pub mod object;
mod options;
mod page;
pub mod xref;

pub use document::{Document, PageNode, Resolved};
#[cfg(test)]
pub(crate) use document::testing;
pub use object::{Dictionary, Object, ObjectId, Stream};
pub use options::{ErrorMode, ParseOptions, PARALLEL_PAGE_THRESHOLD};
pub use page::{Page, Resources};
