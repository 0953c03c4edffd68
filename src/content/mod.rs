//! Content stream interpretation.

mod interpreter;
mod operation;

pub use interpreter::{interpret_page, Interpreter, Matrix};
pub use operation::{parse_operations, Operation};
