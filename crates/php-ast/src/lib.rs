pub mod ast;
pub mod span;
pub mod visitor;

pub use ast::*;
pub use span::{LineCol, LineIndex, Span};
