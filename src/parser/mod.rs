//! Formula parser
//!
//! A hand-written tokenizer feeding a Pratt parser, converting formula text
//! into an [`ExpressionNode`](crate::ast::ExpressionNode) tree.

#![warn(missing_docs)]

pub mod error;
pub mod pratt;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use pratt::parse_expression_pratt;

// Re-export parser function for compatibility
pub use pratt::parse_expression_pratt as parse_expression;
