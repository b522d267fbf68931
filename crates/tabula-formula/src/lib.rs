//! Formula collaborator for the Tabula workbook model.
//!
//! - [`tokenize`] splits formula text into source-preserving tokens.
//! - [`parse`] builds an [`Ast`] with Excel operator precedence; [`ast_to_formula`] prints it.
//! - [`FunctionRegistry`] describes known functions (arity, defaults, export eligibility).
//! - [`normalize_formula`] / [`denormalize_formula`] move references in and out of the
//!   `|i|` placeholder form stored in cells.

mod ast;
pub mod functions;
mod normalize;
mod parser;
mod tokenizer;

pub use ast::{ast_to_formula, Ast, BinaryOp, ParseError, UnaryOp};
pub use functions::{lookup_function, ArgDefinition, FunctionDescription, FunctionRegistry};
pub use normalize::{denormalize_formula, normalize_formula};
pub use parser::parse;
pub use tokenizer::{split_reference, tokenize, tokens_to_formula, Token, TokenKind};
