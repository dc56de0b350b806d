//! C and C++ source code parser
//!
//! This module transforms source text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → lossless token sequence)
//! - [`stream`]: Lookahead, backtracking and delimiter tracking over tokens
//! - [`parse`]: Parsing (tokens → AST), split across `declarations`,
//!   `declarators`, `statements` and `expressions`
//! - [`ast`]: AST node definitions
//!
//! # Supported Language
//!
//! - C: the full declaration syntax (declarators, typedefs, unions, enums,
//!   bitfields, function pointers), designated initializers, compound
//!   literals, every statement form including `goto`
//! - C++ subset: classes with access sections and inheritance, templates,
//!   namespaces, `using`, `enum class`, references, lambdas, `new`/`delete`,
//!   named casts, range-based `for`, direct and brace initialization
//! - Preprocessor lines are kept as directive trivia; see
//!   [`crate::preprocess`] for plugging in a real pre-pass
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser with precedence climbing for binary
//! operators. Identifiers are classified as type names through a scoped
//! table, which is what makes `T * x;` parse as a declaration only when `T`
//! names a type.

pub mod ast;
pub mod consteval;
mod declarations;
mod declarators;
mod expressions;
pub mod lexer;
pub mod parse;
pub mod scope;
mod statements;
pub mod stream;
pub mod token;

use crate::config::ParseOptions;

pub use parse::{ParseError, ParseOutput, Parser};

/// Parse a complete source unit.
///
/// Never fails: every problem is reported in [`ParseOutput::diagnostics`]
/// next to a best-effort program.
pub fn parse(source: &str, options: &ParseOptions) -> ParseOutput {
    Parser::new(source, options).parse_program()
}
