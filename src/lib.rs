//! # Introduction
//!
//! cfront is an error-tolerant lexer and parser for C and a C++ subset. It
//! turns source text into a lossless token stream and an owned AST, and never
//! gives up on malformed input: every problem becomes a positioned
//! diagnostic next to a best-effort tree. A terminal explorer built with
//! [ratatui](https://docs.rs/ratatui) shows the source, tokens, tree and
//! diagnostics side by side.
//!
//! ## Pipeline
//!
//! ```text
//! Source → (Preprocessor) → Lexer → TokenStream → Parser → Program + Diagnostics
//! ```
//!
//! 1. [`preprocess`]: optional source-to-source pass; the default leaves
//!    directives in place as trivia.
//! 2. [`parser`]: lexer, token stream, recursive descent parser, AST and the
//!    scoped type-name table that separates `T * x;` declarations from
//!    multiplications.
//! 3. [`diagnostics`]: lexical, syntax and nesting diagnostics with the
//!    recovery action taken.
//! 4. [`dump`]: stable text renderings of tokens and trees.
//! 5. [`batch`]: parallel parsing of independent files.
//! 6. [`ui`]: ratatui-based explorer; not part of the stable library API.
//!
//! ## Example
//!
//! ```
//! use cfront::{parse, ParseOptions};
//!
//! let output = parse("int main(void) { return 1 + 2 * 3; }", &ParseOptions::c());
//! assert!(output.diagnostics.is_empty());
//! assert_eq!(output.program.items[0].name().as_deref(), Some("main"));
//! ```

pub mod batch;
pub mod config;
pub mod diagnostics;
pub mod dump;
pub mod parser;
pub mod preprocess;
pub mod ui;

pub use config::{LanguageProfile, ParseOptions, TriviaMode};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use parser::{parse, ParseOutput};
