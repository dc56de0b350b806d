//! TUI pane rendering modules
//!
//! This module provides the rendering logic for all visual panes in the TUI,
//! organized by responsibility for maintainability.
//!
//! # Pane Modules
//!
//! - [`source`]: Source text highlighted from the lexer's own token categories,
//!   with the current token marked and diagnostic lines flagged
//! - [`tokens`]: The token sequence with positions and categories
//! - [`ast`]: The AST outline, following the token cursor
//! - [`diagnostics`]: Lexical, syntax and nesting diagnostics
//! - [`status`]: Status bar with keybindings and parse state
//! - `utils`: Shared block styling and scroll handling
//!
//! # Architecture
//!
//! Each pane module exports a primary `render_*` function. Panes are stateless
//! apart from a scroll offset owned by the [`App`](crate::ui::App); an offset
//! of `usize::MAX` asks the pane to center on its highlighted row.

mod utils;

pub mod ast;
pub mod diagnostics;
pub mod source;
pub mod status;
pub mod tokens;

// Re-export render functions for convenience
pub use ast::render_ast_pane;
pub use diagnostics::render_diagnostics_pane;
pub use source::{render_source_pane, SourceRenderData};
pub use status::render_status_bar;
pub use tokens::render_tokens_pane;
