//! Interactive explorer for a single translation unit.
//!
//! [`App`] owns the lexed tokens, the parsed tree and the diagnostics for one
//! file, and steps a token cursor through them. Rendering lives in `panes`,
//! one function per pane, all drawing from the palette in `theme`.

pub mod app;
pub mod panes;
pub mod theme;

pub use app::App;
