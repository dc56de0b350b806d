//! Color palette shared by every pane.

use ratatui::style::Color;

use crate::parser::token::TokenCategory;

pub struct Theme {
    pub text: Color,
    pub accent: Color,
    pub highlight: Color,
    pub muted: Color,
    pub ok: Color,
    pub error: Color,
    pub warning: Color,
    pub keyword: Color,
    pub identifier: Color,
    pub string_lit: Color,
    pub number_lit: Color,
    pub directive: Color,
    /// AST node kind labels.
    pub node_kind: Color,
    pub focus_border: Color,
    pub idle_border: Color,
    /// Status bar and header rows.
    pub bar_bg: Color,
    /// Cursor token and selected rows.
    pub selection_bg: Color,
}

// Catppuccin Mocha
pub const DEFAULT_THEME: Theme = Theme {
    text: Color::Rgb(205, 214, 244),
    accent: Color::Rgb(137, 180, 250),
    highlight: Color::Rgb(250, 179, 135),
    muted: Color::Rgb(108, 112, 134),
    ok: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    warning: Color::Rgb(249, 226, 175),
    keyword: Color::Rgb(203, 166, 247),
    identifier: Color::Rgb(205, 214, 244),
    string_lit: Color::Rgb(166, 227, 161),
    number_lit: Color::Rgb(250, 179, 135),
    directive: Color::Rgb(245, 194, 231),
    node_kind: Color::Rgb(148, 226, 213),
    focus_border: Color::Rgb(249, 226, 175),
    idle_border: Color::Rgb(108, 112, 134),
    bar_bg: Color::Rgb(49, 50, 68),
    selection_bg: Color::Rgb(69, 71, 90),
};

impl Theme {
    /// Foreground color for a token category.
    pub fn token_color(&self, category: TokenCategory) -> Color {
        match category {
            TokenCategory::Keyword => self.keyword,
            TokenCategory::Identifier => self.identifier,
            TokenCategory::IntegerLiteral | TokenCategory::FloatLiteral => self.number_lit,
            TokenCategory::StringLiteral | TokenCategory::CharLiteral => self.string_lit,
            TokenCategory::Comment | TokenCategory::Whitespace | TokenCategory::EndOfInput => {
                self.muted
            }
            TokenCategory::Directive => self.directive,
            TokenCategory::Error => self.error,
            TokenCategory::Operator => self.accent,
            TokenCategory::Punctuation => self.text,
        }
    }
}
