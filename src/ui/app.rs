//! Main TUI application state and logic

use crate::config::{ParseOptions, TriviaMode};
use crate::diagnostics::Diagnostic;
use crate::dump::{self, OutlineRow};
use crate::parser::ast::Span;
use crate::parser::lexer::tokenize;
use crate::parser::token::TokenCategory;
use crate::parser::{self, ParseOutput};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    Frame, Terminal,
    backend::Backend,
    layout::{Constraint, Direction, Layout},
};
use std::io;
use std::time::Duration;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Tokens,
    Ast,
    Diagnostics,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> diagnostics -> tokens -> ast)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Diagnostics,
            FocusedPane::Diagnostics => FocusedPane::Tokens,
            FocusedPane::Tokens => FocusedPane::Ast,
            FocusedPane::Ast => FocusedPane::Source,
        }
    }
}

/// Owned copy of a token for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenEntry {
    pub category: TokenCategory,
    pub lexeme: String,
    pub span: Span,
    pub line: String,
}

/// The main application state
pub struct App {
    pub path: String,
    pub source_code: String,

    /// Every token including trivia, for highlighting the source pane
    pub all_tokens: Vec<TokenEntry>,
    /// Tokens listed in the token pane (trivia only with `--trivia`)
    pub tokens: Vec<TokenEntry>,
    pub outline: Vec<OutlineRow>,
    pub diagnostics: Vec<Diagnostic>,

    /// Index into `tokens`
    pub cursor: usize,
    pub selected_diagnostic: Option<usize>,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: usize,
    pub tokens_scroll: usize,
    pub ast_scroll: usize,
    pub diagnostics_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Lex and parse `source_code` and build the explorer state.
    pub fn new(
        path: impl Into<String>,
        source_code: String,
        options: &ParseOptions,
        show_trivia: bool,
    ) -> Self {
        let output: ParseOutput = parser::parse(&source_code, options);
        let (raw, _) = tokenize(&source_code, options.profile, TriviaMode::Keep);
        let all_tokens: Vec<TokenEntry> = raw
            .iter()
            .map(|token| TokenEntry {
                category: token.category(),
                lexeme: token.lexeme.to_string(),
                span: token.span,
                line: dump::token_line(token),
            })
            .collect();
        let tokens = all_tokens
            .iter()
            .filter(|t| {
                show_trivia
                    || !matches!(
                        t.category,
                        TokenCategory::Whitespace
                            | TokenCategory::Comment
                            | TokenCategory::Directive
                    )
            })
            .cloned()
            .collect();

        let status_message = match output.diagnostics.len() {
            0 => "Parsed without diagnostics".to_string(),
            n => format!("Parse completed with {} diagnostic(s)", n),
        };

        App {
            path: path.into(),
            source_code,
            all_tokens,
            tokens,
            outline: dump::outline(&output.program),
            diagnostics: output.diagnostics,
            cursor: 0,
            selected_diagnostic: None,
            focused_pane: FocusedPane::Source,
            source_scroll: 0,
            tokens_scroll: 0,
            ast_scroll: 0,
            diagnostics_scroll: 0,
            should_quit: false,
            status_message,
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// The token under the cursor.
    pub fn current_token(&self) -> Option<&TokenEntry> {
        self.tokens.get(self.cursor)
    }

    /// The deepest outline row whose span contains the current token.
    pub fn current_outline_row(&self) -> Option<usize> {
        let offset = self.current_token()?.span.start.offset;
        self.outline
            .iter()
            .enumerate()
            .filter(|(_, row)| row.span.start.offset <= offset && offset < row.span.end.offset)
            .max_by_key(|(index, row)| (row.depth, *index))
            .map(|(index, _)| index)
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Diagnostics (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
            .split(columns[0]);

        // Right column: Tokens (top) | AST (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(columns[1]);

        let current_span = self.current_token().map(|t| t.span);
        let current_row = self.current_outline_row();

        super::panes::render_source_pane(
            frame,
            left_rows[0],
            super::panes::SourceRenderData {
                path: &self.path,
                source_code: &self.source_code,
                tokens: &self.all_tokens,
                diagnostics: &self.diagnostics,
                current: current_span,
            },
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        super::panes::render_diagnostics_pane(
            frame,
            left_rows[1],
            &self.diagnostics,
            self.selected_diagnostic,
            self.focused_pane == FocusedPane::Diagnostics,
            &mut self.diagnostics_scroll,
        );

        super::panes::render_tokens_pane(
            frame,
            right_rows[0],
            &self.tokens,
            self.cursor,
            self.focused_pane == FocusedPane::Tokens,
            &mut self.tokens_scroll,
        );

        super::panes::render_ast_pane(
            frame,
            right_rows[1],
            &self.outline,
            current_row,
            self.focused_pane == FocusedPane::Ast,
            &mut self.ast_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.cursor,
            self.tokens.len(),
            self.diagnostics.len(),
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Left => self.move_cursor_to(self.cursor.saturating_sub(1)),
            KeyCode::Right => self.move_cursor_to(self.cursor + 1),
            KeyCode::Up => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(1);
            }
            KeyCode::Char('n') => self.select_diagnostic(true),
            KeyCode::Char('N') => self.select_diagnostic(false),
            KeyCode::Enter => {
                self.move_cursor_to(self.tokens.len().saturating_sub(1));
                self.status_message = "Jumped to last token".to_string();
            }
            KeyCode::Backspace => {
                self.move_cursor_to(0);
                self.status_message = "Jumped to first token".to_string();
            }
            _ => {}
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Source => &mut self.source_scroll,
            FocusedPane::Tokens => &mut self.tokens_scroll,
            FocusedPane::Ast => &mut self.ast_scroll,
            FocusedPane::Diagnostics => &mut self.diagnostics_scroll,
        }
    }

    fn move_cursor_to(&mut self, index: usize) {
        if self.tokens.is_empty() {
            return;
        }
        self.cursor = index.min(self.tokens.len() - 1);
        if let Some(token) = self.current_token() {
            self.status_message = format!(
                "{}:{} {} {:?}",
                token.span.start.line,
                token.span.start.column,
                token.category.name(),
                token.lexeme
            );
        }
        // Panes re-center on the cursor when they are drawn next
        self.source_scroll = usize::MAX;
        self.tokens_scroll = usize::MAX;
        self.ast_scroll = usize::MAX;
    }

    /// Step to the next (or previous) diagnostic and move the cursor to the
    /// first token at or after its position.
    fn select_diagnostic(&mut self, forward: bool) {
        if self.diagnostics.is_empty() {
            self.status_message = "No diagnostics".to_string();
            return;
        }
        let count = self.diagnostics.len();
        let next = match (self.selected_diagnostic, forward) {
            (None, true) => 0,
            (None, false) => count - 1,
            (Some(i), true) => (i + 1) % count,
            (Some(i), false) => (i + count - 1) % count,
        };
        self.selected_diagnostic = Some(next);
        self.diagnostics_scroll = usize::MAX;

        let offset = self.diagnostics[next].span.start.offset;
        let target = self
            .tokens
            .iter()
            .position(|t| t.span.end.offset > offset)
            .unwrap_or(self.tokens.len().saturating_sub(1));
        self.move_cursor_to(target);
        self.status_message = self.diagnostics[next].to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_cursor_moves_and_clamps() {
        let mut app = App::new("t.c", "int x = 1;".to_string(), &ParseOptions::c(), false);
        assert_eq!(app.tokens.len(), 6);
        press(&mut app, KeyCode::Left);
        assert_eq!(app.cursor, 0);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.current_token().map(|t| t.lexeme.as_str()), Some("x"));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.cursor, 5);
        press(&mut app, KeyCode::Right);
        assert_eq!(app.cursor, 5);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.cursor, 0);
    }

    #[test]
    fn test_trivia_toggle() {
        let source = "// hi\nint x;".to_string();
        let hidden = App::new("t.c", source.clone(), &ParseOptions::c(), false);
        let shown = App::new("t.c", source, &ParseOptions::c(), true);
        assert!(shown.tokens.len() > hidden.tokens.len());
        assert_eq!(hidden.all_tokens.len(), shown.all_tokens.len());
    }

    #[test]
    fn test_next_diagnostic_moves_cursor() {
        let mut app = App::new("t.c", "int a;\nint b = ;".to_string(), &ParseOptions::c(), false);
        assert_eq!(app.diagnostics.len(), 1);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.selected_diagnostic, Some(0));
        assert_eq!(app.current_token().map(|t| t.lexeme.as_str()), Some(";"));
        assert_eq!(app.current_token().map(|t| t.span.start.line), Some(2));
    }

    #[test]
    fn test_outline_row_follows_cursor() {
        let source = "int f(void) { return 7; }".to_string();
        let mut app = App::new("t.c", source, &ParseOptions::c(), false);
        let seven = app.tokens.iter().position(|t| t.lexeme == "7").unwrap_or(0);
        app.move_cursor_to(seven);
        let row = app.current_outline_row().map(|i| app.outline[i].label.clone());
        assert_eq!(row.as_deref(), Some("IntLiteral 7"));
    }

    #[test]
    fn test_focus_cycles() {
        let mut app = App::new("t.c", String::new(), &ParseOptions::c(), false);
        for _ in 0..4 {
            press(&mut app, KeyCode::Tab);
        }
        assert_eq!(app.focused_pane, FocusedPane::Source);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
