//! Status bar: cursor position, last message, key hints and a parse badge

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Key, description pairs shown on the right.
const KEY_HINTS: &[(&str, &str)] = &[
    ("←/→", "token"),
    ("n/N", "diagnostic"),
    ("⇥", "focus"),
    ("↵/⌫", "end/start"),
    ("q", "quit"),
];

fn bar() -> Style {
    Style::default().bg(DEFAULT_THEME.bar_bg)
}

fn badge(color: Color) -> Style {
    Style::default()
        .bg(color)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

fn hint_spans() -> Vec<Span<'static>> {
    let key = Style::default().bg(DEFAULT_THEME.muted).fg(Color::Black);
    let desc = bar().fg(DEFAULT_THEME.text);
    let sep = bar().fg(DEFAULT_THEME.muted);

    KEY_HINTS
        .iter()
        .flat_map(|&(k, d)| {
            [
                Span::styled(format!(" {} ", k), key),
                Span::styled(format!(" {} ", d), desc),
                Span::styled("│ ", sep),
            ]
        })
        .collect()
}

/// Render the status bar at the bottom.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    message: &str,
    cursor: usize,
    total_tokens: usize,
    diagnostic_count: usize,
) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let position = match total_tokens {
        0 => " Token 0/0 ".to_string(),
        total => format!(" Token {}/{} ", cursor + 1, total),
    };
    let info = Line::from(vec![
        Span::styled(position, badge(DEFAULT_THEME.accent)),
        Span::styled(format!("  {}", message), bar().fg(DEFAULT_THEME.text)),
    ]);
    frame.render_widget(
        Paragraph::new(info).style(bar()).alignment(Alignment::Left),
        halves[0],
    );

    let mut hints = hint_spans();
    hints.push(match diagnostic_count {
        0 => Span::styled(" CLEAN ", badge(DEFAULT_THEME.ok)),
        n => Span::styled(format!(" {} DIAG ", n), badge(DEFAULT_THEME.error)),
    });
    frame.render_widget(
        Paragraph::new(Line::from(hints))
            .style(bar())
            .alignment(Alignment::Right),
        halves[1],
    );
}
