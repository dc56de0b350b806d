//! Token list pane rendering

use super::utils::{pane_block, settle_scroll, visible_height};
use crate::ui::app::TokenEntry;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the token pane, one token per row, with the cursor row marked.
pub fn render_tokens_pane(
    frame: &mut Frame,
    area: Rect,
    tokens: &[TokenEntry],
    cursor: usize,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(format!(" Tokens ({}) ", tokens.len()), is_focused);
    let visible = visible_height(area);
    settle_scroll(scroll_offset, tokens.len(), visible, Some(cursor));

    let rows: Vec<Line> = tokens
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible)
        .map(|(idx, token)| {
            let mut style = Style::default().fg(DEFAULT_THEME.token_color(token.category));
            let marker = if idx == cursor {
                style = style
                    .bg(DEFAULT_THEME.selection_bg)
                    .add_modifier(Modifier::BOLD);
                "▶"
            } else {
                " "
            };
            Line::from(vec![
                Span::styled(marker, Style::default().fg(DEFAULT_THEME.highlight)),
                Span::styled(token.line.clone(), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(rows).block(block), area);
}
