//! AST outline pane rendering
//!
//! Shows the flattened outline from [`crate::dump::outline`]. The row for the
//! innermost node containing the token cursor is highlighted, so stepping
//! through tokens walks the tree.

use super::utils::{pane_block, settle_scroll, visible_height};
use crate::dump::OutlineRow;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the AST pane
pub fn render_ast_pane(
    frame: &mut Frame,
    area: Rect,
    outline: &[OutlineRow],
    current: Option<usize>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Syntax Tree ".to_string(), is_focused);

    if outline.is_empty() {
        let paragraph = Paragraph::new("(empty program)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.muted));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible = visible_height(area);
    settle_scroll(scroll_offset, outline.len(), visible, current);

    let rows: Vec<Line> = outline
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible)
        .map(|(idx, row)| {
            let (kind, detail) = match row.label.split_once(' ') {
                Some((kind, detail)) => (kind, detail),
                None => (row.label.as_str(), ""),
            };
            let mut kind_style = Style::default().fg(DEFAULT_THEME.node_kind);
            let mut detail_style = Style::default().fg(DEFAULT_THEME.text);
            if current == Some(idx) {
                kind_style = kind_style
                    .bg(DEFAULT_THEME.selection_bg)
                    .add_modifier(Modifier::BOLD);
                detail_style = detail_style.bg(DEFAULT_THEME.selection_bg);
            }
            Line::from(vec![
                Span::raw("  ".repeat(row.depth)),
                Span::styled(kind.to_string(), kind_style),
                Span::styled(format!(" {}", detail), detail_style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(rows).block(block), area);
}
