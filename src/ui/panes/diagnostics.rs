//! Diagnostics pane rendering

use super::utils::{pane_block, settle_scroll, visible_height};
use crate::diagnostics::{Diagnostic, Severity};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the diagnostics pane
pub fn render_diagnostics_pane(
    frame: &mut Frame,
    area: Rect,
    diagnostics: &[Diagnostic],
    selected: Option<usize>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(format!(" Diagnostics ({}) ", diagnostics.len()), is_focused);

    if diagnostics.is_empty() {
        let paragraph = Paragraph::new("(no diagnostics)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.ok));
        frame.render_widget(paragraph, area);
        return;
    }

    let visible = visible_height(area);
    settle_scroll(scroll_offset, diagnostics.len(), visible, selected);

    let rows: Vec<Line> = diagnostics
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible)
        .map(|(idx, diagnostic)| {
            let color = match diagnostic.severity {
                Severity::Error => DEFAULT_THEME.error,
                Severity::Warning => DEFAULT_THEME.warning,
            };
            let mut line = Line::from(vec![
                Span::styled(
                    format!(
                        "{:>4}:{:<3} ",
                        diagnostic.span.start.line, diagnostic.span.start.column
                    ),
                    Style::default().fg(DEFAULT_THEME.muted),
                ),
                Span::styled(
                    format!("{:<8}", diagnostic.severity.name()),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("[{}] ", diagnostic.kind.name()),
                    Style::default().fg(DEFAULT_THEME.muted),
                ),
                Span::styled(diagnostic.message.clone(), Style::default().fg(DEFAULT_THEME.text)),
            ]);
            if let Some(recovery) = diagnostic.recovery {
                line.spans.push(Span::styled(
                    format!(" ({})", recovery),
                    Style::default().fg(DEFAULT_THEME.muted),
                ));
            }
            if selected == Some(idx) {
                line = line.style(Style::default().bg(DEFAULT_THEME.selection_bg));
            }
            line
        })
        .collect();

    frame.render_widget(Paragraph::new(rows).block(block), area);
}
