//! Source code pane rendering with syntax highlighting
//!
//! This module renders the source pane, which displays the file being
//! explored with highlighting taken from the lexer's token categories.
//!
//! # Features
//!
//! - Highlighting that matches exactly what the lexer produced, including
//!   error tokens and multi-line comments
//! - The token under the cursor is marked
//! - Line numbers turn red (error) or yellow (warning) on lines with diagnostics

use super::utils::{pane_block, settle_scroll, visible_height};
use crate::diagnostics::{Diagnostic, Severity};
use crate::parser::ast::Span as SourceSpan;
use crate::ui::app::TokenEntry;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Everything the source pane shows.
pub struct SourceRenderData<'a> {
    pub path: &'a str,
    pub source_code: &'a str,
    /// Lossless token sequence, trivia included
    pub tokens: &'a [TokenEntry],
    pub diagnostics: &'a [Diagnostic],
    pub current: Option<SourceSpan>,
}

/// Byte ranges of each line, without the line terminator.
fn line_ranges(source: &str) -> Vec<(usize, usize)> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for line in source.split('\n') {
        let end = start + line.trim_end_matches('\r').len();
        ranges.push((start, end));
        start += line.len() + 1;
    }
    ranges
}

/// Style each token slice that falls on the line `[start, end)`.
fn highlight_line<'a>(
    source: &'a str,
    (start, end): (usize, usize),
    tokens: &[TokenEntry],
    current: Option<SourceSpan>,
) -> Vec<Span<'a>> {
    let mut spans = Vec::new();
    let first = tokens.partition_point(|t| t.span.end.offset <= start);

    for token in &tokens[first..] {
        if token.span.start.offset >= end {
            break;
        }
        let seg_start = token.span.start.offset.max(start);
        let seg_end = token.span.end.offset.min(end);
        if seg_start >= seg_end {
            continue;
        }

        let mut style = Style::default().fg(DEFAULT_THEME.token_color(token.category));
        if current == Some(token.span) {
            style = style
                .bg(DEFAULT_THEME.selection_bg)
                .add_modifier(Modifier::BOLD);
        }
        let text = &source[seg_start..seg_end];
        if text.contains('\t') {
            spans.push(Span::styled(text.replace('\t', "    "), style));
        } else {
            spans.push(Span::styled(text, style));
        }
    }

    spans
}

/// Render the source code pane
pub fn render_source_pane(
    frame: &mut Frame,
    area: Rect,
    data: SourceRenderData<'_>,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(format!(" {} ", data.path), is_focused);

    let ranges = line_ranges(data.source_code);
    let visible = visible_height(area);
    let current_line = data.current.map(|span| span.start.line);
    settle_scroll(
        scroll_offset,
        ranges.len(),
        visible,
        current_line.map(|line| line.saturating_sub(1)),
    );

    let visible_lines: Vec<Line> = ranges
        .iter()
        .enumerate()
        .skip(*scroll_offset)
        .take(visible)
        .map(|(idx, range)| {
            let line_num = idx + 1;
            let severity = data
                .diagnostics
                .iter()
                .filter(|d| d.span.start.line == line_num)
                .map(|d| d.severity)
                .max();

            let num_style = match severity {
                Some(Severity::Error) => Style::default()
                    .fg(DEFAULT_THEME.error)
                    .add_modifier(Modifier::BOLD),
                Some(Severity::Warning) => Style::default().fg(DEFAULT_THEME.warning),
                None if current_line == Some(line_num) => Style::default()
                    .fg(DEFAULT_THEME.highlight)
                    .add_modifier(Modifier::BOLD),
                None => Style::default().fg(DEFAULT_THEME.muted),
            };

            let mut spans = vec![Span::styled(format!("{:4} ", line_num), num_style)];
            spans.extend(highlight_line(data.source_code, *range, data.tokens, data.current));
            let mut line = Line::from(spans);
            if current_line == Some(line_num) {
                line = line.style(Style::default().bg(DEFAULT_THEME.bar_bg));
            }
            line
        })
        .collect();

    let paragraph = Paragraph::new(visible_lines).block(block);
    frame.render_widget(paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::app::App;
    use crate::config::ParseOptions;

    #[test]
    fn test_line_ranges() {
        assert_eq!(line_ranges("ab\r\ncd\n"), vec![(0, 2), (4, 6), (7, 7)]);
    }

    #[test]
    fn test_multiline_comment_is_split_per_line() {
        let source = "/* a\n b */ int x;";
        let app = App::new("t.c", source.to_string(), &ParseOptions::c(), true);
        let ranges = line_ranges(source);
        let first: Vec<String> = highlight_line(source, ranges[0], &app.all_tokens, None)
            .into_iter()
            .map(|s| s.content.to_string())
            .collect();
        assert_eq!(first, vec!["/* a"]);
        let second: String = highlight_line(source, ranges[1], &app.all_tokens, None)
            .into_iter()
            .map(|s| s.content.to_string())
            .collect();
        assert_eq!(second, " b */ int x;");
    }
}
