//! Shared utility functions for pane rendering

use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders},
};

/// Bordered block with the focused/unfocused border color.
pub(super) fn pane_block(title: String, is_focused: bool) -> Block<'static> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.focus_border)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.idle_border)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Rows available inside a bordered pane, min 1.
pub(super) fn visible_height(area: Rect) -> usize {
    area.height.saturating_sub(2).max(1) as usize
}

/// Clamp `scroll` so the window stays within `total` rows. `usize::MAX`
/// centers the window on `focus`.
pub(super) fn settle_scroll(
    scroll: &mut usize,
    total: usize,
    visible: usize,
    focus: Option<usize>,
) {
    if *scroll == usize::MAX {
        *scroll = match focus {
            Some(row) => row.saturating_sub(visible / 2),
            None => 0,
        };
    }
    let max_scroll = total.saturating_sub(visible);
    *scroll = (*scroll).min(max_scroll);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settle_scroll_centers_and_clamps() {
        let mut scroll = usize::MAX;
        settle_scroll(&mut scroll, 100, 10, Some(50));
        assert_eq!(scroll, 45);

        let mut scroll = usize::MAX;
        settle_scroll(&mut scroll, 100, 10, Some(98));
        assert_eq!(scroll, 90);

        let mut scroll = 7;
        settle_scroll(&mut scroll, 5, 10, None);
        assert_eq!(scroll, 0);
    }
}
