//! Adventure log widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::scrollbar,
    text::{Line, Span},
    widgets::{
        Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
        StatefulWidget, Widget, Wrap,
    },
};

use rpg_core::GameLogEntry;

use crate::ui::theme::GameTheme;

/// Widget for displaying the adventure log
pub struct NarrativeWidget<'a> {
    entries: &'a [GameLogEntry],
    scroll: usize,
    theme: &'a GameTheme,
    focused: bool,
}

impl<'a> NarrativeWidget<'a> {
    pub fn new(entries: &'a [GameLogEntry], theme: &'a GameTheme) -> Self {
        Self {
            entries,
            scroll: 0,
            theme,
            focused: false,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn entry_lines(&self, entry: &GameLogEntry) -> Vec<Line<'static>> {
        if entry.is_dm() {
            let style = self.theme.dm_style();
            return entry
                .message
                .lines()
                .map(|line| Line::from(Span::styled(line.to_string(), style)))
                .collect();
        }

        if entry.is_system() {
            let style = if entry.message.starts_with("Error:") {
                self.theme.error_style()
            } else {
                self.theme.system_style()
            };
            return vec![Line::from(Span::styled(format!("[ {} ]", entry.message), style))];
        }

        let style = self.theme.player_style();
        let mut lines = entry.message.lines();
        let first = lines.next().unwrap_or_default();
        let mut out = vec![Line::from(vec![
            Span::styled(
                format!("> {}: ", entry.sender),
                style.add_modifier(Modifier::BOLD),
            ),
            Span::styled(first.to_string(), style),
        ])];
        out.extend(lines.map(|line| Line::from(Span::styled(format!("  {line}"), style))));
        out
    }
}

impl Widget for NarrativeWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.focused {
            " Adventure [j/k scroll] "
        } else {
            " Adventure "
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();
        for entry in self.entries {
            lines.extend(self.entry_lines(entry));
            lines.push(Line::from(""));
        }

        let visible_height = inner.height as usize;
        let total_lines = lines.len();
        let max_scroll = total_lines.saturating_sub(visible_height);
        let scroll = self.scroll.min(max_scroll);

        Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .wrap(Wrap { trim: false })
            .render(inner, buf);

        if total_lines > visible_height {
            let scrollbar_area = Rect {
                x: inner.x + inner.width.saturating_sub(1),
                y: inner.y,
                width: 1,
                height: inner.height,
            };

            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .symbols(scrollbar::VERTICAL)
                .thumb_style(Style::default().fg(Color::DarkGray))
                .track_style(Style::default().fg(Color::Black))
                .begin_symbol(Some("↑"))
                .end_symbol(Some("↓"));

            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(scroll);
            scrollbar.render(scrollbar_area, buf, &mut scrollbar_state);

            // More content below
            if scroll < max_scroll {
                let hint = format!(" ↓{} more ", max_scroll - scroll);
                let hint_y = inner.y + inner.height.saturating_sub(1);
                let hint_style = Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::DIM);
                for (i, ch) in hint.chars().enumerate() {
                    let x = inner.x + (i as u16);
                    if x < inner.x + inner.width.saturating_sub(2) {
                        buf[(x, hint_y)].set_char(ch).set_style(hint_style);
                    }
                }
            }
        }
    }
}
