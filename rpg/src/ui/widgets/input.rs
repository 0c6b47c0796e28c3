//! Action input widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::ui::theme::GameTheme;

/// Single-line input with a block cursor. Command mode shows the buffer
/// after its leading `:`.
pub struct InputWidget<'a> {
    content: &'a str,
    cursor_position: usize,
    theme: &'a GameTheme,
    placeholder: &'a str,
    title: Option<&'a str>,
    is_active: bool,
    is_command_mode: bool,
}

impl<'a> InputWidget<'a> {
    pub fn new(content: &'a str, theme: &'a GameTheme) -> Self {
        Self {
            content,
            cursor_position: content.chars().count(),
            theme,
            placeholder: "",
            title: None,
            is_active: true,
            is_command_mode: false,
        }
    }

    pub fn cursor_position(mut self, pos: usize) -> Self {
        self.cursor_position = pos;
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = placeholder;
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    pub fn command_mode(mut self, is_command: bool) -> Self {
        self.is_command_mode = is_command;
        self
    }

    fn cursor_line(&self) -> Line<'static> {
        let (prefix, text, cursor) = if self.is_command_mode {
            (
                ":",
                self.content.strip_prefix(':').unwrap_or(self.content),
                self.cursor_position.saturating_sub(1),
            )
        } else {
            ("> ", self.content, self.cursor_position)
        };

        let before: String = text.chars().take(cursor).collect();
        let at: String = text
            .chars()
            .nth(cursor)
            .map(String::from)
            .unwrap_or_else(|| " ".to_string());
        let after: String = text.chars().skip(cursor + 1).collect();

        let mut spans = vec![Span::styled(prefix, self.theme.player_style()), Span::raw(before)];
        if self.is_active {
            spans.push(Span::styled(
                at,
                Style::default()
                    .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
                    .fg(self.theme.player_text),
            ));
        } else {
            spans.push(Span::raw(at));
        }
        spans.push(Span::raw(after));
        Line::from(spans)
    }
}

impl Widget for InputWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.is_active));
        if let Some(title) = self.title {
            block = block.title(title);
        }

        let inner = block.inner(area);
        block.render(area, buf);

        let line = if self.content.is_empty() && !self.is_command_mode {
            Line::from(vec![
                Span::styled("> ", self.theme.player_style()),
                Span::styled(
                    self.placeholder.to_string(),
                    Style::default().add_modifier(Modifier::DIM),
                ),
            ])
        } else {
            self.cursor_line()
        };

        Paragraph::new(line).render(inner, buf);
    }
}
