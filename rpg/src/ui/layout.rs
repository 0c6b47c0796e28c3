//! Layout calculations for the RPG TUI

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Areas of the play screen
pub struct AppLayout {
    pub title_area: Rect,
    pub narrative_area: Rect,
    pub sidebar_area: Rect,
    pub status_bar: Rect,
    pub hotkey_bar: Rect,
    pub input_area: Rect,
}

impl AppLayout {
    /// Calculate layout based on terminal size
    pub fn calculate(area: Rect) -> Self {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Title bar
                Constraint::Min(8),    // Main content
                Constraint::Length(1), // Status bar
                Constraint::Length(1), // Hotkey bar
                Constraint::Length(3), // Input area
            ])
            .split(area);

        // Content area: narrative + party
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(main_chunks[1]);

        Self {
            title_area: main_chunks[0],
            narrative_area: content_chunks[0],
            sidebar_area: content_chunks[1],
            status_bar: main_chunks[2],
            hotkey_bar: main_chunks[3],
            input_area: main_chunks[4],
        }
    }
}

/// Areas of the creation and assembly screens
pub struct FormLayout {
    pub form_area: Rect,
    pub status_bar: Rect,
    pub hotkey_bar: Rect,
}

impl FormLayout {
    pub fn calculate(area: Rect, width: u16, height: u16) -> Self {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(area);

        Self {
            form_area: centered_rect_fixed(width, height, chunks[0]),
            status_bar: chunks[1],
            hotkey_bar: chunks[2],
        }
    }
}

/// Calculate fixed-size centered popup
pub fn centered_rect_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;

    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_layout() {
        let layout = AppLayout::calculate(Rect::new(0, 0, 100, 40));
        assert_eq!(layout.title_area.height, 1);
        assert_eq!(layout.input_area.height, 3);
        assert_eq!(layout.narrative_area.width, 70);
        assert_eq!(layout.sidebar_area.width, 30);
        assert_eq!(layout.narrative_area.height, 34);
    }

    #[test]
    fn test_centered_rect_fits() {
        let area = Rect::new(0, 0, 40, 10);
        assert_eq!(centered_rect_fixed(20, 4, area), Rect::new(10, 3, 20, 4));
        assert_eq!(centered_rect_fixed(60, 20, area), Rect::new(0, 0, 40, 10));
    }
}
