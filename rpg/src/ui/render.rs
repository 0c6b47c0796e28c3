//! Render orchestration for the RPG TUI

use std::fmt::Display;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use rpg_core::{GamePhase, MAX_COMPANIONS};

use crate::app::{App, CreationField, InputMode, SlotField};
use crate::ui::layout::{centered_rect_fixed, AppLayout, FormLayout};
use crate::ui::theme::GameTheme;
use crate::ui::widgets::{
    HotkeyBarWidget, InputWidget, NarrativeWidget, PartyPanelWidget, StatusBarWidget,
};

/// Overlay types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Help,
}

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    match app.phase() {
        GamePhase::CharacterCreation => render_creation(frame, app, area),
        GamePhase::PartyAssembly => render_assembly(frame, app, area),
        GamePhase::Playing | GamePhase::GameOver => render_play(frame, app, area),
    }

    if let Some(Overlay::Help) = app.overlay() {
        render_help_overlay(frame, app, area);
    }
}

// ============================================================================
// Character creation
// ============================================================================

/// `‹ value ›` when focused, plain otherwise.
fn choice_line<T: Display>(label: &str, value: T, focused: bool, theme: &GameTheme) -> Line<'static> {
    let label = Span::styled(format!("{label:<8}"), theme.title_style(focused));
    if focused {
        Line::from(vec![
            label,
            Span::styled(format!("‹ {value} ›"), theme.selected_style()),
        ])
    } else {
        Line::from(vec![label, Span::raw(format!("  {value}"))])
    }
}

fn render_creation(frame: &mut Frame, app: &App, area: Rect) {
    let layout = FormLayout::calculate(area, 48, 13);
    let form = &app.creation;
    let theme = &app.theme;

    let name_focused = form.field == CreationField::Name;
    let name_value = if name_focused {
        format!("{}▌", form.name)
    } else if form.name.is_empty() {
        "(unnamed)".to_string()
    } else {
        form.name.clone()
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("Welcome, {}. Who leads the party?", app.user()),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled(format!("{:<8}", "Name"), theme.title_style(name_focused)),
            Span::styled(
                name_value,
                if name_focused {
                    theme.selected_style()
                } else {
                    Style::default()
                },
            ),
        ]),
        choice_line("Race", form.race, form.field == CreationField::Race, theme),
        choice_line("Class", form.class, form.field == CreationField::Class, theme),
        choice_line("Gender", form.gender, form.field == CreationField::Gender, theme),
        Line::from(""),
    ];
    if app.has_save() {
        lines.push(Line::from(Span::styled(
            "A saved adventure exists. Press F2 to resume it.",
            theme.selected_style(),
        )));
    }

    let block = Block::default()
        .title(" Create Your Character ")
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        layout.form_area,
    );

    render_status_bar(frame, app, layout.status_bar);
    render_hotkey_bar(frame, app, layout.hotkey_bar);
}

// ============================================================================
// Party assembly
// ============================================================================

fn render_assembly(frame: &mut Frame, app: &App, area: Rect) {
    let layout = FormLayout::calculate(area, 56, 16);
    let form = &app.assembly;
    let theme = &app.theme;

    let mut lines = Vec::new();
    if let Some(leader) = app.session.leader() {
        lines.push(Line::from(vec![
            Span::styled("Leader: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{} ({})", leader.name, leader.summary_line())),
        ]));
    }
    lines.push(Line::from(Span::styled(
        format!(
            "Companions ({}/{MAX_COMPANIONS}); the game master names them.",
            form.slots.len()
        ),
        theme.system_style(),
    )));
    lines.push(Line::from(""));

    if form.slots.is_empty() {
        lines.push(Line::from("  No companions. Press 'a' to add one, Enter to go alone."));
    }
    for (index, slot) in form.slots.iter().enumerate() {
        let selected = index == form.selected;
        let marker = if selected { "▸ " } else { "  " };
        let field = |which: SlotField, value: String| {
            if selected && form.field == which {
                Span::styled(format!("‹ {value} ›"), theme.selected_style())
            } else {
                Span::raw(format!("  {value}  "))
            }
        };
        lines.push(Line::from(vec![
            Span::styled(format!("{marker}{}. ", index + 1), theme.title_style(selected)),
            field(SlotField::Gender, slot.gender.to_string()),
            field(SlotField::Race, slot.race.to_string()),
            field(SlotField::Class, slot.class.to_string()),
        ]));
    }

    let block = Block::default()
        .title(" Assemble Your Party ")
        .borders(Borders::ALL)
        .border_style(theme.border_style(true));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        layout.form_area,
    );

    render_status_bar(frame, app, layout.status_bar);
    render_hotkey_bar(frame, app, layout.hotkey_bar);
}

// ============================================================================
// Play
// ============================================================================

fn render_play(frame: &mut Frame, app: &App, area: Rect) {
    let layout = AppLayout::calculate(area);

    render_title_bar(frame, app, layout.title_area);

    let narrative = NarrativeWidget::new(app.session.log(), &app.theme)
        .scroll(app.narrative_scroll)
        .focused(app.input_mode == InputMode::Normal);
    frame.render_widget(narrative, layout.narrative_area);

    frame.render_widget(
        PartyPanelWidget::new(app.session.party(), &app.theme),
        layout.sidebar_area,
    );

    render_status_bar(frame, app, layout.status_bar);
    render_hotkey_bar(frame, app, layout.hotkey_bar);

    if app.phase() == GamePhase::GameOver {
        render_game_over(frame, app, layout.input_area);
    } else {
        render_input(frame, app, layout.input_area);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let names: Vec<&str> = app
        .session
        .party()
        .iter()
        .map(|member| member.name.as_str())
        .collect();
    let title = format!(" ⚔ {} ⚔ ", names.join(" · "));
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled(title, app.theme.title_style(true)))),
        area,
    );
}

fn render_game_over(frame: &mut Frame, app: &App, area: Rect) {
    let reason = app.session.game_over_reason().unwrap_or_default();
    let line = Line::from(vec![
        Span::styled("GAME OVER ", app.theme.game_over_style()),
        Span::raw(reason.to_string()),
        Span::styled("  :restart to begin anew", app.theme.system_style()),
    ]);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.game_over));
    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let widget = StatusBarWidget::new(app.phase(), app.input_mode, &app.theme)
        .leader(app.session.leader())
        .message(app.status_message())
        .busy(app.is_busy());
    frame.render_widget(widget, area);
}

fn render_hotkey_bar(frame: &mut Frame, app: &App, area: Rect) {
    let widget =
        HotkeyBarWidget::new(app.phase(), app.input_mode, &app.theme).has_save(app.has_save());
    frame.render_widget(widget, area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let is_active = matches!(app.input_mode, InputMode::Insert | InputMode::Command);
    let is_command = app.input_mode == InputMode::Command;

    let placeholder = if app.is_busy() {
        "The game master is thinking..."
    } else if is_active {
        "What does the party do?"
    } else {
        "Press i to act"
    };
    let title = app
        .session
        .leader()
        .map(|leader| leader.name.as_str())
        .unwrap_or_default();

    let widget = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .active(is_active)
        .command_mode(is_command)
        .title(title)
        .placeholder(placeholder);
    frame.render_widget(widget, area);
}

// ============================================================================
// Overlays
// ============================================================================

fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup_area = centered_rect_fixed(52, 24, area);
    frame.render_widget(Clear, popup_area);

    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
    };

    let help_text = vec![
        heading("Character creation:"),
        Line::from("  Tab/↑↓    Next/previous field"),
        Line::from("  ←→        Change race, class or gender"),
        Line::from("  Enter     Create the leader"),
        Line::from("  F2        Resume your saved game"),
        Line::from(""),
        heading("Party assembly:"),
        Line::from("  a/d       Add/remove a companion"),
        Line::from("  j/k Tab   Select companion and field"),
        Line::from("  Enter     Begin the adventure"),
        Line::from(""),
        heading("Play:"),
        Line::from("  i         Describe the party's action"),
        Line::from("  j/k g/G   Scroll the adventure"),
        Line::from("  :w :wq    Save (and quit)"),
        Line::from("  :load     Resume your saved game"),
        Line::from("  :restart  Start over and delete the save"),
        Line::from("  :q        Quit"),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or q to close",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));

    frame.render_widget(
        Paragraph::new(help_text).block(block).wrap(Wrap { trim: false }),
        popup_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};
    use rpg_core::{GameSession, MockMaster, MockTurn, SaveStore};
    use tempfile::TempDir;

    fn screen(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 32)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        (0..buffer.area.height)
            .map(|y| {
                (0..buffer.area.width)
                    .map(|x| buffer[(x, y)].symbol())
                    .collect::<String>()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn test_app(master: MockMaster, dir: &TempDir) -> App {
        App::new(GameSession::new(master), SaveStore::new(dir.path()), "noa")
    }

    #[test]
    fn test_creation_screen() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(MockMaster::new(), &dir);
        app.creation.name = "Mira".to_string();

        let text = screen(&app);
        assert!(text.contains("Create Your Character"));
        assert!(text.contains("Mira"));
        assert!(text.contains("Warrior"));
        assert!(!text.contains("F2"));
    }

    #[tokio::test]
    async fn test_play_and_game_over_screens() {
        let dir = TempDir::new().unwrap();
        let master = MockMaster::new()
            .with_opening("Fog rolls in.")
            .with_turn(MockTurn::narrate("The ground gives way.").game_over(Some("Swallowed by the marsh.")));
        let mut app = test_app(master, &dir);
        app.creation.name = "Mira".to_string();
        app.submit_creation();
        app.run_pending().await;

        let text = screen(&app);
        assert!(text.contains("Assemble Your Party"));
        assert!(text.contains("Leader: Mira"));

        app.submit_party();
        app.run_pending().await;
        let text = screen(&app);
        assert!(text.contains("Fog rolls in."));
        assert!(text.contains("HP: 18/18"));
        assert!(text.contains("-- NORMAL --"));

        app.set_input("Step forward");
        app.submit_action();
        app.run_pending().await;
        let text = screen(&app);
        assert!(text.contains("GAME OVER"));
        assert!(text.contains("Swallowed by the marsh."));
    }

    #[test]
    fn test_help_overlay() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(MockMaster::new(), &dir);
        app.toggle_help();
        assert!(screen(&app).contains(":restart"));
    }
}
