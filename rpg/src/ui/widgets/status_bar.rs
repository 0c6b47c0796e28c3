//! Status bar widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use rpg_core::{GamePhase, PlayerCharacter};

use crate::app::InputMode;
use crate::ui::theme::GameTheme;

/// Status bar: mode, phase, leader HP and the latest message
pub struct StatusBarWidget<'a> {
    phase: GamePhase,
    input_mode: InputMode,
    leader: Option<&'a PlayerCharacter>,
    theme: &'a GameTheme,
    message: Option<&'a str>,
    busy: bool,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(phase: GamePhase, input_mode: InputMode, theme: &'a GameTheme) -> Self {
        Self {
            phase,
            input_mode,
            leader: None,
            theme,
            message: None,
            busy: false,
        }
    }

    pub fn leader(mut self, leader: Option<&'a PlayerCharacter>) -> Self {
        self.leader = leader;
        self
    }

    pub fn message(mut self, message: Option<&'a str>) -> Self {
        self.message = message;
        self
    }

    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }
}

impl Widget for StatusBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let mut spans = Vec::new();

        if matches!(self.phase, GamePhase::Playing | GamePhase::GameOver) {
            let (text, color) = match self.input_mode {
                InputMode::Normal => ("NORMAL", Color::Blue),
                InputMode::Insert => ("INSERT", Color::Green),
                InputMode::Command => ("COMMAND", Color::Yellow),
            };
            spans.push(Span::styled(
                format!("-- {text} --"),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ));
            spans.push(Span::raw(" | "));
        }

        let phase_style = match self.phase {
            GamePhase::GameOver => self.theme.game_over_style(),
            _ => self.theme.system_style(),
        };
        spans.push(Span::styled(self.phase.name().to_uppercase(), phase_style));

        if let Some(leader) = self.leader {
            spans.push(Span::raw(" | "));
            spans.push(Span::styled(
                format!("{} HP: {}/{}", leader.name, leader.hp, leader.max_hp),
                Style::default().fg(self.theme.hp_color(leader.hp_ratio())),
            ));
        }

        if let Some(msg) = self.message {
            spans.push(Span::raw(" | "));
            let style = if self.busy {
                self.theme.selected_style()
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            spans.push(Span::styled(msg, style));
        }

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}

/// Hotkey bar widget
pub struct HotkeyBarWidget<'a> {
    phase: GamePhase,
    input_mode: InputMode,
    has_save: bool,
    theme: &'a GameTheme,
}

impl<'a> HotkeyBarWidget<'a> {
    pub fn new(phase: GamePhase, input_mode: InputMode, theme: &'a GameTheme) -> Self {
        Self {
            phase,
            input_mode,
            has_save: false,
            theme,
        }
    }

    pub fn has_save(mut self, has_save: bool) -> Self {
        self.has_save = has_save;
        self
    }

    fn hotkeys(&self) -> Vec<(&'static str, bool)> {
        match self.phase {
            GamePhase::CharacterCreation => {
                let mut keys = vec![
                    ("Tab/↑↓:field", true),
                    ("←→:choose", true),
                    ("Enter:create", true),
                ];
                if self.has_save {
                    keys.push(("F2:load save", true));
                }
                keys.push(("Esc:quit", false));
                keys
            }
            GamePhase::PartyAssembly => vec![
                ("a:add", true),
                ("d:remove", true),
                ("j/k:select", true),
                ("Tab:field", true),
                ("h/l:choose", true),
                ("Enter:begin", true),
                ("q:quit", false),
            ],
            GamePhase::Playing | GamePhase::GameOver => match self.input_mode {
                InputMode::Normal if self.phase == GamePhase::GameOver => vec![
                    (":restart", true),
                    (":load", true),
                    ("j/k:scroll", true),
                    ("?:help", false),
                ],
                InputMode::Normal => vec![
                    ("i:insert", true),
                    ("::command", true),
                    ("j/k:scroll", true),
                    (":w save", true),
                    ("?:help", false),
                ],
                InputMode::Insert => vec![
                    ("Esc:normal", true),
                    ("Enter:send", true),
                    ("↑↓:history", false),
                ],
                InputMode::Command => vec![
                    ("Esc:cancel", true),
                    ("Enter:execute", true),
                    (":w :load :restart :q", false),
                ],
            },
        }
    }
}

impl Widget for HotkeyBarWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let spans: Vec<Span> = self
            .hotkeys()
            .into_iter()
            .flat_map(|(text, primary)| {
                let style = if primary {
                    Style::default().fg(self.theme.foreground)
                } else {
                    Style::default().add_modifier(Modifier::DIM)
                };
                [Span::styled(text, style), Span::raw("  ")]
            })
            .collect();

        Paragraph::new(Line::from(spans)).render(area, buf);
    }
}
