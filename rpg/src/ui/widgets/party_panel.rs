//! Party panel widget for sidebar display

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Widget, Wrap},
};

use rpg_core::PlayerCharacter;

use crate::ui::theme::GameTheme;

/// Rows a member card needs before its inventory.
const CARD_HEADER_ROWS: u16 = 5;

/// One card per party member, leader first.
pub struct PartyPanelWidget<'a> {
    party: &'a [PlayerCharacter],
    theme: &'a GameTheme,
}

impl<'a> PartyPanelWidget<'a> {
    pub fn new(party: &'a [PlayerCharacter], theme: &'a GameTheme) -> Self {
        Self { party, theme }
    }
}

impl Widget for PartyPanelWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(" Party ")
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(false));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.party.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                "No adventurers yet",
                self.theme.system_style(),
            )))
            .render(inner, buf);
            return;
        }

        let constraints: Vec<Constraint> = self
            .party
            .iter()
            .map(|member| Constraint::Min(CARD_HEADER_ROWS + card_inventory_rows(member)))
            .collect();
        let cards = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(inner);

        for (index, (member, card)) in self.party.iter().zip(cards.iter()).enumerate() {
            MemberCard {
                member,
                leader: index == 0,
                theme: self.theme,
            }
            .render(*card, buf);
        }
    }
}

fn card_inventory_rows(member: &PlayerCharacter) -> u16 {
    (member.inventory.len() as u16).clamp(1, 4)
}

struct MemberCard<'a> {
    member: &'a PlayerCharacter,
    leader: bool,
    theme: &'a GameTheme,
}

impl Widget for MemberCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let member = self.member;
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Name
                Constraint::Length(1), // Gender race class
                Constraint::Length(1), // HP bar
                Constraint::Length(1), // Stats
                Constraint::Length(1), // Inventory heading
                Constraint::Min(0),    // Items
            ])
            .split(area);

        let mut name_spans = vec![Span::styled(
            member.name.clone(),
            self.theme.title_style(self.leader),
        )];
        if self.leader {
            name_spans.push(Span::styled(" ★", self.theme.selected_style()));
        }
        if member.has_portrait() {
            name_spans.push(Span::styled(" [portrait]", self.theme.system_style()));
        }
        if member.is_down() {
            name_spans.push(Span::styled(" DOWN", self.theme.game_over_style()));
        }
        Paragraph::new(Line::from(name_spans)).render(chunks[0], buf);

        Paragraph::new(Line::from(Span::styled(
            member.summary_line(),
            Style::default().add_modifier(Modifier::DIM),
        )))
        .render(chunks[1], buf);

        let ratio = member.hp_ratio();
        Gauge::default()
            .gauge_style(Style::default().fg(self.theme.hp_color(ratio)))
            .ratio(ratio as f64)
            .label(format!("HP: {}/{}", member.hp, member.max_hp))
            .render(chunks[2], buf);

        Paragraph::new(Line::from(vec![
            Span::raw("STR "),
            Span::styled(member.strength.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  DEX "),
            Span::styled(member.dexterity.to_string(), Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  INT "),
            Span::styled(member.intelligence.to_string(), Style::default().add_modifier(Modifier::BOLD)),
        ]))
        .render(chunks[3], buf);

        Paragraph::new(Line::from(Span::styled(
            "Inventory:",
            Style::default().add_modifier(Modifier::UNDERLINED),
        )))
        .render(chunks[4], buf);

        let items: Vec<Line> = if member.inventory.is_empty() {
            vec![Line::from(Span::styled("  (empty)", self.theme.system_style()))]
        } else {
            member
                .inventory
                .iter()
                .map(|item| Line::from(format!("  • {item}")))
                .collect()
        };
        Paragraph::new(items)
            .wrap(Wrap { trim: true })
            .render(chunks[5], buf);
    }
}
