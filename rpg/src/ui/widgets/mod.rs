//! TUI widgets for the RPG

pub mod input;
pub mod narrative;
pub mod party_panel;
pub mod status_bar;

pub use input::InputWidget;
pub use narrative::NarrativeWidget;
pub use party_panel::PartyPanelWidget;
pub use status_bar::{HotkeyBarWidget, StatusBarWidget};
