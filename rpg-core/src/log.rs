//! The adventure log shown to the player and replayed to the game master.

use serde::{Deserialize, Serialize};

/// Sender used for notices from the game itself.
pub const SYSTEM: &str = "System";

/// Sender used for the game master's narration.
pub const DM: &str = "DM";

/// How many trailing entries are replayed to the model each turn.
pub const HISTORY_WINDOW: usize = 6;

/// One line of the adventure log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLogEntry {
    /// `System`, `DM`, or the name of the acting character.
    pub sender: String,
    pub message: String,
}

impl GameLogEntry {
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
        }
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(SYSTEM, message)
    }

    pub fn dm(message: impl Into<String>) -> Self {
        Self::new(DM, message)
    }

    /// An action spoken by a party member.
    pub fn player(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(name, message)
    }

    pub fn is_system(&self) -> bool {
        self.sender == SYSTEM
    }

    pub fn is_dm(&self) -> bool {
        self.sender == DM
    }
}

/// Render the last `window` entries as `sender: message` lines.
pub fn recent_history(log: &[GameLogEntry], window: usize) -> String {
    let start = log.len().saturating_sub(window);
    log[start..]
        .iter()
        .map(|entry| format!("{}: {}", entry.sender, entry.message))
        .collect::<Vec<_>>()
        .join("\n")
}
