use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the player is in the flow from character creation to the end of the adventure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    #[default]
    CharacterCreation,
    PartyAssembly,
    Playing,
    GameOver,
}

impl GamePhase {
    /// Only sessions that have started an adventure are worth saving.
    pub fn is_saveable(&self) -> bool {
        matches!(self, GamePhase::Playing | GamePhase::GameOver)
    }

    pub fn name(&self) -> &'static str {
        match self {
            GamePhase::CharacterCreation => "Character Creation",
            GamePhase::PartyAssembly => "Party Assembly",
            GamePhase::Playing => "Playing",
            GamePhase::GameOver => "Game Over",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&GamePhase::CharacterCreation).unwrap(),
            "\"CHARACTER_CREATION\""
        );
        assert_eq!(
            serde_json::to_string(&GamePhase::GameOver).unwrap(),
            "\"GAME_OVER\""
        );
        let phase: GamePhase = serde_json::from_str("\"PARTY_ASSEMBLY\"").unwrap();
        assert_eq!(phase, GamePhase::PartyAssembly);
    }

    #[test]
    fn test_saveable_phases() {
        assert!(!GamePhase::CharacterCreation.is_saveable());
        assert!(!GamePhase::PartyAssembly.is_saveable());
        assert!(GamePhase::Playing.is_saveable());
        assert!(GamePhase::GameOver.is_saveable());
    }
}
