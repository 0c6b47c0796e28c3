//! The game master: the model that invents characters and narrates turns.
//!
//! [`GameMaster`] is the seam between the session and the remote model.
//! [`GeminiMaster`] talks to Gemini; tests use `testing::MockMaster`.

mod agent;
pub mod prompts;

pub use agent::GeminiMaster;

use crate::character::{CharacterRequest, PlayerCharacter};
use crate::log::{GameLogEntry, HISTORY_WINDOW};
use crate::turn::{TurnError, TurnUpdate};
use async_trait::async_trait;
use thiserror::Error;

/// Errors from the game master.
#[derive(Debug, Error)]
pub enum MasterError {
    #[error("Gemini API error: {0}")]
    Api(#[from] gemini::Error),

    #[error("Could not understand the game master's reply: {0}")]
    Parse(#[from] TurnError),

    #[error("The game master refused: {0}")]
    Rejected(String),
}

impl From<serde_json::Error> for MasterError {
    fn from(err: serde_json::Error) -> Self {
        MasterError::Parse(TurnError::Json(err))
    }
}

/// Anything that can run the game.
#[async_trait]
pub trait GameMaster: Send + Sync {
    /// Generate a full character from the player's choices.
    async fn generate_character(
        &self,
        request: &CharacterRequest,
    ) -> Result<PlayerCharacter, MasterError>;

    /// A `data:` URL portrait, or `None` if none could be made.
    async fn generate_portrait(&self, character: &PlayerCharacter) -> Option<String>;

    /// Narration that opens the adventure. Never fails.
    async fn opening_scene(&self, party: &[PlayerCharacter]) -> String;

    /// Resolve one player action.
    async fn next_turn(
        &self,
        party: &[PlayerCharacter],
        log: &[GameLogEntry],
        action: &str,
    ) -> Result<TurnUpdate, MasterError>;
}

/// Configuration for [`GeminiMaster`].
#[derive(Debug, Clone)]
pub struct MasterConfig {
    /// Text model (defaults to the client's model).
    pub model: Option<String>,

    /// Model used for portraits.
    pub image_model: String,

    /// Temperature for generation.
    pub temperature: Option<f32>,

    /// Language the story is told in.
    pub language: String,

    /// Trailing log entries replayed each turn.
    pub history_window: usize,

    /// Skip portrait generation entirely.
    pub portraits: bool,
}

impl Default for MasterConfig {
    fn default() -> Self {
        Self {
            model: None,
            image_model: gemini::DEFAULT_IMAGE_MODEL.to_string(),
            temperature: None,
            language: "Hebrew".to_string(),
            history_window: HISTORY_WINDOW,
            portraits: true,
        }
    }
}

impl MasterConfig {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    pub fn with_portraits(mut self, enabled: bool) -> Self {
        self.portraits = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = MasterConfig::default();
        assert_eq!(config.model, None);
        assert_eq!(config.image_model, "gemini-2.5-flash-image");
        assert_eq!(config.language, "Hebrew");
        assert_eq!(config.history_window, 6);
        assert!(config.portraits);
    }

    #[test]
    fn test_config_builder() {
        let config = MasterConfig::default()
            .with_model("gemini-2.5-pro")
            .with_language("English")
            .with_temperature(0.9)
            .with_history_window(10)
            .with_portraits(false);

        assert_eq!(config.model.as_deref(), Some("gemini-2.5-pro"));
        assert_eq!(config.language, "English");
        assert_eq!(config.temperature, Some(0.9));
        assert_eq!(config.history_window, 10);
        assert!(!config.portraits);
    }

    #[test]
    fn test_error_messages() {
        let err = MasterError::from(TurnError::EmptyParty);
        assert!(err.to_string().contains("empty party"));

        let err = MasterError::from(gemini::Error::NoApiKey);
        assert!(matches!(err, MasterError::Api(_)));
    }
}
