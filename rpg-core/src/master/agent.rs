//! Game master backed by the Gemini API.

use super::prompts;
use super::{GameMaster, MasterConfig, MasterError};
use crate::character::{CharacterRequest, PlayerCharacter};
use crate::log::GameLogEntry;
use crate::turn::{extract_json, parse_turn_update, TurnUpdate};
use async_trait::async_trait;
use gemini::{FinishReason, Gemini, Modality, Request, Response};
use tracing::{debug, info, warn};

/// The AI game master.
pub struct GeminiMaster {
    client: Gemini,
    config: MasterConfig,
}

impl GeminiMaster {
    /// Create a game master with an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Gemini::new(api_key),
            config: MasterConfig::default(),
        }
    }

    /// Create a game master from `GEMINI_API_KEY` (or `API_KEY`).
    pub fn from_env() -> Result<Self, MasterError> {
        Ok(Self::from_client(Gemini::from_env()?))
    }

    pub fn from_client(client: Gemini) -> Self {
        Self {
            client,
            config: MasterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: MasterConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &MasterConfig {
        &self.config
    }

    fn text_request(&self, prompt: String) -> Request {
        let mut request = Request::prompt(prompt);
        if let Some(ref model) = self.config.model {
            request = request.with_model(model);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }
        request
    }

    /// Text of a JSON-mode reply, or `Rejected` when the model produced nothing usable.
    fn reply_text(response: &Response) -> Result<String, MasterError> {
        let text = response.text();
        if text.trim().is_empty() {
            let reason = match response.finish_reason {
                FinishReason::Safety => "reply blocked by safety filters",
                FinishReason::MaxTokens => "reply cut off before any content",
                _ => "empty reply",
            };
            return Err(MasterError::Rejected(reason.to_string()));
        }
        Ok(text)
    }

    async fn try_opening_scene(&self, party: &[PlayerCharacter]) -> Result<String, MasterError> {
        let request = self.text_request(prompts::opening_prompt(party, &self.config.language));
        let response = self.client.generate(request).await?;
        Ok(Self::reply_text(&response)?.trim().to_string())
    }

    async fn try_portrait(&self, character: &PlayerCharacter) -> Result<Option<String>, MasterError> {
        let request = Request::prompt(prompts::portrait_prompt(character))
            .with_model(&self.config.image_model)
            .with_modalities(vec![Modality::Image]);
        let response = self.client.generate(request).await?;

        Ok(response
            .inline_data()
            .map(|(mime_type, data)| format!("data:{mime_type};base64,{data}")))
    }
}

#[async_trait]
impl GameMaster for GeminiMaster {
    async fn generate_character(
        &self,
        request: &CharacterRequest,
    ) -> Result<PlayerCharacter, MasterError> {
        let api_request = self
            .text_request(prompts::character_prompt(request, &self.config.language))
            .with_json_schema(prompts::character_schema());

        let response = self.client.generate(api_request).await?;
        let text = Self::reply_text(&response)?;
        let mut character: PlayerCharacter = serde_json::from_str(extract_json(&text))?;
        character.image_url = None;

        info!(
            name = %character.name,
            race = %character.race,
            class = %character.class,
            "Generated character"
        );
        Ok(character)
    }

    async fn generate_portrait(&self, character: &PlayerCharacter) -> Option<String> {
        if !self.config.portraits {
            return None;
        }

        match self.try_portrait(character).await {
            Ok(Some(url)) => {
                debug!(name = %character.name, bytes = url.len(), "Generated portrait");
                Some(url)
            }
            Ok(None) => {
                warn!(name = %character.name, "No image data in portrait response");
                None
            }
            Err(e) => {
                warn!(name = %character.name, error = %e, "Portrait generation failed");
                None
            }
        }
    }

    async fn opening_scene(&self, party: &[PlayerCharacter]) -> String {
        match self.try_opening_scene(party).await {
            Ok(scene) => scene,
            Err(e) => {
                warn!(error = %e, "Opening scene failed, using fallback");
                prompts::FALLBACK_OPENING.trim().to_string()
            }
        }
    }

    async fn next_turn(
        &self,
        party: &[PlayerCharacter],
        log: &[GameLogEntry],
        action: &str,
    ) -> Result<TurnUpdate, MasterError> {
        let prompt = prompts::turn_prompt(party, log, action, self.config.history_window);
        let request = self
            .text_request(prompt)
            .with_system(prompts::system_instruction(party.len(), &self.config.language))
            .with_json_schema(prompts::turn_schema(&self.config.language));

        let response = self.client.generate(request).await?;
        debug!(
            prompt_tokens = response.usage.prompt_tokens,
            output_tokens = response.usage.output_tokens,
            "Turn response received"
        );

        let text = Self::reply_text(&response)?;
        Ok(parse_turn_update(&text)?)
    }
}
