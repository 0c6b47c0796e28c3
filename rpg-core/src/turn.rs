//! The per-turn state update returned by the game master, and how it is
//! folded back into the local party.

use crate::character::PlayerCharacter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shown when the model ends the game without saying why.
pub const DEFAULT_GAME_OVER_MESSAGE: &str = "Your journey has come to an end.";

/// Result of one turn exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnUpdate {
    pub narrative: String,
    /// Complete replacement for the party, one entry per member.
    pub updated_party: Vec<PlayerCharacter>,
    pub is_game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_over_reason: Option<String>,
}

impl TurnUpdate {
    /// The reason to show when the game ends.
    pub fn game_over_message(&self) -> String {
        match self.game_over_reason.as_deref().map(str::trim) {
            Some(reason) if !reason.is_empty() => reason.to_string(),
            _ => DEFAULT_GAME_OVER_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum TurnError {
    #[error("Malformed turn update: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Turn update contained an empty party")]
    EmptyParty,
}

/// Parse the model's text into a [`TurnUpdate`].
pub fn parse_turn_update(text: &str) -> Result<TurnUpdate, TurnError> {
    let update: TurnUpdate = serde_json::from_str(extract_json(text))?;
    if update.updated_party.is_empty() {
        return Err(TurnError::EmptyParty);
    }
    Ok(update)
}

/// Apply the model's party to the local one.
///
/// Every field comes from `updated` verbatim except the portrait, which is
/// looked up in `previous` by member name. Members with no match get none.
pub fn reconcile_party(
    previous: &[PlayerCharacter],
    updated: Vec<PlayerCharacter>,
) -> Vec<PlayerCharacter> {
    updated
        .into_iter()
        .map(|mut member| {
            member.image_url = previous
                .iter()
                .find(|old| old.name == member.name)
                .and_then(|old| old.image_url.clone());
            member
        })
        .collect()
}

/// Strip a Markdown code fence the model may wrap around JSON.
pub(crate) fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```") {
        let after_fence = &text[start + 3..];
        // Skip an info string such as `json`.
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    text
}
