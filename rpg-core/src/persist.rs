//! Per-user save games.
//!
//! Each user has at most one save: a JSON blob holding the phase, the party
//! and the adventure log. A blob that cannot be read back is treated as no
//! save at all and removed.

use crate::character::PlayerCharacter;
use crate::log::GameLogEntry;
use crate::phase::GamePhase;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Username must not be blank")]
    BlankUsername,
}

/// Everything needed to resume an adventure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedGame {
    pub game_state: GamePhase,
    pub party: Vec<PlayerCharacter>,
    pub game_log: Vec<GameLogEntry>,
}

impl SavedGame {
    /// Whether this could have come from a running adventure: a saveable
    /// phase and at least a leader.
    pub fn is_resumable(&self) -> bool {
        self.game_state.is_saveable() && !self.party.is_empty()
    }
}

/// A directory of save files, one per username.
#[derive(Debug, Clone)]
pub struct SaveStore {
    dir: PathBuf,
}

impl SaveStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the save file for `username`.
    pub fn path_for(&self, username: &str) -> Result<PathBuf, PersistError> {
        Ok(self.dir.join(save_file_name(username)?))
    }

    /// Write the save for `username`, replacing any previous one.
    pub async fn save(&self, username: &str, game: &SavedGame) -> Result<(), PersistError> {
        let path = self.path_for(username)?;
        let content = serde_json::to_string_pretty(game)?;

        fs::create_dir_all(&self.dir).await?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, content).await?;
        fs::rename(&tmp, &path).await?;

        info!(
            user = username,
            phase = %game.game_state,
            entries = game.game_log.len(),
            "Saved game"
        );
        Ok(())
    }

    /// Load the save for `username`.
    ///
    /// Returns `None` when there is no save or when it cannot be read or
    /// parsed; in the latter case the broken file is deleted.
    pub async fn load(&self, username: &str) -> Option<SavedGame> {
        let path = self.path_for(username).ok()?;

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(user = username, "No saved game");
                return None;
            }
            Err(e) => {
                warn!(user = username, error = %e, "Unreadable save, discarding");
                discard(&path).await;
                return None;
            }
        };

        match serde_json::from_str::<SavedGame>(&content) {
            Ok(game) if game.is_resumable() => {
                info!(user = username, phase = %game.game_state, "Loaded game");
                Some(game)
            }
            Ok(game) => {
                warn!(
                    user = username,
                    phase = %game.game_state,
                    members = game.party.len(),
                    "Save has no adventure to resume, discarding"
                );
                discard(&path).await;
                None
            }
            Err(e) => {
                warn!(user = username, error = %e, "Corrupt save, discarding");
                discard(&path).await;
                None
            }
        }
    }

    pub async fn has_save(&self, username: &str) -> bool {
        match self.path_for(username) {
            Ok(path) => fs::try_exists(path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    /// Delete the save for `username`. A missing save is not an error.
    pub async fn clear(&self, username: &str) -> Result<(), PersistError> {
        let path = self.path_for(username)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            warn!(path = %path.display(), error = %e, "Could not remove broken save");
        }
    }
}

/// File name for a username.
///
/// Alphanumeric characters without an uppercase form are kept. Every other
/// byte, `_` and capital letters included, becomes `_` followed by two
/// lowercase hex digits, so two usernames never map to one file even on a
/// case-insensitive filesystem.
pub fn save_file_name(username: &str) -> Result<String, PersistError> {
    if username.trim().is_empty() {
        return Err(PersistError::BlankUsername);
    }

    let mut name = String::with_capacity(username.len() + 5);
    let mut buf = [0u8; 4];
    for c in username.chars() {
        if c.is_alphanumeric() && c.to_lowercase().eq([c]) {
            name.push(c);
        } else {
            for byte in c.encode_utf8(&mut buf).bytes() {
                let _ = write!(name, "_{byte:02x}");
            }
        }
    }
    name.push_str(".json");
    Ok(name)
}
