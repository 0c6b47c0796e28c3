//! GameSession - the primary public API for a party adventure.
//!
//! A session owns the phase, the party and the adventure log, and drives a
//! [`GameMaster`] through character creation, party assembly and play.

use crate::character::{CharacterRequest, PlayerCharacter, MAX_COMPANIONS};
use crate::log::GameLogEntry;
use crate::master::{GameMaster, GeminiMaster, MasterConfig, MasterError};
use crate::persist::SavedGame;
use crate::phase::GamePhase;
use crate::turn::{reconcile_party, DEFAULT_GAME_OVER_MESSAGE};
use thiserror::Error;
use tracing::{info, warn};

/// Errors from GameSession operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Not allowed during {actual} (expected {expected})")]
    WrongPhase {
        expected: GamePhase,
        actual: GamePhase,
    },

    #[error("Character name must not be empty")]
    EmptyName,

    #[error("At most 3 companions may join, got {0}")]
    TooManyCompanions(usize),

    #[error("Game master error: {0}")]
    Master(#[from] MasterError),
}

/// What came of a player action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing happened: not playing, no party, or a blank action.
    Ignored,

    /// The story moved on.
    Advanced,

    /// The story moved on and the adventure is over.
    GameOver { reason: String },

    /// The exchange failed; `message` was appended to the log.
    Failed { message: String },
}

/// A party adventure.
pub struct GameSession {
    master: Box<dyn GameMaster>,
    phase: GamePhase,
    party: Vec<PlayerCharacter>,
    log: Vec<GameLogEntry>,
    game_over_reason: Option<String>,
}

impl GameSession {
    /// Create a session at character creation.
    pub fn new(master: impl GameMaster + 'static) -> Self {
        Self {
            master: Box::new(master),
            phase: GamePhase::CharacterCreation,
            party: Vec::new(),
            log: Vec::new(),
            game_over_reason: None,
        }
    }

    /// Create a session narrated by Gemini, reading the API key from the environment.
    pub fn from_env(config: MasterConfig) -> Result<Self, SessionError> {
        let master = GeminiMaster::from_env()?.with_config(config);
        Ok(Self::new(master))
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn party(&self) -> &[PlayerCharacter] {
        &self.party
    }

    /// The party leader, if a character has been created.
    pub fn leader(&self) -> Option<&PlayerCharacter> {
        self.party.first()
    }

    pub fn log(&self) -> &[GameLogEntry] {
        &self.log
    }

    pub fn game_over_reason(&self) -> Option<&str> {
        self.game_over_reason.as_deref()
    }

    fn require_phase(&self, expected: GamePhase) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::WrongPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    /// Generate a character with its portrait.
    async fn recruit(&self, request: &CharacterRequest) -> Result<PlayerCharacter, SessionError> {
        let mut character = self.master.generate_character(request).await?;
        character.image_url = self.master.generate_portrait(&character).await;
        Ok(character)
    }

    /// Create the party leader and move on to party assembly.
    pub async fn create_main_character(
        &mut self,
        request: CharacterRequest,
    ) -> Result<&PlayerCharacter, SessionError> {
        self.require_phase(GamePhase::CharacterCreation)?;
        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(SessionError::EmptyName)?
            .to_string();

        let request = CharacterRequest {
            name: Some(name),
            ..request
        };
        let leader = self.recruit(&request).await?;

        info!(name = %leader.name, portrait = leader.has_portrait(), "Party leader created");
        self.party = vec![leader];
        self.phase = GamePhase::PartyAssembly;
        Ok(&self.party[0])
    }

    /// Recruit companions, open the adventure and start playing.
    ///
    /// An empty `companions` list starts a solo adventure.
    pub async fn finalize_party(
        &mut self,
        companions: Vec<CharacterRequest>,
    ) -> Result<(), SessionError> {
        self.require_phase(GamePhase::PartyAssembly)?;
        if companions.len() > MAX_COMPANIONS {
            return Err(SessionError::TooManyCompanions(companions.len()));
        }

        let mut party = self.party.clone();
        for companion in &companions {
            let request = CharacterRequest {
                name: None,
                ..companion.clone()
            };
            party.push(self.recruit(&request).await?);
        }

        let opening = self.master.opening_scene(&party).await;
        let names = party
            .iter()
            .map(|member| member.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        self.log = vec![
            GameLogEntry::system(format!("Welcome to the adventure, {names}!")),
            GameLogEntry::dm(opening),
        ];
        self.party = party;
        self.phase = GamePhase::Playing;
        info!(party = %names, "Adventure started");
        Ok(())
    }

    /// Resolve one action by the party leader.
    pub async fn player_action(&mut self, action: &str) -> TurnOutcome {
        let action = action.trim();
        if self.phase != GamePhase::Playing || action.is_empty() {
            return TurnOutcome::Ignored;
        }
        let Some(leader) = self.party.first() else {
            return TurnOutcome::Ignored;
        };

        self.log.push(GameLogEntry::player(leader.name.clone(), action));

        let update = match self.master.next_turn(&self.party, &self.log, action).await {
            Ok(update) => update,
            Err(e) => {
                warn!(error = %e, "Turn failed");
                let message = format!("Error: {e}");
                self.log.push(GameLogEntry::system(message.clone()));
                return TurnOutcome::Failed { message };
            }
        };

        let is_game_over = update.is_game_over;
        let reason = update.game_over_message();
        self.party = reconcile_party(&self.party, update.updated_party);
        self.log.push(GameLogEntry::dm(update.narrative));

        if !is_game_over {
            return TurnOutcome::Advanced;
        }

        info!(reason = %reason, "Game over");
        self.phase = GamePhase::GameOver;
        self.game_over_reason = Some(reason.clone());
        self.log.push(GameLogEntry::system(reason.clone()));
        TurnOutcome::GameOver { reason }
    }

    /// The state worth saving, or `None` before the adventure has started.
    pub fn snapshot(&self) -> Option<SavedGame> {
        if !self.phase.is_saveable() {
            return None;
        }
        Some(SavedGame {
            game_state: self.phase,
            party: self.party.clone(),
            game_log: self.log.clone(),
        })
    }

    /// Resume from a save.
    pub fn restore(&mut self, saved: SavedGame) {
        self.game_over_reason = (saved.game_state == GamePhase::GameOver).then(|| {
            saved
                .game_log
                .iter()
                .rev()
                .find(|entry| entry.is_system())
                .map(|entry| entry.message.clone())
                .unwrap_or_else(|| DEFAULT_GAME_OVER_MESSAGE.to_string())
        });
        self.phase = saved.game_state;
        self.party = saved.party;
        self.log = saved.game_log;
        info!(phase = %self.phase, members = self.party.len(), "Session restored");
    }

    /// Throw everything away and go back to character creation.
    pub fn restart(&mut self) {
        self.phase = GamePhase::CharacterCreation;
        self.party.clear();
        self.log.clear();
        self.game_over_reason = None;
        info!("Session restarted");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{CharacterClass, Gender, Race};
    use crate::testing::{sample_character, MockMaster, MockTurn};

    fn leader_request() -> CharacterRequest {
        CharacterRequest::named("Noa", Race::Human, CharacterClass::Warrior, Gender::Female)
    }

    async fn playing_session(master: MockMaster) -> GameSession {
        let mut session = GameSession::new(master);
        session.create_main_character(leader_request()).await.unwrap();
        session.finalize_party(vec![]).await.unwrap();
        session
    }

    #[tokio::test]
    async fn test_create_requires_name() {
        let mut session = GameSession::new(MockMaster::new());
        let request = CharacterRequest::named("  ", Race::Elf, CharacterClass::Wizard, Gender::Male);

        assert!(matches!(
            session.create_main_character(request).await,
            Err(SessionError::EmptyName)
        ));
        assert_eq!(session.phase(), GamePhase::CharacterCreation);
        assert!(session.party().is_empty());
    }

    #[tokio::test]
    async fn test_create_main_character() {
        let mut session = GameSession::new(MockMaster::new());
        let leader = session.create_main_character(leader_request()).await.unwrap();

        assert_eq!(leader.name, "Noa");
        assert!(leader.has_portrait());
        assert_eq!(session.phase(), GamePhase::PartyAssembly);
        assert_eq!(session.party().len(), 1);
    }

    #[tokio::test]
    async fn test_create_failure_leaves_state() {
        let master = MockMaster::new().failing_characters();
        let mut session = GameSession::new(master);

        assert!(session.create_main_character(leader_request()).await.is_err());
        assert_eq!(session.phase(), GamePhase::CharacterCreation);
        assert!(session.party().is_empty());
    }

    #[tokio::test]
    async fn test_wrong_phase() {
        let mut session = GameSession::new(MockMaster::new());
        let err = session.finalize_party(vec![]).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::WrongPhase {
                expected: GamePhase::PartyAssembly,
                actual: GamePhase::CharacterCreation
            }
        ));
    }

    #[tokio::test]
    async fn test_too_many_companions() {
        let mut session = GameSession::new(MockMaster::new());
        session.create_main_character(leader_request()).await.unwrap();

        let companions = vec![CharacterRequest::default(); 4];
        assert!(matches!(
            session.finalize_party(companions).await,
            Err(SessionError::TooManyCompanions(4))
        ));
        assert_eq!(session.phase(), GamePhase::PartyAssembly);
        assert_eq!(session.party().len(), 1);
    }

    #[tokio::test]
    async fn test_finalize_party_opens_adventure() {
        let mut session = GameSession::new(MockMaster::new().with_opening("A misty valley."));
        session.create_main_character(leader_request()).await.unwrap();

        let companions = vec![
            CharacterRequest::companion(Race::Elf, CharacterClass::Wizard, Gender::Male),
            CharacterRequest::companion(Race::Dwarf, CharacterClass::Cleric, Gender::Female),
        ];
        session.finalize_party(companions).await.unwrap();

        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.party().len(), 3);
        assert_eq!(session.party()[1].race, "Elf");
        assert_eq!(session.log().len(), 2);
        assert_eq!(
            session.log()[0],
            GameLogEntry::system("Welcome to the adventure, Noa, Elf Wizard 1, Dwarf Cleric 2!")
        );
        assert_eq!(session.log()[1], GameLogEntry::dm("A misty valley."));
    }

    #[tokio::test]
    async fn test_action_ignored_outside_play() {
        let mut session = GameSession::new(MockMaster::new());
        assert_eq!(session.player_action("hello").await, TurnOutcome::Ignored);

        let mut session = playing_session(MockMaster::new()).await;
        assert_eq!(session.player_action("   ").await, TurnOutcome::Ignored);
        assert_eq!(session.log().len(), 2);
    }

    #[tokio::test]
    async fn test_action_advances() {
        let master = MockMaster::new().with_turn(MockTurn::narrate("The door opens.").with_hp("Noa", 9));
        let mut session = playing_session(master).await;
        let portrait = session.party()[0].image_url.clone();

        assert_eq!(session.player_action("I open the door").await, TurnOutcome::Advanced);

        assert_eq!(session.party()[0].hp, 9);
        assert_eq!(session.party()[0].image_url, portrait);
        let log = session.log();
        assert_eq!(log[2], GameLogEntry::player("Noa", "I open the door"));
        assert_eq!(log[3], GameLogEntry::dm("The door opens."));
    }

    #[tokio::test]
    async fn test_failed_action() {
        let master = MockMaster::new().with_turn(MockTurn::fail("connection reset"));
        let mut session = playing_session(master).await;
        let party_before = session.party().to_vec();

        let outcome = session.player_action("I open the door").await;

        assert!(matches!(outcome, TurnOutcome::Failed { .. }));
        assert_eq!(session.party(), party_before.as_slice());
        assert_eq!(session.phase(), GamePhase::Playing);
        assert_eq!(session.log().len(), 4);
        assert!(session.log()[3].is_system());
        assert!(session.log()[3].message.starts_with("Error: "));
    }

    #[tokio::test]
    async fn test_game_over() {
        let master = MockMaster::new().with_turn(
            MockTurn::narrate("The bridge collapses.").game_over(Some("You fell into the abyss.")),
        );
        let mut session = playing_session(master).await;

        let outcome = session.player_action("Cross the bridge").await;

        assert_eq!(
            outcome,
            TurnOutcome::GameOver {
                reason: "You fell into the abyss.".to_string()
            }
        );
        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(session.game_over_reason(), Some("You fell into the abyss."));
        assert_eq!(
            session.log().last(),
            Some(&GameLogEntry::system("You fell into the abyss."))
        );
        assert_eq!(session.player_action("Get up").await, TurnOutcome::Ignored);
    }

    #[tokio::test]
    async fn test_snapshot_only_when_saveable() {
        let mut session = GameSession::new(MockMaster::new());
        assert!(session.snapshot().is_none());

        session.create_main_character(leader_request()).await.unwrap();
        assert!(session.snapshot().is_none());

        session.finalize_party(vec![]).await.unwrap();
        let saved = session.snapshot().unwrap();
        assert_eq!(saved.game_state, GamePhase::Playing);
        assert_eq!(saved.party, session.party());
        assert_eq!(saved.game_log, session.log());
    }

    #[test]
    fn test_restore_game_over_recovers_reason() {
        let mut session = GameSession::new(MockMaster::new());
        session.restore(SavedGame {
            game_state: GamePhase::GameOver,
            party: vec![sample_character("Noa")],
            game_log: vec![
                GameLogEntry::system("Welcome to the adventure, Noa!"),
                GameLogEntry::dm("The end."),
                GameLogEntry::system("The dragon ate you."),
                GameLogEntry::dm("Silence."),
            ],
        });

        assert_eq!(session.phase(), GamePhase::GameOver);
        assert_eq!(session.game_over_reason(), Some("The dragon ate you."));

        session.restore(SavedGame {
            game_state: GamePhase::GameOver,
            party: vec![],
            game_log: vec![],
        });
        assert_eq!(session.game_over_reason(), Some(DEFAULT_GAME_OVER_MESSAGE));
    }

    #[tokio::test]
    async fn test_restart() {
        let mut session = playing_session(MockMaster::new()).await;
        session.restart();

        assert_eq!(session.phase(), GamePhase::CharacterCreation);
        assert!(session.party().is_empty());
        assert!(session.log().is_empty());
        assert_eq!(session.game_over_reason(), None);
    }
}
