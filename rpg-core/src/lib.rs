//! Party RPG engine narrated by a Gemini game master.
//!
//! This crate provides:
//! - Character generation with portraits
//! - Turn exchange with the game master and party reconciliation
//! - Per-user save games
//!
//! # Quick Start
//!
//! ```ignore
//! use rpg_core::{CharacterClass, CharacterRequest, GameSession, Gender, MasterConfig, Race};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut session = GameSession::from_env(MasterConfig::default().with_language("English"))?;
//!
//!     let leader = CharacterRequest::named("Noa", Race::Elf, CharacterClass::Rogue, Gender::Female);
//!     session.create_main_character(leader).await?;
//!     session.finalize_party(vec![]).await?;
//!
//!     session.player_action("I look around the clearing").await;
//!     for entry in session.log() {
//!         println!("{}: {}", entry.sender, entry.message);
//!     }
//!     Ok(())
//! }
//! ```

pub mod character;
pub mod log;
pub mod master;
pub mod persist;
pub mod phase;
pub mod session;
pub mod testing;
pub mod turn;

// Primary public API
pub use character::{CharacterClass, CharacterRequest, Gender, PlayerCharacter, Race, MAX_COMPANIONS};
pub use log::GameLogEntry;
pub use master::{GameMaster, GeminiMaster, MasterConfig, MasterError};
pub use persist::{PersistError, SaveStore, SavedGame};
pub use phase::GamePhase;
pub use session::{GameSession, SessionError, TurnOutcome};
pub use testing::{MockMaster, MockTurn, TestHarness};
pub use turn::{TurnError, TurnUpdate};
