//! Testing utilities for the RPG engine.
//!
//! This module provides tools for integration testing:
//! - `MockMaster` for deterministic testing without API calls
//! - `TestHarness` for scripted game scenarios
//! - Assertion helpers for verifying session state

use crate::character::{CharacterClass, CharacterRequest, PlayerCharacter};
use crate::log::GameLogEntry;
use crate::master::{GameMaster, MasterError};
use crate::phase::GamePhase;
use crate::session::{GameSession, SessionError, TurnOutcome};
use crate::turn::{parse_turn_update, TurnUpdate};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A plain character for tests: a 14 HP human warrior.
pub fn sample_character(name: &str) -> PlayerCharacter {
    PlayerCharacter {
        name: name.to_string(),
        race: "Human".to_string(),
        class: "Warrior".to_string(),
        gender: "Female".to_string(),
        hp: 14,
        max_hp: 14,
        inventory: vec!["longsword".to_string(), "shield".to_string()],
        backstory: "Raised by the border wardens.".to_string(),
        strength: 16,
        dexterity: 12,
        intelligence: 10,
        image_url: None,
    }
}

/// A scripted reply to one player action.
#[derive(Debug, Clone)]
pub struct MockTurn {
    narrative: String,
    hp: Vec<(String, i32)>,
    items: Vec<(String, String)>,
    departed: Vec<String>,
    joined: Vec<PlayerCharacter>,
    game_over: Option<Option<String>>,
    failure: Option<String>,
    raw: Option<String>,
}

impl MockTurn {
    /// Narration that leaves the party as it is.
    pub fn narrate(text: impl Into<String>) -> Self {
        Self {
            narrative: text.into(),
            hp: Vec::new(),
            items: Vec::new(),
            departed: Vec::new(),
            joined: Vec::new(),
            game_over: None,
            failure: None,
            raw: None,
        }
    }

    /// The call fails before any reply arrives.
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::narrate("")
        }
    }

    /// The model replies with this exact text.
    pub fn raw(text: impl Into<String>) -> Self {
        Self {
            raw: Some(text.into()),
            ..Self::narrate("")
        }
    }

    pub fn with_hp(mut self, name: impl Into<String>, hp: i32) -> Self {
        self.hp.push((name.into(), hp));
        self
    }

    pub fn with_item(mut self, name: impl Into<String>, item: impl Into<String>) -> Self {
        self.items.push((name.into(), item.into()));
        self
    }

    /// The member is missing from the returned party.
    pub fn without_member(mut self, name: impl Into<String>) -> Self {
        self.departed.push(name.into());
        self
    }

    /// A new member appears in the returned party.
    pub fn with_member(mut self, character: PlayerCharacter) -> Self {
        self.joined.push(character);
        self
    }

    pub fn game_over(mut self, reason: Option<&str>) -> Self {
        self.game_over = Some(reason.map(str::to_string));
        self
    }

    /// Reply text for `party`, shaped the way the model would send it.
    fn reply(&self, party: &[PlayerCharacter]) -> String {
        if let Some(ref raw) = self.raw {
            return raw.clone();
        }

        let mut updated: Vec<PlayerCharacter> = party
            .iter()
            .filter(|member| !self.departed.contains(&member.name))
            .map(PlayerCharacter::without_portrait)
            .collect();
        for member in &mut updated {
            if let Some((_, hp)) = self.hp.iter().find(|(name, _)| *name == member.name) {
                member.hp = *hp;
            }
            for (_, item) in self.items.iter().filter(|(name, _)| *name == member.name) {
                member.inventory.push(item.clone());
            }
        }
        updated.extend(self.joined.iter().map(PlayerCharacter::without_portrait));

        let update = TurnUpdate {
            narrative: self.narrative.clone(),
            updated_party: updated,
            is_game_over: self.game_over.is_some(),
            game_over_reason: self.game_over.clone().flatten(),
        };
        serde_json::to_string(&update).unwrap_or_default()
    }
}

/// What the mock was asked to do on one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnCall {
    pub party_size: usize,
    pub log_len: usize,
    pub action: String,
}

#[derive(Debug, Default)]
struct MockState {
    turns: VecDeque<MockTurn>,
    calls: Vec<TurnCall>,
    opening: Option<String>,
    invented: usize,
    fail_characters: bool,
    no_portraits: bool,
}

/// A mock game master that returns scripted replies.
///
/// Clones share their script, so a test can keep a handle after giving
/// one to a `GameSession`.
#[derive(Debug, Clone, Default)]
pub struct MockMaster {
    state: Arc<Mutex<MockState>>,
}

impl MockMaster {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a reply for the next unanswered action.
    pub fn with_turn(self, turn: MockTurn) -> Self {
        self.queue_turn(turn);
        self
    }

    pub fn with_opening(self, text: impl Into<String>) -> Self {
        self.state().opening = Some(text.into());
        self
    }

    /// Character generation always fails.
    pub fn failing_characters(self) -> Self {
        self.state().fail_characters = true;
        self
    }

    /// Portraits are never produced.
    pub fn without_portraits(self) -> Self {
        self.state().no_portraits = true;
        self
    }

    pub fn queue_turn(&self, turn: MockTurn) {
        self.state().turns.push_back(turn);
    }

    /// Every turn request received so far.
    pub fn calls(&self) -> Vec<TurnCall> {
        self.state().calls.clone()
    }

    fn starting_hp(class: &str) -> i32 {
        match class {
            "Warrior" => 18,
            "Cleric" => 14,
            "Rogue" => 12,
            _ => 10,
        }
    }

    fn starting_kit(class: CharacterClass) -> Vec<String> {
        let kit: &[&str] = match class {
            CharacterClass::Warrior => &["longsword", "shield"],
            CharacterClass::Wizard => &["staff", "spellbook"],
            CharacterClass::Rogue => &["daggers", "lockpicks"],
            CharacterClass::Cleric => &["mace", "holy symbol"],
        };
        kit.iter().map(|item| item.to_string()).collect()
    }
}

#[async_trait]
impl GameMaster for MockMaster {
    async fn generate_character(
        &self,
        request: &CharacterRequest,
    ) -> Result<PlayerCharacter, MasterError> {
        let mut state = self.state();
        if state.fail_characters {
            return Err(MasterError::Rejected("scripted failure".to_string()));
        }

        let name = match request.name {
            Some(ref name) => name.clone(),
            None => {
                state.invented += 1;
                format!("{} {} {}", request.race, request.class, state.invented)
            }
        };
        let class = request.class.name().to_string();
        let hp = Self::starting_hp(&class);

        Ok(PlayerCharacter {
            name,
            race: request.race.name().to_string(),
            class,
            gender: request.gender.name().to_string(),
            hp,
            max_hp: hp,
            inventory: Self::starting_kit(request.class),
            backstory: format!("A {} {} of no particular renown.", request.race, request.class),
            strength: 12,
            dexterity: 12,
            intelligence: 12,
            image_url: None,
        })
    }

    async fn generate_portrait(&self, character: &PlayerCharacter) -> Option<String> {
        if self.state().no_portraits {
            return None;
        }
        Some(format!(
            "data:image/png;base64,{}",
            character.name.replace(' ', "")
        ))
    }

    async fn opening_scene(&self, _party: &[PlayerCharacter]) -> String {
        self.state()
            .opening
            .clone()
            .unwrap_or_else(|| "The adventure begins.".to_string())
    }

    async fn next_turn(
        &self,
        party: &[PlayerCharacter],
        log: &[GameLogEntry],
        action: &str,
    ) -> Result<TurnUpdate, MasterError> {
        let mut state = self.state();
        state.calls.push(TurnCall {
            party_size: party.len(),
            log_len: log.len(),
            action: action.to_string(),
        });

        let turn = state
            .turns
            .pop_front()
            .unwrap_or_else(|| MockTurn::narrate("The game master has no more scripted replies."));

        if let Some(message) = turn.failure {
            return Err(MasterError::Api(gemini::Error::Network(message)));
        }
        Ok(parse_turn_update(&turn.reply(party))?)
    }
}

/// Test harness for running game scenarios.
pub struct TestHarness {
    /// Handle to the session's game master.
    pub master: MockMaster,
    /// The game session.
    pub session: GameSession,
}

impl TestHarness {
    /// Create a new test harness at character creation.
    pub fn new() -> Self {
        Self::with_master(MockMaster::new())
    }

    pub fn with_master(master: MockMaster) -> Self {
        Self {
            session: GameSession::new(master.clone()),
            master,
        }
    }

    /// Create `leader` and recruit `companions`, leaving the session in play.
    pub async fn start(
        &mut self,
        leader: CharacterRequest,
        companions: Vec<CharacterRequest>,
    ) -> Result<&mut Self, SessionError> {
        self.session.create_main_character(leader).await?;
        self.session.finalize_party(companions).await?;
        Ok(self)
    }

    /// Queue a reply for the next action.
    pub fn expect_turn(&mut self, turn: MockTurn) -> &mut Self {
        self.master.queue_turn(turn);
        self
    }

    /// Queue a narration-only reply.
    pub fn expect_narrative(&mut self, text: impl Into<String>) -> &mut Self {
        self.expect_turn(MockTurn::narrate(text))
    }

    /// Send an action as the party leader.
    pub async fn act(&mut self, action: &str) -> TurnOutcome {
        self.session.player_action(action).await
    }

    pub fn member(&self, name: &str) -> Option<&PlayerCharacter> {
        self.session.party().iter().find(|member| member.name == name)
    }

    pub fn hp(&self, name: &str) -> Option<i32> {
        self.member(name).map(|member| member.hp)
    }

    pub fn last_entry(&self) -> Option<&GameLogEntry> {
        self.session.log().last()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

#[track_caller]
pub fn assert_phase(harness: &TestHarness, phase: GamePhase) {
    assert_eq!(
        harness.session.phase(),
        phase,
        "Expected phase {phase}, got {}",
        harness.session.phase()
    );
}

/// Assert a party member's HP.
#[track_caller]
pub fn assert_hp(harness: &TestHarness, name: &str, hp: i32) {
    match harness.hp(name) {
        Some(actual) => assert_eq!(actual, hp, "Expected {name} at {hp} HP, got {actual}"),
        None => panic!("Expected party member '{name}'"),
    }
}

/// Assert the last log entry's sender and message.
#[track_caller]
pub fn assert_last_entry(harness: &TestHarness, sender: &str, message: &str) {
    let Some(last) = harness.last_entry() else {
        panic!("Expected a non-empty log");
    };
    assert_eq!(
        (last.sender.as_str(), last.message.as_str()),
        (sender, message),
        "Unexpected last log entry"
    );
}

/// Assert a party member still has a portrait.
#[track_caller]
pub fn assert_has_portrait(harness: &TestHarness, name: &str) {
    let member = harness
        .member(name)
        .unwrap_or_else(|| panic!("Expected party member '{name}'"));
    assert!(member.has_portrait(), "Expected {name} to have a portrait");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{Gender, Race};

    fn leader() -> CharacterRequest {
        CharacterRequest::named("Noa", Race::Human, CharacterClass::Warrior, Gender::Female)
    }

    #[tokio::test]
    async fn test_mock_master_basic() {
        let mut harness = TestHarness::new();
        harness.start(leader(), vec![]).await.unwrap();
        harness.expect_narrative("You stand in a dusty tavern.");

        let outcome = harness.act("I look around").await;

        assert_eq!(outcome, TurnOutcome::Advanced);
        assert_last_entry(&harness, "DM", "You stand in a dusty tavern.");
        assert_phase(&harness, GamePhase::Playing);
    }

    #[tokio::test]
    async fn test_mock_master_with_damage() {
        let mut harness = TestHarness::new();
        harness.start(leader(), vec![]).await.unwrap();
        harness.expect_turn(MockTurn::narrate("The goblin stabs you!").with_hp("Noa", 13));

        harness.act("I approach the goblin").await;

        assert_hp(&harness, "Noa", 13);
        assert_has_portrait(&harness, "Noa");
    }

    #[tokio::test]
    async fn test_mock_master_records_calls() {
        let mut harness = TestHarness::new();
        harness.start(leader(), vec![]).await.unwrap();
        harness.expect_narrative("One.").expect_narrative("Two.");

        harness.act("first").await;
        harness.act("second").await;

        let calls = harness.master.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].action, "first");
        // Welcome, opening, and the action itself.
        assert_eq!(calls[0].log_len, 3);
        assert_eq!(calls[1].log_len, 5);
    }

    #[tokio::test]
    async fn test_invented_names() {
        let master = MockMaster::new();
        let request = CharacterRequest::companion(Race::Elf, CharacterClass::Rogue, Gender::Male);

        let first = master.generate_character(&request).await.unwrap();
        let second = master.generate_character(&request).await.unwrap();

        assert_eq!(first.name, "Elf Rogue 1");
        assert_eq!(second.name, "Elf Rogue 2");
        assert_eq!(first.hp, 12);
    }

    #[tokio::test]
    async fn test_raw_reply_is_parsed() {
        let master = MockMaster::new().with_turn(MockTurn::raw("not json at all"));
        let party = vec![sample_character("Noa")];

        let result = master.next_turn(&party, &[], "wave").await;
        assert!(matches!(result, Err(MasterError::Parse(_))));
    }
}
