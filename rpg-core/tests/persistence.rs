//! Save/load through the session and the per-user store.

use rpg_core::persist::save_file_name;
use rpg_core::{
    CharacterClass, CharacterRequest, GamePhase, GameSession, Gender, MockMaster, MockTurn, Race,
    SaveStore, TestHarness,
};
use tempfile::TempDir;

fn leader() -> CharacterRequest {
    CharacterRequest::named("Noa", Race::Dwarf, CharacterClass::Cleric, Gender::Female)
}

async fn played_harness() -> TestHarness {
    let mut harness = TestHarness::new();
    harness
        .start(
            leader(),
            vec![CharacterRequest::companion(Race::Elf, CharacterClass::Rogue, Gender::Male)],
        )
        .await
        .unwrap();
    harness.expect_turn(MockTurn::narrate("A bridge sways.").with_hp("Noa", 5));
    harness.act("Cross carefully").await;
    harness
}

#[tokio::test]
async fn test_round_trip_restores_session() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SaveStore::new(temp_dir.path());
    let harness = played_harness().await;

    let saved = harness.session.snapshot().expect("Playing sessions are saveable");
    store.save("noa", &saved).await.expect("Save should succeed");

    let loaded = store.load("noa").await.expect("Save should load");
    let mut restored = GameSession::new(MockMaster::new());
    restored.restore(loaded);

    assert_eq!(restored.phase(), GamePhase::Playing);
    assert_eq!(restored.party(), harness.session.party());
    assert_eq!(restored.log(), harness.session.log());
    assert!(restored.party().iter().all(|m| m.has_portrait()));
    assert_eq!(restored.party()[0].hp, 5);
}

#[tokio::test]
async fn test_round_trip_game_over() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SaveStore::new(temp_dir.path());
    let mut harness = played_harness().await;
    harness.expect_turn(MockTurn::narrate("The bridge snaps.").game_over(Some("Lost to the river.")));
    harness.act("Jump").await;

    store
        .save("noa", &harness.session.snapshot().unwrap())
        .await
        .unwrap();

    let mut restored = GameSession::new(MockMaster::new());
    restored.restore(store.load("noa").await.unwrap());

    assert_eq!(restored.phase(), GamePhase::GameOver);
    assert_eq!(restored.game_over_reason(), Some("Lost to the river."));
}

#[tokio::test]
async fn test_restored_session_keeps_playing() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SaveStore::new(temp_dir.path());
    let harness = played_harness().await;
    store
        .save("noa", &harness.session.snapshot().unwrap())
        .await
        .unwrap();

    let master = MockMaster::new().with_turn(MockTurn::narrate("The far bank.").with_hp("Noa", 4));
    let mut restored = GameSession::new(master.clone());
    restored.restore(store.load("noa").await.unwrap());
    restored.player_action("Keep going").await;

    assert_eq!(restored.party()[0].hp, 4);
    assert!(restored.party()[0].has_portrait());
    assert_eq!(master.calls()[0].log_len, harness.session.log().len() + 1);
}

#[tokio::test]
async fn test_corrupt_blob_is_no_save() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SaveStore::new(temp_dir.path());
    let path = store.path_for("noa").unwrap();

    std::fs::write(&path, b"\x00\x01garbage").unwrap();
    assert!(store.has_save("noa").await);
    assert!(store.load("noa").await.is_none());
    assert!(!store.has_save("noa").await);
}

#[tokio::test]
async fn test_users_do_not_share_saves() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let store = SaveStore::new(temp_dir.path());
    let harness = played_harness().await;
    let saved = harness.session.snapshot().unwrap();

    store.save("a b", &saved).await.unwrap();
    assert!(store.load("a_b").await.is_none());
    assert!(store.load("a-b").await.is_none());
    assert!(store.load("a b").await.is_some());

    assert_ne!(save_file_name("a b").unwrap(), save_file_name("a_20b").unwrap());
}

#[tokio::test]
async fn test_nothing_to_save_before_play() {
    let mut session = GameSession::new(MockMaster::new());
    assert!(session.snapshot().is_none());
    session.create_main_character(leader()).await.unwrap();
    assert!(session.snapshot().is_none());
}
