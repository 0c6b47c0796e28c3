//! Quick live run of the engine against Gemini.
//!
//! Run with: `cargo run -p rpg-core --example test_session`

use rpg_core::{
    CharacterClass, CharacterRequest, GameSession, Gender, MasterConfig, Race, SaveStore,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    println!("=== Testing RPG Core ===\n");

    println!("1. Creating session...");
    let config = MasterConfig::default()
        .with_language("English")
        .with_portraits(false);
    let mut session = GameSession::from_env(config)?;

    println!("2. Creating the leader...");
    let leader = session
        .create_main_character(CharacterRequest::named(
            "Thorin",
            Race::Dwarf,
            CharacterClass::Warrior,
            Gender::Male,
        ))
        .await?;
    println!("   {} ({}) HP {}/{}", leader.name, leader.summary_line(), leader.hp, leader.max_hp);
    println!("   {}", leader.backstory);

    println!("\n3. Recruiting a companion and opening the adventure...");
    session
        .finalize_party(vec![CharacterRequest::companion(
            Race::Elf,
            CharacterClass::Wizard,
            Gender::Female,
        )])
        .await?;
    for member in session.party() {
        println!("   {} ({}) HP {}/{}", member.name, member.summary_line(), member.hp, member.max_hp);
    }

    println!("\n4. Taking a turn...");
    let outcome = session.player_action("We search the ruins for shelter.").await;
    println!("   Outcome: {outcome:?}");
    for entry in session.log() {
        let snippet: String = entry.message.chars().take(300).collect();
        println!("   [{}] {snippet}", entry.sender);
    }

    println!("\n5. Save round trip...");
    let dir = std::env::temp_dir().join("rpg-test-session");
    let store = SaveStore::new(&dir);
    if let Some(saved) = session.snapshot() {
        store.save("thorin", &saved).await?;
        let loaded = store.load("thorin").await;
        println!("   Round trip intact: {}", loaded.as_ref() == Some(&saved));
        store.clear("thorin").await?;
    }

    println!("\n=== Done ===");
    Ok(())
}
