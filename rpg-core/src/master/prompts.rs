//! Prompt text and response schemas sent to the game master.

use crate::character::{CharacterRequest, PlayerCharacter};
use crate::log::{recent_history, GameLogEntry};
use serde_json::{json, Value};

/// Narration used when the opening scene cannot be generated.
pub const FALLBACK_OPENING: &str = include_str!("prompts/opening_fallback.txt");

/// Schema for a single generated character.
pub fn character_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "name": { "type": "STRING" },
            "race": { "type": "STRING" },
            "class": { "type": "STRING" },
            "gender": { "type": "STRING" },
            "hp": { "type": "INTEGER" },
            "maxHp": { "type": "INTEGER" },
            "inventory": {
                "type": "ARRAY",
                "items": { "type": "STRING" }
            },
            "backstory": { "type": "STRING" },
            "strength": { "type": "INTEGER" },
            "dexterity": { "type": "INTEGER" },
            "intelligence": { "type": "INTEGER" }
        },
        "required": [
            "name", "race", "class", "gender", "hp", "maxHp", "inventory",
            "backstory", "strength", "dexterity", "intelligence"
        ]
    })
}

/// Schema for a turn update.
pub fn turn_schema(language: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "narrative": {
                "type": "STRING",
                "description": format!(
                    "Story description of what happens now in the game world as a result of the player's action. Must be in {language}."
                )
            },
            "updatedParty": {
                "type": "ARRAY",
                "items": character_schema(),
                "description": "Every character in the party with their updated data."
            },
            "isGameOver": {
                "type": "BOOLEAN",
                "description": "Whether the game has ended (for example, every party member has died)."
            },
            "gameOverReason": {
                "type": "STRING",
                "description": "If the game has ended, the reason. Otherwise an empty string."
            }
        },
        "required": ["narrative", "updatedParty", "isGameOver"]
    })
}

/// System instruction for a turn exchange.
pub fn system_instruction(party_size: usize, language: &str) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "The party has {party_size} adventurer{}. The game is conducted in {language} only.\n\n",
        if party_size == 1 { "" } else { "s" }
    ));
    prompt.push_str(include_str!("prompts/game_master.txt"));
    prompt
}

pub fn character_prompt(request: &CharacterRequest, language: &str) -> String {
    let mut prompt = String::from("Create a new character for a role-playing game.\n");

    match request.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            prompt.push_str(&format!("The character's name is: {name}\n"));
        }
        _ => prompt.push_str("Invent a fitting and unique name for the character.\n"),
    }

    prompt.push_str(&format!("Race: {}\n", request.race));
    prompt.push_str(&format!("Gender: {}\n", request.gender));
    prompt.push_str(&format!("Class: {}\n\n", request.class));
    prompt.push_str(
        "Write a short, interesting backstory, set the character's hit points (HP), \
         base attributes (strength, dexterity, intelligence) and starting equipment.\n",
    );
    prompt.push_str(
        "Attributes must be between 8 and 18. Hit points must be between 10 and 20, \
         based on the class, and hp must equal maxHp.\n",
    );
    prompt.push_str(&format!(
        "The gender you return must be exactly \"{}\".\n",
        request.gender
    ));
    prompt.push_str(&format!(
        "Write the backstory and item names in {language}.\n"
    ));
    prompt.push_str("Reply with JSON only, matching the provided schema.\n");
    prompt
}

pub fn portrait_prompt(character: &PlayerCharacter) -> String {
    format!(
        "Fantasy character portrait of a {} {} {} named {}. \
         Epic fantasy art style, detailed, Dungeons and Dragons character art.",
        character.gender, character.race, character.class, character.name
    )
}

/// One line per member: `- name, the race (gender) class. Backstory: ...`
pub fn party_description(party: &[PlayerCharacter]) -> String {
    party
        .iter()
        .map(|member| {
            format!(
                "- {}, the {} ({}) {}. Backstory: {}",
                member.name, member.race, member.gender, member.class, member.backstory
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn opening_prompt(party: &[PlayerCharacter], language: &str) -> String {
    let mut prompt = String::from("You are the game master of a fantasy role-playing game.\n");
    prompt.push_str("This is the party of adventurers setting out on their journey:\n");
    prompt.push_str(&party_description(party));
    prompt.push_str("\n\n");
    prompt.push_str(
        "Based on the party and their backstories, create a gripping, dramatic opening scene.\n\
         Describe where they are and what is happening around them. \
         Present them with their first challenge or decision.\n",
    );
    prompt.push_str(&format!(
        "Reply with narration in {language}, addressed directly to the players.\n"
    ));
    prompt.push_str("Do not output JSON. Provide only the story text.\n");
    prompt
}

/// Prompt for one turn. The roster is sent without portraits.
pub fn turn_prompt(
    party: &[PlayerCharacter],
    log: &[GameLogEntry],
    action: &str,
    history_window: usize,
) -> String {
    let roster: Vec<PlayerCharacter> = party.iter().map(PlayerCharacter::without_portrait).collect();
    let roster_json = serde_json::to_string(&roster).unwrap_or_else(|_| "[]".to_string());
    let leader = party.first().map(|m| m.name.as_str()).unwrap_or("the party");

    let mut prompt = String::from("Continue the role-playing game.\n\n");
    prompt.push_str("Current state of the party:\n");
    prompt.push_str(&roster_json);
    prompt.push_str("\n\nRecent history:\n");
    prompt.push_str(&recent_history(log, history_window));
    prompt.push_str(&format!(
        "\n\nLatest player action (spoken by {leader}, leader of the party):\n"
    ));
    prompt.push_str(action);
    prompt.push_str("\n\n");
    prompt.push_str(
        "Based on the player's action, advance the story. Describe the outcome of the action \
         and what is happening now in the world.\n\
         Update the party members if needed (for example, a change in HP or a new inventory item). \
         Return the complete, updated state of every party member in \"updatedParty\".\n\
         Be fair but challenging. Remember that dangerous actions can injure or kill party members.\n\
         Reply with JSON only, matching the provided schema.\n",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{CharacterClass, Gender, Race};
    use crate::testing::sample_character;

    #[test]
    fn test_character_prompt_named_and_invented() {
        let named = CharacterRequest::named("Noa", Race::Elf, CharacterClass::Rogue, Gender::Female);
        let prompt = character_prompt(&named, "Hebrew");
        assert!(prompt.contains("The character's name is: Noa"));
        assert!(prompt.contains("Race: Elf"));
        assert!(prompt.contains("exactly \"Female\""));
        assert!(prompt.contains("in Hebrew"));

        let invented = CharacterRequest::companion(Race::Dwarf, CharacterClass::Cleric, Gender::Male);
        assert!(character_prompt(&invented, "Hebrew").contains("Invent a fitting"));

        let blank = CharacterRequest::named("  ", Race::Dwarf, CharacterClass::Cleric, Gender::Male);
        assert!(character_prompt(&blank, "Hebrew").contains("Invent a fitting"));
    }

    #[test]
    fn test_portrait_prompt() {
        let prompt = portrait_prompt(&sample_character("Noa"));
        assert!(prompt.starts_with("Fantasy character portrait of a Female Human Warrior named Noa."));
    }

    #[test]
    fn test_party_description() {
        let party = vec![sample_character("Noa"), sample_character("Ido")];
        let description = party_description(&party);
        let lines: Vec<_> = description.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("- Noa, the Human (Female) Warrior. Backstory: "));
    }

    #[test]
    fn test_turn_prompt_strips_portraits() {
        let mut leader = sample_character("Noa");
        leader.image_url = Some("data:image/png;base64,SECRET".to_string());
        let log = vec![GameLogEntry::dm("A troll blocks the bridge.")];

        let prompt = turn_prompt(&[leader], &log, "I charge the troll", 6);

        assert!(!prompt.contains("SECRET"));
        assert!(!prompt.contains("imageUrl"));
        assert!(prompt.contains("\"maxHp\":14"));
        assert!(prompt.contains("DM: A troll blocks the bridge."));
        assert!(prompt.contains("spoken by Noa"));
        assert!(prompt.contains("I charge the troll"));
    }

    #[test]
    fn test_system_instruction() {
        let solo = system_instruction(1, "Hebrew");
        assert!(solo.contains("1 adventurer."));
        assert!(solo.contains("in Hebrew only"));

        let group = system_instruction(4, "English");
        assert!(group.contains("4 adventurers."));
        assert!(group.contains("valid JSON object"));
    }

    #[test]
    fn test_turn_schema_requires_core_fields() {
        let schema = turn_schema("Hebrew");
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert_eq!(schema["properties"]["updatedParty"]["items"]["type"], "OBJECT");
        assert!(schema["properties"]["updatedParty"]["items"]["properties"]
            .get("imageUrl")
            .is_none());
    }
}
