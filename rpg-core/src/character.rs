//! Party members and the choices used to generate them.
//!
//! A [`PlayerCharacter`] is exactly what the game master sends back: every
//! field except the portrait is owned by the model and replaced wholesale on
//! each turn.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Most companions that may join the party leader.
pub const MAX_COMPANIONS: usize = 3;

/// A member of the adventuring party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerCharacter {
    pub name: String,
    pub race: String,
    pub class: String,
    pub gender: String,
    pub hp: i32,
    pub max_hp: i32,
    /// Item names in the order the model listed them.
    pub inventory: Vec<String>,
    pub backstory: String,
    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    /// Portrait as a `data:` URL. Never supplied by the model.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl PlayerCharacter {
    /// HP as a fraction of maximum, clamped to `0.0..=1.0`.
    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp <= 0 {
            return 0.0;
        }
        (self.hp as f32 / self.max_hp as f32).clamp(0.0, 1.0)
    }

    /// Whether the character is down (0 HP or less).
    pub fn is_down(&self) -> bool {
        self.hp <= 0
    }

    /// "gender race class", as shown under the name on a character card.
    pub fn summary_line(&self) -> String {
        format!("{} {} {}", self.gender, self.race, self.class)
    }

    /// Copy of this character without the portrait, as sent to the model.
    pub fn without_portrait(&self) -> Self {
        Self {
            image_url: None,
            ..self.clone()
        }
    }

    pub fn has_portrait(&self) -> bool {
        self.image_url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

// ============================================================================
// Creation choices
// ============================================================================

/// Playable races.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Halfling,
}

impl Race {
    pub fn name(&self) -> &'static str {
        match self {
            Race::Human => "Human",
            Race::Elf => "Elf",
            Race::Dwarf => "Dwarf",
            Race::Halfling => "Halfling",
        }
    }

    pub fn all() -> &'static [Race] {
        &[Race::Human, Race::Elf, Race::Dwarf, Race::Halfling]
    }
}

impl fmt::Display for Race {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Playable classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterClass {
    Warrior,
    Wizard,
    Rogue,
    Cleric,
}

impl CharacterClass {
    pub fn name(&self) -> &'static str {
        match self {
            CharacterClass::Warrior => "Warrior",
            CharacterClass::Wizard => "Wizard",
            CharacterClass::Rogue => "Rogue",
            CharacterClass::Cleric => "Cleric",
        }
    }

    pub fn all() -> &'static [CharacterClass] {
        &[
            CharacterClass::Warrior,
            CharacterClass::Wizard,
            CharacterClass::Rogue,
            CharacterClass::Cleric,
        ]
    }
}

impl fmt::Display for CharacterClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn name(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    pub fn all() -> &'static [Gender] {
        &[Gender::Male, Gender::Female]
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What the player asked for when generating a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRequest {
    /// `None` lets the game master invent a fitting name.
    pub name: Option<String>,
    pub race: Race,
    pub class: CharacterClass,
    pub gender: Gender,
}

impl CharacterRequest {
    /// A named character (the party leader).
    pub fn named(name: impl Into<String>, race: Race, class: CharacterClass, gender: Gender) -> Self {
        Self {
            name: Some(name.into()),
            race,
            class,
            gender,
        }
    }

    /// A companion whose name the game master invents.
    pub fn companion(race: Race, class: CharacterClass, gender: Gender) -> Self {
        Self {
            name: None,
            race,
            class,
            gender,
        }
    }
}

impl Default for CharacterRequest {
    fn default() -> Self {
        Self::companion(Race::Human, CharacterClass::Warrior, Gender::Male)
    }
}
