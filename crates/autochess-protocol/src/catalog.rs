//! The fixed character catalog.
//!
//! Characters are static data compiled into the client. They are never
//! fetched from or persisted to a server; only the player's chosen entry
//! is copied into their identity record.

use crate::CharacterChoice;

/// `(id, name, icon, description)` for every playable character, in the
/// order they are shown on the select screen.
const CHARACTERS: [(&str, &str, &str, &str); 4] = [
    (
        "warrior",
        "Warrior",
        "⚔️",
        "High health and defense, excels at close combat",
    ),
    (
        "mage",
        "Mage",
        "🔮",
        "Powerful magic attacks, but low health",
    ),
    (
        "archer",
        "Archer",
        "🏹",
        "Ranged attacks, skilled at evading enemies",
    ),
    (
        "healer",
        "Healer",
        "💚",
        "Restorative powers that heal themselves and allies",
    ),
];

/// Returns every playable character in display order.
pub fn catalog() -> Vec<CharacterChoice> {
    CHARACTERS.iter().map(|entry| to_choice(*entry)).collect()
}

/// Looks up a character by its ID (`"warrior"`, `"mage"`, ...).
pub fn find_character(id: &str) -> Option<CharacterChoice> {
    CHARACTERS
        .iter()
        .find(|(candidate, ..)| *candidate == id)
        .map(|entry| to_choice(*entry))
}

fn to_choice(
    (id, name, icon, description): (&str, &str, &str, &str),
) -> CharacterChoice {
    CharacterChoice {
        id: id.to_string(),
        name: name.to_string(),
        icon: icon.to_string(),
        description: description.to_string(),
    }
}
