//! Random username generator.
//!
//! Produces names in the format `AdjectiveNounNN` (e.g. `NeonFox42`).

use rand::RngExt;

const ADJECTIVES: &[&str] = &[
    "Quiet", "Velvet", "Amber", "Hidden", "Midnight", "Smoky", "Gilded", "Hushed", "Copper",
    "Lunar", "Crimson", "Silent", "Dusky", "Brass", "Jazzy", "Sly", "Mellow", "Ivory", "Rusty",
    "Secret", "Misty", "Golden", "Neon", "Shady", "Cobalt", "Onyx",
];

const NOUNS: &[&str] = &[
    "Fox", "Raven", "Otter", "Heron", "Lynx", "Moth", "Crow", "Owl", "Hare", "Stoat", "Marten",
    "Badger", "Finch", "Wren", "Newt", "Viper", "Panther", "Cat", "Hound", "Bear", "Swift",
    "Ferret", "Mink", "Sparrow",
];

/// Generate a random username like `VelvetOtter7`.
pub fn generate_username() -> String {
    let mut rng = rand::rng();
    let adj = ADJECTIVES[rng.random_range(0..ADJECTIVES.len())];
    let noun = NOUNS[rng.random_range(0..NOUNS.len())];
    let num: u8 = rng.random_range(0..100);
    format!("{}{}{}", adj, noun, num)
}
