//! Player identity minting.
//!
//! The hub asks a [`PlayerIdGenerator`] for a new id each time a client
//! authenticates without a token. Production uses memorable random names;
//! tests swap in [`SequentialIdGenerator`] so ids are predictable.

use fairway_protocol::PlayerId;
use rand::Rng;

/// Source of fresh player ids.
///
/// `Send + 'static` because the generator lives inside the hub task.
pub trait PlayerIdGenerator: Send + 'static {
    fn generate(&mut self) -> PlayerId;
}

/// Produces `player-1`, `player-2`, ...
#[derive(Debug, Default)]
pub struct SequentialIdGenerator {
    counter: u64,
}

impl PlayerIdGenerator for SequentialIdGenerator {
    fn generate(&mut self) -> PlayerId {
        self.counter += 1;
        PlayerId::new(format!("player-{}", self.counter))
    }
}

const ADJECTIVES: [&str; 20] = [
    "bouncy", "giggly", "sparkly", "fuzzy", "wiggly", "snuggly", "dreamy",
    "bubbly", "twinkly", "jolly", "quirky", "peppy", "zesty", "frisky",
    "silly", "perky", "cheeky", "zippy", "groovy", "jazzy",
];

const COLOURS: [&str; 20] = [
    "lavender", "periwinkle", "coral", "mint", "peach", "turquoise",
    "magenta", "cerulean", "lilac", "salmon", "chartreuse", "crimson",
    "cobalt", "amber", "jade", "fuchsia", "indigo", "teal", "mauve",
    "vermillion",
];

const ANIMALS: [&str; 20] = [
    "koala", "kangaroo", "wombat", "quokka", "platypus", "echidna",
    "wallaby", "bilby", "numbat", "possum", "kookaburra", "cockatoo",
    "lorikeet", "galah", "budgie", "dingo", "bandicoot", "pademelon",
    "potoroo", "glider",
];

const SLUG_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Produces ids like `bouncy-coral-quokka-x7k2`.
///
/// 20 × 20 × 20 × 36⁴ combinations; the hub does not check for clashes.
#[derive(Debug, Default)]
pub struct WhimsicalIdGenerator;

impl WhimsicalIdGenerator {
    /// Draws one id from `rng`. Every word and slug character is equally
    /// likely.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> PlayerId {
        let adjective = pick(rng, &ADJECTIVES);
        let colour = pick(rng, &COLOURS);
        let animal = pick(rng, &ANIMALS);
        let slug: String = (0..4)
            .map(|_| char::from(SLUG_CHARSET[rng.random_range(0..SLUG_CHARSET.len())]))
            .collect();

        PlayerId::new(format!("{adjective}-{colour}-{animal}-{slug}"))
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, words: &[&'static str]) -> &'static str {
    words[rng.random_range(0..words.len())]
}

impl PlayerIdGenerator for WhimsicalIdGenerator {
    fn generate(&mut self) -> PlayerId {
        // The thread RNG is reseeded from the OS.
        Self::generate_with(&mut rand::rng())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn test_sequential_generate_counts_from_one() {
        let mut ids = SequentialIdGenerator::default();
        assert_eq!(ids.generate(), PlayerId::new("player-1"));
        assert_eq!(ids.generate(), PlayerId::new("player-2"));
    }

    #[test]
    fn test_whimsical_generate_has_four_parts_from_word_lists() {
        let id = WhimsicalIdGenerator.generate();
        let parts: Vec<&str> = id.as_str().split('-').collect();

        assert_eq!(parts.len(), 4, "unexpected id {id}");
        assert!(ADJECTIVES.contains(&parts[0]));
        assert!(COLOURS.contains(&parts[1]));
        assert!(ANIMALS.contains(&parts[2]));
        assert_eq!(parts[3].len(), 4);
        assert!(parts[3].bytes().all(|b| SLUG_CHARSET.contains(&b)));
    }

    #[test]
    fn test_whimsical_generate_with_reaches_every_word_evenly() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..20_000 {
            let id = WhimsicalIdGenerator::generate_with(&mut rng);
            let animal = id.as_str().split('-').nth(2).unwrap().to_owned();
            *counts.entry(animal).or_default() += 1;
        }

        // 1000 expected per word.
        assert_eq!(counts.len(), ANIMALS.len());
        assert!(counts.keys().all(|k| ANIMALS.contains(&k.as_str())));
        assert!(counts.values().all(|&n| (850..=1150).contains(&n)), "{counts:?}");
    }
}
