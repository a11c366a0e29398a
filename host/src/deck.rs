//! Card deck construction and draw rules.
//!
//! The deck is built once at game start from a word bank and never changes;
//! played words are tracked through the used-word set as `"{cardId}-{digit}"`
//! markers. Draws avoid repeating a (card, digit) pair until the pool for
//! that digit is exhausted, after which repeats are allowed rather than
//! treated as an error.

use rand::seq::SliceRandom;
use rand::Rng;
use shared::{Card, WORDS_PER_CARD};
use std::collections::HashSet;

/// Fallback word bank used when no word file is supplied.
pub const DEFAULT_WORDS: &[&str] = &[
    "anchor", "apple", "arrow", "balloon", "banana", "basket", "beach", "bells", "bicycle",
    "blanket", "bottle", "breeze", "bridge", "bucket", "butter", "cabin", "camera", "candle",
    "canyon", "carpet", "castle", "cherry", "circus", "cloud", "compass", "cookie", "coral",
    "crayon", "cricket", "crystal", "curtain", "daisy", "desert", "diamond", "dolphin", "dragon",
    "drum", "eagle", "engine", "feather", "fence", "fiddle", "flame", "forest", "fountain",
    "garden", "glacier", "guitar", "hammer", "harbor", "helmet", "honey", "island", "jacket",
    "jungle", "kettle", "kite", "ladder", "lantern", "lemon", "lighthouse", "lizard", "magnet",
    "marble", "meadow", "mirror", "mountain", "mushroom", "needle", "ocean", "orange", "orchid",
    "otter", "paddle", "parrot", "peanut", "pebble", "pencil", "penguin", "pillow", "pirate",
    "planet", "pocket", "pumpkin", "puzzle", "rabbit", "rainbow", "river", "rocket", "saddle",
    "sailor", "sandal", "scarf", "shadow", "shovel", "spider", "sponge", "spoon", "statue",
    "summer", "sunset", "sweater", "thunder", "ticket", "tiger", "toast", "tractor", "trumpet",
    "tunnel", "turtle", "umbrella", "valley", "velvet", "violin", "volcano", "wagon", "walnut",
    "whistle", "window", "winter", "zebra",
];

/// Used-word marker for a specific word slot of a specific card.
pub fn used_key(card_id: u32, digit: usize) -> String {
    format!("{}-{}", card_id, digit)
}

/// Builds a shuffled deck from a word bank, ten words per card. Leftover
/// words that do not fill a whole card are dropped.
pub fn build_deck<R: Rng>(words: &[String], rng: &mut R) -> Vec<Card> {
    let mut pool = words.to_vec();
    pool.shuffle(rng);

    let mut cards: Vec<Card> = pool
        .chunks_exact(WORDS_PER_CARD)
        .enumerate()
        .map(|(i, chunk)| Card {
            id: i as u32,
            words: chunk.to_vec(),
        })
        .collect();

    cards.shuffle(rng);
    cards
}

/// Draws one card for the given digit, preferring cards whose word slot at
/// that digit has not been shown yet. Once every card's slot for the digit
/// is used, any card may repeat.
pub fn draw_card<R: Rng>(
    deck: &[Card],
    used: &HashSet<String>,
    digit: usize,
    rng: &mut R,
) -> Option<Card> {
    if deck.is_empty() {
        return None;
    }

    let fresh: Vec<&Card> = deck
        .iter()
        .filter(|c| !used.contains(&used_key(c.id, digit)))
        .collect();

    if fresh.is_empty() {
        deck.choose(rng).cloned()
    } else {
        fresh.choose(rng).map(|c| (*c).clone())
    }
}

/// Draws `count` cards for a special turn, preferring distinct cards with an
/// unused slot at the digit, then distinct cards regardless of usage, and
/// only repeating cards when the deck itself is smaller than `count`.
pub fn draw_special_cards<R: Rng>(
    deck: &[Card],
    used: &HashSet<String>,
    digit: usize,
    count: usize,
    rng: &mut R,
) -> Vec<Card> {
    let mut fresh: Vec<&Card> = deck
        .iter()
        .filter(|c| !used.contains(&used_key(c.id, digit)))
        .collect();
    fresh.shuffle(rng);

    let mut picked: Vec<Card> = fresh.into_iter().take(count).cloned().collect();

    if picked.len() < count {
        let mut rest: Vec<&Card> = deck
            .iter()
            .filter(|c| !picked.iter().any(|p| p.id == c.id))
            .collect();
        rest.shuffle(rng);
        for card in rest {
            if picked.len() == count {
                break;
            }
            picked.push(card.clone());
        }
    }

    // Deck smaller than the request: repeats are the graceful fallback.
    while picked.len() < count {
        match deck.choose(rng) {
            Some(card) => picked.push(card.clone()),
            None => break,
        }
    }

    picked
}
