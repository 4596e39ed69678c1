//! Hand scoring and winner selection.

use std::collections::BTreeMap;

use crate::{Card, Rank, RulesError};

/// Number of cards each player holds.
pub const HAND_SIZE: usize = 4;

/// How many of their own cards a player may look at during a game.
pub const MAX_REVEALS: usize = 2;

/// Checks that `index` names a hand slot and returns it as a `usize`.
pub fn validate_card_index(index: i64) -> Result<usize, RulesError> {
    usize::try_from(index)
        .ok()
        .filter(|&i| i < HAND_SIZE)
        .ok_or(RulesError::InvalidCardIndex(index))
}

/// Scores a hand.
///
/// Cards are grouped by rank. A rank held an even number of times (a pair,
/// or all four) cancels to zero. A rank held an odd number of times counts
/// every copy, so three Kings score 30.
pub fn score_hand(cards: &[Card]) -> i32 {
    let mut counts: BTreeMap<Rank, i32> = BTreeMap::new();
    for card in cards {
        *counts.entry(card.rank).or_default() += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| count % 2 == 1)
        .map(|(rank, count)| crate::card_value(rank) * count)
        .sum()
}

/// Returns the seat indices of the winners.
///
/// The lowest score wins. When the knocker is among the lowest scorers
/// the knocker alone wins; otherwise every tied seat is returned.
pub fn winners(scores: &[i32], knocker: Option<usize>) -> Vec<usize> {
    let Some(&best) = scores.iter().min() else {
        return Vec::new();
    };
    let tied: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, s)| **s == best)
        .map(|(i, _)| i)
        .collect();
    match knocker {
        Some(k) if tied.contains(&k) => vec![k],
        _ => tied,
    }
}
