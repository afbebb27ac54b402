//! A player's hand, held as a multiset of card kinds.

use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

use crate::game::card::Card;

/// Card kind → count. Kinds with a zero count are not stored, so two hands
/// holding the same cards always compare (and serialize) equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hand {
    cards: BTreeMap<Card, u32>,
}

impl Hand {
    /// Create an empty hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one card.
    pub fn add(&mut self, card: Card) {
        *self.cards.entry(card).or_insert(0) += 1;
    }

    /// Remove one instance of `card`. Returns false if none was held.
    pub fn remove_one(&mut self, card: Card) -> bool {
        match self.cards.get_mut(&card) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.cards.remove(&card);
                true
            }
            None => false,
        }
    }

    /// How many of `card` are held.
    pub fn count(&self, card: Card) -> u32 {
        self.cards.get(&card).copied().unwrap_or(0)
    }

    /// Whether at least one `card` is held.
    pub fn contains(&self, card: Card) -> bool {
        self.count(card) > 0
    }

    /// Total number of cards held.
    pub fn total(&self) -> usize {
        self.cards.values().map(|c| *c as usize).sum()
    }

    /// Whether the hand is empty.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate `(kind, count)` in card order.
    pub fn iter(&self) -> impl Iterator<Item = (Card, u32)> + '_ {
        self.cards.iter().map(|(card, count)| (*card, *count))
    }
}
