//! The draw pile.
//!
//! An ordered stack of cards; the top of the deck is the end of the vector.

use serde::{Serialize, Deserialize};

use crate::core::rng::DeterministicRng;
use crate::game::card::Card;

/// Deck errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeckError {
    /// Nothing left to draw.
    #[error("Deck is empty")]
    Empty,
}

/// Ordered stack of cards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Build a deck from bottom-to-top order.
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Remove and return the top card.
    pub fn draw(&mut self) -> Result<Card, DeckError> {
        self.cards.pop().ok_or(DeckError::Empty)
    }

    /// Uniformly permute the remaining cards.
    pub fn shuffle(&mut self, rng: &mut DeterministicRng) {
        rng.shuffle(&mut self.cards);
    }

    /// Number of cards left.
    pub fn size(&self) -> usize {
        self.cards.len()
    }

    /// Whether the deck is empty.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Up to `n` cards from the top, top card first. Nothing is removed.
    pub fn peek_top(&self, n: usize) -> Vec<Card> {
        self.cards.iter().rev().take(n).copied().collect()
    }

    /// Put a card back `depth` cards below the top (0 = on top).
    ///
    /// Depths past the bottom put the card at the bottom.
    pub fn insert_at_depth(&mut self, depth: usize, card: Card) {
        let depth = depth.min(self.cards.len());
        let index = self.cards.len() - depth;
        self.cards.insert(index, card);
    }

    /// Cards in bottom-to-top order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// How many cards of `kind` are left.
    pub fn count(&self, kind: Card) -> usize {
        self.cards.iter().filter(|c| **c == kind).count()
    }
}
