//! Card kinds.
//!
//! Cards have no identity beyond their kind; two Skips are interchangeable.

use std::fmt;
use serde::{Serialize, Deserialize};

/// Every card kind in the game.
///
/// Wire names follow the browser client (`"See Future"` with a space).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Card {
    /// End the turn without drawing.
    Skip = 0,
    /// Survive a drawn Explode.
    Defuse = 1,
    /// End the turn and make the opponent take two.
    Attack = 2,
    /// Shuffle the deck.
    Shuffle = 3,
    /// Peek at the top three cards.
    #[serde(rename = "See Future", alias = "SeeFuture")]
    SeeFuture = 4,
    /// Cancel the most recent effect.
    Nope = 5,
    /// Eliminates whoever draws it without a Defuse.
    Explode = 6,
}

impl Card {
    /// All card kinds, in discriminant order.
    pub const ALL: [Card; 7] = [
        Card::Skip,
        Card::Defuse,
        Card::Attack,
        Card::Shuffle,
        Card::SeeFuture,
        Card::Nope,
        Card::Explode,
    ];

    /// Stable numeric code, used for hashing.
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Display name, identical to the wire name.
    pub fn name(self) -> &'static str {
        match self {
            Card::Skip => "Skip",
            Card::Defuse => "Defuse",
            Card::Attack => "Attack",
            Card::Shuffle => "Shuffle",
            Card::SeeFuture => "See Future",
            Card::Nope => "Nope",
            Card::Explode => "Explode",
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
