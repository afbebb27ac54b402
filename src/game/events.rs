//! Game Events
//!
//! Every transition reports what happened as a list of events. The server
//! traces them and renders them into the player-facing log.

use std::fmt;
use serde::{Serialize, Deserialize};

use crate::game::card::Card;
use crate::game::state::PlayerSlot;

/// Something that happened during a transition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A card went from the deck into a hand. The kind stays hidden.
    CardDrawn { player: PlayerSlot },

    /// A card went from a hand onto the discard pile.
    CardPlayed { player: PlayerSlot, card: Card },

    /// The turn moved to another player.
    TurnPassed { to: PlayerSlot },

    /// The player keeps the turn because of an Attack.
    ExtraTurn { player: PlayerSlot, remaining: u32 },

    /// An Attack put the opponent under obligation.
    TurnsOwed { player: PlayerSlot, turns: u32 },

    /// The deck was shuffled.
    DeckShuffled { player: PlayerSlot },

    /// Top cards were revealed to one player.
    FutureSeen { player: PlayerSlot, count: usize },

    /// A Nope cancelled an earlier card.
    EffectCancelled { player: PlayerSlot, card: Card },

    /// A Nope found nothing to cancel.
    NopeFizzled { player: PlayerSlot },

    /// An Explode was drawn by a player holding a Defuse.
    ExplosionPending { player: PlayerSlot },

    /// The Explode went back into the deck.
    ExplosionDefused { player: PlayerSlot },

    /// A player drew an Explode with no Defuse.
    PlayerExploded { player: PlayerSlot },

    /// The game is over.
    GameWon { winner: PlayerSlot },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameEvent::CardDrawn { player } => write!(f, "Player {player} drew a card"),
            GameEvent::CardPlayed { player, card } => write!(f, "Player {player} played {card}"),
            GameEvent::TurnPassed { to } => write!(f, "Player {to}'s turn"),
            GameEvent::ExtraTurn { player, remaining } => {
                write!(f, "Player {player} goes again ({remaining} turn(s) left)")
            }
            GameEvent::TurnsOwed { player, turns } => {
                write!(f, "Player {player} must take {turns} turns")
            }
            GameEvent::DeckShuffled { player } => write!(f, "Player {player} shuffled the deck"),
            GameEvent::FutureSeen { player, count } => {
                write!(f, "Player {player} looked at the top {count} card(s)")
            }
            GameEvent::EffectCancelled { player, card } => {
                write!(f, "Player {player} noped {card}")
            }
            GameEvent::NopeFizzled { player } => {
                write!(f, "Player {player} played Nope but there was nothing to cancel")
            }
            GameEvent::ExplosionPending { player } => {
                write!(f, "Player {player} drew an Explode and must defuse it")
            }
            GameEvent::ExplosionDefused { player } => {
                write!(f, "Player {player} defused the Explode and hid it in the deck")
            }
            GameEvent::PlayerExploded { player } => write!(f, "Player {player} exploded"),
            GameEvent::GameWon { winner } => write!(f, "Player {winner} wins!"),
        }
    }
}

/// Append-only, player-facing log of the current game.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameLog {
    lines: Vec<String>,
}

impl GameLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line per event.
    pub fn record(&mut self, events: &[GameEvent]) {
        self.lines.extend(events.iter().map(ToString::to_string));
    }

    /// Drop every line (new game).
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines, oldest first.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
