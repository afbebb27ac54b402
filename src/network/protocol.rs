//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. Every
//! message is a JSON object tagged by its `type` field.

use serde::{Serialize, Deserialize};

use crate::core::hash::StateHash;
use crate::game::card::Card;
use crate::game::hand::Hand;
use crate::game::state::{GameState, PlayerSlot};
use crate::game::turn::Action;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Draw the top card.
    DrawCard {
        /// Slot the client claims to be.
        player: PlayerSlot,
    },

    /// Play a card from hand.
    PlayCard {
        /// Slot the client claims to be.
        player: PlayerSlot,
        /// Card to play.
        card: Card,
        /// Reinsertion depth for a Defuse (0 = top).
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
    },

    /// Start a new game.
    Reset,
}

impl ClientMessage {
    /// Slot named in the message, if any.
    pub fn claimed_slot(&self) -> Option<PlayerSlot> {
        match self {
            ClientMessage::DrawCard { player } | ClientMessage::PlayCard { player, .. } => {
                Some(*player)
            }
            ClientMessage::Reset => None,
        }
    }

    /// Turn into a game action for `slot`.
    pub fn into_action(self, slot: PlayerSlot) -> Action {
        match self {
            ClientMessage::DrawCard { .. } => Action::DrawCard(slot),
            ClientMessage::PlayCard { card, position, .. } => Action::PlayCard { slot, card, position },
            ClientMessage::Reset => Action::Reset,
        }
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Slot given to this connection. Sent once, right after accept.
    AssignPlayer {
        /// Assigned slot.
        player: PlayerSlot,
    },

    /// Full state push.
    GameState {
        /// Public view of the state.
        #[serde(rename = "gameState")]
        game_state: GameSnapshot,
        /// Log lines, oldest first. Empty when logs are disabled.
        logs: Vec<String>,
    },

    /// Private See Future reveal, top card first.
    SeeFuture {
        /// Revealed cards.
        cards: Vec<Card>,
    },

    /// Rejection notice. The connection is closed after it.
    Error {
        /// Human-readable message.
        message: String,
    },
}

impl ServerMessage {
    /// Build an error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }
}

/// What clients see of the game state.
///
/// Deck order stays on the server; clients only learn its size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// Cards left to draw.
    pub deck_size: usize,
    /// Hands, indexed by slot.
    pub player_hands: [Hand; 2],
    /// Whose turn it is.
    pub current_player: PlayerSlot,
    /// Discard pile, oldest first.
    pub discard_pile: Vec<Card>,
    /// Whether a player has exploded.
    pub game_over: bool,
    /// Winning slot once the game is over.
    pub winner: Option<PlayerSlot>,
    /// Turns the current player still owes.
    pub pending_turns: u32,
    /// Slot that must play a Defuse.
    pub pending_explosion: Option<PlayerSlot>,
    /// Hex SHA-256 of the full server state.
    pub state_hash: String,
}

impl GameSnapshot {
    /// Capture the public part of `state`.
    pub fn from_state(state: &GameState) -> Self {
        let hash: StateHash = state.compute_hash();

        Self {
            deck_size: state.deck.size(),
            player_hands: state.player_hands.clone(),
            current_player: state.current_player,
            discard_pile: state.discard_pile.clone(),
            game_over: state.game_over,
            winner: state.winner,
            pending_turns: state.pending_turns,
            pending_explosion: state.pending_explosion,
            state_hash: hex::encode(hash),
        }
    }
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
