//! Game Logic Module
//!
//! All rules code. Deterministic given the seed; no I/O.
//!
//! ## Module Structure
//!
//! - `card`: Card kinds and their wire names
//! - `deck`: Draw pile
//! - `hand`: Per-player card multiset
//! - `state`: Game state, player slots, rule constants
//! - `events`: Transition events and the player-facing log
//! - `effects`: Card effect resolution
//! - `turn`: Action validation and the turn state machine

pub mod card;
pub mod deck;
pub mod hand;
pub mod state;
pub mod events;
pub mod effects;
pub mod turn;

// Re-export key types
pub use card::Card;
pub use deck::{Deck, DeckError};
pub use hand::Hand;
pub use state::{GameConfig, GameState, PlayerSlot, TurnPhase};
pub use events::{GameEvent, GameLog};
pub use turn::{Action, IllegalAction, Transition, TurnController};
