//! # Exploding Kittens Duel Server
//!
//! Authoritative two-player card game server over WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      KITTENS SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Seeded Xorshift128+ PRNG                  │
//! │  └── hash.rs     - State hashing and seed derivation         │
//! │                                                              │
//! │  game/           - Rules (deterministic)                     │
//! │  ├── card.rs     - Card kinds                                │
//! │  ├── deck.rs     - Draw pile                                 │
//! │  ├── hand.rs     - Per-player card multiset                  │
//! │  ├── state.rs    - Game state and obligations                │
//! │  ├── events.rs   - Transition events and game log            │
//! │  ├── effects.rs  - Card effect resolution                    │
//! │  └── turn.rs     - Action validation, turn state machine     │
//! │                                                              │
//! │  network/        - Networking (non-deterministic)            │
//! │  ├── server.rs   - Accept loop, connections, game actor      │
//! │  ├── protocol.rs - Message types                             │
//! │  ├── session.rs  - Seat assignment                           │
//! │  └── broadcast.rs- Outbound fan-out                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! The `core/` and `game/` modules never read the clock or the OS RNG.
//! Given the base seed and the same sequence of actions, every game plays
//! out identically, and `GameState::compute_hash` agrees.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use game::card::Card;
pub use game::state::{GameState, PlayerSlot};
pub use game::turn::{Action, TurnController};
pub use network::server::{GameServer, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
