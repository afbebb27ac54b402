//! Core deterministic primitives.
//!
//! Seeded randomness and state hashing. Nothing in here knows about cards
//! or connections.

pub mod rng;
pub mod hash;

// Re-export core types
pub use rng::{DeterministicRng, derive_game_seed, entropy_seed};
pub use hash::{StateHash, StateHasher};
