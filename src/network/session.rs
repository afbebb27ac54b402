//! Seat Assignment
//!
//! Maps live connections to the two player slots. First come, first seated;
//! a third connection is turned away.

use std::fmt;

use crate::game::state::PlayerSlot;

/// Server-assigned connection identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Seat assignment errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// Both slots are taken.
    #[error("Game already in progress.")]
    GameFull,

    /// Connection already holds a slot.
    #[error("Connection {0} is already seated")]
    AlreadySeated(ConnectionId),
}

/// Connection → slot table. No two connections share a slot.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    slots: [Option<ConnectionId>; 2],
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seat `conn` in the lowest free slot.
    pub fn assign(&mut self, conn: ConnectionId) -> Result<PlayerSlot, SessionError> {
        if self.slot_of(conn).is_some() {
            return Err(SessionError::AlreadySeated(conn));
        }

        let slot = PlayerSlot::ALL
            .into_iter()
            .find(|slot| self.slots[slot.index()].is_none())
            .ok_or(SessionError::GameFull)?;

        self.slots[slot.index()] = Some(conn);
        Ok(slot)
    }

    /// Free the slot held by `conn`, if any.
    pub fn release(&mut self, conn: ConnectionId) -> Option<PlayerSlot> {
        let slot = self.slot_of(conn)?;
        self.slots[slot.index()] = None;
        Some(slot)
    }

    /// Slot held by `conn`.
    pub fn slot_of(&self, conn: ConnectionId) -> Option<PlayerSlot> {
        PlayerSlot::ALL
            .into_iter()
            .find(|slot| self.slots[slot.index()] == Some(conn))
    }

    /// Connection holding `slot`.
    pub fn holder(&self, slot: PlayerSlot) -> Option<ConnectionId> {
        self.slots[slot.index()]
    }

    /// Number of seated connections.
    pub fn occupied_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Seated connections in slot order.
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.slots.iter().flatten().copied().collect()
    }
}
