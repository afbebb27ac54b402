//! Network Layer
//!
//! WebSocket server for the two-player game.
//! This layer is **non-deterministic** - all rules run through `game/`.

pub mod protocol;
pub mod session;
pub mod broadcast;
pub mod server;

pub use protocol::{ClientMessage, ServerMessage, GameSnapshot};
pub use session::{ConnectionId, SessionRegistry, SessionError};
pub use broadcast::Broadcaster;
pub use server::{GameServer, GameActor, ServerConfig, ServerEvent, GameServerError, ShutdownHandle};
