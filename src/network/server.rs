//! WebSocket Game Server
//!
//! Accept loop, per-connection tasks and the game actor. Connection tasks
//! only parse frames and forward them; the actor owns the game and applies
//! events one at a time, in arrival order.

use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::core::rng::entropy_seed;
use crate::core::hash::short_hex;
use crate::game::events::GameEvent;
use crate::game::state::GameConfig;
use crate::game::turn::TurnController;
use crate::network::broadcast::Broadcaster;
use crate::network::protocol::{ClientMessage, GameSnapshot, ServerMessage};
use crate::network::session::{ConnectionId, SessionRegistry};

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Base seed for every game. Random when unset.
    pub seed: Option<u64>,
    /// Include the game log in state pushes.
    pub send_logs: bool,
    /// Capacity of the actor's event queue.
    pub max_queue: usize,
    /// Capacity of each connection's outbox.
    pub outbox_capacity: usize,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3001)),
            seed: None,
            send_logs: true,
            max_queue: 256,
            outbox_capacity: 64,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from any key lookup. Unset or unparsable values keep
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: lookup("KITTENS_BIND_ADDR")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.bind_addr),
            seed: lookup("KITTENS_SEED").and_then(|v| v.parse().ok()),
            send_logs: lookup("KITTENS_SEND_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(defaults.send_logs),
            max_queue: lookup("KITTENS_MAX_QUEUE")
                .and_then(|v| v.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_queue),
            ..defaults
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The game actor stopped unexpectedly.
    #[error("Game actor failed: {0}")]
    Actor(#[from] tokio::task::JoinError),
}

// =============================================================================
// GAME ACTOR
// =============================================================================

/// Input to the game actor.
#[derive(Debug)]
pub enum ServerEvent {
    /// A WebSocket handshake completed.
    Connected {
        /// New connection.
        conn: ConnectionId,
        /// Queue drained by the connection's writer task.
        outbox: mpsc::Sender<ServerMessage>,
    },
    /// A well-formed message arrived.
    Message {
        /// Sender.
        conn: ConnectionId,
        /// Parsed message.
        message: ClientMessage,
    },
    /// The connection closed.
    Disconnected {
        /// Closed connection.
        conn: ConnectionId,
    },
}

/// Sole owner of the game, the seat table and the outboxes.
pub struct GameActor {
    controller: TurnController,
    registry: SessionRegistry,
    broadcaster: Broadcaster,
    send_logs: bool,
}

impl GameActor {
    /// Create an actor for a fresh game.
    pub fn new(config: &ServerConfig) -> Self {
        let seed = config.seed.unwrap_or_else(entropy_seed);
        info!("Base seed: {}", seed);

        let controller = TurnController::new(GameConfig::default(), seed);
        Self::with_controller(controller, config.send_logs)
    }

    /// Create an actor around an existing controller.
    pub fn with_controller(controller: TurnController, send_logs: bool) -> Self {
        Self {
            controller,
            registry: SessionRegistry::new(),
            broadcaster: Broadcaster::new(),
            send_logs,
        }
    }

    /// Game controller.
    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    /// Seat table.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Process events until the queue closes or shutdown is signalled.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ServerEvent>,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                _ = shutdown_rx.recv() => break,
            }
        }

        debug!("Game actor stopped");
    }

    /// Apply one event.
    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected { conn, outbox } => self.on_connect(conn, outbox),
            ServerEvent::Message { conn, message } => self.on_message(conn, message),
            ServerEvent::Disconnected { conn } => self.release(conn),
        }
    }

    /// Seat a connection whose WebSocket handshake has completed. Seats go
    /// out in handshake-completion order, not TCP accept order.
    fn on_connect(&mut self, conn: ConnectionId, outbox: mpsc::Sender<ServerMessage>) {
        let slot = match self.registry.assign(conn) {
            Ok(slot) => slot,
            Err(e) => {
                warn!(%conn, "Rejecting connection: {}", e);
                // Dropping the outbox afterwards closes the socket.
                let _ = outbox.try_send(ServerMessage::error(e.to_string()));
                return;
            }
        };

        info!(%conn, %slot, "Player seated");
        self.broadcaster.attach(conn, outbox);

        let delivered = self.broadcaster.send_to(conn, ServerMessage::AssignPlayer { player: slot })
            && self.broadcaster.send_to(conn, self.state_message());
        if !delivered {
            self.release(conn);
        }
    }

    #[instrument(level = "debug", skip(self, message))]
    fn on_message(&mut self, conn: ConnectionId, message: ClientMessage) {
        let Some(slot) = self.registry.slot_of(conn) else {
            debug!("Message from unseated connection dropped");
            return;
        };

        if let Some(claimed) = message.claimed_slot() {
            if claimed != slot {
                debug!(%slot, %claimed, "Player field does not match seat");
                return;
            }
        }

        let transition = match self.controller.apply(message.into_action(slot)) {
            Ok(transition) => transition,
            Err(e) => {
                debug!(%slot, "Illegal action dropped: {}", e);
                return;
            }
        };

        for event in &transition.events {
            match event {
                GameEvent::GameWon { winner } => info!(%winner, "Game over"),
                _ => debug!(%slot, "{}", event),
            }
        }

        if let Some(cards) = transition.reveal {
            if !self.broadcaster.send_to(conn, ServerMessage::SeeFuture { cards }) {
                self.release(conn);
            }
        }

        self.broadcast_state();
    }

    fn release(&mut self, conn: ConnectionId) {
        self.broadcaster.detach(conn);
        if let Some(slot) = self.registry.release(conn) {
            info!(%conn, %slot, "Slot released");
        }
    }

    fn state_message(&self) -> ServerMessage {
        let logs = if self.send_logs {
            self.controller.log().lines().to_vec()
        } else {
            Vec::new()
        };

        ServerMessage::GameState {
            game_state: GameSnapshot::from_state(self.controller.state()),
            logs,
        }
    }

    fn broadcast_state(&mut self) {
        let msg = self.state_message();
        debug!(
            hash = %short_hex(&self.controller.state().compute_hash()),
            "Broadcasting state"
        );

        for conn in self.broadcaster.broadcast(&msg) {
            self.release(conn);
        }
    }
}

// =============================================================================
// SERVER
// =============================================================================

/// Cloneable handle that stops a running server.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    /// Signal shutdown to the accept loop, the actor and every connection.
    pub fn shutdown(&self) {
        let _ = self.tx.send(());
    }
}

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Bound listener.
    listener: TcpListener,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
    /// Accept loop's subscription, taken at bind so no signal is missed.
    shutdown_rx: broadcast::Receiver<()>,
}

impl GameServer {
    /// Bind the listener.
    pub async fn bind(config: ServerConfig) -> Result<Self, GameServerError> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        Ok(Self {
            config,
            listener,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Address actually bound (useful with port 0).
    pub fn local_addr(&self) -> Result<SocketAddr, GameServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    /// Run until shutdown.
    #[instrument(skip(self))]
    pub async fn run(self) -> Result<(), GameServerError> {
        let addr = self.local_addr()?;
        let Self { config, listener, shutdown_tx, mut shutdown_rx } = self;
        info!("Game server v{} listening on {}", config.version, addr);

        let (event_tx, event_rx) = mpsc::channel(config.max_queue);
        let actor = GameActor::new(&config);
        let actor_handle = tokio::spawn(actor.run(event_rx, shutdown_tx.subscribe()));

        let mut next_id = 0u64;

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            next_id += 1;
                            let conn = ConnectionId(next_id);
                            info!(%conn, "New connection from {}", peer);

                            tokio::spawn(handle_connection(
                                stream,
                                conn,
                                event_tx.clone(),
                                shutdown_tx.subscribe(),
                                config.outbox_capacity,
                            ));
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        drop(event_tx);
        actor_handle.await?;

        Ok(())
    }
}

/// Drive one WebSocket connection.
///
/// The reader forwards parsed messages to the actor. The writer drains the
/// outbox and closes the socket once the actor drops it.
#[instrument(skip(stream, events, shutdown_rx))]
async fn handle_connection(
    stream: TcpStream,
    conn: ConnectionId,
    events: mpsc::Sender<ServerEvent>,
    mut shutdown_rx: broadcast::Receiver<()>,
    outbox_capacity: usize,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            error!("WebSocket handshake failed: {}", e);
            return;
        }
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerMessage>(outbox_capacity);

    if events.send(ServerEvent::Connected { conn, outbox: outbox_tx }).await.is_err() {
        return;
    }

    let mut writer = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            let text = match msg.to_json() {
                Ok(t) => t,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };
            if ws_sender.send(Message::Text(text)).await.is_err() {
                return;
            }
        }
        let _ = ws_sender.close().await;
    });

    loop {
        tokio::select! {
            _ = &mut writer => {
                debug!("Outbox closed");
                break;
            }
            frame = ws_receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => match ClientMessage::from_json(&text) {
                        Ok(message) => {
                            if events.send(ServerEvent::Message { conn, message }).await.is_err() {
                                break;
                            }
                        }
                        Err(e) => debug!("Malformed message dropped: {}", e),
                    },
                    Some(Ok(Message::Binary(_))) => debug!("Binary frame dropped"),
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("Client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket error: {}", e);
                        break;
                    }
                    _ => {}
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }

    let _ = events.send(ServerEvent::Disconnected { conn }).await;
    writer.abort();
    debug!("Connection cleaned up");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use crate::core::rng::DeterministicRng;
    use crate::game::card::Card;
    use crate::game::deck::Deck;
    use crate::game::state::{GameState, PlayerSlot};

    const P0: PlayerSlot = PlayerSlot::Zero;
    const P1: PlayerSlot = PlayerSlot::One;

    fn actor_with(deck: Vec<Card>, hand0: &[Card], send_logs: bool) -> GameActor {
        let config = GameConfig::default();
        let mut state = GameState::new(&config, DeterministicRng::new(11));
        state.deck = Deck::from_cards(deck);
        for card in hand0 {
            state.hand_mut(P0).add(*card);
        }
        GameActor::with_controller(TurnController::with_state(config, 11, state), send_logs)
    }

    fn connect(actor: &mut GameActor, id: u64) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(16);
        actor.handle_event(ServerEvent::Connected { conn: ConnectionId(id), outbox: tx });
        rx
    }

    fn send(actor: &mut GameActor, id: u64, message: ClientMessage) {
        actor.handle_event(ServerEvent::Message { conn: ConnectionId(id), message });
    }

    fn drain(rx: &mut mpsc::Receiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            out.push(msg);
        }
        out
    }

    fn snapshot_of(msg: &ServerMessage) -> (&GameSnapshot, &Vec<String>) {
        match msg {
            ServerMessage::GameState { game_state, logs } => (game_state, logs),
            other => panic!("expected gameState, got {other:?}"),
        }
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 3001);
        assert!(config.send_logs);
        assert_eq!(config.seed, None);
        assert_eq!(config.max_queue, 256);
    }

    #[test]
    fn test_server_config_from_lookup() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("KITTENS_BIND_ADDR", "127.0.0.1:4000"),
            ("KITTENS_SEED", "99"),
            ("KITTENS_SEND_LOGS", "false"),
            ("KITTENS_MAX_QUEUE", "nope"),
        ]);
        let config = ServerConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.bind_addr, "127.0.0.1:4000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.seed, Some(99));
        assert!(!config.send_logs);
        assert_eq!(config.max_queue, 256);
    }

    #[tokio::test]
    async fn test_seating_and_initial_sync() {
        let mut actor = actor_with(vec![Card::Skip, Card::Nope], &[], true);
        let mut rx1 = connect(&mut actor, 1);
        let mut rx2 = connect(&mut actor, 2);

        let msgs = drain(&mut rx1);
        assert_eq!(msgs[0], ServerMessage::AssignPlayer { player: P0 });
        assert_eq!(snapshot_of(&msgs[1]).0.deck_size, 2);

        let msgs = drain(&mut rx2);
        assert_eq!(msgs[0], ServerMessage::AssignPlayer { player: P1 });
        assert_eq!(msgs.len(), 2);
    }

    #[tokio::test]
    async fn test_third_connection_rejected() {
        let mut actor = actor_with(vec![Card::Skip], &[], true);
        let _rx1 = connect(&mut actor, 1);
        let _rx2 = connect(&mut actor, 2);
        let mut rx3 = connect(&mut actor, 3);

        assert_eq!(rx3.recv().await, Some(ServerMessage::error("Game already in progress.")));
        assert_eq!(rx3.recv().await, None);
        assert_eq!(actor.registry().occupied_count(), 2);
    }

    #[tokio::test]
    async fn test_draw_broadcasts_to_all() {
        let mut actor = actor_with(vec![Card::Skip, Card::Nope], &[], true);
        let mut rx1 = connect(&mut actor, 1);
        let mut rx2 = connect(&mut actor, 2);
        drain(&mut rx1);
        drain(&mut rx2);

        send(&mut actor, 1, ClientMessage::DrawCard { player: P0 });

        let a = drain(&mut rx1);
        let b = drain(&mut rx2);
        assert_eq!(a.len(), 1);
        assert_eq!(a, b);

        let (snapshot, logs) = snapshot_of(&a[0]);
        assert_eq!(snapshot.deck_size, 1);
        assert_eq!(snapshot.player_hands[0].count(Card::Nope), 1);
        assert_eq!(snapshot.current_player, P1);
        assert_eq!(logs, &vec!["Player 0 drew a card".to_string(), "Player 1's turn".to_string()]);
    }

    #[tokio::test]
    async fn test_illegal_and_mismatched_messages_are_silent() {
        let mut actor = actor_with(vec![Card::Skip, Card::Nope], &[], true);
        let mut rx1 = connect(&mut actor, 1);
        let mut rx2 = connect(&mut actor, 2);
        drain(&mut rx1);
        drain(&mut rx2);
        let before = actor.controller().state().compute_hash();

        // Skip not held
        send(&mut actor, 1, ClientMessage::PlayCard { player: P0, card: Card::Skip, position: None });
        // Not player 1's turn
        send(&mut actor, 2, ClientMessage::DrawCard { player: P1 });
        // Claims the other seat
        send(&mut actor, 2, ClientMessage::DrawCard { player: P0 });

        assert!(drain(&mut rx1).is_empty());
        assert!(drain(&mut rx2).is_empty());
        assert_eq!(actor.controller().state().compute_hash(), before);
    }

    #[tokio::test]
    async fn test_see_future_is_private() {
        let mut actor = actor_with(vec![Card::Skip, Card::Attack, Card::Nope], &[Card::SeeFuture], true);
        let mut rx1 = connect(&mut actor, 1);
        let mut rx2 = connect(&mut actor, 2);
        drain(&mut rx1);
        drain(&mut rx2);

        send(&mut actor, 1, ClientMessage::PlayCard { player: P0, card: Card::SeeFuture, position: None });

        let a = drain(&mut rx1);
        assert_eq!(a[0], ServerMessage::SeeFuture { cards: vec![Card::Nope, Card::Attack, Card::Skip] });
        assert!(matches!(a[1], ServerMessage::GameState { .. }));

        let b = drain(&mut rx2);
        assert_eq!(b.len(), 1);
        assert!(matches!(b[0], ServerMessage::GameState { .. }));
    }

    #[tokio::test]
    async fn test_logs_can_be_disabled() {
        let mut actor = actor_with(vec![Card::Skip, Card::Nope], &[], false);
        let mut rx1 = connect(&mut actor, 1);
        drain(&mut rx1);

        send(&mut actor, 1, ClientMessage::DrawCard { player: P0 });
        let msgs = drain(&mut rx1);
        assert!(snapshot_of(&msgs[0]).1.is_empty());
    }

    #[tokio::test]
    async fn test_reset_broadcasts_fresh_game() {
        let mut actor = actor_with(vec![Card::Skip, Card::Explode], &[], true);
        let mut rx1 = connect(&mut actor, 1);
        let mut rx2 = connect(&mut actor, 2);
        send(&mut actor, 1, ClientMessage::DrawCard { player: P0 });
        assert!(actor.controller().state().game_over);
        drain(&mut rx1);
        drain(&mut rx2);

        send(&mut actor, 2, ClientMessage::Reset);

        for rx in [&mut rx1, &mut rx2] {
            let msgs = drain(rx);
            let (snapshot, logs) = snapshot_of(&msgs[0]);
            assert_eq!(snapshot.deck_size, 21);
            assert!(!snapshot.game_over);
            assert_eq!(snapshot.winner, None);
            assert!(logs.is_empty());
        }
    }

    #[tokio::test]
    async fn test_disconnect_releases_slot_only() {
        let mut actor = actor_with(vec![Card::Skip, Card::Nope], &[], true);
        let _rx1 = connect(&mut actor, 1);
        let _rx2 = connect(&mut actor, 2);
        send(&mut actor, 1, ClientMessage::DrawCard { player: P0 });
        let before = actor.controller().state().compute_hash();

        actor.handle_event(ServerEvent::Disconnected { conn: ConnectionId(1) });
        assert_eq!(actor.registry().occupied_count(), 1);
        assert_eq!(actor.controller().state().compute_hash(), before);

        let mut rx3 = connect(&mut actor, 3);
        assert_eq!(rx3.recv().await, Some(ServerMessage::AssignPlayer { player: P0 }));
    }

    #[tokio::test]
    async fn test_dead_outbox_released_on_broadcast() {
        let mut actor = actor_with(vec![Card::Skip, Card::Nope], &[], true);
        let _rx1 = connect(&mut actor, 1);
        let rx2 = connect(&mut actor, 2);
        drop(rx2);

        send(&mut actor, 1, ClientMessage::DrawCard { player: P0 });

        assert_eq!(actor.registry().occupied_count(), 1);
        assert_eq!(actor.registry().slot_of(ConnectionId(2)), None);
    }

    #[tokio::test]
    async fn test_server_bind_and_shutdown() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            seed: Some(1),
            ..Default::default()
        };
        let server = GameServer::bind(config).await.unwrap();
        assert_ne!(server.local_addr().unwrap().port(), 0);

        let handle = server.shutdown_handle();
        let task = tokio::spawn(server.run());
        handle.shutdown();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
