// Integration smoke test for the game server.
//
// Binds a server on localhost, connects real WebSocket clients and walks
// through seating, initial sync, a draw broadcast, a rejected third player,
// silently dropped intents and a reset.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use kittens::network::protocol::{ClientMessage, GameSnapshot, ServerMessage};
use kittens::network::server::{GameServer, ServerConfig};
use kittens::PlayerSlot;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Helper: next server message, or None once the server closed the socket.
async fn recv(client: &mut Client) -> Option<ServerMessage> {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for server");

        match frame {
            Some(Ok(Message::Text(text))) => return Some(ServerMessage::from_json(&text).unwrap()),
            Some(Ok(Message::Close(_))) | None | Some(Err(_)) => return None,
            Some(Ok(_)) => continue,
        }
    }
}

/// Helper: send a raw text frame.
async fn send_text(client: &mut Client, text: &str) {
    client.send(Message::Text(text.to_string())).await.unwrap();
}

/// Helper: send a client message.
async fn send(client: &mut Client, msg: &ClientMessage) {
    send_text(client, &msg.to_json().unwrap()).await;
}

/// Helper: expect a gameState push.
async fn recv_state(client: &mut Client) -> (GameSnapshot, Vec<String>) {
    match recv(client).await {
        Some(ServerMessage::GameState { game_state, logs }) => (game_state, logs),
        other => panic!("expected gameState, got {other:?}"),
    }
}

/// Connect and check the seat assignment plus initial sync.
async fn join(addr: SocketAddr, expected: PlayerSlot) -> (Client, GameSnapshot) {
    let (mut client, _) = connect_async(format!("ws://{addr}")).await.unwrap();

    match recv(&mut client).await {
        Some(ServerMessage::AssignPlayer { player }) => assert_eq!(player, expected),
        other => panic!("expected assignPlayer, got {other:?}"),
    }

    let (snapshot, _) = recv_state(&mut client).await;
    (client, snapshot)
}

#[tokio::test]
async fn full_game_lifecycle() {
    // 1. Start a server on a random port.
    let config = ServerConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        seed: Some(2024),
        ..Default::default()
    };
    let server = GameServer::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let server_task = tokio::spawn(server.run());

    // 2. Two players are seated in order and synced.
    let (mut alice, initial) = join(addr, PlayerSlot::Zero).await;
    assert_eq!(initial.deck_size, 21);
    assert_eq!(initial.current_player, PlayerSlot::Zero);
    assert!(!initial.game_over);

    let (mut bob, _) = join(addr, PlayerSlot::One).await;

    // 3. Player 0 draws; both see the same new state.
    send(&mut alice, &ClientMessage::DrawCard { player: PlayerSlot::Zero }).await;

    let (a, a_logs) = recv_state(&mut alice).await;
    let (b, b_logs) = recv_state(&mut bob).await;
    assert_eq!(a, b);
    assert_eq!(a_logs, b_logs);
    assert_eq!(a.deck_size, 20);
    assert_eq!(a_logs[0], "Player 0 drew a card");

    // 4. A third player is turned away.
    let (mut carol, _) = connect_async(format!("ws://{addr}")).await.unwrap();
    assert_eq!(
        recv(&mut carol).await,
        Some(ServerMessage::Error { message: "Game already in progress.".to_string() })
    );
    assert_eq!(recv(&mut carol).await, None);

    // 5. Garbage and impersonation are dropped without a reply.
    send_text(&mut bob, "not json").await;
    send_text(&mut bob, r#"{"type":"playCard","player":1,"card":"Taco"}"#).await;
    send(&mut bob, &ClientMessage::DrawCard { player: PlayerSlot::Zero }).await;

    // 6. Reset is the next thing anyone hears about.
    send(&mut bob, &ClientMessage::Reset).await;

    for client in [&mut alice, &mut bob] {
        let (snapshot, logs) = recv_state(client).await;
        assert_eq!(snapshot.deck_size, 21);
        assert!(snapshot.player_hands.iter().all(|h| h.is_empty()));
        assert!(snapshot.discard_pile.is_empty());
        assert!(!snapshot.game_over);
        assert_eq!(snapshot.winner, None);
        assert!(logs.is_empty());
    }

    // 7. Shut down.
    shutdown.shutdown();
    let result = tokio::time::timeout(Duration::from_secs(5), server_task)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
}
