//! End-to-end tests: a real server on a random port, driven by WebSocket
//! clients speaking JSON.

use std::time::Duration;

use fairway::prelude::*;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address and a hub
/// handle.
async fn start_server() -> (String, HubHandle) {
    let server = FairwayServerBuilder::new()
        .bind("127.0.0.1:0")
        .id_generator(SequentialIdGenerator::default())
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let hub = server.hub();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(10)).await;
    (addr, hub)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_raw(ws: &mut ClientWs, text: &str) {
    ws.send(Message::text(text.to_owned())).await.expect("send");
}

async fn send(ws: &mut ClientWs, message: serde_json::Value) {
    send_raw(ws, &message.to_string()).await;
}

async fn recv(ws: &mut ClientWs) -> ServerMessage {
    let msg = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for a message")
        .expect("stream ended")
        .expect("recv");
    assert!(msg.is_text(), "server replies with text frames");
    serde_json::from_slice(&msg.into_data()).expect("decode")
}

async fn authenticate(ws: &mut ClientWs) -> (PlayerId, String) {
    send(ws, serde_json::json!({ "type": "authenticate" })).await;
    match recv(ws).await {
        ServerMessage::Authenticated {
            player_id,
            session_token,
            reconnected: false,
        } => (player_id, session_token),
        other => panic!("expected authenticated, got {other:?}"),
    }
}

fn error_text(message: ServerMessage) -> String {
    match message {
        ServerMessage::Error { message } => message,
        other => panic!("expected error, got {other:?}"),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_authenticate_and_create_room_over_websocket() {
    let (addr, hub) = start_server().await;
    let mut ws = connect(&addr).await;

    let (player_id, token) = authenticate(&mut ws).await;
    assert_eq!(player_id.as_str(), "player-1");

    send(&mut ws, serde_json::json!({ "type": "createRoom" })).await;
    match recv(&mut ws).await {
        ServerMessage::RoomJoined {
            player_id: joined,
            session_token,
            room_state,
        } => {
            assert_eq!(joined, player_id);
            assert_eq!(session_token, token);
            assert_eq!(room_state.id.as_str().len(), 6);
            assert_eq!(room_state.players.len(), 1);
        }
        other => panic!("expected roomJoined, got {other:?}"),
    }

    let snapshot = hub.snapshot().await.unwrap();
    assert_eq!(snapshot.rooms.len(), 1);
    assert!(fairway::validate_hub(&snapshot).is_empty());
}

#[tokio::test]
async fn test_malformed_frames_return_error_and_keep_connection() {
    let (addr, _hub) = start_server().await;
    let mut ws = connect(&addr).await;

    send_raw(&mut ws, "this is not json").await;
    assert_eq!(error_text(recv(&mut ws).await), "Invalid message format");

    send(&mut ws, serde_json::json!({ "noType": true })).await;
    assert_eq!(error_text(recv(&mut ws).await), "Invalid message format");

    send(&mut ws, serde_json::json!({ "type": "fly" })).await;
    assert_eq!(error_text(recv(&mut ws).await), "Unknown message type: fly");

    // Still usable afterwards.
    authenticate(&mut ws).await;
}

#[tokio::test]
async fn test_two_clients_see_each_other_join() {
    let (addr, _hub) = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    authenticate(&mut a).await;
    authenticate(&mut b).await;

    send(&mut a, serde_json::json!({ "type": "createRoom" })).await;
    let room_id = match recv(&mut a).await {
        ServerMessage::RoomJoined { room_state, .. } => room_state.id,
        other => panic!("expected roomJoined, got {other:?}"),
    };

    send(&mut b, serde_json::json!({ "type": "joinRoom", "roomId": room_id })).await;
    assert!(matches!(recv(&mut b).await, ServerMessage::RoomJoined { .. }));

    match recv(&mut a).await {
        ServerMessage::RoomStateUpdate { room_state } => {
            assert_eq!(room_state.players.len(), 2);
            assert!(room_state.players.iter().all(|p| p.is_connected));
        }
        other => panic!("expected roomStateUpdate, got {other:?}"),
    }
}

#[tokio::test]
async fn test_closed_socket_marks_player_disconnected() {
    let (addr, hub) = start_server().await;
    let mut a = connect(&addr).await;
    let mut b = connect(&addr).await;
    authenticate(&mut a).await;
    authenticate(&mut b).await;

    send(&mut a, serde_json::json!({ "type": "createRoom" })).await;
    let room_id = match recv(&mut a).await {
        ServerMessage::RoomJoined { room_state, .. } => room_state.id,
        other => panic!("expected roomJoined, got {other:?}"),
    };
    send(&mut b, serde_json::json!({ "type": "joinRoom", "roomId": room_id })).await;
    recv(&mut b).await;
    recv(&mut b).await;

    a.close(None).await.expect("close");
    drop(a);

    match recv(&mut b).await {
        ServerMessage::RoomStateUpdate { room_state } => {
            assert!(!room_state.players[0].is_connected);
            assert!(room_state.players[1].is_connected);
        }
        other => panic!("expected roomStateUpdate, got {other:?}"),
    }
    let snapshot = hub.snapshot().await.unwrap();
    assert_eq!(snapshot.rooms[&room_id].members().len(), 2, "seat held for the grace period");
}
