//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use fairway_transport::{Connection, Transport, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds on port 0, connects one client, and returns both ends.
    async fn pair() -> (fairway_transport::WebSocketConnection, ClientWs) {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("should have addr");

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let (client, _) =
            tokio_tungstenite::connect_async(format!("ws://{addr}"))
                .await
                .expect("client should connect");
        let server = server_handle.await.expect("task should complete");
        (server, client)
    }

    #[tokio::test]
    async fn test_websocket_send_json_arrives_as_text_frame() {
        let (server, mut client) = pair().await;
        assert!(server.id().into_inner() > 0);

        server
            .send(br#"{"type":"gameStarted"}"#)
            .await
            .expect("send should succeed");

        let msg = client.next().await.unwrap().unwrap();
        assert!(msg.is_text(), "JSON should go out as a text frame");
        assert_eq!(msg.into_text().unwrap().as_str(), r#"{"type":"gameStarted"}"#);
    }

    #[tokio::test]
    async fn test_websocket_recv_text_and_binary() {
        let (server, mut client) = pair().await;

        client
            .send(Message::text(r#"{"type":"knock"}"#.to_string()))
            .await
            .unwrap();
        client
            .send(Message::binary(b"raw".to_vec()))
            .await
            .unwrap();

        let first = server.recv().await.unwrap().unwrap();
        assert_eq!(first, br#"{"type":"knock"}"#);
        let second = server.recv().await.unwrap().unwrap();
        assert_eq!(second, b"raw");
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_none_on_client_close() {
        let (server, mut client) = pair().await;

        client.send(Message::Close(None)).await.unwrap();

        let result = server.recv().await.expect("recv should not error");
        assert!(result.is_none(), "should return None on client close");
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending_does_not_block() {
        // A reader parked in recv() must not stop a writer on the same
        // connection. The hub relies on this.
        let (server, mut client) = pair().await;
        let server = Arc::new(server);

        let reader = {
            let server = Arc::clone(&server);
            tokio::spawn(async move { server.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(2), server.send(b"ping"))
            .await
            .expect("send must not wait for the reader")
            .expect("send should succeed");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_data().as_ref(), b"ping");

        client.send(Message::text("pong".to_string())).await.unwrap();
        let received = reader.await.unwrap().unwrap().unwrap();
        assert_eq!(received, b"pong");
    }

    #[tokio::test]
    async fn test_accept_stalled_upgrade_times_out_and_listener_survives() {
        let mut transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind")
            .with_upgrade_timeout(Duration::from_millis(50));
        let addr = transport.local_addr().expect("should have addr");

        // Plain TCP, never sends the upgrade request.
        let _silent = tokio::net::TcpStream::connect(addr).await.unwrap();
        assert!(transport.accept().await.is_err());

        let client = tokio::spawn(async move {
            tokio_tungstenite::connect_async(format!("ws://{addr}")).await
        });
        let server = transport.accept().await.expect("next client is accepted");
        assert!(server.peer_addr().ip().is_loopback());
        client.await.unwrap().expect("client should connect");
    }
}
