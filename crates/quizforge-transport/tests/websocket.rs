//! Integration tests for the WebSocket transport.
//!
//! These spin up a real listener on an OS-assigned port and talk to it
//! with a `tokio-tungstenite` client.

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use futures_util::{SinkExt, StreamExt};
    use quizforge_transport::{Connection, Transport, WebSocketTransport};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    async fn connect_client(addr: &str) -> ClientWs {
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
            .await
            .expect("client should connect");
        ws
    }

    /// Binds on port 0 and returns the transport plus its address.
    async fn bind_any() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("bound").to_string();
        (transport, addr)
    }

    #[tokio::test]
    async fn test_websocket_text_frames_round_trip() {
        let (mut transport, addr) = bind_any().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&addr).await;
        let conn = server.await.expect("accept task");

        client
            .send(Message::Text(r#"{"event":"create_room"}"#.into()))
            .await
            .unwrap();
        let frame = conn.recv().await.unwrap();
        assert_eq!(frame.as_deref(), Some(r#"{"event":"create_room"}"#));

        conn.send(r#"{"event":"countdown","data":{"count":3}}"#)
            .await
            .unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(
            msg.into_text().unwrap().as_str(),
            r#"{"event":"countdown","data":{"count":3}}"#
        );
    }

    #[tokio::test]
    async fn test_websocket_binary_utf8_is_accepted() {
        let (mut transport, addr) = bind_any().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&addr).await;
        let conn = server.await.unwrap();

        client
            .send(Message::Binary(b"hello".to_vec().into()))
            .await
            .unwrap();
        assert_eq!(conn.recv().await.unwrap().as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_websocket_send_while_recv_pending() {
        let (mut transport, addr) = bind_any().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&addr).await;
        let conn = Arc::new(server.await.unwrap());

        // Park a reader on the connection, then push a frame from another
        // task. The send must not wait for the read.
        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };
        tokio::task::yield_now().await;

        conn.send("pushed").await.unwrap();
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "pushed");

        client.send(Message::Text("reply".into())).await.unwrap();
        let got = reader.await.unwrap().unwrap();
        assert_eq!(got.as_deref(), Some("reply"));
    }

    #[tokio::test]
    async fn test_websocket_clean_close_yields_none() {
        let (mut transport, addr) = bind_any().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&addr).await;
        let conn = server.await.unwrap();

        client.close(None).await.unwrap();
        assert_eq!(conn.recv().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_websocket_ping_counts_as_activity() {
        let (mut transport, addr) = bind_any().await;
        let server = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&addr).await;
        let conn = Arc::new(server.await.unwrap());

        // A parked reader sees the ping even though `recv` never returns it.
        let reader = {
            let conn = Arc::clone(&conn);
            tokio::spawn(async move { conn.recv().await })
        };

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(conn.idle_for() >= Duration::from_millis(250));

        client.send(Message::Ping(Vec::new().into())).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(
            conn.idle_for() < Duration::from_millis(200),
            "ping should reset idle time, got {:?}",
            conn.idle_for()
        );
        assert!(!reader.is_finished());

        client.send(Message::Text("after".into())).await.unwrap();
        let got = reader.await.unwrap().unwrap();
        assert_eq!(got.as_deref(), Some("after"));
    }

    #[tokio::test]
    async fn test_connection_ids_are_unique() {
        let (mut transport, addr) = bind_any().await;
        let server = tokio::spawn(async move {
            let a = transport.accept().await.unwrap();
            let b = transport.accept().await.unwrap();
            (a, b)
        });

        let _c1 = connect_client(&addr).await;
        let _c2 = connect_client(&addr).await;
        let (a, b) = server.await.unwrap();
        assert_ne!(a.id(), b.id());
    }
}
