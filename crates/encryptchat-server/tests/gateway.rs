/// Integration test: run the full server on loopback, connect a WebSocket
/// client, and check that replayed and live messages arrive decoded.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, Stream, StreamExt};
use tokio_tungstenite::tungstenite::Message;

use encryptchat_api::ChatRoom;
use encryptchat_crypto::ShiftKey;
use encryptchat_db::Database;
use encryptchat_gateway::{ConnectionSettings, Dispatcher};
use encryptchat_types::events::GatewayEvent;

fn room() -> Arc<ChatRoom> {
    Arc::new(ChatRoom::new(
        Database::open_in_memory().unwrap(),
        ShiftKey::new(12),
        Dispatcher::new(),
    ))
}

async fn spawn_server(room: Arc<ChatRoom>) -> SocketAddr {
    spawn_server_with(room, ConnectionSettings::default()).await
}

async fn spawn_server_with(room: Arc<ChatRoom>, settings: ConnectionSettings) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = encryptchat_server::app(room, settings);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn next_event<S>(ws: &mut S) -> GatewayEvent
where
    S: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for gateway event")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

#[tokio::test]
async fn sync_and_live_messages_arrive_decoded() {
    let room = room();
    room.db()
        .insert_message("00000000-0000-0000-0000-000000000001", "Tqxxa", "ada", 100)
        .unwrap();

    let addr = spawn_server(room.clone()).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/gateway", addr))
        .await
        .unwrap();

    assert!(matches!(next_event(&mut ws).await, GatewayEvent::Ready { .. }));

    ws.send(Message::Text(r#"{"type":"Sync","data":{"since":null}}"#.into()))
        .await
        .unwrap();

    match next_event(&mut ws).await {
        GatewayEvent::MessageCreate(msg) => {
            assert_eq!(msg.text, "Hello");
            assert_eq!(msg.author, "ada");
            assert_eq!(msg.timestamp, 100);
        }
        other => panic!("expected MessageCreate, got {:?}", other),
    }

    let resp = reqwest::Client::new()
        .post(format!("http://{}/messages", addr))
        .header("content-type", "application/json")
        .body(r#"{"text":"123! ok","author":"bob"}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);

    match next_event(&mut ws).await {
        GatewayEvent::MessageCreate(msg) => {
            assert_eq!(msg.text, "123! ok");
            assert_eq!(msg.author, "bob");
        }
        other => panic!("expected MessageCreate, got {:?}", other),
    }

    let rows = room.db().get_messages(1, None).unwrap();
    assert_eq!(rows[0].text.as_deref(), Some("123! aw"));
}

#[tokio::test]
async fn health_reports_ok() {
    let room = Arc::new(ChatRoom::new(
        Database::open_in_memory().unwrap(),
        ShiftKey::default(),
        Dispatcher::new(),
    ));
    let addr = spawn_server(room).await;

    let body = reqwest::get(format!("http://{}/health", addr))
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn message_sent_between_ready_and_sync_arrives_once() {
    let room = room();
    let addr = spawn_server(room.clone()).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/gateway", addr))
        .await
        .unwrap();

    let server_time = match next_event(&mut ws).await {
        GatewayEvent::Ready { server_time } => server_time,
        other => panic!("expected Ready, got {:?}", other),
    };

    // Land strictly after `server_time` so both the live push and the replay see it
    tokio::time::sleep(Duration::from_millis(5)).await;
    let (id, _) = room.send("Hello", "ada").unwrap();

    let sync = format!(r#"{{"type":"Sync","data":{{"since":{}}}}}"#, server_time);
    ws.send(Message::Text(sync.into())).await.unwrap();

    let mut deliveries = 0;
    while let Ok(Some(Ok(msg))) = tokio::time::timeout(Duration::from_millis(500), ws.next()).await {
        if let Message::Text(text) = msg {
            if let GatewayEvent::MessageCreate(m) = serde_json::from_str(text.as_str()).unwrap() {
                assert_eq!(m.id, id);
                assert_eq!(m.text, "Hello");
                deliveries += 1;
            }
        }
    }

    assert_eq!(deliveries, 1);
}

#[tokio::test]
async fn client_that_never_answers_pings_is_dropped() {
    let room = room();
    let settings = ConnectionSettings {
        heartbeat_interval: Duration::from_millis(100),
        ..ConnectionSettings::default()
    };
    let addr = spawn_server_with(room.clone(), settings).await;

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/gateway", addr))
        .await
        .unwrap();

    // Not polling the socket means no Pong goes back
    tokio::time::sleep(Duration::from_millis(600)).await;

    let closed = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "server kept a silent client connected");

    let dropped = tokio::time::timeout(Duration::from_secs(5), async {
        while room.dispatcher().subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    assert!(dropped.is_ok());
}
