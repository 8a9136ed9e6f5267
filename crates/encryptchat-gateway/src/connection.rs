use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use uuid::Uuid;

use encryptchat_types::api::MessageResponse;
use encryptchat_types::events::{GatewayCommand, GatewayEvent};

use crate::dispatcher::{Dispatcher, MessageEvent};

/// Heartbeat interval: server sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const MAX_MISSED_PONGS: u8 = 2;

/// Most messages a single `Sync` replays (the newest ones after `since`).
pub const REPLAY_LIMIT: u32 = 200;

/// How many delivered message ids each connection remembers for dedup.
const DELIVERED_CAPACITY: usize = 4096;
const REPLAY_CHANNEL_CAPACITY: usize = 64;

/// Turns stored messages into what clients are allowed to see.
pub trait MessageSource: Send + Sync + 'static {
    /// Decode a freshly broadcast message.
    fn reveal(&self, event: &MessageEvent) -> MessageResponse;

    /// At most `limit` stored messages newer than `since` (the newest ones),
    /// decoded, oldest first. Blocking.
    fn replay(&self, since: Option<i64>, limit: u32) -> anyhow::Result<Vec<MessageResponse>>;
}

/// Per-connection tunables.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub heartbeat_interval: Duration,
    pub replay_limit: u32,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: HEARTBEAT_INTERVAL,
            replay_limit: REPLAY_LIMIT,
        }
    }
}

/// Ids already sent on one connection. Live broadcasts and `Sync` replays
/// overlap, and each message must reach the client once.
struct DeliveredIds {
    order: VecDeque<Uuid>,
    seen: HashSet<Uuid>,
    capacity: usize,
}

impl DeliveredIds {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns false if `id` was already delivered. The nil id marks rows
    /// whose id was corrupt; those are never treated as duplicates.
    fn insert(&mut self, id: Uuid) -> bool {
        if id.is_nil() {
            return true;
        }
        if !self.seen.insert(id) {
            return false;
        }
        self.order.push_back(id);
        if self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
            }
        }
        true
    }
}

/// Handle a single WebSocket connection until the client goes away.
pub async fn handle_connection(
    socket: WebSocket,
    dispatcher: Dispatcher,
    source: Arc<dyn MessageSource>,
    settings: ConnectionSettings,
) {
    let conn_id = Uuid::new_v4();
    let (mut sender, mut receiver) = socket.split();

    info!("Connection {} opened", conn_id);

    // Subscribe before Ready so nothing posted after `server_time` is missed
    let mut broadcast_rx = dispatcher.subscribe();

    let ready = GatewayEvent::Ready {
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    match serde_json::to_string(&ready) {
        Ok(text) => {
            if sender.send(Message::Text(text.into())).await.is_err() {
                return;
            }
        }
        Err(e) => {
            error!("Failed to serialize Ready: {}", e);
            return;
        }
    }

    let (replay_tx, mut replay_rx) = mpsc::channel::<MessageResponse>(REPLAY_CHANNEL_CAPACITY);

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    let send_source = source.clone();
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(settings.heartbeat_interval);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;
        let mut delivered = DeliveredIds::with_capacity(DELIVERED_CAPACITY);

        loop {
            let outgoing = tokio::select! {
                result = broadcast_rx.recv() => {
                    match result {
                        Ok(event) => send_source.reveal(&event),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            warn!("Connection {} lagged by {} messages", conn_id, n);
                            continue;
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
                result = replay_rx.recv() => {
                    match result {
                        Some(msg) => msg,
                        None => break,
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= MAX_MISSED_PONGS {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection {}", missed_heartbeats, conn_id);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                        break;
                    }
                    continue;
                }
            };

            if !delivered.insert(outgoing.id) {
                continue;
            }

            let text = match serde_json::to_string(&GatewayEvent::MessageCreate(outgoing)) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize MessageCreate: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match serde_json::from_str::<GatewayCommand>(&text) {
                    Ok(cmd) => {
                        handle_command(conn_id, cmd, &source, settings.replay_limit, &replay_tx).await
                    }
                    Err(e) => {
                        warn!(
                            "Connection {} bad command: {} -- raw: {}",
                            conn_id,
                            e,
                            text.chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("Connection {} closed", conn_id);
}

async fn handle_command(
    conn_id: Uuid,
    cmd: GatewayCommand,
    source: &Arc<dyn MessageSource>,
    replay_limit: u32,
    replay_tx: &mpsc::Sender<MessageResponse>,
) {
    match cmd {
        GatewayCommand::Sync { since } => {
            let source = source.clone();
            let replayed =
                tokio::task::spawn_blocking(move || source.replay(since, replay_limit)).await;

            let messages = match replayed {
                Ok(Ok(messages)) => messages,
                Ok(Err(e)) => {
                    error!("Connection {} sync failed: {}", conn_id, e);
                    return;
                }
                Err(e) => {
                    error!("spawn_blocking join error: {}", e);
                    return;
                }
            };

            info!("Connection {} syncing {} messages", conn_id, messages.len());
            for msg in messages {
                if replay_tx.send(msg).await.is_err() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivered_ids_reject_repeats() {
        let mut delivered = DeliveredIds::with_capacity(8);
        let id = Uuid::new_v4();
        assert!(delivered.insert(id));
        assert!(!delivered.insert(id));
        assert!(delivered.insert(Uuid::new_v4()));
    }

    #[test]
    fn delivered_ids_forget_oldest_past_capacity() {
        let mut delivered = DeliveredIds::with_capacity(2);
        let first = Uuid::new_v4();
        delivered.insert(first);
        delivered.insert(Uuid::new_v4());
        delivered.insert(Uuid::new_v4());
        assert!(delivered.insert(first));
        assert_eq!(delivered.seen.len(), 2);
    }

    #[test]
    fn nil_ids_are_never_duplicates() {
        let mut delivered = DeliveredIds::with_capacity(8);
        assert!(delivered.insert(Uuid::nil()));
        assert!(delivered.insert(Uuid::nil()));
    }

    #[test]
    fn default_settings() {
        let settings = ConnectionSettings::default();
        assert_eq!(settings.heartbeat_interval, Duration::from_secs(15));
        assert_eq!(settings.replay_limit, REPLAY_LIMIT);
    }
}
