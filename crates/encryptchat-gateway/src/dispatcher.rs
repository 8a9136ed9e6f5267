use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use encryptchat_types::models::ChatMessage;

const BROADCAST_CAPACITY: usize = 1024;

/// A newly stored message. `message.text` is in stored (shifted) form;
/// each connection decodes it before it reaches a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub id: Uuid,
    pub message: ChatMessage,
}

/// Fans newly stored messages out to every connected client.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<MessageEvent>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner { broadcast_tx }),
        }
    }

    /// Subscribe to message events. Returns a broadcast receiver.
    pub fn subscribe(&self) -> broadcast::Receiver<MessageEvent> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Broadcast an event to all subscribers. Dropped silently if nobody listens.
    pub fn broadcast(&self, event: MessageEvent) {
        let _ = self.inner.broadcast_tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.broadcast_tx.receiver_count()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> MessageEvent {
        MessageEvent {
            id: Uuid::new_v4(),
            message: ChatMessage {
                text: text.into(),
                author: "ada".into(),
                timestamp: 1,
            },
        }
    }

    #[tokio::test]
    async fn every_subscriber_receives_broadcast() {
        let dispatcher = Dispatcher::new();
        let mut rx1 = dispatcher.subscribe();
        let mut rx2 = dispatcher.clone().subscribe();
        assert_eq!(dispatcher.subscriber_count(), 2);

        let sent = event("Tqxxa");
        dispatcher.broadcast(sent.clone());

        assert_eq!(rx1.recv().await.unwrap(), sent);
        assert_eq!(rx2.recv().await.unwrap(), sent);
    }

    #[test]
    fn broadcast_without_subscribers_is_a_noop() {
        let dispatcher = Dispatcher::new();
        dispatcher.broadcast(event("x"));
        assert_eq!(dispatcher.subscriber_count(), 0);
    }
}
