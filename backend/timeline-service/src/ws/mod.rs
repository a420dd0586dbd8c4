//! Fanout hub: the registry of live push connections.
//!
//! The one piece of in-process shared mutable state in the service. Each
//! open WebSocket registers an unbounded outbound channel here; broadcasts
//! are fire-and-forget with per-connection FIFO ordering and no ordering
//! guarantee across connections. A failed send never blocks delivery to the
//! rest and unregisters the dead connection.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{
    mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
    RwLock,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::metrics::{PUSH_CONNECTIONS, PUSH_EVENTS_TOTAL};
use crate::models::PostView;

pub mod session;

/// Unique identifier for a live push connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Server-to-client push events
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum PushEvent<'a> {
    #[serde(rename = "NEW_POST")]
    NewPost { post: &'a PostView },
}

struct Connection {
    id: ConnectionId,
    sender: UnboundedSender<String>,
}

/// Registry of currently open push connections
#[derive(Default, Clone)]
pub struct FanoutHub {
    inner: Arc<RwLock<HashMap<ConnectionId, Connection>>>,
}

impl FanoutHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection.
    ///
    /// Returns the connection id (used for cleanup and relay exclusion) and
    /// the receiving half of its outbound stream.
    pub async fn register(&self) -> (ConnectionId, UnboundedReceiver<String>) {
        let (tx, rx) = unbounded_channel();
        let id = ConnectionId::new();

        let mut guard = self.inner.write().await;
        guard.insert(id, Connection { id, sender: tx });
        PUSH_CONNECTIONS.set(guard.len() as i64);

        debug!("registered push connection {:?}, total: {}", id, guard.len());

        (id, rx)
    }

    /// Remove a connection. Idempotent; called on disconnect and on error.
    pub async fn unregister(&self, id: ConnectionId) {
        let mut guard = self.inner.write().await;
        if guard.remove(&id).is_some() {
            debug!(
                "unregistered push connection {:?}, remaining: {}",
                id,
                guard.len()
            );
        }
        PUSH_CONNECTIONS.set(guard.len() as i64);
    }

    /// Broadcast a NEW_POST event to every registered connection.
    pub async fn broadcast_new_post(&self, post: &PostView) {
        let payload = match serde_json::to_string(&PushEvent::NewPost { post }) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(post_id = %post.id, "failed to encode push event: {}", err);
                return;
            }
        };

        PUSH_EVENTS_TOTAL.with_label_values(&["new_post"]).inc();
        self.send_to_all(None, payload).await;
    }

    /// Relay an opaque inbound payload verbatim to every connection except
    /// the originating one. No validation, no envelope.
    pub async fn relay(&self, origin: ConnectionId, payload: String) {
        PUSH_EVENTS_TOTAL.with_label_values(&["relay"]).inc();
        self.send_to_all(Some(origin), payload).await;
    }

    /// Deliver `payload` to all registered connections, skipping `exclude`.
    /// Dead senders are dropped from the registry as they are discovered.
    async fn send_to_all(&self, exclude: Option<ConnectionId>, payload: String) {
        let mut guard = self.inner.write().await;
        let before = guard.len();

        guard.retain(|_, conn| {
            if exclude == Some(conn.id) {
                return true;
            }
            conn.sender.send(payload.clone()).is_ok()
        });

        let after = guard.len();
        if before != after {
            debug!(
                "broadcast cleaned up {} dead connections, {} active",
                before - after,
                after
            );
        }
        PUSH_CONNECTIONS.set(after as i64);
    }

    /// Currently registered connection count (for diagnostics/tests).
    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.len()
    }
}
