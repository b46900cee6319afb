//! WebSocket channel registry and session identity.
//!
//! The transport layer performs the actual upgrade and frame I/O; this
//! module owns the URI→channel map populated at startup and the live
//! session sets per channel. Lookup is by exact URI (no templating).

use crate::ids::SessionId;
use anyhow::Result;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

/// Transport-side handle for one established connection. Implemented by the
/// embedding server; the core only ever sends through it.
pub trait WebSocketConnection: Send + Sync {
    fn send_text(&self, text: &str) -> Result<()>;
    fn close(&self);
}

/// Application-side channel logic registered under a URI.
pub trait WebSocketChannel: Send + Sync {
    fn on_open(&self, session: &Arc<WebSocketSession>);
    fn on_message(&self, session: &Arc<WebSocketSession>, text: &str);
    fn on_close(&self, session: &Arc<WebSocketSession>);
}

/// One live connection on a channel: unique id, transport handle, a small
/// per-connection parameter map and the originating HTTP session id (carried
/// for correlation only; no session bookkeeping happens here).
pub struct WebSocketSession {
    id: SessionId,
    connection: Arc<dyn WebSocketConnection>,
    params: RwLock<HashMap<String, String>>,
    http_session: Option<String>,
}

impl WebSocketSession {
    fn new(connection: Arc<dyn WebSocketConnection>, http_session: Option<String>) -> Self {
        Self {
            id: SessionId::new(),
            connection,
            params: RwLock::new(HashMap::new()),
            http_session,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn http_session(&self) -> Option<&str> {
        self.http_session.as_deref()
    }

    pub fn send_text(&self, text: &str) -> Result<()> {
        self.connection.send_text(text)
    }

    pub fn close(&self) {
        self.connection.close();
    }

    pub fn set_param(&self, key: &str, value: &str) {
        if let Ok(mut params) = self.params.write() {
            params.insert(key.to_string(), value.to_string());
        }
    }

    pub fn param(&self, key: &str) -> Option<String> {
        self.params.read().ok().and_then(|p| p.get(key).cloned())
    }
}

struct ChannelEntry {
    channel: Arc<dyn WebSocketChannel>,
    sessions: Arc<DashMap<SessionId, Arc<WebSocketSession>>>,
}

/// Thread-safe URI→channel map with per-channel session sets.
#[derive(Default)]
pub struct WebSocketRegistry {
    channels: DashMap<String, ChannelEntry>,
}

impl WebSocketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a channel under an exact URI. Re-registering a URI replaces
    /// the channel and discards that URI's session set.
    pub fn register(&self, uri: &str, channel: Arc<dyn WebSocketChannel>) {
        let replaced = self
            .channels
            .insert(
                uri.to_string(),
                ChannelEntry {
                    channel,
                    sessions: Arc::new(DashMap::new()),
                },
            )
            .is_some();
        if replaced {
            warn!(uri = uri, "WebSocket channel replaced; existing session set discarded");
        } else {
            info!(uri = uri, "WebSocket channel registered");
        }
    }

    pub fn is_registered(&self, uri: &str) -> bool {
        self.channels.contains_key(uri)
    }

    /// Open a session on the channel registered under `uri`. Returns `None`
    /// for an unregistered URI; rejecting the upgrade is then the
    /// transport's call.
    pub fn open(
        &self,
        uri: &str,
        connection: Arc<dyn WebSocketConnection>,
        http_session: Option<String>,
    ) -> Option<Arc<WebSocketSession>> {
        // Clone the entry pieces and drop the map guard before the callback:
        // channel code may re-enter the registry.
        let (channel, sessions) = {
            let entry = self.channels.get(uri)?;
            (Arc::clone(&entry.channel), Arc::clone(&entry.sessions))
        };
        let session = Arc::new(WebSocketSession::new(connection, http_session));
        sessions.insert(session.id(), Arc::clone(&session));
        debug!(uri = uri, session_id = %session.id(), "WebSocket session opened");
        channel.on_open(&session);
        Some(session)
    }

    /// Relay an inbound text frame to the channel. Unknown URIs or session
    /// ids are logged and dropped.
    pub fn message(&self, uri: &str, session_id: SessionId, text: &str) {
        let found = {
            let Some(entry) = self.channels.get(uri) else {
                warn!(uri = uri, "Message for unregistered WebSocket URI");
                return;
            };
            entry
                .sessions
                .get(&session_id)
                .map(|s| (Arc::clone(&entry.channel), Arc::clone(s.value())))
        };
        match found {
            Some((channel, session)) => channel.on_message(&session, text),
            None => {
                warn!(uri = uri, session_id = %session_id, "Message for unknown WebSocket session");
            }
        }
    }

    /// Remove the session and fire the channel's close callback.
    pub fn close(&self, uri: &str, session_id: SessionId) {
        let removed = {
            let Some(entry) = self.channels.get(uri) else {
                return;
            };
            entry
                .sessions
                .remove(&session_id)
                .map(|(_, session)| (Arc::clone(&entry.channel), session))
        };
        if let Some((channel, session)) = removed {
            debug!(uri = uri, session_id = %session_id, "WebSocket session closed");
            channel.on_close(&session);
        }
    }

    /// Number of live sessions on a channel, 0 for unregistered URIs.
    pub fn session_count(&self, uri: &str) -> usize {
        self.channels
            .get(uri)
            .map(|entry| entry.sessions.len())
            .unwrap_or(0)
    }
}
