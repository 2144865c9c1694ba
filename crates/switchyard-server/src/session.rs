use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

/// Open legacy SSE sessions, keyed by the id handed out in the `endpoint` event.
pub struct SessionManager {
    sessions: RwLock<HashMap<Uuid, broadcast::Sender<Arc<Value>>>>,
}

impl SessionManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new session and return its id with a receiver for its messages.
    pub async fn open(&self) -> (Uuid, broadcast::Receiver<Arc<Value>>) {
        let id = Uuid::new_v4();
        let (sender, receiver) = broadcast::channel(100);
        self.sessions.write().await.insert(id, sender);
        (id, receiver)
    }

    /// Deliver a JSON-RPC message to a session's stream.
    /// Returns true if the session exists and has a listener.
    pub async fn send(&self, id: Uuid, message: Value) -> bool {
        let sessions = self.sessions.read().await;
        sessions
            .get(&id)
            .is_some_and(|sender| sender.send(Arc::new(message)).is_ok())
    }

    pub async fn contains(&self, id: Uuid) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    pub async fn remove(&self, id: Uuid) {
        self.sessions.write().await.remove(&id);
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Removes its session when dropped, i.e. when the SSE stream holding it goes away.
pub struct SessionGuard {
    id: Uuid,
    manager: Arc<SessionManager>,
}

impl SessionGuard {
    #[must_use]
    pub fn new(manager: Arc<SessionManager>, id: Uuid) -> Self {
        Self { id, manager }
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let id = self.id;
        let manager = Arc::clone(&self.manager);
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                manager.remove(id).await;
                tracing::info!(session = %id, "legacy SSE session closed");
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn messages_reach_the_open_session() {
        let manager = SessionManager::new();
        let (id, mut rx) = manager.open().await;

        assert!(manager.send(id, json!({"id": 1})).await);
        assert_eq!(*rx.recv().await.unwrap(), json!({"id": 1}));
    }

    #[tokio::test]
    async fn unknown_session_is_not_delivered() {
        let manager = SessionManager::new();
        assert!(!manager.send(Uuid::new_v4(), json!({})).await);
    }

    #[tokio::test]
    async fn dropping_the_guard_removes_the_session() {
        let manager = Arc::new(SessionManager::new());
        let (id, _rx) = manager.open().await;
        assert!(manager.contains(id).await);

        drop(SessionGuard::new(Arc::clone(&manager), id));

        for _ in 0..50 {
            if !manager.contains(id).await {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!manager.contains(id).await);
        assert_eq!(manager.len().await, 0);
    }
}
