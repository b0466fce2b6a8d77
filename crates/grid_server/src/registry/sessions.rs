//! Session registry: id allocation, lookup, lobby listing and removal.

use crate::connection::ConnectionId;
use crate::error::GameError;
use crate::game::{Phase, Session, SessionId};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info};

/// A session shared by its joined connections. Holding the lock is the
/// critical section for joins, moves and departures.
pub type SharedSession = Arc<Mutex<Session>>;

/// One forming session as shown by `LIST`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LobbyEntry {
    pub id: SessionId,
    pub capacity: usize,
    pub joined: usize,
}

impl fmt::Display for LobbyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.id, self.capacity, self.joined)
    }
}

/// Session counts by phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub forming: usize,
    pub active: usize,
    pub ended: usize,
}

impl RegistryStats {
    pub fn total(&self) -> usize {
        self.forming + self.active + self.ended
    }
}

#[derive(Debug)]
struct RegistryInner {
    sessions: BTreeMap<SessionId, SharedSession>,
    next_id: SessionId,
}

/// Central map from session id to session.
///
/// Creation and listing are serialized through one `RwLock`; per-session
/// state is guarded by each session's own mutex. The registry lock is never
/// held while waiting on a session lock, so a session holder may call back
/// into the registry without deadlocking.
#[derive(Debug)]
pub struct SessionRegistry {
    inner: RwLock<RegistryInner>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                sessions: BTreeMap::new(),
                next_id: 1,
            }),
        }
    }

    /// Creates a session with the creator seated as its first player.
    ///
    /// The session is returned already locked, so the caller can queue its
    /// confirmations before any other connection can join. A rejected
    /// capacity consumes no id and registers nothing.
    pub async fn create(
        &self,
        capacity: usize,
        creator: ConnectionId,
        creator_addr: SocketAddr,
    ) -> Result<OwnedMutexGuard<Session>, GameError> {
        let mut inner = self.inner.write().await;
        let id = inner.next_id;
        let mut session = Session::new(id, capacity)?;
        session.add_player(creator, creator_addr)?;

        let shared = Arc::new(Mutex::new(session));
        let guard = shared.clone().lock_owned().await;
        inner.sessions.insert(id, shared);
        inner.next_id += 1;

        info!(session_id = id, capacity, creator, "🎲 Session created");
        Ok(guard)
    }

    pub async fn get(&self, id: SessionId) -> Option<SharedSession> {
        self.inner.read().await.sessions.get(&id).cloned()
    }

    /// Drops a session from the registry. Existing handles stay valid.
    pub async fn remove(&self, id: SessionId) -> Option<SharedSession> {
        let removed = self.inner.write().await.sessions.remove(&id);
        if removed.is_some() {
            info!(session_id = id, "🗑️ Session removed");
        }
        removed
    }

    /// Lists every forming session in id order with its current seat count.
    pub async fn list(&self) -> Vec<LobbyEntry> {
        let mut entries = Vec::new();
        for session in self.snapshot().await {
            let session = session.lock().await;
            if session.phase() == Phase::Forming {
                entries.push(LobbyEntry {
                    id: session.id(),
                    capacity: session.capacity(),
                    joined: session.joined_count(),
                });
            }
        }
        debug!("📋 Lobby lists {} forming session(s)", entries.len());
        entries
    }

    pub async fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for session in self.snapshot().await {
            match session.lock().await.phase() {
                Phase::Forming => stats.forming += 1,
                Phase::Active => stats.active += 1,
                Phase::Ended => stats.ended += 1,
            }
        }
        stats
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn snapshot(&self) -> Vec<SharedSession> {
        self.inner.read().await.sessions.values().cloned().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
