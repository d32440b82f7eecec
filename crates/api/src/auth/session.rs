//! In-memory session store for browser clients.
//!
//! A session maps an opaque random identifier (handed to the client as a
//! cookie) to a user id and a CSRF token. Sessions are immutable and live for
//! a fixed TTL measured from creation; reads never extend them.
//!
//! Expiry is enforced twice: each session owns a one-shot timer task that
//! deletes it when the TTL elapses, and [`SessionStore::get`] also checks the
//! deadline, so a late timer can never surface a stale session. Explicit
//! deletion aborts the pending timer.
//!
//! Thread-safe via a single interior `RwLock`; designed to be wrapped in
//! `Arc` and shared across the application.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use credence_core::types::DbId;
use rand::RngCore;
use tokio::sync::RwLock;
use tokio::task::AbortHandle;
use tokio::time::Instant;

use super::AuthError;

/// Fixed session lifetime: 24 hours from creation.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Random bytes per session id and per CSRF token.
const TOKEN_BYTES: usize = 32;

/// A live session. `Debug` hides the CSRF token.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: DbId,
    pub csrf_token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("csrf_token", &"[redacted]")
            .finish()
    }
}

/// Values handed to the client when a session is created.
pub struct NewSession {
    pub session_id: String,
    pub csrf_token: String,
}

impl fmt::Debug for NewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NewSession([redacted])")
    }
}

struct Entry {
    session: Session,
    deadline: Instant,
    expiry: AbortHandle,
}

pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    /// Create an empty store using [`SESSION_TTL`].
    pub fn new() -> Arc<Self> {
        Self::with_ttl(SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a new session for `user_id`.
    ///
    /// Concurrent calls for the same user create independent sessions.
    /// Must be called from within a Tokio runtime (the expiry timer is a
    /// spawned task).
    pub async fn create(self: &Arc<Self>, user_id: DbId) -> NewSession {
        let session_id = random_token();
        let csrf_token = random_token();
        let deadline = Instant::now() + self.ttl;

        let mut sessions = self.sessions.write().await;

        // Spawned while the write lock is held, so the timer cannot run
        // before the entry exists.
        let expiry = spawn_expiry(Arc::downgrade(self), session_id.clone(), deadline);

        sessions.insert(
            session_id.clone(),
            Entry {
                session: Session {
                    user_id,
                    csrf_token: csrf_token.clone(),
                },
                deadline,
                expiry,
            },
        );
        drop(sessions);

        tracing::debug!(user_id, "Session created");

        NewSession {
            session_id,
            csrf_token,
        }
    }

    /// Look up a live session.
    pub async fn get(&self, session_id: &str) -> Result<Session, AuthError> {
        let sessions = self.sessions.read().await;
        match sessions.get(session_id) {
            Some(entry) if Instant::now() < entry.deadline => Ok(entry.session.clone()),
            _ => Err(AuthError::SessionNotFound),
        }
    }

    /// Remove a session and cancel its expiry timer. Unknown ids are a no-op.
    pub async fn delete(&self, session_id: &str) {
        let removed = self.sessions.write().await.remove(session_id);
        if let Some(entry) = removed {
            entry.expiry.abort();
            tracing::debug!(user_id = entry.session.user_id, "Session deleted");
        }
    }

    /// Number of sessions currently held, including any whose timer is due
    /// but has not yet run.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Cancel every pending timer and drop all sessions.
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.write().await;
        let count = sessions.len();
        for entry in sessions.values() {
            entry.expiry.abort();
        }
        sessions.clear();
        tracing::info!(count, "Session store shut down");
    }

    async fn expire(&self, session_id: &str) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.remove(session_id) {
            tracing::debug!(user_id = entry.session.user_id, "Session expired");
        }
    }
}

fn spawn_expiry(store: Weak<SessionStore>, session_id: String, deadline: Instant) -> AbortHandle {
    tokio::spawn(async move {
        tokio::time::sleep_until(deadline).await;
        if let Some(store) = store.upgrade() {
            store.expire(&session_id).await;
        }
    })
    .abort_handle()
}

fn random_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use assert_matches::assert_matches;

    use super::*;

    async fn settle(store: &SessionStore, expected: usize) {
        for _ in 0..20 {
            if store.len().await == expected {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn create_then_get_returns_same_session() {
        let store = SessionStore::new();
        let created = store.create(7).await;

        let session = store.get(&created.session_id).await.unwrap();
        assert_eq!(session.user_id, 7);
        assert_eq!(session.csrf_token, created.csrf_token);
    }

    #[tokio::test]
    async fn ids_and_csrf_tokens_are_independent_random_values() {
        let store = SessionStore::new();
        let created = store.create(1).await;

        assert_ne!(created.session_id, created.csrf_token);
        // 32 bytes, unpadded base64url.
        assert_eq!(created.session_id.len(), 43);
        assert_eq!(created.csrf_token.len(), 43);
    }

    #[tokio::test]
    async fn delete_then_get_fails() {
        let store = SessionStore::new();
        let created = store.create(7).await;

        store.delete(&created.session_id).await;

        assert_matches!(store.get(&created.session_id).await, Err(AuthError::SessionNotFound));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn delete_unknown_is_noop() {
        let store = SessionStore::new();
        let created = store.create(7).await;

        store.delete("does-not-exist").await;
        store.delete("does-not-exist").await;

        assert_eq!(store.len().await, 1);
        assert!(store.get(&created.session_id).await.is_ok());
    }

    #[tokio::test]
    async fn get_unknown_fails() {
        let store = SessionStore::new();
        assert_matches!(store.get("nope").await, Err(AuthError::SessionNotFound));
    }

    #[tokio::test(start_paused = true)]
    async fn session_expires_after_ttl_without_delete() {
        let store = SessionStore::new();
        let created = store.create(7).await;

        tokio::time::advance(SESSION_TTL - Duration::from_secs(1)).await;
        assert!(store.get(&created.session_id).await.is_ok(), "still inside TTL");

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_matches!(store.get(&created.session_id).await, Err(AuthError::SessionNotFound));

        settle(&store, 0).await;
        assert!(store.is_empty().await, "timer should have removed the entry");
    }

    #[tokio::test(start_paused = true)]
    async fn reads_do_not_extend_ttl() {
        let store = SessionStore::with_ttl(Duration::from_secs(10));
        let created = store.create(7).await;

        for _ in 0..9 {
            tokio::time::advance(Duration::from_secs(1)).await;
            assert!(store.get(&created.session_id).await.is_ok());
        }
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_matches!(store.get(&created.session_id).await, Err(AuthError::SessionNotFound));
    }

    async fn expiry_handle(store: &SessionStore, session_id: &str) -> AbortHandle {
        store.sessions.read().await[session_id].expiry.clone()
    }

    async fn wait_finished(handle: &AbortHandle) -> bool {
        for _ in 0..20 {
            if handle.is_finished() {
                return true;
            }
            tokio::task::yield_now().await;
        }
        handle.is_finished()
    }

    #[tokio::test(start_paused = true)]
    async fn explicit_delete_cancels_timer() {
        let store = SessionStore::with_ttl(Duration::from_secs(10));
        let first = store.create(1).await;
        let second = store.create(2).await;
        let first_timer = expiry_handle(&store, &first.session_id).await;
        let second_timer = expiry_handle(&store, &second.session_id).await;

        store.delete(&first.session_id).await;

        // Well before the deadline: only the deleted session's timer is gone.
        assert!(wait_finished(&first_timer).await, "delete should abort the timer");
        assert!(!second_timer.is_finished());
        assert_eq!(store.len().await, 1);
        assert!(store.get(&second.session_id).await.is_ok());

        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(wait_finished(&second_timer).await);
        settle(&store, 0).await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn shutdown_aborts_pending_timers() {
        let store = SessionStore::new();
        let created = store.create(1).await;
        let timer = expiry_handle(&store, &created.session_id).await;

        store.shutdown().await;

        assert!(wait_finished(&timer).await);
    }

    #[tokio::test]
    async fn shutdown_clears_everything() {
        let store = SessionStore::new();
        let created = store.create(1).await;
        store.create(2).await;

        store.shutdown().await;

        assert!(store.is_empty().await);
        assert_matches!(store.get(&created.session_id).await, Err(AuthError::SessionNotFound));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_creates_for_same_user_are_unique() {
        const N: usize = 10_000;
        let store = SessionStore::new();

        let handles: Vec<_> = (0..N)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(99).await })
            })
            .collect();

        let mut ids = HashSet::with_capacity(N);
        let mut csrf_tokens = HashSet::with_capacity(N);
        for handle in handles {
            let created = handle.await.unwrap();
            ids.insert(created.session_id);
            csrf_tokens.insert(created.csrf_token);
        }

        assert_eq!(ids.len(), N);
        assert_eq!(csrf_tokens.len(), N);
        assert_eq!(store.len().await, N);

        store.shutdown().await;
    }
}
