//! Session store for in-progress dialogs
//!
//! Holds one [`UserSession`] per chat while a multi-step entry is being
//! collected. Entries carry an idle TTL that is refreshed on every `set`,
//! so an abandoned dialog disappears on its own. Absence of an entry is the
//! same as `DialogStep::None`.
//!
//! # Example
//!
//! ```ignore
//! use placenote::session::{InMemorySessionStore, SessionConfig, SessionStore};
//!
//! let store = InMemorySessionStore::new(SessionConfig::default());
//! store.set(chat_id, UserSession::start(), None);
//! let session = store.get(chat_id);
//! store.remove(chat_id);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::RwLock;

use crate::dialog::UserSession;
use crate::telegram::ChatId;

pub use crate::utils::toml_config::SessionConfig;

// ============================================================================
// Store Types
// ============================================================================

/// Counters for monitoring the session store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Lookups that found a live session
    pub hits: u64,
    /// Lookups that found nothing or an expired session
    pub misses: u64,
    /// Sessions currently held (expired ones may not be swept yet)
    pub active: usize,
    /// Sessions dropped because the store was full
    pub evictions: u64,
    /// Sessions dropped because their TTL ran out
    pub expirations: u64,
}

// ============================================================================
// Store Trait
// ============================================================================

/// Keyed storage for dialog sessions with per-entry expiry
pub trait SessionStore: Send + Sync {
    /// Get the live session for a chat
    fn get(&self, key: ChatId) -> Option<UserSession>;

    /// Store a session. `ttl` overrides the store default when given.
    fn set(&self, key: ChatId, session: UserSession, ttl: Option<Duration>);

    /// Remove a session, returning it if it was live
    fn remove(&self, key: ChatId) -> Option<UserSession>;

    /// Number of sessions held
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired session
    fn cleanup_expired(&self);

    fn stats(&self) -> SessionStats;
}

// ============================================================================
// Session Entry
// ============================================================================

#[derive(Debug, Clone)]
struct SessionEntry {
    session: UserSession,
    last_accessed: Instant,
    expires_at: Instant,
}

impl SessionEntry {
    fn new(session: UserSession, ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            session,
            last_accessed: now,
            expires_at: now + ttl,
        }
    }

    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

// ============================================================================
// In-Memory Store
// ============================================================================

/// Process-local session store
///
/// A `HashMap` behind a `parking_lot::RwLock`. Expired entries are treated
/// as absent on read and swept whenever a write pushes the store to its
/// capacity. When still full after the sweep, the least recently touched
/// session is evicted.
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<ChatId, SessionEntry>>,
    config: SessionConfig,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

impl InMemorySessionStore {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(SessionConfig::default())
    }

    fn default_ttl(&self) -> Duration {
        self.config.ttl()
    }

    fn sweep_expired(&self, sessions: &mut HashMap<ChatId, SessionEntry>) {
        let before = sessions.len();
        sessions.retain(|_, entry| !entry.is_expired());
        let removed = (before - sessions.len()) as u64;
        if removed > 0 {
            self.expirations.fetch_add(removed, Ordering::Relaxed);
            tracing::debug!(removed, "Swept expired sessions");
        }
    }

    fn evict_lru(&self, sessions: &mut HashMap<ChatId, SessionEntry>) {
        let lru_key = sessions
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| *key);

        if let Some(key) = lru_key {
            sessions.remove(&key);
            self.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(chat_id = %key, "Session store full, evicted least recently used session");
        }
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, key: ChatId) -> Option<UserSession> {
        let mut sessions = self.sessions.write();

        let expired = match sessions.get_mut(&key) {
            Some(entry) if !entry.is_expired() => {
                entry.last_accessed = Instant::now();
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.session.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            sessions.remove(&key);
            self.expirations.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    fn set(&self, key: ChatId, session: UserSession, ttl: Option<Duration>) {
        let entry = SessionEntry::new(session, ttl.unwrap_or_else(|| self.default_ttl()));
        let mut sessions = self.sessions.write();

        if !sessions.contains_key(&key) && sessions.len() >= self.config.max_sessions {
            self.sweep_expired(&mut sessions);
            while sessions.len() >= self.config.max_sessions && !sessions.is_empty() {
                self.evict_lru(&mut sessions);
            }
        }

        sessions.insert(key, entry);
    }

    fn remove(&self, key: ChatId) -> Option<UserSession> {
        self.sessions
            .write()
            .remove(&key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.session)
    }

    fn len(&self) -> usize {
        self.sessions.read().len()
    }

    fn cleanup_expired(&self) {
        let mut sessions = self.sessions.write();
        self.sweep_expired(&mut sessions);
    }

    fn stats(&self) -> SessionStats {
        SessionStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            active: self.sessions.read().len(),
            evictions: self.evictions.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
