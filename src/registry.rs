//! overpass/src/registry.rs
//! Shared table of active sessions, keyed by the client's remote address.

use dashmap::DashMap;

/// Per-session state visible to other components. The username is set once
/// during the handshake and never changes afterwards.
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub username: String,
}

/// The one piece of state shared across sessions. An entry is present
/// exactly while its session is active; mutation happens only from session
/// lifecycle code, while the command processor only enumerates.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<String, SessionEntry>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    pub fn insert(&self, identity: String, username: String) {
        self.sessions.insert(identity, SessionEntry { username });
    }

    /// Removing an identity that is not present is a no-op.
    pub fn remove(&self, identity: &str) -> Option<SessionEntry> {
        self.sessions.remove(identity).map(|(_, entry)| entry)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.sessions.contains_key(identity)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Usernames of every active session, sorted so enumeration is
    /// deterministic regardless of shard order.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sessions
            .iter()
            .map(|entry| entry.username.clone())
            .collect();
        names.sort();
        names
    }
}
