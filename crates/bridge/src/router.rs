//! Conversation routing.
//!
//! Maps a conversation id to the reply sink that can deliver a
//! downstream-originated activity back into that conversation's inbound
//! channel. Registration is first-writer-wins and atomic; the table is
//! bounded and entries expire, so long-running processes do not accumulate
//! routes for conversations that went quiet.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use {
    async_trait::async_trait,
    dashmap::{DashMap, mapref::entry::Entry},
    pontis_protocol::Activity,
    serde::{Deserialize, Serialize},
    tracing::debug,
};

/// Delivers an activity back into the inbound channel for one specific
/// conversation. Delivery failure is the channel's concern, not the
/// bridge's.
#[async_trait]
pub trait ReplySink: Send + Sync {
    async fn deliver(&self, activity: Activity);
}

/// Routing-table tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Hard cap on live routing entries; the least-recently-used entry is
    /// evicted to admit a new conversation.
    pub max_entries: usize,
    /// Idle lifetime of an entry in seconds.
    pub ttl_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_entries: 1024,
            ttl_secs: 86_400,
        }
    }
}

struct RouterEntry {
    sink: Arc<dyn ReplySink>,
    last_seen: Instant,
}

/// Concurrent conversation → reply-sink table.
pub struct ConversationRouter {
    entries: DashMap<String, RouterEntry>,
    max_entries: usize,
    ttl: Duration,
}

impl ConversationRouter {
    #[must_use]
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries: config.max_entries.max(1),
            ttl: Duration::from_secs(config.ttl_secs),
        }
    }

    /// Register a reply sink for a conversation. Returns `false` when an
    /// entry already exists — the first registered sink stays; the insert
    /// is atomic, never a read-then-write pair.
    pub fn register(&self, conversation_id: &str, sink: Arc<dyn ReplySink>) -> bool {
        if !self.entries.contains_key(conversation_id) && self.entries.len() >= self.max_entries {
            self.evict();
        }
        match self.entries.entry(conversation_id.to_string()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(RouterEntry {
                    sink,
                    last_seen: Instant::now(),
                });
                true
            },
        }
    }

    /// The reply sink for a conversation, if a live entry exists. A hit
    /// refreshes the entry's idle clock; an expired entry is removed.
    pub fn lookup(&self, conversation_id: &str) -> Option<Arc<dyn ReplySink>> {
        let mut entry = self.entries.get_mut(conversation_id)?;
        if entry.last_seen.elapsed() <= self.ttl {
            entry.last_seen = Instant::now();
            return Some(Arc::clone(&entry.sink));
        }
        drop(entry);
        self.entries.remove(conversation_id);
        debug!(conversation = conversation_id, "expired reply route removed");
        None
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop expired entries; if the table is still full, drop the
    /// least-recently-used entry.
    fn evict(&self) {
        self.entries
            .retain(|_, entry| entry.last_seen.elapsed() <= self.ttl);
        while self.entries.len() >= self.max_entries {
            let victim = self
                .entries
                .iter()
                .min_by_key(|entry| entry.value().last_seen)
                .map(|entry| entry.key().clone());
            let Some(key) = victim else { break };
            self.entries.remove(&key);
            debug!(conversation = %key, "evicted least-recently-used reply route");
        }
    }
}
