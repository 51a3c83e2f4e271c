//! Bounded, newest-first feed of accepted recognition events.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use uuid::Uuid;

/// Default number of entries retained by a feed.
pub const DEFAULT_FEED_CAPACITY: usize = 10;

/// One accepted recognition event. Never mutated after creation.
#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub id: Uuid,
    /// Display name of the recognized person.
    pub label: String,
    pub roll_number: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl LogEntry {
    pub fn new(label: String, roll_number: Option<String>, message: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            label,
            roll_number,
            timestamp: Utc::now(),
            message,
        }
    }
}

/// Newest-first list of log entries, truncated to a fixed capacity.
/// Truncation is the only removal; entries are never reordered.
#[derive(Debug)]
pub struct LogFeed {
    entries: VecDeque<LogEntry>,
    capacity: usize,
}

impl LogFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Prepend `entry`, evicting the oldest entry when full.
    pub fn append(&mut self, entry: LogEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries newest-first, for the presentation layer.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        self.entries.iter().cloned().collect()
    }
}

impl Default for LogFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
