//! Messages relayed between agents.

use std::fmt;
use std::hash::{Hash, Hasher};

use bevy_ecs::prelude::Resource;
use serde::Serialize;

/// Opaque message content identifier. Two messages are "the same message"
/// exactly when their content ids match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ContentId(pub u64);

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// A message copy held in one agent's queue. Each holder keeps its own
/// priority for the same content, so equality and hashing look at the
/// content alone.
#[derive(Debug, Clone, Copy)]
pub struct Message {
    pub content: ContentId,
    pub priority: f64,
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.content == other.content
    }
}

impl Eq for Message {}

impl Hash for Message {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.content.hash(state);
    }
}

impl Message {
    pub fn new(content: ContentId, priority: f64) -> Self {
        Self { content, priority }
    }

    /// Same content with a re-scored priority.
    pub fn with_priority(&self, priority: f64) -> Self {
        Self {
            content: self.content,
            priority,
        }
    }
}

/// Hands out fresh content ids for one simulation run.
#[derive(Debug, Default, Resource)]
pub struct ContentIdAllocator {
    next: u64,
}

impl ContentIdAllocator {
    pub fn next_id(&mut self) -> ContentId {
        let id = ContentId(self.next);
        self.next += 1;
        id
    }

    pub fn issued(&self) -> u64 {
        self.next
    }
}
