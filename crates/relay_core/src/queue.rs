//! Bounded, content-deduplicated message queue owned by one agent.
//!
//! The queue holds at most `capacity` messages. Inserting a new content into
//! a full queue evicts the single lowest-priority entry; among equal
//! priorities the oldest insertion goes first.

use crate::message::{ContentId, Message};

pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Result of [MessageQueue::add_message].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddOutcome {
    /// Content already present; queue unchanged.
    Duplicate,
    Inserted,
    /// Inserted, and the returned message was evicted to stay within capacity.
    /// The evicted message may be the one just inserted.
    Evicted(Message),
}

#[derive(Debug, Clone)]
struct Entry {
    message: Message,
    seq: u64,
}

#[derive(Debug, Clone)]
pub struct MessageQueue {
    capacity: usize,
    next_seq: u64,
    entries: Vec<Entry>,
}

impl MessageQueue {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be at least 1");
        Self {
            capacity,
            next_seq: 0,
            entries: Vec::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_content(&self, content: ContentId) -> bool {
        self.entries.iter().any(|e| e.message.content == content)
    }

    pub fn get(&self, content: ContentId) -> Option<&Message> {
        self.entries
            .iter()
            .map(|e| &e.message)
            .find(|m| m.content == content)
    }

    pub fn add_message(&mut self, message: Message) -> AddOutcome {
        if self.has_content(message.content) {
            return AddOutcome::Duplicate;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push(Entry { message, seq });

        if self.entries.len() <= self.capacity {
            return AddOutcome::Inserted;
        }
        match self.min_index() {
            Some(idx) => AddOutcome::Evicted(self.entries.swap_remove(idx).message),
            None => AddOutcome::Inserted,
        }
    }

    /// Messages in insertion order. Senders hand this copy to receivers so an
    /// exchange never observes its own writes.
    pub fn snapshot(&self) -> Vec<Message> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.message).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter().map(|e| &e.message)
    }

    pub fn min_priority(&self) -> Option<f64> {
        self.min_index().map(|idx| self.entries[idx].message.priority)
    }

    fn min_index(&self) -> Option<usize> {
        self.entries
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.message
                    .priority
                    .total_cmp(&b.message.priority)
                    .then_with(|| a.seq.cmp(&b.seq))
            })
            .map(|(idx, _)| idx)
    }
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(id: u64, priority: f64) -> Message {
        Message::new(ContentId(id), priority)
    }

    fn pairs(messages: &[Message]) -> Vec<(u64, f64)> {
        messages.iter().map(|m| (m.content.0, m.priority)).collect()
    }

    fn evicted(outcome: AddOutcome) -> Option<(u64, f64)> {
        match outcome {
            AddOutcome::Evicted(m) => Some((m.content.0, m.priority)),
            _ => None,
        }
    }

    #[test]
    fn capacity_one_evicts_minimum_then_dedups() {
        let mut queue = MessageQueue::new(1);
        queue.add_message(msg(1, 0.9));

        let outcome = queue.add_message(msg(2, 0.95));
        assert_eq!(evicted(outcome), Some((1, 0.9)));
        assert_eq!(pairs(&queue.snapshot()), vec![(2, 0.95)]);

        assert_eq!(queue.add_message(msg(2, 0.1)), AddOutcome::Duplicate);
        assert_eq!(pairs(&queue.snapshot()), vec![(2, 0.95)]);
    }

    #[test]
    fn new_low_priority_message_can_evict_itself() {
        let mut queue = MessageQueue::new(2);
        queue.add_message(msg(1, 0.5));
        queue.add_message(msg(2, 0.6));
        assert_eq!(evicted(queue.add_message(msg(3, 0.1))), Some((3, 0.1)));
        assert!(!queue.has_content(ContentId(3)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn ties_evict_oldest_insertion() {
        let mut queue = MessageQueue::new(2);
        queue.add_message(msg(1, 0.5));
        queue.add_message(msg(2, 0.5));
        assert_eq!(evicted(queue.add_message(msg(3, 0.5))), Some((1, 0.5)));
        assert_eq!(pairs(&queue.snapshot()), vec![(2, 0.5), (3, 0.5)]);
    }

    #[test]
    fn length_never_exceeds_capacity() {
        let mut queue = MessageQueue::new(3);
        for i in 0..50u64 {
            let priority = ((i * 37) % 11) as f64 / 10.0;
            let outcome = queue.add_message(msg(i, priority));
            assert!(queue.len() <= 3);
            if let AddOutcome::Evicted(evicted) = outcome {
                for kept in queue.iter() {
                    assert!(evicted.priority <= kept.priority);
                }
            }
        }
    }

    #[test]
    fn contents_stay_unique() {
        let mut queue = MessageQueue::new(5);
        for _ in 0..3 {
            queue.add_message(msg(9, 0.2));
        }
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.get(ContentId(9)).map(|m| m.priority), Some(0.2));
    }
}
