//! Discrete-event clock: the single authority over simulated time.
//!
//! Events are kept in a min-heap keyed by `(timestamp, seq)`; `seq` is a
//! monotonically increasing insertion counter so events scheduled at the same
//! instant pop in FIFO order. Time is an `f64` in whatever unit the input
//! traces use (milliseconds for mobility traces, seconds for encounter logs).

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;

use crate::agents::AgentId;

/// Something the runner can execute at a point in simulated time.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Move an agent to the next point of its mobility schedule.
    MovePerson(AgentId),
    /// Run one step of the active encounter model over the whole population.
    EncounterTick,
    /// Replay one recorded encounter between two agents.
    TraceEncounter(AgentId, AgentId),
    /// Sample propagation of the tracked message.
    Measure,
    /// Sub-actions executed back to back at the same timestamp.
    Sequence(Vec<Action>),
}

/// Flat discriminant of [Action], used by schedule run conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    MovePerson,
    EncounterTick,
    TraceEncounter,
    Measure,
    Sequence,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::MovePerson(_) => ActionKind::MovePerson,
            Action::EncounterTick => ActionKind::EncounterTick,
            Action::TraceEncounter(_, _) => ActionKind::TraceEncounter,
            Action::Measure => ActionKind::Measure,
            Action::Sequence(_) => ActionKind::Sequence,
        }
    }

    /// Expands nested sequences into the leaf actions they run, in order.
    pub fn flatten_into(self, out: &mut Vec<Action>) {
        match self {
            Action::Sequence(actions) => {
                for action in actions {
                    action.flatten_into(out);
                }
            }
            leaf => out.push(leaf),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Event {
    pub timestamp: f64,
    pub seq: u64,
    pub action: Action,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (timestamp, seq).
        other
            .timestamp
            .total_cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Event {}

/// The leaf action currently being executed, inserted by the runner before
/// each schedule pass.
#[derive(Debug, Clone, Resource)]
pub struct CurrentAction {
    pub timestamp: f64,
    pub action: Action,
}

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: f64,
    next_seq: u64,
    steps: u64,
    cancelled: bool,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Number of events popped so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Enqueues `action` at `timestamp`.
    ///
    /// # Panics
    ///
    /// Panics if `timestamp` is earlier than the current clock or not finite.
    pub fn schedule_at(&mut self, timestamp: f64, action: Action) {
        assert!(
            timestamp.is_finite() && timestamp >= self.now,
            "event timestamp {timestamp} must be finite and >= current time {}",
            self.now
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.events.push(Event {
            timestamp,
            seq,
            action,
        });
    }

    pub fn schedule_now(&mut self, action: Action) {
        self.schedule_at(self.now, action);
    }

    /// Pops the earliest pending event and advances the clock to it.
    /// Returns `None` once the queue is drained or the clock was cancelled.
    pub fn pop_next(&mut self) -> Option<Event> {
        if self.cancelled {
            return None;
        }
        let event = self.events.pop()?;
        self.now = event.timestamp;
        self.steps += 1;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<f64> {
        self.events.peek().map(|e| e.timestamp)
    }

    /// Drops every pending event. The in-flight event, including the rest of
/// its sequence, still finishes.
    pub fn cancel_all(&mut self) {
        self.events.clear();
        self.cancelled = true;
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
