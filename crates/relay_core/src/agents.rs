//! Agents ("persons"): identity, trust policy, message queue and encounter
//! bookkeeping.
//!
//! A person never holds a reference to other persons or to the graph. Any
//! cross-agent query goes through the [SocialGraph] passed in with an
//! [ExchangeContext].

use std::collections::BTreeMap;

use bevy_ecs::prelude::Component;
use rand::Rng;

use crate::message::Message;
use crate::queue::{AddOutcome, MessageQueue};
use crate::social::SocialGraph;
use crate::trust::{rescaled, TrustInput, TrustParams, TrustPolicy};

pub type AgentId = u32;

/// Shared, read-only state an exchange needs, plus the run's generator.
pub struct ExchangeContext<'a, R: Rng + ?Sized> {
    pub graph: &'a SocialGraph,
    pub trust: &'a TrustParams,
    pub rng: &'a mut R,
}

/// What one side took away from an exchange.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiveSummary {
    pub offered: usize,
    pub accepted: usize,
    pub evicted: usize,
}

#[derive(Debug, Clone, Component)]
pub struct Person {
    pub id: AgentId,
    pub trust_policy: TrustPolicy,
    pub queue: MessageQueue,
    encounter_counts: BTreeMap<AgentId, u32>,
}

impl Person {
    pub fn new(id: AgentId, trust_policy: TrustPolicy, queue_capacity: usize) -> Self {
        Self {
            id,
            trust_policy,
            queue: MessageQueue::new(queue_capacity),
            encounter_counts: BTreeMap::new(),
        }
    }

    pub fn is_adversary(&self) -> bool {
        self.trust_policy.is_adversary()
    }

    pub fn encounter_count(&self, other: AgentId) -> u32 {
        self.encounter_counts.get(&other).copied().unwrap_or(0)
    }

    /// Encounter counts keyed by the other agent, in id order.
    pub fn encounter_counts(&self) -> &BTreeMap<AgentId, u32> {
        &self.encounter_counts
    }

    pub fn add_message(&mut self, message: Message) -> AddOutcome {
        self.queue.add_message(message)
    }

    /// Symmetric exchange: both sides count the meeting, then each receives a
    /// snapshot of the other's queue taken before either side changed.
    /// `other` receives first, which fixes the order of generator draws.
    pub fn encounter<R: Rng + ?Sized>(
        &mut self,
        other: &mut Person,
        ctx: &mut ExchangeContext<'_, R>,
    ) -> (ReceiveSummary, ReceiveSummary) {
        *self.encounter_counts.entry(other.id).or_insert(0) += 1;
        *other.encounter_counts.entry(self.id).or_insert(0) += 1;

        let mine = self.queue.snapshot();
        let theirs = other.queue.snapshot();

        let to_other = other.receive(&mine, self.id, self.trust_policy, ctx);
        let to_self = self.receive(&theirs, other.id, other.trust_policy, ctx);
        (to_self, to_other)
    }

    /// Re-scores every message whose content this person lacks and adds the
    /// copy to the queue.
    pub fn receive<R: Rng + ?Sized>(
        &mut self,
        sender_messages: &[Message],
        sender: AgentId,
        sender_policy: TrustPolicy,
        ctx: &mut ExchangeContext<'_, R>,
    ) -> ReceiveSummary {
        let shared_friends = ctx.graph.shared_friend_count(self.id, sender);
        let my_friends = ctx.graph.degree(self.id);
        let mut summary = ReceiveSummary {
            offered: sender_messages.len(),
            ..Default::default()
        };

        for message in sender_messages {
            if self.queue.has_content(message.content) {
                continue;
            }
            let priority = rescaled(
                TrustInput {
                    priority: message.priority,
                    shared_friends,
                    my_friends,
                    sender_policy,
                },
                self.trust_policy,
                ctx.trust,
                &mut *ctx.rng,
            );
            match self.queue.add_message(message.with_priority(priority)) {
                AddOutcome::Duplicate => {}
                AddOutcome::Inserted => summary.accepted += 1,
                AddOutcome::Evicted(evicted) => {
                    summary.evicted += 1;
                    if evicted.content != message.content {
                        summary.accepted += 1;
                    }
                }
            }
        }
        summary
    }
}
