//! Tracks how far a single authored message has spread.
//!
//! The first measurement authors the message. Every measurement after that
//! counts the agents holding it and records a new point whenever the count
//! reaches a new maximum at a nonzero time.

use bevy_ecs::prelude::Resource;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agents::AgentId;
use crate::message::ContentId;
use crate::social::SocialGraph;

/// Who authors the tracked message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthorPolicy {
    /// Uniformly random member of the population.
    #[default]
    Random,
    /// Highest social degree.
    Popular,
    /// Lowest social degree among honest agents.
    Unpopular,
    /// Lowest-id adversary.
    Adversarial,
}

impl AuthorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthorPolicy::Random => "random",
            AuthorPolicy::Popular => "popular",
            AuthorPolicy::Unpopular => "unpopular",
            AuthorPolicy::Adversarial => "adversarial",
        }
    }
}

impl std::str::FromStr for AuthorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "random" => Ok(AuthorPolicy::Random),
            "popular" => Ok(AuthorPolicy::Popular),
            "unpopular" => Ok(AuthorPolicy::Unpopular),
            "adversarial" | "adversary" => Ok(AuthorPolicy::Adversarial),
            other => Err(format!("unknown author policy '{other}'")),
        }
    }
}

/// Unit of the timestamps driving the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeUnit {
    #[default]
    Milliseconds,
    Seconds,
}

impl TimeUnit {
    pub fn per_hour(self) -> f64 {
        match self {
            TimeUnit::Milliseconds => 3_600_000.0,
            TimeUnit::Seconds => 3_600.0,
        }
    }
}

/// One point of the propagation curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PropagationRecord {
    pub time: f64,
    pub count: usize,
}

/// Picks the author of the tracked message. `is_adversary` reports the trust
/// policy of a graph member. Random consumes exactly one draw.
pub fn select_author<R: Rng + ?Sized>(
    policy: AuthorPolicy,
    graph: &SocialGraph,
    is_adversary: impl Fn(AgentId) -> bool,
    rng: &mut R,
) -> Option<AgentId> {
    match policy {
        AuthorPolicy::Random => {
            let ids: Vec<AgentId> = graph.nodes().collect();
            if ids.is_empty() {
                return None;
            }
            Some(ids[rng.gen_range(0..ids.len())])
        }
        AuthorPolicy::Popular => graph.order_by_degree().last().copied(),
        AuthorPolicy::Unpopular => graph
            .order_by_degree()
            .into_iter()
            .find(|&id| !is_adversary(id)),
        AuthorPolicy::Adversarial => graph.nodes().find(|&id| is_adversary(id)),
    }
}

#[derive(Debug, Clone, Resource)]
pub struct PropagationMeasurer {
    pub author_policy: AuthorPolicy,
    population: usize,
    max_runtime_hours: f64,
    time_unit: TimeUnit,
    authored: bool,
    tracked: Option<ContentId>,
    author: Option<AgentId>,
    records: Vec<PropagationRecord>,
    max_count: usize,
    min_time_seen: Option<f64>,
    max_time_seen: f64,
    measurements: u64,
}

impl PropagationMeasurer {
    pub fn new(
        author_policy: AuthorPolicy,
        population: usize,
        max_runtime_hours: f64,
        time_unit: TimeUnit,
    ) -> Self {
        Self {
            author_policy,
            population,
            max_runtime_hours,
            time_unit,
            authored: false,
            tracked: None,
            author: None,
            records: Vec::new(),
            max_count: 0,
            min_time_seen: None,
            max_time_seen: 0.0,
            measurements: 0,
        }
    }

    pub fn needs_author(&self) -> bool {
        !self.authored
    }

    /// Records the authoring step. `author` is `None` when the policy found
    /// nobody eligible; measurement continues with a zero count.
    pub fn mark_authored(&mut self, content: ContentId, author: Option<AgentId>) {
        self.authored = true;
        match author {
            Some(id) => {
                self.tracked = Some(content);
                self.author = Some(id);
                info!(
                    author = id,
                    policy = self.author_policy.as_str(),
                    content = %content,
                    "authored tracked message"
                );
            }
            None => warn!(
                policy = self.author_policy.as_str(),
                "no eligible author; nothing will propagate"
            ),
        }
    }

    /// Folds one measurement in. Returns `true` when the run should stop.
    pub fn observe(&mut self, time: f64, holders: usize) -> bool {
        self.measurements += 1;
        if holders > self.max_count && time != 0.0 {
            self.records.push(PropagationRecord {
                time,
                count: holders,
            });
            self.max_count = holders;
            debug!(time, holders, "propagation advanced");
        }
        if time > self.max_time_seen {
            self.max_time_seen = time;
        }
        if time != 0.0 && self.min_time_seen.map_or(true, |min| time < min) {
            self.min_time_seen = Some(time);
        }

        let reached_everyone = holders == self.population;
        let timed_out =
            self.max_runtime_hours > 0.0 && self.elapsed_hours(time) > self.max_runtime_hours;
        if reached_everyone || timed_out {
            info!(
                time,
                holders,
                population = self.population,
                reached_everyone,
                timed_out,
                "stopping simulation"
            );
        }
        reached_everyone || timed_out
    }

    fn elapsed_hours(&self, time: f64) -> f64 {
        self.min_time_seen
            .map_or(0.0, |min| (time - min) / self.time_unit.per_hour())
    }

    pub fn tracked(&self) -> Option<ContentId> {
        self.tracked
    }

    pub fn author(&self) -> Option<AgentId> {
        self.author
    }

    pub fn records(&self) -> &[PropagationRecord] {
        &self.records
    }

    /// Largest holder count seen at a nonzero time.
    pub fn reach(&self) -> usize {
        self.max_count
    }

    pub fn population(&self) -> usize {
        self.population
    }

    /// Smallest nonzero measurement time, or 0 when none happened.
    pub fn min_time_seen(&self) -> f64 {
        self.min_time_seen.unwrap_or(0.0)
    }

    pub fn max_time_seen(&self) -> f64 {
        self.max_time_seen
    }

    pub fn measurements(&self) -> u64 {
        self.measurements
    }
}
