//! Undirected weighted social graph shared by every agent.
//!
//! The graph is mutated only during scenario setup. During the event loop it
//! is read-only, which is what makes the shared-friend cache safe: every
//! mutation clears it.

mod generate;

use std::collections::BTreeMap;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use bevy_ecs::prelude::Resource;
use lru::LruCache;

use crate::agents::AgentId;

pub use generate::{assign_adversaries, random_attachment, scale_free_attachment};

/// Default weight for edges created by generators and loaders.
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

const SHARED_FRIEND_CACHE_SIZE: usize = 16_384;

#[derive(Resource)]
pub struct SocialGraph {
    adjacency: BTreeMap<AgentId, BTreeMap<AgentId, f64>>,
    shared_cache: Mutex<LruCache<(AgentId, AgentId), usize>>,
}

impl fmt::Debug for SocialGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocialGraph")
            .field("nodes", &self.adjacency.len())
            .field("edges", &self.edge_count())
            .finish()
    }
}

impl Default for SocialGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SocialGraph {
    fn clone(&self) -> Self {
        Self {
            adjacency: self.adjacency.clone(),
            shared_cache: Self::empty_cache(),
        }
    }
}

impl SocialGraph {
    pub fn new() -> Self {
        Self {
            adjacency: BTreeMap::new(),
            shared_cache: Self::empty_cache(),
        }
    }

    pub fn with_nodes(ids: impl IntoIterator<Item = AgentId>) -> Self {
        let mut graph = Self::new();
        for id in ids {
            graph.add_node(id);
        }
        graph
    }

    fn empty_cache() -> Mutex<LruCache<(AgentId, AgentId), usize>> {
        Mutex::new(LruCache::new(
            NonZeroUsize::MIN.saturating_add(SHARED_FRIEND_CACHE_SIZE - 1),
        ))
    }

    fn invalidate(&mut self) {
        if let Ok(cache) = self.shared_cache.get_mut() {
            cache.clear();
        }
    }

    pub fn add_node(&mut self, id: AgentId) {
        self.adjacency.entry(id).or_default();
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.adjacency.contains_key(&id)
    }

    /// Node ids in ascending order.
    pub fn nodes(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.adjacency.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Adds an undirected edge, creating missing endpoints. Self-loops and
    /// already-existing edges are ignored. Returns whether an edge was added.
    pub fn add_edge(&mut self, a: AgentId, b: AgentId, weight: f64) -> bool {
        if a == b || self.are_friends(a, b) {
            self.add_node(a);
            self.add_node(b);
            return false;
        }
        self.adjacency.entry(a).or_default().insert(b, weight);
        self.adjacency.entry(b).or_default().insert(a, weight);
        self.invalidate();
        true
    }

    /// Removes a node and all edges touching it.
    pub fn remove_node(&mut self, id: AgentId) -> bool {
        let Some(friends) = self.adjacency.remove(&id) else {
            return false;
        };
        for friend in friends.keys() {
            if let Some(links) = self.adjacency.get_mut(friend) {
                links.remove(&id);
            }
        }
        self.invalidate();
        true
    }

    pub fn are_friends(&self, a: AgentId, b: AgentId) -> bool {
        self.adjacency
            .get(&a)
            .is_some_and(|links| links.contains_key(&b))
    }

    pub fn edge_weight(&self, a: AgentId, b: AgentId) -> Option<f64> {
        self.adjacency.get(&a).and_then(|links| links.get(&b).copied())
    }

    pub fn degree(&self, id: AgentId) -> usize {
        self.adjacency.get(&id).map_or(0, BTreeMap::len)
    }

    /// Friends of `id` in ascending id order.
    pub fn friends(&self, id: AgentId) -> impl Iterator<Item = AgentId> + '_ {
        self.adjacency
            .get(&id)
            .into_iter()
            .flat_map(|links| links.keys().copied())
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(BTreeMap::len).sum::<usize>() / 2
    }

    /// `|friends(a) ∩ friends(b)|`, memoised until the next mutation.
    pub fn shared_friend_count(&self, a: AgentId, b: AgentId) -> usize {
        let key = if a <= b { (a, b) } else { (b, a) };
        let mut cache = match self.shared_cache.lock() {
            Ok(guard) => guard,
            Err(_) => return self.count_shared(a, b),
        };
        *cache.get_or_insert(key, || self.count_shared(a, b))
    }

    fn count_shared(&self, a: AgentId, b: AgentId) -> usize {
        let (Some(left), Some(right)) = (self.adjacency.get(&a), self.adjacency.get(&b)) else {
            return 0;
        };
        let (small, large) = if left.len() <= right.len() {
            (left, right)
        } else {
            (right, left)
        };
        small.keys().filter(|id| large.contains_key(id)).count()
    }

    /// Node ids sorted by ascending degree; equal degrees keep id order.
    pub fn order_by_degree(&self) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self.nodes().collect();
        ids.sort_by_key(|id| self.degree(*id));
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle_plus_tail() -> SocialGraph {
        // 1-2, 1-3, 2-3, 3-4
        let mut graph = SocialGraph::with_nodes(1..=4);
        graph.add_edge(1, 2, 1.0);
        graph.add_edge(1, 3, 1.0);
        graph.add_edge(2, 3, 1.0);
        graph.add_edge(3, 4, 0.5);
        graph
    }

    #[test]
    fn edges_are_undirected_and_unique() {
        let mut graph = triangle_plus_tail();
        assert!(graph.are_friends(4, 3));
        assert_eq!(graph.edge_weight(4, 3), Some(0.5));
        assert!(!graph.add_edge(3, 1, 1.0));
        assert!(!graph.add_edge(2, 2, 1.0));
        assert_eq!(graph.edge_count(), 4);
        assert_eq!(graph.degree(3), 3);
    }

    #[test]
    fn shared_friends_count_intersection() {
        let graph = triangle_plus_tail();
        assert_eq!(graph.shared_friend_count(1, 2), 1);
        assert_eq!(graph.shared_friend_count(2, 1), 1);
        assert_eq!(graph.shared_friend_count(1, 4), 1);
        assert_eq!(graph.shared_friend_count(2, 4), 1);
        assert_eq!(graph.shared_friend_count(1, 99), 0);
    }

    #[test]
    fn mutation_invalidates_shared_friend_cache() {
        let mut graph = triangle_plus_tail();
        assert_eq!(graph.shared_friend_count(1, 4), 1);
        graph.add_edge(2, 4, 1.0);
        assert_eq!(graph.shared_friend_count(1, 4), 2);
        graph.remove_node(3);
        assert_eq!(graph.shared_friend_count(1, 4), 1);
        assert!(!graph.contains(3));
        assert_eq!(graph.degree(1), 1);
    }

    #[test]
    fn order_by_degree_is_stable_on_ties() {
        let graph = triangle_plus_tail();
        assert_eq!(graph.order_by_degree(), vec![4, 1, 2, 3]);
    }
}
