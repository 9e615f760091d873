//! Setup-time graph generators.

use std::collections::BTreeSet;

use rand::Rng;
use tracing::{debug, info};

use super::{SocialGraph, DEFAULT_EDGE_WEIGHT};
use crate::agents::AgentId;

/// Additive attractiveness every node gets on top of its degree share.
const BASE_ATTRACTIVENESS: f64 = 0.02;

/// Approximate preferential attachment over every ordered pair of nodes.
///
/// Pairs are visited in id order. For each pair that is not yet connected one
/// uniform value `p` is drawn and the edge is created when
/// `p < degree(u) / total_degree + 0.02`, or unconditionally while no edge
/// exists yet. Returns the number of edges created.
pub fn scale_free_attachment<R: Rng + ?Sized>(graph: &mut SocialGraph, rng: &mut R) -> usize {
    let nodes: Vec<AgentId> = graph.nodes().collect();
    let mut total_degree: usize = 0;
    let mut created = 0;
    for &u in &nodes {
        for &v in &nodes {
            if u == v || graph.are_friends(u, v) {
                continue;
            }
            let p: f64 = rng.gen();
            let connect = if total_degree == 0 {
                true
            } else {
                p < graph.degree(u) as f64 / total_degree as f64 + BASE_ATTRACTIVENESS
            };
            if connect && graph.add_edge(u, v, DEFAULT_EDGE_WEIGHT) {
                total_degree += 1;
                created += 1;
            }
        }
    }
    info!(
        nodes = nodes.len(),
        edges = created,
        "generated scale-free social graph"
    );
    created
}

/// Connects every node to `edges_per_node` uniformly chosen other nodes.
/// Picks that hit an existing edge are not retried, so degrees can fall short.
pub fn random_attachment<R: Rng + ?Sized>(
    graph: &mut SocialGraph,
    rng: &mut R,
    edges_per_node: usize,
) -> usize {
    let nodes: Vec<AgentId> = graph.nodes().collect();
    if nodes.len() < 2 {
        return 0;
    }
    let mut created = 0;
    for &u in &nodes {
        for _ in 0..edges_per_node {
            let v = loop {
                let candidate = nodes[rng.gen_range(0..nodes.len())];
                if candidate != u {
                    break candidate;
                }
            };
            if graph.add_edge(u, v, DEFAULT_EDGE_WEIGHT) {
                created += 1;
            }
        }
    }
    info!(
        nodes = nodes.len(),
        edges = created,
        "generated uniform random social graph"
    );
    created
}

/// Picks the `count` lowest-degree nodes (ties by id) as adversaries and
/// wires them into a clique that also befriends every friend any of them had
/// before assignment. Returns the adversary ids in selection order.
///
/// Only the graph changes here; callers flip the agents' trust policies.
pub fn assign_adversaries(graph: &mut SocialGraph, count: usize) -> Vec<AgentId> {
    let count = count.min(graph.len());
    let adversaries: Vec<AgentId> = graph.order_by_degree().into_iter().take(count).collect();
    if adversaries.is_empty() {
        return adversaries;
    }

    let friend_union: BTreeSet<AgentId> = adversaries
        .iter()
        .flat_map(|&adv| graph.friends(adv).collect::<Vec<_>>())
        .collect();
    debug!(
        adversaries = adversaries.len(),
        shared_friends = friend_union.len(),
        "adversary friend union collected"
    );

    for (i, &adv) in adversaries.iter().enumerate() {
        for &other in &adversaries[i + 1..] {
            graph.add_edge(adv, other, DEFAULT_EDGE_WEIGHT);
        }
        for &friend in &friend_union {
            graph.add_edge(adv, friend, DEFAULT_EDGE_WEIGHT);
        }
    }
    info!(count = adversaries.len(), "assigned adversaries");
    adversaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn scale_free_first_pair_always_connects() {
        let mut graph = SocialGraph::with_nodes(0..2);
        let mut rng = StdRng::seed_from_u64(3);
        let created = scale_free_attachment(&mut graph, &mut rng);
        assert!(created >= 1);
        assert!(graph.are_friends(0, 1));
    }

    #[test]
    fn scale_free_is_deterministic_for_seed() {
        let build = |seed| {
            let mut graph = SocialGraph::with_nodes(0..40);
            let mut rng = StdRng::seed_from_u64(seed);
            scale_free_attachment(&mut graph, &mut rng);
            graph
                .nodes()
                .map(|id| graph.friends(id).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        };
        assert_eq!(build(42), build(42));
    }

    #[test]
    fn random_attachment_never_self_loops() {
        let mut graph = SocialGraph::with_nodes(0..10);
        let mut rng = StdRng::seed_from_u64(8);
        random_attachment(&mut graph, &mut rng, 5);
        for id in 0..10 {
            assert!(!graph.are_friends(id, id));
            assert!(graph.degree(id) >= 1);
        }
    }

    #[test]
    fn adversaries_share_friend_union_and_form_clique() {
        // Path 0-1-2-3-4 plus 4-5, 4-6: degree(0)=1, degree(5)=1, degree(6)=1.
        let mut graph = SocialGraph::with_nodes(0..7);
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (4, 6)] {
            graph.add_edge(a, b, 1.0);
        }
        let adversaries = assign_adversaries(&mut graph, 2);
        assert_eq!(adversaries, vec![0, 5]);
        assert!(graph.are_friends(0, 5));
        assert!(graph.are_friends(0, 4));
        assert!(graph.are_friends(5, 1));
        assert!(!graph.are_friends(1, 4));
        assert!(!graph.are_friends(0, 0));
    }

    #[test]
    fn adversary_count_is_capped_at_population() {
        let mut graph = SocialGraph::with_nodes(0..3);
        assert_eq!(assign_adversaries(&mut graph, 10).len(), 3);
    }
}
