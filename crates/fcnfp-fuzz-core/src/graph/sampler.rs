use std::collections::HashSet;

use rand::Rng;
use tracing::trace;

use crate::graph::Network;
use crate::{FuzzError, Result};

pub const DEFAULT_GRAPH_ATTEMPTS: usize = 10_000;

/// Draws uniform random directed graphs until the source reaches the target.
#[derive(Debug, Clone, Copy)]
pub struct GraphSampler {
    pub max_attempts: usize,
}

impl Default for GraphSampler {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_GRAPH_ATTEMPTS,
        }
    }
}

impl GraphSampler {
    pub fn new(max_attempts: usize) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
        }
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        node_count: usize,
        arc_count: usize,
        source: u32,
        target: u32,
    ) -> Result<Network> {
        if node_count < 2 {
            return Err(FuzzError::InvalidInput(
                "graph sampling needs at least two nodes".to_string(),
            ));
        }
        if source as usize >= node_count || target as usize >= node_count || source == target {
            return Err(FuzzError::InvalidInput(format!(
                "endpoints {source} -> {target} invalid for {node_count} nodes"
            )));
        }
        for attempt in 1..=self.max_attempts {
            let network = gnm_random_digraph(rng, node_count, arc_count);
            if network.has_path(source, target) {
                return Ok(network);
            }
            trace!(attempt, source, target, "sampled graph has no path, resampling");
        }
        Err(FuzzError::GraphUnconstructible {
            from: source,
            to: target,
            attempts: self.max_attempts,
        })
    }
}

/// Uniform random simple digraph with `arc_count` distinct arcs and no self-loops.
/// Requests beyond `n * (n - 1)` yield the complete digraph, so the result may have fewer
/// arcs than requested.
pub fn gnm_random_digraph<R: Rng + ?Sized>(
    rng: &mut R,
    node_count: usize,
    arc_count: usize,
) -> Network {
    let n = node_count as u32;
    let max_arcs = node_count * node_count.saturating_sub(1);
    let mut tails = Vec::with_capacity(arc_count.min(max_arcs));
    let mut heads = Vec::with_capacity(arc_count.min(max_arcs));

    if arc_count >= max_arcs {
        for u in 0..n {
            for v in (0..n).filter(|&v| v != u) {
                tails.push(u);
                heads.push(v);
            }
        }
    } else {
        let mut seen = HashSet::with_capacity(arc_count);
        while tails.len() < arc_count {
            let u = rng.gen_range(0..n);
            let v = rng.gen_range(0..n);
            if u != v && seen.insert((u, v)) {
                tails.push(u);
                heads.push(v);
            }
        }
    }

    Network {
        node_count,
        tails,
        heads,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sampled_graphs_are_simple() {
        let mut rng = StdRng::seed_from_u64(3);
        let network = gnm_random_digraph(&mut rng, 12, 40);
        assert_eq!(network.arc_count(), 40);
        let distinct: HashSet<_> = network.arcs().collect();
        assert_eq!(distinct.len(), 40);
        assert!(network.arcs().all(|(u, v)| u != v));
    }

    #[test]
    fn oversized_request_collapses_to_complete_digraph() {
        let mut rng = StdRng::seed_from_u64(5);
        let network = gnm_random_digraph(&mut rng, 4, 100);
        assert_eq!(network.arc_count(), 12);
    }

    #[test]
    fn sample_guarantees_path() {
        let mut rng = StdRng::seed_from_u64(11);
        let sampler = GraphSampler::default();
        for _ in 0..20 {
            let network = sampler.sample(&mut rng, 8, 12, 2, 6).unwrap();
            assert!(network.has_path(2, 6));
        }
    }

    #[test]
    fn arcless_graph_exhausts_attempts() {
        let mut rng = StdRng::seed_from_u64(0);
        let err = GraphSampler::new(7).sample(&mut rng, 5, 0, 0, 1).unwrap_err();
        assert!(matches!(
            err,
            FuzzError::GraphUnconstructible { attempts: 7, .. }
        ));
    }
}
