use std::collections::VecDeque;

use crate::{FuzzError, Result};

pub mod max_flow;
pub(crate) mod min_cost_flow;
pub mod sampler;

pub use max_flow::MaxFlow;
pub use sampler::GraphSampler;

/// Directed multigraph topology. Arcs have no id of their own: position is identity,
/// and every per-arc array elsewhere in the crate is indexed the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    node_count: usize,
    tails: Vec<u32>,
    heads: Vec<u32>,
}

impl Network {
    pub fn new(node_count: usize, tails: Vec<u32>, heads: Vec<u32>) -> Result<Self> {
        if tails.len() != heads.len() {
            return Err(FuzzError::InvalidInput(
                "tail and head arrays must have identical length".to_string(),
            ));
        }
        for (&t, &h) in tails.iter().zip(heads.iter()) {
            if t as usize >= node_count || h as usize >= node_count {
                return Err(FuzzError::InvalidInput(format!(
                    "arc ({t}, {h}) outside node range 0..{node_count}"
                )));
            }
        }
        Ok(Self {
            node_count,
            tails,
            heads,
        })
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn arc_count(&self) -> usize {
        self.tails.len()
    }

    pub fn tails(&self) -> &[u32] {
        &self.tails
    }

    pub fn heads(&self) -> &[u32] {
        &self.heads
    }

    pub fn endpoints(&self, arc: usize) -> Option<(u32, u32)> {
        Some((*self.tails.get(arc)?, *self.heads.get(arc)?))
    }

    pub fn arcs(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        self.tails.iter().copied().zip(self.heads.iter().copied())
    }

    /// Breadth-first reachability from `source` to `target` along arc direction.
    pub fn has_path(&self, source: u32, target: u32) -> bool {
        let (s, t) = (source as usize, target as usize);
        if s >= self.node_count || t >= self.node_count {
            return false;
        }
        if s == t {
            return true;
        }
        let mut outgoing = vec![Vec::new(); self.node_count];
        for (tail, head) in self.arcs() {
            outgoing[tail as usize].push(head as usize);
        }
        let mut seen = vec![false; self.node_count];
        let mut queue = VecDeque::new();
        seen[s] = true;
        queue.push_back(s);
        while let Some(u) = queue.pop_front() {
            for &v in &outgoing[u] {
                if v == t {
                    return true;
                }
                if !seen[v] {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
        false
    }

    /// Supply vector shipping `demand` units from `source` to `target`:
    /// `+demand` at the source, `-demand` at the target, zero elsewhere.
    pub fn supply_vector(&self, source: u32, target: u32, demand: i64) -> Vec<i64> {
        let mut supply = vec![0_i64; self.node_count];
        supply[source as usize] += demand;
        supply[target as usize] -= demand;
        supply
    }

    pub(crate) fn expect_arc_len(&self, what: &str, len: usize) -> Result<()> {
        if len != self.arc_count() {
            return Err(FuzzError::InvalidInput(format!(
                "{what} has {len} entries for {} arcs",
                self.arc_count()
            )));
        }
        Ok(())
    }

    pub(crate) fn expect_node_len(&self, what: &str, len: usize) -> Result<()> {
        if len != self.node_count {
            return Err(FuzzError::InvalidInput(format!(
                "{what} has {len} entries for {} nodes",
                self.node_count
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_endpoints() {
        let err = Network::new(2, vec![0], vec![2]).unwrap_err();
        assert!(matches!(err, FuzzError::InvalidInput(_)));
    }

    #[test]
    fn path_follows_arc_direction() {
        let network = Network::new(3, vec![0, 1], vec![1, 2]).unwrap();
        assert!(network.has_path(0, 2));
        assert!(!network.has_path(2, 0));
        assert!(!network.has_path(0, 7));
    }

    #[test]
    fn supply_vector_balances() {
        let network = Network::new(4, vec![0], vec![3]).unwrap();
        let supply = network.supply_vector(0, 3, 5);
        assert_eq!(supply, vec![5, 0, 0, -5]);
        assert_eq!(supply.iter().sum::<i64>(), 0);
    }
}
