pub mod analysis;
pub mod codec;
pub mod error;
pub mod filter;
pub mod generator;
pub mod graph;
pub mod instance;
pub mod oracle;
pub mod verify;

pub use error::{FuzzError, Result};
pub use instance::{Instance, InstanceId, ResultRecord};

use crate::graph::min_cost_flow::SuccessiveShortestPaths;
use crate::graph::Network;

/// Plain capacitated min-cost flow: no activation charges, no side constraints.
/// `supply[n] > 0` marks a source of flow, `supply[n] < 0` a sink.
#[derive(Debug, Clone)]
pub struct McfProblem {
    pub tails: Vec<u32>,
    pub heads: Vec<u32>,
    pub capacity: Vec<i64>,
    pub cost: Vec<i64>,
    pub supply: Vec<i64>,
}

#[derive(Debug, Clone)]
pub struct McfSolution {
    pub flow: Vec<i64>,
    pub cost: i128,
}

impl McfProblem {
    pub fn new(
        tails: Vec<u32>,
        heads: Vec<u32>,
        capacity: Vec<i64>,
        cost: Vec<i64>,
        supply: Vec<i64>,
    ) -> Result<Self> {
        let arc_count = tails.len();
        if heads.len() != arc_count || capacity.len() != arc_count || cost.len() != arc_count {
            return Err(FuzzError::InvalidInput(
                "arc arrays must have identical length".to_string(),
            ));
        }
        let node_count = supply.len();
        for (&t, &h) in tails.iter().zip(heads.iter()) {
            if t as usize >= node_count || h as usize >= node_count {
                return Err(FuzzError::InvalidInput(
                    "arc endpoint outside node range".to_string(),
                ));
            }
        }
        if supply.iter().sum::<i64>() != 0 {
            return Err(FuzzError::InvalidInput(
                "supplies must sum to zero".to_string(),
            ));
        }
        if capacity.iter().any(|&c| c < 0) {
            return Err(FuzzError::InvalidInput(
                "negative arc capacity".to_string(),
            ));
        }
        Ok(Self {
            tails,
            heads,
            capacity,
            cost,
            supply,
        })
    }

    pub fn from_network(
        network: &Network,
        capacity: &[i64],
        cost: &[i64],
        supply: &[i64],
    ) -> Result<Self> {
        Self::new(
            network.tails().to_vec(),
            network.heads().to_vec(),
            capacity.to_vec(),
            cost.to_vec(),
            supply.to_vec(),
        )
    }

    pub fn arc_count(&self) -> usize {
        self.tails.len()
    }

    pub fn node_count(&self) -> usize {
        self.supply.len()
    }
}

/// Successive shortest paths with Bellman-Ford; exact for integral data.
pub fn min_cost_flow_exact(problem: &McfProblem) -> Result<McfSolution> {
    let n = problem.node_count();
    let m = problem.arc_count();

    let source = n;
    let sink = n + 1;
    let mut ssp = SuccessiveShortestPaths::new(n + 2);
    let mut arc_refs = Vec::with_capacity(m);

    for i in 0..m {
        let tail = problem.tails[i] as usize;
        let head = problem.heads[i] as usize;
        let idx = ssp.add_arc(tail, head, problem.capacity[i], problem.cost[i]);
        arc_refs.push((tail, idx));
    }

    let mut total_supply = 0_i64;
    for (node, &b) in problem.supply.iter().enumerate() {
        if b > 0 {
            ssp.add_arc(source, node, b, 0);
            total_supply += b;
        } else if b < 0 {
            ssp.add_arc(node, sink, -b, 0);
        }
    }

    if total_supply > 0 {
        ssp.run(source, sink, total_supply)?;
    }

    let flow: Vec<i64> = arc_refs
        .iter()
        .enumerate()
        .map(|(i, &(tail, idx))| problem.capacity[i] - ssp.graph[tail][idx].cap)
        .collect();

    let cost = flow
        .iter()
        .zip(problem.cost.iter())
        .map(|(&f, &c)| f as i128 * c as i128)
        .sum::<i128>();

    Ok(McfSolution { flow, cost })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(
        tail: Vec<u32>,
        head: Vec<u32>,
        capacity: Vec<i64>,
        cost: Vec<i64>,
        supply: Vec<i64>,
    ) -> McfSolution {
        let problem = McfProblem::new(tail, head, capacity, cost, supply).unwrap();
        min_cost_flow_exact(&problem).unwrap()
    }

    #[test]
    fn routes_over_cheapest_arc() {
        let solution = solve(
            vec![0, 0, 1],
            vec![1, 2, 2],
            vec![5, 5, 5],
            vec![2, 1, 3],
            vec![3, 0, -3],
        );
        assert_eq!(solution.flow, vec![0, 3, 0]);
        assert_eq!(solution.cost, 3);
    }

    #[test]
    fn splits_over_parallel_arcs() {
        let solution = solve(vec![0, 0], vec![1, 1], vec![1, 4], vec![1, 3], vec![3, -3]);
        assert_eq!(solution.flow, vec![1, 2]);
        assert_eq!(solution.cost, 7);
    }

    #[test]
    fn saturates_cheap_path_before_expensive_one() {
        let solution = solve(
            vec![0, 1, 0],
            vec![1, 2, 2],
            vec![2, 2, 5],
            vec![1, 1, 5],
            vec![4, 0, -4],
        );
        assert_eq!(solution.flow, vec![2, 2, 2]);
        assert_eq!(solution.cost, 14);
    }

    #[test]
    fn detects_infeasible() {
        let problem = McfProblem::new(vec![0], vec![1], vec![1], vec![1], vec![2, -2]).unwrap();
        let err = min_cost_flow_exact(&problem).unwrap_err();
        assert!(matches!(err, FuzzError::Infeasible));
    }

    #[test]
    fn rejects_unbalanced_supplies() {
        let err = McfProblem::new(vec![0], vec![1], vec![3], vec![1], vec![1, 0]).unwrap_err();
        assert!(matches!(err, FuzzError::InvalidInput(_)));
    }

    #[test]
    fn rejects_negative_capacity() {
        let err = McfProblem::new(vec![0], vec![1], vec![-2], vec![1], vec![1, -1]).unwrap_err();
        assert!(matches!(err, FuzzError::InvalidInput(_)));
    }
}
