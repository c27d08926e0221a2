//! Exact solvers used to certify generated instances.

use crate::graph::{MaxFlow, Network};
use crate::{min_cost_flow_exact, FuzzError, McfProblem, Result};

mod milp;

pub use milp::MilpOracle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleOutcome<T> {
    Optimal(T),
    Infeasible,
}

impl<T> OracleOutcome<T> {
    pub fn optimal(self) -> Option<T> {
        match self {
            OracleOutcome::Optimal(value) => Some(value),
            OracleOutcome::Infeasible => None,
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(self, OracleOutcome::Infeasible)
    }
}

/// Optimal objective of column 0 together with the flow that attains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstrainedSolution {
    pub objective: i64,
    pub flow: Vec<i64>,
}

pub trait ExactOracle {
    /// Exact maximum flow value from `source` to `target`.
    fn max_flow(&self, network: &Network, capacity: &[i64], source: u32, target: u32) -> Result<i64> {
        let mut flow = MaxFlow::from_network(network, capacity)?;
        flow.max_flow(source as usize, target as usize)
    }

    /// Optimal fixed-charge flow cost for a single cost column, with no side constraints.
    fn min_cost_flow_lower_bound(
        &self,
        network: &Network,
        capacity: &[i64],
        unit_cost: &[i64],
        fixed_cost: &[i64],
        supply: &[i64],
    ) -> Result<OracleOutcome<i64>>;

    /// Minimizes column 0 subject to capacity, conservation, activation coupling and
    /// one `<= bounds[k]` side constraint per bound.
    fn constrained_min_cost_flow(
        &self,
        network: &Network,
        capacity: &[i64],
        unit_costs: &[Vec<i64>],
        fixed_costs: &[Vec<i64>],
        supply: &[i64],
        bounds: &[i64],
    ) -> Result<OracleOutcome<ConstrainedSolution>>;

    /// Plain min-cost flow without activation charges.
    fn min_cost_flow(
        &self,
        network: &Network,
        capacity: &[i64],
        cost: &[i64],
        supply: &[i64],
    ) -> Result<OracleOutcome<i64>> {
        let problem = McfProblem::from_network(network, capacity, cost, supply)?;
        match min_cost_flow_exact(&problem) {
            Ok(solution) => i64::try_from(solution.cost)
                .map(OracleOutcome::Optimal)
                .map_err(|_| FuzzError::Oracle("min-cost flow objective overflows i64".to_string())),
            Err(FuzzError::Infeasible) => Ok(OracleOutcome::Infeasible),
            Err(err) => Err(err),
        }
    }
}

impl<O: ExactOracle + ?Sized> ExactOracle for &O {
    fn max_flow(&self, network: &Network, capacity: &[i64], source: u32, target: u32) -> Result<i64> {
        (**self).max_flow(network, capacity, source, target)
    }

    fn min_cost_flow_lower_bound(
        &self,
        network: &Network,
        capacity: &[i64],
        unit_cost: &[i64],
        fixed_cost: &[i64],
        supply: &[i64],
    ) -> Result<OracleOutcome<i64>> {
        (**self).min_cost_flow_lower_bound(network, capacity, unit_cost, fixed_cost, supply)
    }

    fn constrained_min_cost_flow(
        &self,
        network: &Network,
        capacity: &[i64],
        unit_costs: &[Vec<i64>],
        fixed_costs: &[Vec<i64>],
        supply: &[i64],
        bounds: &[i64],
    ) -> Result<OracleOutcome<ConstrainedSolution>> {
        (**self).constrained_min_cost_flow(
            network,
            capacity,
            unit_costs,
            fixed_costs,
            supply,
            bounds,
        )
    }

    fn min_cost_flow(
        &self,
        network: &Network,
        capacity: &[i64],
        cost: &[i64],
        supply: &[i64],
    ) -> Result<OracleOutcome<i64>> {
        (**self).min_cost_flow(network, capacity, cost, supply)
    }
}

/// Fixed-charge cost of `flow` under one column; an arc is charged when it carries flow.
/// Accumulates in `i128`; any `i64` inputs fit.
pub fn charged_cost(flow: &[i64], unit_cost: &[i64], fixed_cost: &[i64]) -> i128 {
    flow.iter()
        .zip(unit_cost.iter().zip(fixed_cost.iter()))
        .map(|(&f, (&c, &fc))| {
            let charge = if f > 0 { i128::from(fc) } else { 0 };
            i128::from(f) * i128::from(c) + charge
        })
        .sum()
}
