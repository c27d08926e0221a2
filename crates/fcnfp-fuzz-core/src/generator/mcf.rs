//! Unconstrained two-field corpora: plain min-cost flow, optionally with activation charges.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::graph::{GraphSampler, Network};
use crate::oracle::{ExactOracle, OracleOutcome};
use crate::{FuzzError, Result};

/// The plain format carries no endpoints; every consumer ships from node 0 to node 1.
pub const MCF_SOURCE: u32 = 0;
pub const MCF_TARGET: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McfCaseParams {
    pub nodes: usize,
    pub arcs: usize,
    pub max_capacity: i64,
    pub max_cost: i64,
    /// `Some` draws activation charges and certifies with the fixed-charge oracle.
    #[serde(default)]
    pub max_fixed_cost: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McfCase {
    pub network: Network,
    pub capacity: Vec<i64>,
    pub cost: Vec<i64>,
    pub fixed_cost: Option<Vec<i64>>,
    pub demand: i64,
    pub best_cost: i64,
}

impl McfCase {
    pub fn supply(&self) -> Vec<i64> {
        self.network
            .supply_vector(MCF_SOURCE, MCF_TARGET, self.demand)
    }
}

pub fn generate_mcf_case<O, R>(
    oracle: &O,
    sampler: &GraphSampler,
    rng: &mut R,
    params: &McfCaseParams,
) -> Result<McfCase>
where
    O: ExactOracle + ?Sized,
    R: Rng + ?Sized,
{
    if params.max_capacity < 1 || params.max_cost < 0 || params.max_fixed_cost.is_some_and(|c| c < 0) {
        return Err(FuzzError::InvalidInput(
            "capacity range must start at 1 and cost ranges must be non-negative".to_string(),
        ));
    }
    let network = sampler.sample(rng, params.nodes, params.arcs, MCF_SOURCE, MCF_TARGET)?;
    let m = network.arc_count();

    let capacity: Vec<i64> = (0..m)
        .map(|_| rng.gen_range(1..=params.max_capacity))
        .collect();
    let cost: Vec<i64> = (0..m).map(|_| rng.gen_range(0..=params.max_cost)).collect();
    let fixed_cost: Option<Vec<i64>> = params
        .max_fixed_cost
        .map(|max| (0..m).map(|_| rng.gen_range(0..=max)).collect());

    let max_flow = oracle.max_flow(&network, &capacity, MCF_SOURCE, MCF_TARGET)?;
    if max_flow < 1 {
        return Err(FuzzError::UnexpectedInfeasible { stage: "max-flow" });
    }
    let demand = rng.gen_range(1..=max_flow);
    let supply = network.supply_vector(MCF_SOURCE, MCF_TARGET, demand);

    let outcome = match &fixed_cost {
        Some(fixed) => {
            oracle.min_cost_flow_lower_bound(&network, &capacity, &cost, fixed, &supply)?
        }
        None => oracle.min_cost_flow(&network, &capacity, &cost, &supply)?,
    };
    let best_cost = match outcome {
        OracleOutcome::Optimal(value) => value,
        OracleOutcome::Infeasible => {
            return Err(FuzzError::UnexpectedInfeasible {
                stage: "min-cost-flow",
            })
        }
    };
    info!(demand, best_cost, arcs = m, "generated plain min-cost flow case");

    Ok(McfCase {
        network,
        capacity,
        cost,
        fixed_cost,
        demand,
        best_cost,
    })
}
