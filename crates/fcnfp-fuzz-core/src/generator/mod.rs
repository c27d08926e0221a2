//! Difficulty-controlled instance generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::graph::sampler::DEFAULT_GRAPH_ATTEMPTS;
use crate::graph::{GraphSampler, Network};
use crate::instance::{Instance, InstanceId};
use crate::oracle::{ExactOracle, OracleOutcome};
use crate::{FuzzError, Result};

pub mod mcf;

pub const DEFAULT_MAX_ATTEMPTS: usize = 100;

/// Shape and value ranges of one generated instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorParams {
    pub nodes: usize,
    pub arcs: usize,
    pub max_capacity: i64,
    pub max_cost: i64,
    #[serde(default)]
    pub max_fixed_cost: i64,
    #[serde(default)]
    pub constraints: usize,
    /// One value in `(0, 1]` per side constraint.
    #[serde(default)]
    pub difficulty: Vec<f64>,
}

impl GeneratorParams {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(FuzzError::InvalidInput(msg));
        if self.nodes < 2 {
            return invalid(format!("need at least 2 nodes, got {}", self.nodes));
        }
        if self.max_capacity < 1 {
            return invalid("max_capacity must be at least 1".to_string());
        }
        if self.max_cost < 0 || self.max_fixed_cost < 0 {
            return invalid("cost ranges must be non-negative".to_string());
        }
        if self.difficulty.len() != self.constraints {
            return invalid(format!(
                "{} difficulties given for {} constraints",
                self.difficulty.len(),
                self.constraints
            ));
        }
        if let Some(d) = self.difficulty.iter().find(|d| !(**d > 0.0 && **d <= 1.0)) {
            return invalid(format!("difficulty {d} outside (0, 1]"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Cost/capacity redraws before giving up on a configuration.
    pub max_attempts: usize,
    /// Graph resamples before the endpoints are declared unconnectable.
    pub graph_attempts: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            graph_attempts: DEFAULT_GRAPH_ATTEMPTS,
        }
    }
}

/// A job for [`ProblemGenerator::generate_batch`]; each job owns its random stream.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub seed: u64,
    pub params: GeneratorParams,
}

/// Derives an independent per-job seed from a base seed (splitmix64 finalizer).
pub fn job_seed(base: u64, index: u64) -> u64 {
    let mut z = base.wrapping_add(index.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Side-constraint bound from the unconstrained optimum: `floor(lower_bound / difficulty)`.
/// Difficulty 1 returns the optimum itself, the tightest bound that stays feasible alone.
pub fn difficulty_bound(lower_bound: i64, difficulty: f64) -> i64 {
    (lower_bound as f64 / difficulty).floor() as i64
}

#[derive(Debug)]
struct Draw {
    capacity: Vec<i64>,
    unit_cost: Vec<Vec<i64>>,
    fixed_cost: Vec<Vec<i64>>,
}

fn draw_arc_data<R: Rng + ?Sized>(
    rng: &mut R,
    arc_count: usize,
    columns: usize,
    params: &GeneratorParams,
) -> Draw {
    let capacity = (0..arc_count)
        .map(|_| rng.gen_range(1..=params.max_capacity))
        .collect();
    let unit_cost = (0..columns)
        .map(|_| {
            (0..arc_count)
                .map(|_| rng.gen_range(0..=params.max_cost))
                .collect()
        })
        .collect();
    let fixed_cost = (0..columns)
        .map(|_| {
            (0..arc_count)
                .map(|_| rng.gen_range(0..=params.max_fixed_cost))
                .collect()
        })
        .collect();
    Draw {
        capacity,
        unit_cost,
        fixed_cost,
    }
}

#[derive(Debug, Clone)]
pub struct ProblemGenerator<O> {
    oracle: O,
    sampler: GraphSampler,
    max_attempts: usize,
}

impl<O: ExactOracle> ProblemGenerator<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_config(oracle, &GeneratorConfig::default())
    }

    pub fn with_config(oracle: O, config: &GeneratorConfig) -> Self {
        Self {
            oracle,
            sampler: GraphSampler::new(config.graph_attempts),
            max_attempts: config.max_attempts.max(1),
        }
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn sampler(&self) -> &GraphSampler {
        &self.sampler
    }

    /// Builds one certified instance, or `Ok(None)` when every draw within the attempt
    /// budget was infeasible under its difficulty-derived bounds.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        params: &GeneratorParams,
    ) -> Result<Option<Instance>> {
        params.validate()?;

        let source = rng.gen_range(0..params.nodes) as u32;
        let destination = loop {
            let target = rng.gen_range(0..params.nodes) as u32;
            if target != source {
                break target;
            }
        };
        let network = self
            .sampler
            .sample(rng, params.nodes, params.arcs, source, destination)?;

        for attempt in 1..=self.max_attempts {
            if let Some(instance) =
                self.attempt(rng, params, &network, source, destination, attempt)?
            {
                return Ok(Some(instance));
            }
        }

        warn!(
            attempts = self.max_attempts,
            nodes = params.nodes,
            arcs = network.arc_count(),
            constraints = params.constraints,
            "no feasible difficulty-controlled instance, skipping"
        );
        Ok(None)
    }

    fn attempt<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        params: &GeneratorParams,
        network: &Network,
        source: u32,
        destination: u32,
        attempt: usize,
    ) -> Result<Option<Instance>> {
        let columns = params.constraints.max(1);
        let draw = draw_arc_data(rng, network.arc_count(), columns, params);

        let max_flow = self
            .oracle
            .max_flow(network, &draw.capacity, source, destination)?;
        if max_flow < 1 {
            return Err(FuzzError::UnexpectedInfeasible { stage: "max-flow" });
        }
        let demand = rng.gen_range(1..=max_flow);
        let supply = network.supply_vector(source, destination, demand);

        let mut bounds = Vec::with_capacity(params.constraints);
        for (k, &difficulty) in params.difficulty.iter().enumerate() {
            let lower_bound = match self.oracle.min_cost_flow_lower_bound(
                network,
                &draw.capacity,
                &draw.unit_cost[k],
                &draw.fixed_cost[k],
                &supply,
            )? {
                OracleOutcome::Optimal(value) => value,
                OracleOutcome::Infeasible => {
                    return Err(FuzzError::UnexpectedInfeasible {
                        stage: "lower-bound",
                    })
                }
            };
            bounds.push(difficulty_bound(lower_bound, difficulty));
        }
        debug!(attempt, max_flow, demand, ?bounds, "candidate draw");

        let solution = match self.oracle.constrained_min_cost_flow(
            network,
            &draw.capacity,
            &draw.unit_cost,
            &draw.fixed_cost,
            &supply,
            &bounds,
        )? {
            OracleOutcome::Optimal(solution) => solution,
            OracleOutcome::Infeasible => {
                debug!(attempt, "bounded problem infeasible, redrawing");
                return Ok(None);
            }
        };

        let id = InstanceId::random(rng);
        info!(
            id = %id,
            attempt,
            demand,
            best_cost = solution.objective,
            "accepted instance"
        );
        Ok(Some(Instance {
            id,
            network: network.clone(),
            difficulty: params.difficulty.clone(),
            capacity: draw.capacity,
            unit_cost: draw.unit_cost,
            fixed_cost: draw.fixed_cost,
            bounds,
            source,
            destination,
            demand,
            best_cost: solution.objective,
            proof: solution.flow,
        }))
    }
}

impl<O: ExactOracle + Sync> ProblemGenerator<O> {
    /// Runs independent jobs in parallel. Results keep the job order.
    pub fn generate_batch(&self, jobs: &[GenerationJob]) -> Vec<Result<Option<Instance>>> {
        jobs.par_iter()
            .map(|job| {
                let mut rng = StdRng::seed_from_u64(job.seed);
                self.generate(&mut rng, &job.params)
            })
            .collect()
    }
}
