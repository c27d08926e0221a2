use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

use super::{charged_cost, ConstrainedSolution, ExactOracle, OracleOutcome};
use crate::graph::Network;
use crate::{FuzzError, Result};

/// Exact fixed-charge flow oracle on the pure-Rust `microlp` branch-and-bound solver.
///
/// Flow variables are integral in `[0, capacity[a]]`, activations binary, and every arc
/// couples as `flow[a] <= capacity[a] * active[a]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MilpOracle;

fn charged_expression(flow: &[Variable], active: &[Variable], unit: &[i64], fixed: &[i64]) -> Expression {
    flow.iter()
        .zip(active.iter())
        .zip(unit.iter().zip(fixed.iter()))
        .fold(0.0.into(), |acc: Expression, ((&x, &y), (&c, &fc))| {
            acc + (c as f64) * x + (fc as f64) * y
        })
}

fn solve_fixed_charge(
    network: &Network,
    capacity: &[i64],
    unit_costs: &[Vec<i64>],
    fixed_costs: &[Vec<i64>],
    supply: &[i64],
    bounds: &[i64],
) -> Result<OracleOutcome<ConstrainedSolution>> {
    network.expect_arc_len("capacity", capacity.len())?;
    network.expect_node_len("supply", supply.len())?;
    if unit_costs.is_empty() || unit_costs.len() != fixed_costs.len() {
        return Err(FuzzError::InvalidInput(
            "fixed-charge model needs matching, non-empty cost columns".to_string(),
        ));
    }
    if bounds.len() > unit_costs.len() {
        return Err(FuzzError::InvalidInput(format!(
            "{} bounds for {} cost columns",
            bounds.len(),
            unit_costs.len()
        )));
    }
    for (unit, fixed) in unit_costs.iter().zip(fixed_costs.iter()) {
        network.expect_arc_len("unit cost column", unit.len())?;
        network.expect_arc_len("fixed cost column", fixed.len())?;
    }

    let mut vars = ProblemVariables::new();
    let flow: Vec<Variable> = capacity
        .iter()
        .map(|&cap| vars.add(variable().integer().min(0).max(cap as f64)))
        .collect();
    let active: Vec<Variable> = capacity.iter().map(|_| vars.add(variable().binary())).collect();

    let objective = charged_expression(&flow, &active, &unit_costs[0], &fixed_costs[0]);
    let mut model = vars.minimise(objective).using(microlp);

    let mut balance: Vec<Expression> = vec![0.0.into(); network.node_count()];
    for (a, (tail, head)) in network.arcs().enumerate() {
        balance[tail as usize] += flow[a];
        balance[head as usize] -= flow[a];
    }
    for (net_outflow, &b) in balance.into_iter().zip(supply.iter()) {
        let b = b as f64;
        model = model.with(constraint!(net_outflow == b));
    }

    for ((&x, &y), &cap) in flow.iter().zip(active.iter()).zip(capacity.iter()) {
        let cap = cap as f64;
        model = model.with(constraint!(x <= cap * y));
    }

    for (k, &bound) in bounds.iter().enumerate() {
        let side = charged_expression(&flow, &active, &unit_costs[k], &fixed_costs[k]);
        let bound = bound as f64;
        model = model.with(constraint!(side <= bound));
    }

    match model.solve() {
        Ok(solution) => {
            let flow_values: Vec<i64> = flow
                .iter()
                .map(|&x| solution.value(x).round() as i64)
                .collect();
            let objective = i64::try_from(charged_cost(&flow_values, &unit_costs[0], &fixed_costs[0]))
                .map_err(|_| FuzzError::Oracle("objective does not fit in i64".to_string()))?;
            Ok(OracleOutcome::Optimal(ConstrainedSolution {
                objective,
                flow: flow_values,
            }))
        }
        Err(ResolutionError::Infeasible) => Ok(OracleOutcome::Infeasible),
        Err(err) => Err(FuzzError::Oracle(err.to_string())),
    }
}

impl ExactOracle for MilpOracle {
    fn min_cost_flow_lower_bound(
        &self,
        network: &Network,
        capacity: &[i64],
        unit_cost: &[i64],
        fixed_cost: &[i64],
        supply: &[i64],
    ) -> Result<OracleOutcome<i64>> {
        let outcome = solve_fixed_charge(
            network,
            capacity,
            &[unit_cost.to_vec()],
            &[fixed_cost.to_vec()],
            supply,
            &[],
        )?;
        Ok(match outcome {
            OracleOutcome::Optimal(solution) => OracleOutcome::Optimal(solution.objective),
            OracleOutcome::Infeasible => OracleOutcome::Infeasible,
        })
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
        solve_fixed_charge(network, capacity, unit_costs, fixed_costs, supply, bounds)
    }
}
