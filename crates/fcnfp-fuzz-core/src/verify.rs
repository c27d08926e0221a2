use crate::instance::Instance;
use crate::oracle::{charged_cost, ExactOracle, OracleOutcome};
use crate::{FuzzError, Result};

/// Charged cost of `flow` under cost column `column`.
pub fn flow_cost_with_charge(instance: &Instance, column: usize, flow: &[i64]) -> i128 {
    charged_cost(
        flow,
        &instance.unit_cost[column],
        &instance.fixed_cost[column],
    )
}

/// Number of side constraints whose charged cost stays within its bound.
pub fn count_satisfied_constraints(instance: &Instance, flow: &[i64]) -> usize {
    instance
        .bounds
        .iter()
        .enumerate()
        .filter(|&(k, &bound)| flow_cost_with_charge(instance, k, flow) <= i128::from(bound))
        .count()
}

/// Capacity bounds per arc, and node balance (inflow minus outflow) of `-demand` at the
/// source, `+demand` at the destination and zero elsewhere.
pub fn check_flow(instance: &Instance, flow: &[i64]) -> std::result::Result<(), String> {
    if flow.len() != instance.arc_count() {
        return Err(format!(
            "flow has {} entries for {} arcs",
            flow.len(),
            instance.arc_count()
        ));
    }
    let mut balance = vec![0_i128; instance.node_count()];
    for (a, (tail, head)) in instance.network.arcs().enumerate() {
        let f = flow[a];
        if f < 0 || f > instance.capacity[a] {
            return Err(format!(
                "arc {a} carries {f} outside [0, {}]",
                instance.capacity[a]
            ));
        }
        balance[tail as usize] -= i128::from(f);
        balance[head as usize] += i128::from(f);
    }
    for (node, &b) in balance.iter().enumerate() {
        let expected = if node == instance.source as usize {
            -instance.demand
        } else if node == instance.destination as usize {
            instance.demand
        } else {
            0
        };
        if b != i128::from(expected) {
            return Err(format!("node {node} has balance {b}, expected {expected}"));
        }
    }
    Ok(())
}

/// Checks that the stored proof certifies the stored best cost and bounds.
pub fn verify_instance(instance: &Instance) -> Result<()> {
    let invalid = |reason: String| FuzzError::InvalidProof {
        id: instance.id.to_string(),
        reason,
    };
    instance
        .check_shape()
        .map_err(|err| invalid(err.to_string()))?;
    if instance.demand < 1 {
        return Err(invalid(format!("demand {} is not positive", instance.demand)));
    }
    check_flow(instance, &instance.proof).map_err(invalid)?;
    let cost = flow_cost_with_charge(instance, 0, &instance.proof);
    if cost != i128::from(instance.best_cost) {
        return Err(invalid(format!(
            "proof costs {cost}, record claims {}",
            instance.best_cost
        )));
    }
    let satisfied = count_satisfied_constraints(instance, &instance.proof);
    if satisfied != instance.constraint_count() {
        return Err(invalid(format!(
            "proof satisfies {satisfied} of {} side constraints",
            instance.constraint_count()
        )));
    }
    Ok(())
}

/// Re-derives the certificate with an exact oracle: demand within max flow, and the
/// bounded optimum equal to the stored best cost.
pub fn reoptimize_instance<O: ExactOracle + ?Sized>(oracle: &O, instance: &Instance) -> Result<()> {
    let invalid = |reason: String| FuzzError::InvalidProof {
        id: instance.id.to_string(),
        reason,
    };
    let max_flow = oracle.max_flow(
        &instance.network,
        &instance.capacity,
        instance.source,
        instance.destination,
    )?;
    if instance.demand > max_flow {
        return Err(invalid(format!(
            "demand {} exceeds max flow {max_flow}",
            instance.demand
        )));
    }
    match oracle.constrained_min_cost_flow(
        &instance.network,
        &instance.capacity,
        &instance.unit_cost,
        &instance.fixed_cost,
        &instance.supply(),
        &instance.bounds,
    )? {
        OracleOutcome::Optimal(solution) if solution.objective == instance.best_cost => Ok(()),
        OracleOutcome::Optimal(solution) => Err(invalid(format!(
            "oracle optimum {} differs from recorded {}",
            solution.objective, instance.best_cost
        ))),
        OracleOutcome::Infeasible => Err(invalid("bounded problem is infeasible".to_string())),
    }
}
