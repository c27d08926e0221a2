use std::cell::Cell;

use fcnfp_fuzz_core::generator::{
    difficulty_bound, job_seed, GenerationJob, GeneratorConfig, GeneratorParams, ProblemGenerator,
};
use fcnfp_fuzz_core::graph::Network;
use fcnfp_fuzz_core::oracle::{ConstrainedSolution, ExactOracle, MilpOracle, OracleOutcome};
use fcnfp_fuzz_core::verify::verify_instance;
use fcnfp_fuzz_core::{FuzzError, Result};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn unconstrained_params() -> GeneratorParams {
    GeneratorParams {
        nodes: 5,
        arcs: 10,
        max_capacity: 10,
        max_cost: 10,
        max_fixed_cost: 0,
        constraints: 0,
        difficulty: vec![],
    }
}

fn constrained_params(difficulty: Vec<f64>) -> GeneratorParams {
    GeneratorParams {
        nodes: 6,
        arcs: 14,
        max_capacity: 8,
        max_cost: 6,
        max_fixed_cost: 4,
        constraints: difficulty.len(),
        difficulty,
    }
}

/// Accepts any lower bound but never finds the bounded problem feasible.
struct NeverFeasible {
    constrained_calls: Cell<usize>,
}

impl ExactOracle for NeverFeasible {
    fn min_cost_flow_lower_bound(
        &self,
        _network: &Network,
        _capacity: &[i64],
        _unit_cost: &[i64],
        _fixed_cost: &[i64],
        _supply: &[i64],
    ) -> Result<OracleOutcome<i64>> {
        Ok(OracleOutcome::Optimal(10))
    }

    fn constrained_min_cost_flow(
        &self,
        _network: &Network,
        _capacity: &[i64],
        _unit_costs: &[Vec<i64>],
        _fixed_costs: &[Vec<i64>],
        _supply: &[i64],
        _bounds: &[i64],
    ) -> Result<OracleOutcome<ConstrainedSolution>> {
        self.constrained_calls.set(self.constrained_calls.get() + 1);
        Ok(OracleOutcome::Infeasible)
    }
}

/// Reports the unconstrained lower bound as infeasible, which can never happen legitimately.
struct BrokenLowerBound;

impl ExactOracle for BrokenLowerBound {
    fn min_cost_flow_lower_bound(
        &self,
        _network: &Network,
        _capacity: &[i64],
        _unit_cost: &[i64],
        _fixed_cost: &[i64],
        _supply: &[i64],
    ) -> Result<OracleOutcome<i64>> {
        Ok(OracleOutcome::Infeasible)
    }

    fn constrained_min_cost_flow(
        &self,
        _network: &Network,
        _capacity: &[i64],
        _unit_costs: &[Vec<i64>],
        _fixed_costs: &[Vec<i64>],
        _supply: &[i64],
        _bounds: &[i64],
    ) -> Result<OracleOutcome<ConstrainedSolution>> {
        panic!("bounded solve must not run after a failed lower bound");
    }
}

#[test]
fn unconstrained_best_cost_matches_plain_min_cost_flow() {
    let generator = ProblemGenerator::new(MilpOracle);
    for seed in 0..12 {
        let mut rng = StdRng::seed_from_u64(seed);
        let instance = generator
            .generate(&mut rng, &unconstrained_params())
            .unwrap()
            .expect("unconstrained draws are always feasible");
        assert_eq!(instance.constraint_count(), 0);
        assert_eq!(instance.cost_columns(), 1);
        assert!(instance.bounds.is_empty());

        let plain = MilpOracle
            .min_cost_flow(
                &instance.network,
                &instance.capacity,
                &instance.unit_cost[0],
                &instance.supply(),
            )
            .unwrap();
        assert_eq!(plain, OracleOutcome::Optimal(instance.best_cost), "seed {seed}");
        verify_instance(&instance).unwrap();
    }
}

#[test]
fn demand_never_exceeds_max_flow() {
    let generator = ProblemGenerator::new(MilpOracle);
    for seed in 100..110 {
        let mut rng = StdRng::seed_from_u64(seed);
        let Some(instance) = generator
            .generate(&mut rng, &constrained_params(vec![0.6]))
            .unwrap()
        else {
            continue;
        };
        let max_flow = MilpOracle
            .max_flow(
                &instance.network,
                &instance.capacity,
                instance.source,
                instance.destination,
            )
            .unwrap();
        assert!(instance.demand > 0 && instance.demand <= max_flow);
        assert_ne!(instance.source, instance.destination);
        assert_eq!(instance.proof.len(), instance.arc_count());
    }
}

#[test]
fn bounds_follow_difficulty_transform() {
    let generator = ProblemGenerator::new(MilpOracle);
    let difficulty = vec![0.5, 0.9];
    let mut accepted = 0;
    for seed in 0..8 {
        let mut rng = StdRng::seed_from_u64(seed);
        let Some(instance) = generator
            .generate(&mut rng, &constrained_params(difficulty.clone()))
            .unwrap()
        else {
            continue;
        };
        accepted += 1;
        let supply = instance.supply();
        for (k, &d) in difficulty.iter().enumerate() {
            let lower_bound = MilpOracle
                .min_cost_flow_lower_bound(
                    &instance.network,
                    &instance.capacity,
                    &instance.unit_cost[k],
                    &instance.fixed_cost[k],
                    &supply,
                )
                .unwrap()
                .optimal()
                .unwrap();
            assert_eq!(instance.bounds[k], difficulty_bound(lower_bound, d));
            assert!(instance.bounds[k] >= lower_bound);
        }
        verify_instance(&instance).unwrap();
    }
    assert!(accepted > 0, "no seed produced a feasible two-constraint instance");
}

#[test]
fn exhausted_retry_budget_yields_none() {
    let oracle = NeverFeasible {
        constrained_calls: Cell::new(0),
    };
    let generator = ProblemGenerator::new(&oracle);
    let mut rng = StdRng::seed_from_u64(9);
    let outcome = generator
        .generate(&mut rng, &constrained_params(vec![0.8]))
        .unwrap();
    assert!(outcome.is_none());
    assert_eq!(oracle.constrained_calls.get(), 100);

    let config = GeneratorConfig {
        max_attempts: 7,
        ..GeneratorConfig::default()
    };
    let oracle = NeverFeasible {
        constrained_calls: Cell::new(0),
    };
    let generator = ProblemGenerator::with_config(&oracle, &config);
    assert!(generator
        .generate(&mut rng, &constrained_params(vec![0.8]))
        .unwrap()
        .is_none());
    assert_eq!(oracle.constrained_calls.get(), 7);
}

#[test]
fn infeasible_lower_bound_is_fatal() {
    let generator = ProblemGenerator::new(BrokenLowerBound);
    let mut rng = StdRng::seed_from_u64(1);
    let err = generator
        .generate(&mut rng, &constrained_params(vec![0.5]))
        .unwrap_err();
    assert!(matches!(
        err,
        FuzzError::UnexpectedInfeasible {
            stage: "lower-bound"
        }
    ));
}

#[test]
fn invalid_params_are_rejected_before_sampling() {
    let generator = ProblemGenerator::new(MilpOracle);
    let mut rng = StdRng::seed_from_u64(1);
    let mut params = constrained_params(vec![0.5]);
    params.difficulty = vec![1.2];
    assert!(matches!(
        generator.generate(&mut rng, &params),
        Err(FuzzError::InvalidInput(_))
    ));
}

#[test]
fn seeded_generation_is_reproducible() {
    let generator = ProblemGenerator::new(MilpOracle);
    let params = constrained_params(vec![0.7]);
    let first = generator
        .generate(&mut StdRng::seed_from_u64(42), &params)
        .unwrap();
    let second = generator
        .generate(&mut StdRng::seed_from_u64(42), &params)
        .unwrap();
    assert_eq!(first, second);
}

#[test]
fn batch_matches_sequential_generation() {
    let generator = ProblemGenerator::new(MilpOracle);
    let jobs: Vec<GenerationJob> = (0..6)
        .map(|i| GenerationJob {
            seed: job_seed(2024, i),
            params: unconstrained_params(),
        })
        .collect();
    let batch = generator.generate_batch(&jobs);
    assert_eq!(batch.len(), jobs.len());
    for (job, result) in jobs.iter().zip(batch) {
        let sequential = generator
            .generate(&mut StdRng::seed_from_u64(job.seed), &job.params)
            .unwrap();
        assert_eq!(result.unwrap(), sequential);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn accepted_instances_carry_valid_proofs(seed in 0u64..10_000, d in 0.2f64..1.0) {
        let generator = ProblemGenerator::new(MilpOracle);
        let mut rng = StdRng::seed_from_u64(seed);
        if let Some(instance) = generator.generate(&mut rng, &constrained_params(vec![d])).unwrap() {
            prop_assert!(verify_instance(&instance).is_ok());
            prop_assert_eq!(instance.difficulty, vec![d]);
            prop_assert!(!instance.id.is_sentinel());
        }
    }
}
