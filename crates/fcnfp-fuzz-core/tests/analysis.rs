use approx::assert_relative_eq;
use fcnfp_fuzz_core::analysis::{AccuracyAnalyzer, Observation};
use fcnfp_fuzz_core::generator::{job_seed, GeneratorParams, ProblemGenerator};
use fcnfp_fuzz_core::oracle::{ExactOracle, MilpOracle};
use fcnfp_fuzz_core::verify::{count_satisfied_constraints, flow_cost_with_charge};
use fcnfp_fuzz_core::{Instance, InstanceId, ResultRecord};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn record(id: u64, difficulty: f64, best: i64, approx: i64, satisfied: usize) -> ResultRecord {
    ResultRecord {
        id: InstanceId::parse(&format!("{id:016x}")).unwrap(),
        difficulty,
        best_cost: best,
        constraint_count: 1,
        mcf_cost: best,
        mcf_satisfied: 1,
        approx_cost: approx,
        approx_satisfied: satisfied,
    }
}

#[test]
fn buckets_are_ordered_by_difficulty() {
    let mut analyzer = AccuracyAnalyzer::default();
    analyzer.record_all(&[
        record(1, 0.9, 10, 11, 1),
        record(2, 0.5, 10, 10, 1),
        record(3, 0.0, 10, 10, 1),
        record(4, 0.9, 10, 10, 0),
    ]);
    let report = analyzer.report();
    let difficulties: Vec<f64> = report.buckets.iter().map(|b| b.difficulty).collect();
    assert_eq!(difficulties, vec![0.0, 0.5, 0.9]);
    assert_relative_eq!(report.buckets[0].transformed, 0.0);
    assert_relative_eq!(report.buckets[1].transformed, 1.0);

    let hardest = &report.buckets[2];
    assert_eq!(hardest.trials, 2);
    assert_eq!(hardest.feasible, 1);
    assert_relative_eq!(hardest.success_rate, 0.5);
    assert_relative_eq!(hardest.mcf_success_rate, 1.0);
    assert!(report.success_rate_is_non_increasing());
}

#[test]
fn ratio_quantiles_use_feasible_trials_only() {
    let mut analyzer = AccuracyAnalyzer::default();
    for (i, approx) in [10, 11, 12, 13, 14].into_iter().enumerate() {
        analyzer.record(&record(i as u64 + 1, 0.75, 10, approx, 1));
    }
    analyzer.record(&record(9, 0.75, 10, 1_000, 0));

    let report = analyzer.report();
    let quantiles = report.buckets[0].ratio_quantiles.unwrap();
    assert_relative_eq!(quantiles[0], 1.2);
    assert_relative_eq!(quantiles[1], 1.3);
    assert_relative_eq!(quantiles[2], 1.38, epsilon = 1e-12);
    assert_relative_eq!(quantiles[3], 1.396, epsilon = 1e-12);
    assert!(report.outliers.is_empty());
}

#[test]
fn classifies_outliers_and_violations() {
    let mut analyzer = AccuracyAnalyzer::new(1.5);
    assert_eq!(
        analyzer.record(&record(1, 0.5, 10, 20, 1)),
        Observation::Outlier { ratio: 2.0 }
    );
    assert_eq!(
        analyzer.record(&record(2, 0.5, 10, 15, 1)),
        Observation::Accepted { ratio: 1.5 }
    );
    assert_eq!(
        analyzer.record(&record(3, 0.5, 10, 9, 1)),
        Observation::BelowOptimum { ratio: 0.9 }
    );
    assert_eq!(
        analyzer.record(&record(4, 0.5, 10, 1, 0)),
        Observation::Unsatisfied
    );

    assert_eq!(analyzer.violations().len(), 1);
    let report = analyzer.report();
    assert_eq!(report.outliers.len(), 1);
    assert_eq!(report.outliers[0].approx_cost, 20);
    assert_eq!(report.buckets[0].feasible, 2);
}

#[test]
fn zero_optimum_ratios() {
    let mut analyzer = AccuracyAnalyzer::default();
    assert_eq!(
        analyzer.record(&record(1, 0.2, 0, 0, 1)),
        Observation::Accepted { ratio: 1.0 }
    );
    assert!(matches!(
        analyzer.record(&record(2, 0.2, 0, 3, 1)),
        Observation::Outlier { ratio } if ratio.is_infinite()
    ));
}

#[test]
fn bucket_without_feasible_trials_has_no_quantiles() {
    let mut analyzer = AccuracyAnalyzer::default();
    analyzer.record(&record(1, 0.99, 10, 5, 0));
    let report = analyzer.report();
    assert_eq!(report.buckets[0].ratio_quantiles, None);
    assert_relative_eq!(report.buckets[0].success_rate, 0.0);
}

#[test]
fn json_report_spells_out_infinities() {
    let mut analyzer = AccuracyAnalyzer::default();
    analyzer.record(&record(1, 1.0, 0, 3, 1));
    let json = serde_json::to_value(analyzer.report()).unwrap();
    let bucket = &json["buckets"][0];
    assert_eq!(bucket["difficulty"], 1.0);
    assert_eq!(bucket["transformed"], "inf");
    assert_eq!(bucket["ratio_quantiles"][0], "inf");
    assert_eq!(json["outliers"][0]["approx_cost"], 3);
}

#[test]
fn out_of_range_difficulties_are_not_bucketed() {
    let mut analyzer = AccuracyAnalyzer::default();
    assert!(matches!(
        analyzer.record(&record(1, 0.0, 10, 10, 1)),
        Observation::Accepted { .. }
    ));
    for (id, difficulty) in [(2, 1.5), (3, -3.0), (4, f64::NAN)] {
        assert_eq!(
            analyzer.record(&record(id, difficulty, 10, 10, 1)),
            Observation::InvalidDifficulty
        );
    }
    let report = analyzer.report();
    assert_eq!(report.buckets.len(), 1);
    assert_eq!(report.buckets[0].difficulty, 0.0);
    assert_eq!(report.buckets[0].trials, 1);
}

/// Scores the unconstrained column-0 optimum against the instance's side constraints.
fn baseline_record(instance: &Instance) -> ResultRecord {
    let flow = MilpOracle
        .constrained_min_cost_flow(
            &instance.network,
            &instance.capacity,
            &instance.unit_cost[..1],
            &instance.fixed_cost[..1],
            &instance.supply(),
            &[],
        )
        .unwrap()
        .optimal()
        .unwrap()
        .flow;
    let cost = i64::try_from(flow_cost_with_charge(instance, 0, &flow)).unwrap();
    let satisfied = count_satisfied_constraints(instance, &flow);
    ResultRecord {
        id: instance.id.clone(),
        difficulty: instance.difficulty_tag(),
        best_cost: instance.best_cost,
        constraint_count: instance.constraint_count(),
        mcf_cost: cost,
        mcf_satisfied: satisfied,
        approx_cost: cost,
        approx_satisfied: satisfied,
    }
}

#[test]
fn success_rate_falls_with_difficulty() {
    const TRIALS: u64 = 25;
    let generator = ProblemGenerator::new(MilpOracle);
    let mut analyzer = AccuracyAnalyzer::default();
    for d in [0.2, 0.5, 0.8, 1.0] {
        let params = GeneratorParams {
            nodes: 6,
            arcs: 14,
            max_capacity: 8,
            max_cost: 6,
            max_fixed_cost: 4,
            constraints: 2,
            difficulty: vec![d, d],
        };
        for trial in 0..TRIALS {
            let mut rng = StdRng::seed_from_u64(job_seed(31, trial));
            if let Some(instance) = generator.generate(&mut rng, &params).unwrap() {
                analyzer.record(&baseline_record(&instance));
            }
        }
    }

    // d = 1 needs one flow optimal for both columns and may yield no instance
    let report = analyzer.report();
    assert!(report.buckets.len() >= 3);
    assert_eq!(report.buckets[0].difficulty, 0.2);
    for pair in report.buckets.windows(2) {
        assert!(
            pair[1].success_rate <= pair[0].success_rate + 0.1,
            "success rate rose from {} at d={} to {} at d={}",
            pair[0].success_rate,
            pair[0].difficulty,
            pair[1].success_rate,
            pair[1].difficulty
        );
    }
    let easiest = &report.buckets[0];
    let hardest = &report.buckets[report.buckets.len() - 1];
    assert!(easiest.trials > TRIALS as usize / 2);
    assert!(hardest.success_rate <= easiest.success_rate);
}
