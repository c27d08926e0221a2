//! Accuracy statistics over result streams, bucketed by difficulty.

use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use tracing::{error, warn};

use crate::instance::{is_valid_difficulty, ResultRecord};

pub const QUANTILES: [f64; 4] = [0.5, 0.75, 0.95, 0.99];
pub const DEFAULT_OUTLIER_RATIO: f64 = 1.5;

/// `-log2(1 - d)`: spreads difficulties close to 1 over a wide range. `d = 1` maps to infinity.
pub fn difficulty_transform(difficulty: f64) -> f64 {
    -(1.0 - difficulty).log2()
}

/// Linear interpolation between order statistics of an ascending slice.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    if lo == hi || sorted[hi] == sorted[lo] {
        return Some(sorted[lo]);
    }
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// What [`AccuracyAnalyzer::record`] concluded about one record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Difficulty outside `[0, 1]`; the record is not counted.
    InvalidDifficulty,
    /// Some side constraint was violated; counts toward the failure rate only.
    Unsatisfied,
    Accepted { ratio: f64 },
    /// Feasible with a ratio above the outlier threshold.
    Outlier { ratio: f64 },
    /// Feasible and cheaper than the exact optimum, which cannot happen for a correct harness.
    BelowOptimum { ratio: f64 },
}

#[derive(Debug, Clone, Default)]
struct Bucket {
    difficulty: f64,
    trials: usize,
    successes: usize,
    mcf_successes: usize,
    ratios: Vec<f64>,
}

/// JSON has no infinity; non-finite values are written as `"inf"` or `"NaN"`.
struct Number(f64);

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_finite() {
            serializer.serialize_f64(self.0)
        } else {
            serializer.collect_str(&self.0)
        }
    }
}

fn serialize_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    Number(*value).serialize(serializer)
}

fn serialize_quantiles<S: Serializer>(
    values: &Option<[f64; 4]>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    (*values).map(|qs| qs.map(Number)).serialize(serializer)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSummary {
    pub difficulty: f64,
    #[serde(serialize_with = "serialize_number")]
    pub transformed: f64,
    pub trials: usize,
    pub success_rate: f64,
    pub mcf_success_rate: f64,
    pub feasible: usize,
    /// Ratio quantiles at [`QUANTILES`]; `None` when no trial was feasible.
    #[serde(serialize_with = "serialize_quantiles")]
    pub ratio_quantiles: Option<[f64; 4]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub buckets: Vec<BucketSummary>,
    pub outliers: Vec<ResultRecord>,
    pub violations: Vec<ResultRecord>,
}

impl AccuracyReport {
    /// Whether the success rate never rises from one bucket to the next harder one.
    pub fn success_rate_is_non_increasing(&self) -> bool {
        self.buckets
            .windows(2)
            .all(|pair| pair[1].success_rate <= pair[0].success_rate)
    }
}

/// Per-run accumulator; nothing is shared between analyzers.
#[derive(Debug, Clone)]
pub struct AccuracyAnalyzer {
    outlier_ratio: f64,
    // Keyed by the bit pattern of the transformed difficulty. For d in [0, 1] the
    // transform is non-negative, so the bits order like the value.
    buckets: BTreeMap<u64, Bucket>,
    outliers: Vec<ResultRecord>,
    violations: Vec<ResultRecord>,
}

impl Default for AccuracyAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_OUTLIER_RATIO)
    }
}

impl AccuracyAnalyzer {
    pub fn new(outlier_ratio: f64) -> Self {
        Self {
            outlier_ratio,
            buckets: BTreeMap::new(),
            outliers: Vec::new(),
            violations: Vec::new(),
        }
    }

    pub fn record(&mut self, record: &ResultRecord) -> Observation {
        if !is_valid_difficulty(record.difficulty) {
            warn!(
                id = %record.id,
                difficulty = record.difficulty,
                "difficulty outside [0, 1], record skipped"
            );
            return Observation::InvalidDifficulty;
        }
        let transformed = difficulty_transform(record.difficulty);
        // folds -0.0 (d = 0) onto 0.0 so both share a key
        let transformed = if transformed > 0.0 { transformed } else { 0.0 };
        let bucket = self.buckets.entry(transformed.to_bits()).or_default();
        bucket.difficulty = record.difficulty;
        bucket.trials += 1;
        if record.mcf_all_satisfied() {
            bucket.mcf_successes += 1;
        }
        if !record.all_satisfied() {
            return Observation::Unsatisfied;
        }
        bucket.successes += 1;

        let ratio = record.cost_ratio();
        if ratio < 1.0 {
            error!(
                id = %record.id,
                approx = record.approx_cost,
                exact = record.best_cost,
                "approximate cost below exact optimum"
            );
            self.violations.push(record.clone());
            return Observation::BelowOptimum { ratio };
        }
        bucket.ratios.push(ratio);
        if ratio > self.outlier_ratio {
            self.outliers.push(record.clone());
            Observation::Outlier { ratio }
        } else {
            Observation::Accepted { ratio }
        }
    }

    pub fn record_all<'a, I>(&mut self, records: I)
    where
        I: IntoIterator<Item = &'a ResultRecord>,
    {
        for record in records {
            self.record(record);
        }
    }

    pub fn violations(&self) -> &[ResultRecord] {
        &self.violations
    }

    pub fn report(&self) -> AccuracyReport {
        let buckets = self
            .buckets
            .iter()
            .map(|(&key, bucket)| {
                let mut ratios = bucket.ratios.clone();
                ratios.sort_by(f64::total_cmp);
                let ratio_quantiles = (!ratios.is_empty()).then(|| {
                    QUANTILES.map(|q| quantile(&ratios, q).unwrap_or(f64::NAN))
                });
                BucketSummary {
                    difficulty: bucket.difficulty,
                    transformed: f64::from_bits(key),
                    trials: bucket.trials,
                    success_rate: bucket.successes as f64 / bucket.trials as f64,
                    mcf_success_rate: bucket.mcf_successes as f64 / bucket.trials as f64,
                    feasible: ratios.len(),
                    ratio_quantiles,
                }
            })
            .collect();
        AccuracyReport {
            buckets,
            outliers: self.outliers.clone(),
            violations: self.violations.clone(),
        }
    }
}
