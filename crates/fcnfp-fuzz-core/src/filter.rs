use std::io::{BufRead, Write};

use serde::Serialize;
use tracing::debug;

use crate::codec::{write_instance, write_sentinel, InstanceReader, ResultReader};
use crate::instance::{Instance, ResultRecord};
use crate::{FuzzError, Result};

pub const DEFAULT_TOLERANCE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Easy,
    /// Some side constraint was violated.
    Violated,
    /// Feasible, but costlier than `(1 + tolerance)` times the optimum.
    Suboptimal,
}

impl Classification {
    pub fn is_hard(self) -> bool {
        !matches!(self, Classification::Easy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FilterSummary {
    pub seen: usize,
    pub hard: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct HardCaseFilter {
    pub tolerance: f64,
}

impl Default for HardCaseFilter {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl HardCaseFilter {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    pub fn classify(&self, instance: &Instance, result: &ResultRecord) -> Classification {
        if result.approx_satisfied < instance.constraint_count() {
            Classification::Violated
        } else if result.approx_cost as f64 > (1.0 + self.tolerance) * instance.best_cost as f64 {
            Classification::Suboptimal
        } else {
            Classification::Easy
        }
    }

    /// Joins the two streams in lockstep and writes every hard instance, the sentinel and
    /// the `count_all` / `count_hard` summary lines to `out`.
    pub fn run<P, Q, W>(&self, problems: P, results: Q, out: &mut W) -> Result<FilterSummary>
    where
        P: BufRead,
        Q: BufRead,
        W: Write + ?Sized,
    {
        let mut problems = InstanceReader::new(problems);
        let mut results = ResultReader::new(results);
        let mut summary = FilterSummary::default();

        loop {
            let instance = problems.read_instance()?;
            let result = results.next().transpose()?;
            let (instance, result) = match (instance, result) {
                (None, None) => break,
                (Some(instance), Some(result)) => (instance, result),
                (Some(instance), None) => {
                    return Err(FuzzError::Desynchronized {
                        instance: instance.id.to_string(),
                        result: "<end of results>".to_string(),
                    })
                }
                (None, Some(result)) => {
                    return Err(FuzzError::Desynchronized {
                        instance: "<end of instances>".to_string(),
                        result: result.id.to_string(),
                    })
                }
            };
            if instance.id != result.id {
                return Err(FuzzError::Desynchronized {
                    instance: instance.id.to_string(),
                    result: result.id.to_string(),
                });
            }

            summary.seen += 1;
            let class = self.classify(&instance, &result);
            debug!(id = %instance.id, ?class, "classified");
            if class.is_hard() {
                write_instance(out, &instance)?;
                summary.hard += 1;
            }
        }

        write_sentinel(out)?;
        writeln!(out, "count_all {}", summary.seen)?;
        writeln!(out, "count_hard {}", summary.hard)?;
        Ok(summary)
    }
}
