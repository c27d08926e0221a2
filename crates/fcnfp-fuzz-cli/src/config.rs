//! TOML sweep configuration.
//!
//! ```toml
//! seed = 7
//! max_attempts = 100
//!
//! [[case]]
//! nodes = 20
//! arcs = 60
//! max_capacity = 50
//! max_cost = 20
//! max_fixed_cost = 10
//! difficulty = [0.5, 0.9]
//! repeat = 10
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use fcnfp_fuzz_core::generator::{job_seed, GenerationJob, GeneratorConfig, GeneratorParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Base seed; job `i` draws from `job_seed(seed, i)`.
    #[serde(default)]
    pub seed: u64,

    /// Retry and graph-resampling caps.
    #[serde(flatten)]
    pub generator: GeneratorConfig,

    #[serde(default, rename = "case")]
    pub cases: Vec<SweepCase>,
}

/// One instance shape, generated `repeat` times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepCase {
    #[serde(flatten)]
    pub params: GeneratorParams,

    #[serde(default = "default_repeat")]
    pub repeat: usize,
}

fn default_repeat() -> usize {
    1
}

impl SweepConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read sweep config {}", path.display()))?;
        Self::from_toml(&content)
            .with_context(|| format!("Failed to parse sweep config {}", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: SweepConfig = toml::from_str(content)?;
        for (i, case) in config.cases.iter_mut().enumerate() {
            // constraints may be left out when the difficulty list says it all
            if case.params.constraints == 0 {
                case.params.constraints = case.params.difficulty.len();
            }
            case.params
                .validate()
                .with_context(|| format!("Invalid sweep case #{}", i + 1))?;
        }
        Ok(config)
    }

    /// Expands every case `repeat` times, in file order, each with its own seed.
    pub fn jobs(&self) -> Vec<GenerationJob> {
        self.cases
            .iter()
            .flat_map(|case| std::iter::repeat(&case.params).take(case.repeat))
            .enumerate()
            .map(|(i, params)| GenerationJob {
                seed: job_seed(self.seed, i as u64),
                params: params.clone(),
            })
            .collect()
    }
}
