use std::fmt;

use rand::Rng;
use serde::Serialize;

use crate::graph::Network;
use crate::{FuzzError, Result};

pub const ID_WIDTH: usize = 16;
pub const SENTINEL_ID: &str = "0000000000000000";

/// Fixed-width opaque record id. The all-zero id terminates a stream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn parse(token: &str) -> Result<Self> {
        if token.len() != ID_WIDTH || !token.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(FuzzError::InvalidInput(format!(
                "id {token:?} is not {ID_WIDTH} printable characters"
            )));
        }
        Ok(Self(token.to_string()))
    }

    pub fn sentinel() -> Self {
        Self(SENTINEL_ID.to_string())
    }

    /// Random lowercase hex id; never the sentinel.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        loop {
            let raw: u64 = rng.gen();
            if raw != 0 {
                return Self(format!("{raw:016x}"));
            }
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == SENTINEL_ID
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// unit_cost[k][a], fixed_cost[k][a]; column 0 is the objective, max(k, 1) columns
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    pub id: InstanceId,
    pub network: Network,
    pub difficulty: Vec<f64>,
    pub capacity: Vec<i64>,
    pub unit_cost: Vec<Vec<i64>>,
    pub fixed_cost: Vec<Vec<i64>>,
    pub bounds: Vec<i64>,
    pub source: u32,
    pub destination: u32,
    pub demand: i64,
    pub best_cost: i64,
    pub proof: Vec<i64>,
}

impl Instance {
    pub fn node_count(&self) -> usize {
        self.network.node_count()
    }

    pub fn arc_count(&self) -> usize {
        self.network.arc_count()
    }

    pub fn constraint_count(&self) -> usize {
        self.bounds.len()
    }

    pub fn cost_columns(&self) -> usize {
        self.unit_cost.len()
    }

    /// Nominal difficulty of the primary objective, used for bucketing downstream.
    pub fn difficulty_tag(&self) -> f64 {
        self.difficulty.first().copied().unwrap_or(0.0)
    }

    pub fn supply(&self) -> Vec<i64> {
        self.network
            .supply_vector(self.source, self.destination, self.demand)
    }

    pub fn check_shape(&self) -> Result<()> {
        let m = self.arc_count();
        let k = self.constraint_count();
        let shape_err = |msg: String| Err(FuzzError::InvalidInput(msg));

        if self.difficulty.len() != k {
            return shape_err(format!(
                "{} difficulties for {k} constraints",
                self.difficulty.len()
            ));
        }
        if self.cost_columns() != k.max(1) || self.fixed_cost.len() != k.max(1) {
            return shape_err(format!(
                "{} cost columns for {k} constraints",
                self.cost_columns()
            ));
        }
        self.network.expect_arc_len("capacity", self.capacity.len())?;
        self.network.expect_arc_len("proof", self.proof.len())?;
        for (unit, fixed) in self.unit_cost.iter().zip(self.fixed_cost.iter()) {
            self.network.expect_arc_len("unit cost column", unit.len())?;
            self.network.expect_arc_len("fixed cost column", fixed.len())?;
        }
        let n = self.node_count() as u32;
        if self.source >= n || self.destination >= n || self.source == self.destination {
            return shape_err(format!(
                "endpoints {} -> {} invalid for {n} nodes",
                self.source, self.destination
            ));
        }
        if m == 0 {
            return shape_err("instance has no arcs".to_string());
        }
        Ok(())
    }
}

/// `mcf_*` describe the unconstrained baseline run, `approx_*` the constrained run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub id: InstanceId,
    pub difficulty: f64,
    pub best_cost: i64,
    pub constraint_count: usize,
    pub mcf_cost: i64,
    pub mcf_satisfied: usize,
    pub approx_cost: i64,
    pub approx_satisfied: usize,
}

/// Result streams tag records with a difficulty in `[0, 1]`; 0 marks an unconstrained run.
pub fn is_valid_difficulty(difficulty: f64) -> bool {
    (0.0..=1.0).contains(&difficulty)
}

impl ResultRecord {
    pub fn all_satisfied(&self) -> bool {
        self.approx_satisfied == self.constraint_count
    }

    pub fn mcf_all_satisfied(&self) -> bool {
        self.mcf_satisfied == self.constraint_count
    }

    /// `approx_cost / best_cost`; a zero optimum gives 1 for a zero approximation, else infinity.
    pub fn cost_ratio(&self) -> f64 {
        if self.best_cost == 0 {
            if self.approx_cost == 0 {
                1.0
            } else {
                f64::INFINITY
            }
        } else {
            self.approx_cost as f64 / self.best_cost as f64
        }
    }
}

impl fmt::Display for ResultRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {} {}",
            self.id,
            self.difficulty,
            self.best_cost,
            self.constraint_count,
            self.mcf_cost,
            self.mcf_satisfied,
            self.approx_cost,
            self.approx_satisfied
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_ids_are_fixed_width_and_not_sentinel() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..64 {
            let id = InstanceId::random(&mut rng);
            assert_eq!(id.as_str().len(), ID_WIDTH);
            assert!(!id.is_sentinel());
            assert_eq!(InstanceId::parse(id.as_str()).unwrap(), id);
        }
    }

    #[test]
    fn id_parse_rejects_wrong_width() {
        assert!(InstanceId::parse("abc").is_err());
        assert!(InstanceId::parse(SENTINEL_ID).unwrap().is_sentinel());
    }

    #[test]
    fn zero_optimum_ratio() {
        let mut record = ResultRecord {
            id: InstanceId::sentinel(),
            difficulty: 0.5,
            best_cost: 0,
            constraint_count: 1,
            mcf_cost: 0,
            mcf_satisfied: 1,
            approx_cost: 0,
            approx_satisfied: 1,
        };
        assert_eq!(record.cost_ratio(), 1.0);
        record.approx_cost = 3;
        assert!(record.cost_ratio().is_infinite());
    }

    #[test]
    fn difficulty_range_is_closed_unit_interval() {
        assert!(is_valid_difficulty(0.0));
        assert!(is_valid_difficulty(1.0));
        assert!(!is_valid_difficulty(-3.0));
        assert!(!is_valid_difficulty(1.5));
        assert!(!is_valid_difficulty(f64::NAN));
        assert!(!is_valid_difficulty(f64::INFINITY));
    }
}
