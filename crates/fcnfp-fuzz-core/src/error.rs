use thiserror::Error;

/// Result type for fuzzing harness operations
pub type Result<T> = std::result::Result<T, FuzzError>;

#[derive(Error, Debug)]
pub enum FuzzError {
    /// A caller-supplied argument violates a precondition
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The successive-shortest-path engine could not route the full supply
    #[error("flow problem is infeasible")]
    Infeasible,

    /// An exact oracle reported infeasibility for a problem that is feasible by construction
    #[error("oracle reported infeasible at the {stage} stage, which is feasible by construction")]
    UnexpectedInfeasible { stage: &'static str },

    /// The exact oracle backend failed for a reason other than infeasibility
    #[error("oracle error: {0}")]
    Oracle(String),

    /// Graph sampling never produced a path between the endpoints
    #[error("no path {from} -> {to} after {attempts} graph samples")]
    GraphUnconstructible { from: u32, to: u32, attempts: usize },

    /// The instance stream and the result stream disagree on the record id
    #[error("stream desynchronized: instance {instance} paired with result {result}")]
    Desynchronized { instance: String, result: String },

    /// A record could not be parsed
    #[error("malformed record {id} at line {line}: {reason}")]
    Malformed {
        line: usize,
        id: String,
        reason: String,
    },

    /// A stored proof does not certify its instance
    #[error("instance {id} carries an invalid proof: {reason}")]
    InvalidProof { id: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
