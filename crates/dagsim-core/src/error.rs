use thiserror::Error;

/// Failures raised by a distribution's sampling routine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DistributionError {
    /// Normal scale is negative, NaN or infinite.
    #[error("invalid scale {0}: must be finite and >= 0")]
    InvalidScale(f64),
    /// Bernoulli success probability outside [0, 1].
    #[error("invalid probability {value}: {reason}")]
    InvalidProbability { value: f64, reason: String },
    /// Poisson rate rejected by the sampler.
    #[error("invalid rate {value}: {reason}")]
    InvalidRate { value: f64, reason: String },
    /// Discrete value set and probability vector differ in length.
    #[error("shape mismatch: {values} values but {probabilities} probabilities")]
    ShapeMismatch { values: usize, probabilities: usize },
    /// Discrete probability vector does not sum to one.
    #[error("probabilities sum to {0}, expected 1")]
    ProbabilitiesNotNormalized(f64),
    /// Discrete weights rejected by the weighted sampler.
    #[error("invalid weights: {0}")]
    InvalidWeights(String),
}

/// Core error type shared across dagsim crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A node's distribution failed while drawing its column.
    #[error("sampling failed for node '{node}': {source}")]
    Sampling {
        node: String,
        #[source]
        source: DistributionError,
    },
    /// The variable graph contains at least one cycle; `nodes` lie on one.
    #[error("graph contains a cycle through: {}", nodes.join(", "))]
    Cycle { nodes: Vec<String> },
    /// A node name was looked up but never declared.
    #[error("unknown node: {0}")]
    UnknownNode(String),
}

/// Convenience alias for results returned by dagsim crates.
pub type Result<T> = std::result::Result<T, Error>;
