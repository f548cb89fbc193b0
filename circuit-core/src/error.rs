use thiserror::Error;

/// Failures that abort a phase. Out-of-turn triggers and zero-supply /
/// zero-size conditions are handled in-band and never reach this enum.
#[derive(Debug, Clone, Error)]
pub enum CircuitError {
    #[error("{owner} has no sales stock")]
    MissingSalesStock { owner: String },

    #[error("{owner} has no money stock")]
    MissingMoneyStock { owner: String },

    #[error("dangling {kind} reference: {id}")]
    MissingEntity { kind: &'static str, id: u64 },

    #[error("fixture rejected: {0}")]
    Fixture(String),
}

impl From<serde_json::Error> for CircuitError {
    fn from(err: serde_json::Error) -> Self {
        CircuitError::Fixture(err.to_string())
    }
}
