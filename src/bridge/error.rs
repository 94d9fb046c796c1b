use thiserror::Error;

/// Failures surfaced by a bridge call
///
/// A missing bridge is not an error; callers see it as an absent capability.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The host ran the method and reported failure
    #[error("{0}")]
    Host(String),

    /// The host reported success but a value-returning call carried no data
    #[error("{}", crate::constants::messages::NO_DATA)]
    NoData,

    /// The call could not be delivered or answered
    #[error("bridge transport failed: {0}")]
    Transport(String),

    #[error("invalid payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BridgeError {
    pub fn transport(err: impl std::fmt::Display) -> Self {
        BridgeError::Transport(err.to_string())
    }
}
