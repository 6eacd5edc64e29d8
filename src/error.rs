use thiserror::Error;

/// Crate-wide result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the gas core and its driver.
///
/// Configuration edits coming from an adapter never produce an error; they are
/// clamped. The variants below cover construction-time geometry, particle
/// placement and config file handling.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid construction or API parameter.
    #[error("invalid parameter: {0}")]
    InvalidParam(String),

    /// Rejection sampling could not place a particle without overlap.
    #[error("could not place particle {index} of {requested} without overlap after {attempts} attempts")]
    Placement {
        index: usize,
        requested: usize,
        attempts: usize,
    },

    /// A configuration document could not be decoded.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    /// Propagated I/O errors (config file loading).
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
