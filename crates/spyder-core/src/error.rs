use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for spyder operations
pub type Result<T> = std::result::Result<T, SpyderError>;

/// Errors that can occur while enumerating subdomains
#[derive(Error, Debug)]
pub enum SpyderError {
    /// Every resolution attempt for a name failed or returned no addresses
    #[error("resolution failed: {name}")]
    ResolutionFailed {
        /// Name that could not be resolved
        name: String,
    },

    /// A single upstream query failed
    #[error("DNS query failed: {0}")]
    Dns(String),

    /// Passive certificate feed could not be reached or read
    #[error("passive source unavailable: {0}")]
    SourceUnavailable(String),

    /// Candidate wordlist could not be opened
    #[error("cannot open candidate source {}: {source}", path.display())]
    CandidateSourceOpenFailed {
        /// Path of the wordlist
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The run's cancellation token fired
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing/serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SpyderError {
    /// Returns true if the error is worth another attempt on a different upstream
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Dns(_))
    }

    /// Returns true if the error was caused by cancellation
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
