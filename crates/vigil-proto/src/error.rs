use thiserror::Error;

pub type Result<T> = std::result::Result<T, GuardError>;

/// Failures the core reports back to its caller. None of them is fatal: each
/// degrades to "no detection this tick" or "command ignored".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    /// Arm attempted without a usable frame. Retry on a later tick.
    #[error("not ready: {0}")]
    NotReady(String),

    /// Persisted zone data could not be parsed. In-memory zones are kept.
    #[error("corrupt zone data: {0}")]
    CorruptData(String),

    /// Rejected or corrected geometry (zoom below 1.0, polygon under 3 points).
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Zone persistence backend failed to read or write.
    #[error("zone storage: {0}")]
    Storage(String),
}
