#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A caller broke a function contract (e.g. asked for a zero-length secret).
    #[error("Precondition failed: {0}")]
    Precondition(String),
}
