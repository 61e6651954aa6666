//! Error types for the pgvault core.

/// Core error type for pgvault infrastructure.
#[derive(Debug, thiserror::Error)]
pub enum PgVaultError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// A stage required a job-context key that was never set.
    #[error("missing job context key: {0}")]
    MissingContextKey(String),

    /// A job-context key holds a value of an unexpected type.
    #[error("job context key {key} has unexpected type (wanted {wanted})")]
    ContextTypeMismatch {
        /// The key that was looked up.
        key: String,
        /// The type the caller asked for.
        wanted: &'static str,
    },

    /// A workflow stage reported failure. The cause is opaque at the
    /// pipeline boundary; diagnostics live in the stage's log records.
    #[error("stage {stage} failed during {phase}")]
    StageFailed {
        /// Name of the failing stage.
        stage: &'static str,
        /// The phase (setup, execute, teardown) that failed.
        phase: &'static str,
        /// Underlying error.
        #[source]
        source: anyhow::Error,
    },

    /// Internal error with context.
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Convenience result type for pgvault operations.
pub type PgVaultResult<T> = Result<T, PgVaultError>;
