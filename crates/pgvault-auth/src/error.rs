//! Signing error types.

/// Errors raised while computing request signatures.
///
/// Signature computation itself is deterministic; failures here are either
/// local I/O (hashing a source file) or malformed key material, and are
/// treated as fatal by the upload path.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    /// Reading a source file for payload hashing failed.
    #[error("failed to hash payload file: {0}")]
    PayloadHash(#[from] std::io::Error),

    /// The Azure shared key is not valid base64.
    #[error("invalid shared key: {0}")]
    InvalidSharedKey(#[from] base64::DecodeError),
}

/// Convenience result type for signing operations.
pub type SigningResult<T> = Result<T, SigningError>;
