//! Offload error taxonomy.

use std::path::PathBuf;

use pgvault_core::catalog::CatalogError;

/// Errors from uploading a backup tree to remote storage.
///
/// Every variant is terminal for the current job: the upload path performs
/// no retries, so the caller sees exactly what stopped the transfer and at
/// which file.
#[derive(Debug, thiserror::Error)]
pub enum OffloadError {
    /// The remote host could not be reached.
    #[error("failed to connect to {host}: {source}")]
    Connect {
        /// The host that was dialed.
        host: String,
        /// Underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request or response broke off mid-flight.
    #[error("protocol error talking to {host}: {source}")]
    Protocol {
        /// The host involved.
        host: String,
        /// Underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("remote rejected PUT {path} with status {status}: {snippet}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// The request path that was rejected.
        path: String,
        /// Truncated response body for diagnostics.
        snippet: String,
    },

    /// Computing the request signature failed.
    #[error(transparent)]
    Signing(#[from] pgvault_auth::SigningError),

    /// Reading the local backup tree failed.
    #[error("local i/o error on {path}: {source}")]
    LocalIo {
        /// The local path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A remote object key exceeds the supported length.
    #[error("remote path for {path} is {len} bytes, above the {max}-byte limit")]
    PathTooLong {
        /// The local file whose key is too long.
        path: PathBuf,
        /// Actual key length in bytes.
        len: usize,
        /// The enforced limit.
        max: usize,
    },

    /// A file name in the backup tree is not valid UTF-8.
    #[error("file name is not valid utf-8: {path}")]
    InvalidFileName {
        /// The offending path.
        path: PathBuf,
    },

    /// Catalog record access failed.
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

/// Convenience result type for offload operations.
pub type OffloadResult<T> = Result<T, OffloadError>;
