//! Remote storage offload stages for pgvault backups.
//!
//! A completed backup is a directory tree on local disk. This crate uploads
//! that tree to remote object storage, one file per PUT, as workflow stages
//! that plug into the post-backup pipeline. Two backends are provided: S3
//! (AWS Signature Version 4) and Azure Blob Storage (shared key).
//!
//! Uploads are strictly sequential and fail fast; there are no retries at
//! this layer, a failed job is simply rerun. The backup's catalog record is
//! updated only after every file landed, and the local data tree is removed
//! only after a complete upload.
//!
//! # Modules
//!
//! - [`uploader`] - Recursive, ordered, fail-fast tree traversal
//! - [`s3`] - S3 target and workflow stage
//! - [`azure`] - Azure Blob Storage target and workflow stage
//! - [`http`] - The PUT boundary between upload logic and the network
//! - [`paths`] - Local and remote backup directory layout
//! - [`error`] - Offload error taxonomy

pub mod azure;
pub mod error;
pub mod http;
pub mod paths;
pub mod s3;
pub mod uploader;

pub use azure::{AZURE_OFFLOAD_COMPLETE, AzureStorageStage, AzureTarget};
pub use error::{OffloadError, OffloadResult};
pub use http::{HttpPutClient, PutRequest, PutResponse, ReqwestPutClient};
pub use s3::{S3_OFFLOAD_COMPLETE, S3StorageStage, S3Target};
pub use uploader::{MAX_REMOTE_PATH, UploadTarget, upload_tree};
