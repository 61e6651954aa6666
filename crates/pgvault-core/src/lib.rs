//! Core types, configuration, and workflow plumbing for pgvault.
//!
//! This crate provides the foundational building blocks shared across the
//! pgvault offload backends: the env-driven configuration surface, the
//! workflow-stage contract with its job context and pipeline driver, and the
//! backup catalog that persists per-backup metadata.

mod config;
mod error;

pub mod catalog;
pub mod workflow;

pub use config::{AzureConfig, OffloadConfig, S3Config, StorageEngine};
pub use error::{PgVaultError, PgVaultResult};
