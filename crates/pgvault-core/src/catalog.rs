//! The backup catalog: per-backup metadata records and their storage.
//!
//! Every backup directory carries a `backup.info` record with sizing,
//! validity, and timing metadata. Offload stages load the record before an
//! upload, set the relevant elapsed-time field only after the upload fully
//! succeeded, and persist it back. Metadata reflects completed work only.
//!
//! Records are scoped per (server, label) and never contended across jobs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

/// File name of the on-disk record inside a backup directory.
const RECORD_FILE: &str = "backup.info";

/// Errors from catalog record access.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// No record exists for the label.
    #[error("no backup record for label {0}")]
    NotFound(String),

    /// Filesystem failure reading or writing a record.
    #[error("catalog i/o error for {path}: {source}")]
    Io {
        /// The record path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A record exists but cannot be parsed.
    #[error("malformed backup record at {path}: {source}")]
    Malformed {
        /// The record path involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Per-backup metadata persisted alongside the backup data.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupRecord {
    /// The backup label (directory name).
    pub label: String,
    /// Whether the backup completed and verified successfully.
    pub valid: bool,
    /// Total size of the backup data in bytes.
    pub backup_size: u64,
    /// Seconds spent taking the base backup.
    pub basebackup_elapsed_time: f64,
    /// Seconds spent uploading to S3; zero until an upload succeeds.
    #[serde(default)]
    pub remote_s3_elapsed_time: f64,
    /// Seconds spent uploading to Azure; zero until an upload succeeds.
    #[serde(default)]
    pub remote_azure_elapsed_time: f64,
}

impl BackupRecord {
    /// Create a fresh record for a new backup.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            valid: false,
            backup_size: 0,
            basebackup_elapsed_time: 0.0,
            remote_s3_elapsed_time: 0.0,
            remote_azure_elapsed_time: 0.0,
        }
    }
}

/// Read/write access to backup records.
///
/// `base_dir` is the server's backup directory (the one holding one
/// subdirectory per label).
#[async_trait]
pub trait BackupCatalog: Send + Sync {
    /// Load the record for a label.
    async fn load_record(&self, base_dir: &Path, label: &str) -> CatalogResult<BackupRecord>;

    /// Persist a record (the record's label selects the directory).
    async fn save_record(&self, base_dir: &Path, record: &BackupRecord) -> CatalogResult<()>;
}

/// File-backed catalog storing one JSON record per backup directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileCatalog;

impl FileCatalog {
    fn record_path(base_dir: &Path, label: &str) -> PathBuf {
        base_dir.join(label).join(RECORD_FILE)
    }
}

#[async_trait]
impl BackupCatalog for FileCatalog {
    async fn load_record(&self, base_dir: &Path, label: &str) -> CatalogResult<BackupRecord> {
        let path = Self::record_path(base_dir, label);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::NotFound(label.to_owned()));
            }
            Err(e) => return Err(CatalogError::Io { path, source: e }),
        };

        let record: BackupRecord =
            serde_json::from_slice(&raw).map_err(|e| CatalogError::Malformed {
                path: path.clone(),
                source: e,
            })?;

        debug!(label = %label, path = %path.display(), "loaded backup record");
        Ok(record)
    }

    async fn save_record(&self, base_dir: &Path, record: &BackupRecord) -> CatalogResult<()> {
        let path = Self::record_path(base_dir, &record.label);
        let raw = serde_json::to_vec_pretty(record).map_err(|e| CatalogError::Malformed {
            path: path.clone(),
            source: e,
        })?;

        tokio::fs::write(&path, raw)
            .await
            .map_err(|e| CatalogError::Io {
                path: path.clone(),
                source: e,
            })?;

        debug!(label = %record.label, path = %path.display(), "saved backup record");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_should_round_trip_record_through_file_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let base_dir = dir.path();
        tokio::fs::create_dir_all(base_dir.join("2025-01-01"))
            .await
            .unwrap();

        let catalog = FileCatalog;
        let mut record = BackupRecord::new("2025-01-01");
        record.valid = true;
        record.backup_size = 4096;
        record.basebackup_elapsed_time = 12.5;

        catalog.save_record(base_dir, &record).await.unwrap();
        let loaded = catalog.load_record(base_dir, "2025-01-01").await.unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_should_report_not_found_for_missing_record() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FileCatalog;

        let result = catalog.load_record(dir.path(), "2024-12-31").await;
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_should_report_malformed_record() {
        let dir = tempfile::tempdir().unwrap();
        let base_dir = dir.path();
        tokio::fs::create_dir_all(base_dir.join("2025-01-01"))
            .await
            .unwrap();
        tokio::fs::write(base_dir.join("2025-01-01").join(RECORD_FILE), b"not json")
            .await
            .unwrap();

        let catalog = FileCatalog;
        let result = catalog.load_record(base_dir, "2025-01-01").await;
        assert!(matches!(result, Err(CatalogError::Malformed { .. })));
    }

    #[test]
    fn test_should_default_elapsed_fields_on_older_records() {
        // Records written before remote offloading existed lack the
        // elapsed-time fields; they deserialize as zero.
        let raw = r#"{"label":"x","valid":true,"backupSize":1,"basebackupElapsedTime":1.0}"#;
        let record: BackupRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.remote_s3_elapsed_time, 0.0);
        assert_eq!(record.remote_azure_elapsed_time, 0.0);
    }
}
