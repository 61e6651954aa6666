//! Configuration for the pgvault offload pipeline.
//!
//! All configuration is driven by environment variables. The keys mirror the
//! main backup manager's configuration file entries so both halves of the
//! system read the same names.
//!
//! Offload configuration is loaded once at startup and handed to each stage
//! constructor as an immutable value; nothing reads configuration from hidden
//! global state while a job is in flight.

use std::path::PathBuf;

use crate::error::{PgVaultError, PgVaultResult};

/// A storage engine selected for backup post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageEngine {
    /// Keep the backup on local disk only.
    Local,
    /// Offload to an S3-compatible bucket.
    S3,
    /// Offload to an Azure Blob Storage container.
    Azure,
}

impl StorageEngine {
    /// Parse a comma-separated engine list (e.g. `"local,s3"`).
    ///
    /// Unknown names are rejected rather than ignored so a typo in the
    /// configuration cannot silently disable offloading.
    pub fn parse_list(raw: &str) -> PgVaultResult<Vec<Self>> {
        let mut engines = Vec::new();
        for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let engine = match name.to_lowercase().as_str() {
                "local" => Self::Local,
                "s3" => Self::S3,
                "azure" => Self::Azure,
                other => {
                    return Err(PgVaultError::Config(format!(
                        "unknown storage engine: {other}"
                    )));
                }
            };
            if !engines.contains(&engine) {
                engines.push(engine);
            }
        }
        if engines.is_empty() {
            engines.push(Self::Local);
        }
        Ok(engines)
    }
}

/// S3 offload settings.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    /// The AWS region.
    pub aws_region: String,
    /// The IAM access key id.
    pub access_key_id: String,
    /// The IAM secret access key.
    pub secret_access_key: String,
    /// The bucket name.
    pub bucket: String,
    /// The bucket-relative base directory for uploads.
    pub base_dir: String,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("aws_region", &self.aws_region)
            .field("access_key_id", &self.access_key_id)
            .field("bucket", &self.bucket)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

/// Azure Blob Storage offload settings.
#[derive(Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureConfig {
    /// The storage account name.
    pub storage_account: String,
    /// The container name.
    pub container: String,
    /// The base64-encoded shared account key.
    pub shared_key: String,
    /// The container-relative base directory for uploads.
    pub base_dir: String,
}

impl std::fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureConfig")
            .field("storage_account", &self.storage_account)
            .field("container", &self.container)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

/// Top-level offload configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OffloadConfig {
    /// Local backups root (the directory that holds `<server>/backup/<label>`).
    pub base_dir: PathBuf,
    /// The storage engines enabled for post-processing.
    pub storage_engines: Vec<StorageEngine>,
    /// S3 settings; required when the s3 engine is enabled.
    pub s3: Option<S3Config>,
    /// Azure settings; required when the azure engine is enabled.
    pub azure: Option<AzureConfig>,
    /// Log level.
    pub log_level: String,
}

impl Default for OffloadConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("/var/lib/pgvault"),
            storage_engines: vec![StorageEngine::Local],
            s3: None,
            azure: None,
            log_level: "info".to_owned(),
        }
    }
}

impl OffloadConfig {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when `STORAGE_ENGINE` names an unknown
    /// engine, or when an enabled engine is missing its settings.
    pub fn from_env() -> PgVaultResult<Self> {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("BASE_DIR") {
            config.base_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            config.log_level = v;
        }
        if let Ok(v) = std::env::var("STORAGE_ENGINE") {
            config.storage_engines = StorageEngine::parse_list(&v)?;
        }

        config.s3 = s3_from_env()?;
        config.azure = azure_from_env()?;

        config.validate()?;
        Ok(config)
    }

    /// Check that every enabled engine has its settings present.
    pub fn validate(&self) -> PgVaultResult<()> {
        if self.storage_engines.contains(&StorageEngine::S3) && self.s3.is_none() {
            return Err(PgVaultError::Config(
                "s3 storage engine enabled but S3_* settings are incomplete".to_owned(),
            ));
        }
        if self.storage_engines.contains(&StorageEngine::Azure) && self.azure.is_none() {
            return Err(PgVaultError::Config(
                "azure storage engine enabled but AZURE_* settings are incomplete".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Read the S3 settings block, if any of its keys are present.
fn s3_from_env() -> PgVaultResult<Option<S3Config>> {
    let region = std::env::var("S3_AWS_REGION").ok();
    let access_key_id = std::env::var("S3_ACCESS_KEY_ID").ok();
    let secret_access_key = std::env::var("S3_SECRET_ACCESS_KEY").ok();
    let bucket = std::env::var("S3_BUCKET").ok();
    let base_dir = std::env::var("S3_BASE_DIR").ok();

    match (region, access_key_id, secret_access_key, bucket) {
        (None, None, None, None) => Ok(None),
        (Some(aws_region), Some(access_key_id), Some(secret_access_key), Some(bucket)) => {
            Ok(Some(S3Config {
                aws_region,
                access_key_id,
                secret_access_key,
                bucket,
                base_dir: base_dir.unwrap_or_default(),
            }))
        }
        _ => Err(PgVaultError::Config(
            "S3 settings require S3_AWS_REGION, S3_ACCESS_KEY_ID, \
             S3_SECRET_ACCESS_KEY and S3_BUCKET together"
                .to_owned(),
        )),
    }
}

/// Read the Azure settings block, if any of its keys are present.
fn azure_from_env() -> PgVaultResult<Option<AzureConfig>> {
    let storage_account = std::env::var("AZURE_STORAGE_ACCOUNT").ok();
    let container = std::env::var("AZURE_CONTAINER").ok();
    let shared_key = std::env::var("AZURE_SHARED_KEY").ok();
    let base_dir = std::env::var("AZURE_BASE_DIR").ok();

    match (storage_account, container, shared_key) {
        (None, None, None) => Ok(None),
        (Some(storage_account), Some(container), Some(shared_key)) => Ok(Some(AzureConfig {
            storage_account,
            container,
            shared_key,
            base_dir: base_dir.unwrap_or_default(),
        })),
        _ => Err(PgVaultError::Config(
            "Azure settings require AZURE_STORAGE_ACCOUNT, AZURE_CONTAINER \
             and AZURE_SHARED_KEY together"
                .to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_create_default_config() {
        let config = OffloadConfig::default();
        assert_eq!(config.storage_engines, vec![StorageEngine::Local]);
        assert!(config.s3.is_none());
        assert!(config.azure.is_none());
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_should_parse_engine_list() {
        let engines = StorageEngine::parse_list("local, s3").unwrap();
        assert_eq!(engines, vec![StorageEngine::Local, StorageEngine::S3]);
    }

    #[test]
    fn test_should_default_to_local_for_empty_engine_list() {
        let engines = StorageEngine::parse_list("").unwrap();
        assert_eq!(engines, vec![StorageEngine::Local]);
    }

    #[test]
    fn test_should_reject_unknown_engine() {
        let result = StorageEngine::parse_list("s3,ftp");
        assert!(matches!(result, Err(PgVaultError::Config(_))));
    }

    #[test]
    fn test_should_dedupe_repeated_engines() {
        let engines = StorageEngine::parse_list("s3,s3,azure").unwrap();
        assert_eq!(engines, vec![StorageEngine::S3, StorageEngine::Azure]);
    }

    #[test]
    fn test_should_reject_enabled_engine_without_settings() {
        let config = OffloadConfig {
            storage_engines: vec![StorageEngine::S3],
            ..OffloadConfig::default()
        };
        assert!(matches!(config.validate(), Err(PgVaultError::Config(_))));
    }

    #[test]
    fn test_should_redact_secret_in_debug_output() {
        let config = S3Config {
            aws_region: "us-east-1".to_owned(),
            access_key_id: "AKIA".to_owned(),
            secret_access_key: "super-secret".to_owned(),
            bucket: "b".to_owned(),
            base_dir: String::new(),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
    }
}
