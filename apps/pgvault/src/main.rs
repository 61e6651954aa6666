//! pgvault - offload completed PostgreSQL backups to remote object storage.
//!
//! Runs the post-backup storage pipeline once for one (server, label) job.
//! The enabled storage engines each contribute a workflow stage; stages run
//! in configuration order and the first failure stops the job with a
//! non-zero exit.
//!
//! # Usage
//!
//! ```text
//! STORAGE_ENGINE=s3 S3_BUCKET=... pgvault <server> <label>
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `BASE_DIR` | `/var/lib/pgvault` | Local backups root |
//! | `STORAGE_ENGINE` | `local` | Comma-separated engine list (`local,s3,azure`) |
//! | `S3_AWS_REGION` | *(unset)* | AWS region |
//! | `S3_ACCESS_KEY_ID` | *(unset)* | IAM access key id |
//! | `S3_SECRET_ACCESS_KEY` | *(unset)* | IAM secret access key |
//! | `S3_BUCKET` | *(unset)* | Bucket name |
//! | `S3_BASE_DIR` | *(empty)* | Bucket-relative key prefix |
//! | `S3_KEY_ENCODING` | `raw` | Object key encoding (`raw` or `uri-encoded`) |
//! | `AZURE_STORAGE_ACCOUNT` | *(unset)* | Storage account name |
//! | `AZURE_CONTAINER` | *(unset)* | Container name |
//! | `AZURE_SHARED_KEY` | *(unset)* | Base64 shared account key |
//! | `AZURE_BASE_DIR` | *(empty)* | Container-relative blob prefix |
//! | `LOG_LEVEL` | `info` | Log level filter |
//! | `RUST_LOG` | *(unset)* | Fine-grained tracing filter (overrides `LOG_LEVEL`) |

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use pgvault_auth::KeyEncoding;
use pgvault_core::workflow::{JobContext, Pipeline};
use pgvault_core::{OffloadConfig, StorageEngine};
use pgvault_offload::{AzureStorageStage, S3StorageStage};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Version reported at startup.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber.
///
/// Uses `RUST_LOG` if set, otherwise falls back to the `LOG_LEVEL` config value.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        EnvFilter::try_new(log_level)
            .with_context(|| format!("invalid log level filter: {log_level}"))?
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    Ok(())
}

/// Parse the object key encoding mode.
fn parse_key_encoding(raw: &str) -> Result<KeyEncoding> {
    match raw {
        "raw" => Ok(KeyEncoding::Raw),
        "uri-encoded" => Ok(KeyEncoding::UriEncoded),
        other => bail!("unknown key encoding: {other} (expected raw or uri-encoded)"),
    }
}

/// Build the stage chain from the enabled storage engines.
///
/// The local engine contributes no stage: the backup already lives on local
/// disk, so local-only configurations leave the pipeline empty.
fn build_pipeline(config: &OffloadConfig, encoding: KeyEncoding) -> Result<Pipeline> {
    let mut pipeline = Pipeline::new();

    for engine in &config.storage_engines {
        match engine {
            StorageEngine::Local => {}
            StorageEngine::S3 => {
                let s3 = config
                    .s3
                    .clone()
                    .context("s3 engine enabled without S3_* settings")?;
                pipeline.push(Arc::new(S3StorageStage::new(
                    s3,
                    config.base_dir.clone(),
                    encoding,
                )));
            }
            StorageEngine::Azure => {
                let azure = config
                    .azure
                    .clone()
                    .context("azure engine enabled without AZURE_* settings")?;
                pipeline.push(Arc::new(AzureStorageStage::new(
                    azure,
                    config.base_dir.clone(),
                )));
            }
        }
    }

    Ok(pipeline)
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = OffloadConfig::from_env()?;
    init_tracing(&config.log_level)?;

    let mut args = std::env::args().skip(1);
    let (server, label) = match (args.next(), args.next()) {
        (Some(server), Some(label)) => (server, label),
        _ => bail!("usage: pgvault <server> <label>"),
    };

    let encoding = match std::env::var("S3_KEY_ENCODING") {
        Ok(raw) => parse_key_encoding(&raw)?,
        Err(_) => KeyEncoding::Raw,
    };

    info!(
        server = %server,
        label = %label,
        base_dir = %config.base_dir.display(),
        engines = ?config.storage_engines,
        version = VERSION,
        "starting backup offload",
    );

    let pipeline = build_pipeline(&config, encoding)?;
    if pipeline.is_empty() {
        info!("no remote storage engines enabled, nothing to do");
        return Ok(());
    }

    let mut ctx = JobContext::new(server, label);
    pipeline.run(&mut ctx).await?;

    info!("offload complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pgvault_core::S3Config;

    #[test]
    fn test_should_build_empty_pipeline_for_local_only() {
        let config = OffloadConfig::default();
        let pipeline = build_pipeline(&config, KeyEncoding::Raw).unwrap();
        assert!(pipeline.is_empty());
    }

    #[test]
    fn test_should_build_stage_per_remote_engine() {
        let config = OffloadConfig {
            storage_engines: vec![StorageEngine::Local, StorageEngine::S3],
            s3: Some(S3Config {
                aws_region: "us-east-1".to_owned(),
                access_key_id: "AKIA".to_owned(),
                secret_access_key: "secret".to_owned(),
                bucket: "b".to_owned(),
                base_dir: String::new(),
            }),
            ..OffloadConfig::default()
        };

        let pipeline = build_pipeline(&config, KeyEncoding::Raw).unwrap();
        assert_eq!(pipeline.len(), 1);
    }

    #[test]
    fn test_should_reject_engine_without_settings() {
        let config = OffloadConfig {
            storage_engines: vec![StorageEngine::Azure],
            ..OffloadConfig::default()
        };
        assert!(build_pipeline(&config, KeyEncoding::Raw).is_err());
    }

    #[test]
    fn test_should_parse_key_encoding() {
        assert_eq!(parse_key_encoding("raw").unwrap(), KeyEncoding::Raw);
        assert_eq!(
            parse_key_encoding("uri-encoded").unwrap(),
            KeyEncoding::UriEncoded
        );
        assert!(parse_key_encoding("percent").is_err());
    }
}
