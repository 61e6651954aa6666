//! Azure Blob Storage engine: shared-key uploads of one backup.
//!
//! Mirrors the S3 stage: the data tree lands under
//! `<azure base dir>/<server>/backup/<label>` in the configured container,
//! the catalog record gains its Azure timing only after a complete upload,
//! and the local data tree is removed in teardown only on success.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::Utc;
use pgvault_auth::sharedkey::{BLOB_TYPE, CONTENT_TYPE, MS_VERSION};
use pgvault_auth::{BlobSignRequest, rfc1123_date, sign_put_blob};
use pgvault_core::catalog::{BackupCatalog, FileCatalog};
use pgvault_core::workflow::{ContextValue, JobContext, WorkflowStage};
use pgvault_core::{AzureConfig, PgVaultResult};
use tracing::{debug, info};

use crate::error::{OffloadError, OffloadResult};
use crate::http::{HttpPutClient, PutRequest, ReqwestPutClient};
use crate::paths;
use crate::uploader::{UploadTarget, upload_tree};

/// Context flag set once every file of the backup reached the container.
pub const AZURE_OFFLOAD_COMPLETE: &str = "azure_offload_complete";

/// Signs and sends individual blobs to one container.
#[derive(Debug)]
pub struct AzureTarget {
    config: AzureConfig,
}

impl AzureTarget {
    /// Create a target for one container.
    #[must_use]
    pub fn new(config: AzureConfig) -> Self {
        Self { config }
    }

    /// The storage account's blob endpoint host.
    #[must_use]
    pub fn host(&self) -> String {
        format!("{}.blob.core.windows.net", self.config.storage_account)
    }
}

#[async_trait]
impl UploadTarget for AzureTarget {
    fn name(&self) -> &'static str {
        "azure"
    }

    async fn upload_file(
        &self,
        client: &dyn HttpPutClient,
        local: &std::path::Path,
        remote_path: &str,
    ) -> OffloadResult<()> {
        let meta = tokio::fs::metadata(local)
            .await
            .map_err(|e| OffloadError::LocalIo {
                path: local.to_path_buf(),
                source: e,
            })?;

        let ms_date = rfc1123_date(&Utc::now());
        let signed = sign_put_blob(
            &BlobSignRequest {
                account: &self.config.storage_account,
                container: &self.config.container,
                path: remote_path,
                shared_key: &self.config.shared_key,
                content_length: meta.len(),
            },
            &ms_date,
        )?;

        debug!(blob = remote_path, bytes = meta.len(), "uploading blob");

        let resource_path = format!("/{}/{remote_path}", self.config.container);
        let response = client
            .put(&PutRequest {
                host: self.host(),
                resource_path: resource_path.clone(),
                headers: vec![
                    ("authorization".to_owned(), signed.authorization),
                    ("content-type".to_owned(), CONTENT_TYPE.to_owned()),
                    ("x-ms-blob-type".to_owned(), BLOB_TYPE.to_owned()),
                    ("x-ms-date".to_owned(), signed.ms_date),
                    ("x-ms-version".to_owned(), MS_VERSION.to_owned()),
                ],
                body: local.to_path_buf(),
                content_length: meta.len(),
            })
            .await?;

        if response.is_success() {
            Ok(())
        } else {
            Err(OffloadError::Rejected {
                status: response.status,
                path: resource_path,
                snippet: response.snippet,
            })
        }
    }
}

/// Workflow stage offloading one backup to Azure Blob Storage.
pub struct AzureStorageStage {
    target: AzureTarget,
    base_dir: PathBuf,
    client: Arc<dyn HttpPutClient>,
    catalog: Arc<dyn BackupCatalog>,
}

impl std::fmt::Debug for AzureStorageStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureStorageStage")
            .field("target", &self.target)
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl AzureStorageStage {
    /// Create a stage with the production HTTP client and file catalog.
    #[must_use]
    pub fn new(config: AzureConfig, base_dir: PathBuf) -> Self {
        Self::with_collaborators(
            config,
            base_dir,
            Arc::new(ReqwestPutClient::new()),
            Arc::new(FileCatalog),
        )
    }

    /// Create a stage with explicit collaborators.
    #[must_use]
    pub fn with_collaborators(
        config: AzureConfig,
        base_dir: PathBuf,
        client: Arc<dyn HttpPutClient>,
        catalog: Arc<dyn BackupCatalog>,
    ) -> Self {
        Self {
            target: AzureTarget::new(config),
            base_dir,
            client,
            catalog,
        }
    }

    /// Upload the data tree and persist the timing record.
    async fn offload(&self, server: &str, label: &str) -> OffloadResult<f64> {
        let started = Instant::now();

        let catalog_dir = paths::catalog_dir(&self.base_dir, server);
        let mut record = self.catalog.load_record(&catalog_dir, label).await?;

        let data_dir = paths::local_data_dir(&self.base_dir, server, label);
        let remote_root = paths::remote_backup_prefix(&self.target.config.base_dir, server, label);

        upload_tree(&self.target, self.client.as_ref(), &data_dir, &remote_root).await?;

        let elapsed = started.elapsed().as_secs_f64();
        record.remote_azure_elapsed_time = elapsed;
        self.catalog.save_record(&catalog_dir, &record).await?;

        info!(server, label, elapsed, "backup offloaded to azure");
        Ok(elapsed)
    }
}

#[async_trait]
impl WorkflowStage for AzureStorageStage {
    fn name(&self) -> &'static str {
        "azure-storage"
    }

    async fn setup(&self, ctx: &mut JobContext) -> PgVaultResult<()> {
        ctx.server()?;
        ctx.label()?;
        Ok(())
    }

    async fn execute(&self, ctx: &mut JobContext) -> PgVaultResult<()> {
        let server = ctx.server()?.to_owned();
        let label = ctx.label()?.to_owned();

        self.offload(&server, &label)
            .await
            .map_err(anyhow::Error::new)?;

        ctx.insert(AZURE_OFFLOAD_COMPLETE, ContextValue::Bool(true));
        Ok(())
    }

    async fn teardown(&self, ctx: &mut JobContext) -> PgVaultResult<()> {
        if !ctx.get_bool(AZURE_OFFLOAD_COMPLETE) {
            debug!("upload incomplete, keeping local backup data");
            return Ok(());
        }

        let data_dir = paths::local_data_dir(&self.base_dir, ctx.server()?, ctx.label()?);
        match tokio::fs::remove_dir_all(&data_dir).await {
            Ok(()) => {
                info!(path = %data_dir.display(), "removed offloaded backup data");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).into()),
        }
    }
}
