//! Recursive backup-tree upload.
//!
//! [`upload_tree`] walks a local directory depth-first and hands every
//! regular file to an [`UploadTarget`], which signs and sends it. Transfers
//! are strictly sequential and fail fast: the first error aborts the walk and
//! no later file is attempted, so a partial upload never looks complete.
//!
//! Directory entries are visited in name order to keep runs reproducible.
//! Symbolic links are skipped with a warning; backup trees are produced by
//! the backup stage and contain none, so a link indicates outside tampering
//! rather than data to preserve.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::{OffloadError, OffloadResult};
use crate::http::HttpPutClient;

/// Maximum remote object key length in bytes.
pub const MAX_REMOTE_PATH: usize = 1024;

/// One remote destination for backup files.
///
/// The target owns naming and signing; the uploader owns traversal and
/// ordering. `remote_path` is the full object key, already joined with the
/// target's base directory.
#[async_trait]
pub trait UploadTarget: Send + Sync {
    /// A short identifier used in log records.
    fn name(&self) -> &'static str;

    /// Sign and send one file.
    async fn upload_file(
        &self,
        client: &dyn HttpPutClient,
        local: &Path,
        remote_path: &str,
    ) -> OffloadResult<()>;
}

/// Upload every regular file under `local_root` to `remote_root`.
///
/// Returns the number of files uploaded.
pub async fn upload_tree(
    target: &dyn UploadTarget,
    client: &dyn HttpPutClient,
    local_root: &Path,
    remote_root: &str,
) -> OffloadResult<u64> {
    let mut uploaded = 0;
    upload_dir(target, client, local_root, remote_root, &mut uploaded).await?;
    info!(
        target = target.name(),
        files = uploaded,
        "uploaded backup tree"
    );
    Ok(uploaded)
}

/// Recurse into one directory, uploading files in name order.
fn upload_dir<'a>(
    target: &'a dyn UploadTarget,
    client: &'a dyn HttpPutClient,
    dir: &'a Path,
    remote_prefix: &'a str,
    uploaded: &'a mut u64,
) -> Pin<Box<dyn Future<Output = OffloadResult<()>> + Send + 'a>> {
    Box::pin(async move {
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| OffloadError::LocalIo {
                path: dir.to_path_buf(),
                source: e,
            })?;
        while let Some(entry) =
            read_dir
                .next_entry()
                .await
                .map_err(|e| OffloadError::LocalIo {
                    path: dir.to_path_buf(),
                    source: e,
                })?
        {
            entries.push(entry.path());
        }
        entries.sort();

        for path in entries {
            let meta =
                tokio::fs::symlink_metadata(&path)
                    .await
                    .map_err(|e| OffloadError::LocalIo {
                        path: path.clone(),
                        source: e,
                    })?;

            if meta.is_symlink() {
                warn!(path = %path.display(), "skipping symbolic link in backup tree");
                continue;
            }

            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| OffloadError::InvalidFileName { path: path.clone() })?;
            let remote_path = format!("{remote_prefix}/{name}");

            if meta.is_dir() {
                upload_dir(target, client, &path, &remote_path, uploaded).await?;
            } else {
                if remote_path.len() > MAX_REMOTE_PATH {
                    return Err(OffloadError::PathTooLong {
                        path,
                        len: remote_path.len(),
                        max: MAX_REMOTE_PATH,
                    });
                }
                target.upload_file(client, &path, &remote_path).await?;
                *uploaded += 1;
            }
        }

        Ok(())
    })
}
