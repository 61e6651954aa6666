//! SHA-256 payload hashing.
//!
//! The content hash of an object doubles as an integrity header
//! (`x-amz-content-sha256`) and as the payload field of the canonical
//! request. Files are hashed by streaming, so arbitrarily large backup
//! segments never require proportional memory.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use crate::error::SigningResult;

/// Read buffer size for streaming file digests.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Hex-encoded SHA-256 digest of a byte slice.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hex-encoded SHA-256 digest of a file's contents, computed by streaming.
pub async fn sha256_file(path: &Path) -> SigningResult<String> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// SHA-256 of the empty input.
    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_should_hash_empty_input_to_known_digest() {
        assert_eq!(sha256_hex(b""), EMPTY_SHA256);
    }

    #[tokio::test]
    async fn test_should_hash_empty_file_to_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty");
        tokio::fs::write(&path, b"").await.unwrap();

        assert_eq!(sha256_file(&path).await.unwrap(), EMPTY_SHA256);
    }

    #[tokio::test]
    async fn test_should_match_streaming_and_in_memory_digests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pg_version");
        let contents = b"17\n";
        tokio::fs::write(&path, contents).await.unwrap();

        assert_eq!(sha256_file(&path).await.unwrap(), sha256_hex(contents));
    }

    #[tokio::test]
    async fn test_should_stream_files_larger_than_one_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big");
        let contents = vec![0xabu8; HASH_CHUNK_SIZE * 3 + 17];
        tokio::fs::write(&path, &contents).await.unwrap();

        assert_eq!(sha256_file(&path).await.unwrap(), sha256_hex(&contents));
    }

    #[tokio::test]
    async fn test_should_surface_missing_file_as_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = sha256_file(&dir.path().join("nope")).await;
        assert!(result.is_err());
    }
}
