//! Content hashing
//!
//! Files are hashed with SHA-256 while streaming, so memory use is bounded
//! by the read buffer regardless of file size. The digest is the lowercase
//! hex encoding expected by the update server.

use std::path::Path;

use sha2::{Digest, Sha256};
use tokio::io::AsyncReadExt;

use shardsync_core::domain::ContentDigest;

/// Read buffer size for hashing
const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 digest of the file at `path`
pub async fn hash_file(path: &Path) -> std::io::Result<ContentDigest> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    digest_from_hasher(hasher)
}

/// Compute the SHA-256 digest of an in-memory buffer
pub fn hash_bytes(data: &[u8]) -> std::io::Result<ContentDigest> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    digest_from_hasher(hasher)
}

fn digest_from_hasher(hasher: Sha256) -> std::io::Result<ContentDigest> {
    let hex = format!("{:x}", hasher.finalize());
    ContentDigest::new(hex)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}
