use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact name '{0}'")]
    InvalidName(String),

    #[error("artifact storage failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Where generated report files are kept
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), ArtifactError>;

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError>;
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Plain file names only: no separators, no parent references
fn check_name(name: &str) -> Result<(), ArtifactError> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ArtifactError::InvalidName(name.to_string()))
    }
}

pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, ArtifactError> {
        check_name(name)?;
        Ok(Path::new(&self.root).join(name))
    }
}

#[async_trait]
impl ArtifactStore for FsArtifactStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        let path = self.path_for(name)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(&path, bytes).await?;
        tracing::info!("Stored artifact {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
        let path = self.path_for(name)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[derive(Default)]
pub struct MemoryArtifactStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ArtifactStore for MemoryArtifactStore {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), ArtifactError> {
        check_name(name)?;
        self.files.write().await.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<Vec<u8>>, ArtifactError> {
        check_name(name)?;
        Ok(self.files.read().await.get(name).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digest_is_lowercase_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[tokio::test]
    async fn rejects_path_traversal() {
        let store = MemoryArtifactStore::new();
        assert!(store.put("../etc/passwd", b"x").await.is_err());
        store.put("rapport-2025.pdf", b"%PDF").await.unwrap();
        assert_eq!(store.get("rapport-2025.pdf").await.unwrap(), Some(b"%PDF".to_vec()));
        assert_eq!(store.get("missing.pdf").await.unwrap(), None);
    }
}
