use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Local-disk blob store rooted at the upload directory.
///
/// Stored names are flat; callers are responsible for validating any name
/// that originates from a request path.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }

    pub async fn ensure_root(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Writes a blob and fsyncs it. The metadata row is only inserted after
    /// this returns, so a recorded filename always points at durable bytes.
    pub async fn save(&self, filename: &str, data: &[u8]) -> Result<()> {
        let path = self.path_for(filename);
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        Ok(())
    }

    pub async fn open(&self, filename: &str) -> std::io::Result<tokio::fs::File> {
        tokio::fs::File::open(self.path_for(filename)).await
    }

    pub async fn exists(&self, filename: &str) -> bool {
        tokio::fs::try_exists(self.path_for(filename))
            .await
            .unwrap_or(false)
    }
}
