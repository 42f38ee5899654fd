//! On-disk storage for uploaded course PDFs. Only file bytes live here; the
//! describing metadata goes through the [`Store`](super::Store).

use super::StorageError;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub async fn open(dir: &Path) -> Result<Self, StorageError> {
        fs::create_dir_all(dir).await?;
        tracing::info!("Upload directory ready at {}", dir.display());
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_of(filename);
        fs::write(&path, bytes).await?;
        Ok(path)
    }

    pub async fn exists(&self, filename: &str) -> bool {
        fs::metadata(self.path_of(filename)).await.is_ok()
    }

    pub async fn read(&self, filename: &str) -> Result<Vec<u8>, StorageError> {
        Ok(fs::read(self.path_of(filename)).await?)
    }

    /// Remove the file if present. Returns whether anything was deleted; a
    /// missing file is not an error so metadata cleanup can still proceed.
    pub async fn remove(&self, filename: &str) -> Result<bool, StorageError> {
        match fs::remove_file(self.path_of(filename)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
