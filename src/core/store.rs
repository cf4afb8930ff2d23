use crate::error::{AppError, Result};
use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

/// Owns the upload directory and hands out memory-mapped views of stored
/// files. A view is an `Arc<Mmap>`: zero-copy, read-only, and cheap to
/// share across however many samplings run against the same file at once.
pub struct FileStore {
    upload_dir: PathBuf,
    max_file_size: usize,
}

impl FileStore {
    pub fn new(upload_dir: PathBuf, max_file_size: usize) -> Self {
        Self {
            upload_dir,
            max_file_size,
        }
    }

    /// Persist an uploaded blob under a fresh uuid and return the id.
    pub async fn save_file(&self, data: &[u8], _filename: &str) -> Result<String> {
        if data.len() > self.max_file_size {
            return Err(AppError::FileTooLarge(data.len()));
        }

        let file_id = Uuid::new_v4().to_string();
        let path = self.upload_dir.join(&file_id);

        fs::create_dir_all(&self.upload_dir)
            .await
            .map_err(AppError::FileAccess)?;

        let mut file = fs::File::create(&path)
            .await
            .map_err(AppError::FileAccess)?;
        file.write_all(data).await.map_err(AppError::FileAccess)?;

        Ok(file_id)
    }

    /// Map a stored file into memory. Either the whole file is usable or
    /// this fails; there is no fallback to buffered reads.
    pub fn map_file(&self, file_id: &str) -> Result<Arc<Mmap>> {
        let path = self.upload_dir.join(file_id);

        if !path.exists() {
            return Err(AppError::FileNotFound(file_id.to_string()));
        }

        let file = File::open(&path).map_err(AppError::FileAccess)?;

        let len = file.metadata().map_err(AppError::FileAccess)?.len() as usize;
        if len > self.max_file_size {
            return Err(AppError::FileTooLarge(len));
        }

        let mmap = unsafe { MmapOptions::new().map(&file).map_err(AppError::FileAccess)? };

        Ok(Arc::new(mmap))
    }

    pub async fn file_info(&self, file_id: &str) -> Result<FileInfo> {
        let path = self.upload_dir.join(file_id);

        let metadata = fs::metadata(&path)
            .await
            .map_err(|_| AppError::FileNotFound(file_id.to_string()))?;

        Ok(FileInfo {
            id: file_id.to_string(),
            size: metadata.len() as usize,
            created: metadata
                .created()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs())
                .unwrap_or(0),
        })
    }

    /// Remove the file from disk. Samples already cached for this id keep
    /// being served until they are evicted: cache keys are hashes of
    /// (id, size), so there is no way to invalidate one file's entries.
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let path = self.upload_dir.join(file_id);

        fs::remove_file(&path)
            .await
            .map_err(|_| AppError::FileNotFound(file_id.to_string()))?;

        Ok(())
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct FileInfo {
    pub id: String,
    pub size: usize,
    pub created: u64,
}
