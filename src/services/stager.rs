use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufWriter};
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StageError {
    #[error("file exceeds the {limit} byte upload limit")]
    TooLarge { limit: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A scratch file owned for the lifetime of a single request.
///
/// Dropping the handle removes the file from disk, so every exit path
/// out of a request (success, relay failure, staging failure after a
/// partial write) releases its scratch space.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    size_bytes: u64,
    created_at: DateTime<Utc>,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(
                    "failed to remove scratch file {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }
}

/// Writes incoming upload streams to the local scratch directory.
pub struct LocalStager {
    scratch_dir: PathBuf,
    max_bytes: usize,
}

impl LocalStager {
    pub fn new(scratch_dir: impl Into<PathBuf>, max_bytes: usize) -> Self {
        Self {
            scratch_dir: scratch_dir.into(),
            max_bytes,
        }
    }

    pub fn scratch_dir(&self) -> &Path {
        &self.scratch_dir
    }

    /// Streams `reader` to a uniquely named file in the scratch directory.
    ///
    /// The scratch directory is created if absent. Streams larger than the
    /// configured maximum are rejected mid-write with `StageError::TooLarge`.
    /// On any failure the partially written file is removed.
    pub async fn stage<R>(&self, mut reader: R, original_name: &str) -> Result<StagedFile, StageError>
    where
        R: AsyncRead + Unpin,
    {
        fs::create_dir_all(&self.scratch_dir).await?;

        let path = self.scratch_dir.join(unique_name(original_name));
        let file = fs::File::create(&path).await?;

        // Arm the cleanup guard before the first byte lands so an aborted
        // stage never leaves a partial file behind.
        let mut staged = StagedFile {
            path,
            size_bytes: 0,
            created_at: Utc::now(),
        };

        let mut writer = BufWriter::new(file);
        let mut buf = vec![0u8; 64 * 1024];
        let mut written: usize = 0;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            written += n;
            if written > self.max_bytes {
                return Err(StageError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            writer.write_all(&buf[..n]).await?;
        }
        writer.flush().await?;

        staged.size_bytes = written as u64;
        debug!("staged {} bytes at {}", written, staged.path.display());
        Ok(staged)
    }
}

/// Collision-resistant scratch name: random token plus the client's extension.
fn unique_name(original_name: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    match Path::new(original_name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{token}.{ext}"),
        _ => token,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn stage_writes_full_stream() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path(), 1024);

        let staged = stager
            .stage(&b"hello world"[..], "greeting.txt")
            .await
            .unwrap();

        assert_eq!(staged.size_bytes(), 11);
        assert_eq!(std::fs::read(staged.path()).unwrap(), b"hello world");
        assert_eq!(staged.path().extension().unwrap(), "txt");
    }

    #[tokio::test]
    async fn identical_names_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path(), 1024);

        let first = stager.stage(&b"one"[..], "same.png").await.unwrap();
        let second = stager.stage(&b"two"[..], "same.png").await.unwrap();

        assert_ne!(first.path(), second.path());
        assert!(first.path().exists());
        assert!(second.path().exists());
    }

    #[tokio::test]
    async fn drop_removes_scratch_file() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path(), 1024);

        let staged = stager.stage(&b"transient"[..], "tmp.bin").await.unwrap();
        let path = staged.path().to_path_buf();
        assert!(path.exists());

        drop(staged);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn oversized_stream_is_rejected() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path(), 8);

        let err = stager
            .stage(&b"way past the limit"[..], "big.bin")
            .await
            .unwrap_err();

        assert!(matches!(err, StageError::TooLarge { limit: 8 }));
        // The partial write is cleaned up.
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn name_without_extension_stays_bare() {
        let dir = TempDir::new().unwrap();
        let stager = LocalStager::new(dir.path(), 1024);

        let staged = stager.stage(&b"notes"[..], "README").await.unwrap();
        let name = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(!name.contains('.'));
    }
}
