use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use tokio::sync::Mutex;
use workout_tracker_lib::WorkoutError;

use crate::WORKOUTS_BLOB_PATH;

/// Reads and writes the whole workout store as one opaque blob.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// `None` when nothing has been saved yet.
    async fn load(&self) -> Result<Option<Vec<u8>>, WorkoutError>;

    async fn save(&self, blob: &[u8]) -> Result<(), WorkoutError>;

    async fn clear(&self) -> Result<(), WorkoutError>;
}

/// Keeps the blob in a single file. Saves replace the file atomically.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    path: PathBuf,
}

impl FileBlobStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The blob file under the project data directory.
    pub fn open_default() -> Result<Self, WorkoutError> {
        let root: PathBuf = project_root::get_project_root()
            .map_err(|err| WorkoutError::IoFailure(format!("Failed to locate project root: {err}")))?;

        Ok(Self::new(root.join(WORKOUTS_BLOB_PATH)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut file_name = self.path.file_name().unwrap_or_default().to_os_string();
        file_name.push(".tmp");
        self.path.with_file_name(file_name)
    }
}

#[async_trait]
impl PersistenceGateway for FileBlobStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, WorkoutError> {
        match tokio::fs::read(&self.path).await {
            Ok(blob) => Ok(Some(blob)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(WorkoutError::IoFailure(format!("Failed to read {:?}: {err}", self.path))),
        }
    }

    async fn save(&self, blob: &[u8]) -> Result<(), WorkoutError> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|err| WorkoutError::IoFailure(format!("Failed to create data directory {dir:?}: {err}")))?;
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, blob)
            .await
            .map_err(|err| WorkoutError::IoFailure(format!("Failed to write {temp_path:?}: {err}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|err| WorkoutError::IoFailure(format!("Failed to move {temp_path:?} into place: {err}")))
    }

    async fn clear(&self) -> Result<(), WorkoutError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(WorkoutError::IoFailure(format!("Failed to remove {:?}: {err}", self.path))),
        }
    }
}

/// In-memory blob, shared between clones. Can be switched into a failing mode.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlobStore {
    blob: Arc<Mutex<Option<Vec<u8>>>>,
    failing: Arc<AtomicBool>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: Vec<u8>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(blob))),
            failing: Arc::default(),
        }
    }

    /// Makes every following operation fail with an I/O failure.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn blob(&self) -> Option<Vec<u8>> {
        self.blob.lock().await.clone()
    }

    fn check(&self) -> Result<(), WorkoutError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(WorkoutError::IoFailure("Memory blob store is set to fail".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PersistenceGateway for MemoryBlobStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, WorkoutError> {
        self.check()?;
        Ok(self.blob.lock().await.clone())
    }

    async fn save(&self, blob: &[u8]) -> Result<(), WorkoutError> {
        self.check()?;
        *self.blob.lock().await = Some(blob.to_vec());
        Ok(())
    }

    async fn clear(&self) -> Result<(), WorkoutError> {
        self.check()?;
        *self.blob.lock().await = None;
        Ok(())
    }
}
