//! Queued JSON file persistence.
//!
//! A [`FileAdapter`] is bound to exactly one file and owns all access to it.
//! Operations are serialized through an internal fair FIFO mutex: they run
//! strictly in the order their callers invoked them, so a write issued after
//! an earlier read (or write) can never overtake it and corrupt the file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// Async adapter for one JSON file.
pub struct FileAdapter {
    path: PathBuf,
    /// Fair FIFO queue: whoever calls first, runs first.
    queue: Mutex<()>,
}

impl FileAdapter {
    /// Bind an adapter to a file path. No I/O happens until an operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            queue: Mutex::new(()),
        }
    }

    /// The bound file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file's full contents.
    ///
    /// Blank content and unparseable content both yield an empty JSON
    /// object, so a fresh or damaged file becomes a valid empty starting
    /// point; unparseable content is logged. I/O failures (missing file,
    /// permissions, not a file) propagate.
    pub async fn load(&self) -> StoreResult<Value> {
        let _queued = self.queue.lock().await;
        let text = fs::read_to_string(&self.path).await?;
        if text.trim().is_empty() {
            return Ok(Value::Object(serde_json::Map::new()));
        }
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(error) => {
                warn!(
                    path = %self.path.display(),
                    %error,
                    "unparseable file content, treating as empty"
                );
                Ok(Value::Object(serde_json::Map::new()))
            }
        }
    }

    /// Serialize `content` and atomically replace the file's contents.
    ///
    /// The new contents are written to a temporary file in the same
    /// directory and renamed over the target, so readers never observe a
    /// half-written file even if the writing task is aborted mid-flight.
    pub async fn save(&self, content: &Value) -> StoreResult<()> {
        let _queued = self.queue.lock().await;
        let text = serde_json::to_string(content)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let tmp = self.tmp_path();
        fs::write(&tmp, text.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), bytes = text.len(), "file written");
        Ok(())
    }

    /// Create an empty file if none exists; a no-op when one does.
    ///
    /// Fails when the file cannot be created, e.g. a missing or unwritable
    /// parent directory.
    pub async fn ensure_exists(&self) -> StoreResult<()> {
        let _queued = self.queue.lock().await;
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
            .await
        {
            Ok(_) => {
                debug!(path = %self.path.display(), "file created");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether the bound file exists.
    ///
    /// Any probe failure (including an invalid path) reads as "does not
    /// exist" rather than an error. Probes do not join the operation queue.
    pub async fn exists(&self) -> bool {
        fs::metadata(&self.path).await.is_ok()
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl std::fmt::Debug for FileAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileAdapter")
            .field("path", &self.path)
            .finish()
    }
}
