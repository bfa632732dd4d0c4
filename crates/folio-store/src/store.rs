//! A record collection bound to one file.
//!
//! [`DataStore::open`] loads the file, hydrates the collection, and spawns a
//! detached writer task that re-serializes the full snapshot after every
//! mutation. The writer is the persistence boundary: mutation callers never
//! wait for it, and its failures are logged and swallowed. A write that
//! fails after the fact must not retroactively fail a mutation that already
//! succeeded in memory.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use folio_collection::{
    ChangeFilter, ChangeKind, ChangeStream, CollectionResult, CollectionSnapshot, Document,
    DocumentId, RecordCollection, Selector,
};

use crate::error::StoreResult;
use crate::file::FileAdapter;

/// One in-memory collection, one file, one writer.
///
/// A store is exclusively owned (in practice by a registry cache entry) and
/// never shares its file with another live store. Dropping or
/// [`detach`](DataStore::detach)ing it stops persistence; the in-memory
/// collection keeps working either way.
pub struct DataStore {
    path: PathBuf,
    collection: Mutex<RecordCollection>,
    writer: Mutex<Option<JoinHandle<()>>>,
}

impl DataStore {
    /// Open the store: load the file, hydrate the collection, start the
    /// writer.
    ///
    /// Unparseable or blank content hydrates as an empty collection; I/O
    /// failures on this initial load propagate to the caller.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let adapter = Arc::new(FileAdapter::new(&path));
        let content = adapter.load().await?;
        let collection = hydrate(&path, content);

        let events = collection.subscribe(ChangeFilter::of_kinds(ChangeKind::ALL));
        let writer = tokio::spawn(persist_changes(events, Arc::clone(&adapter)));

        debug!(
            path = %path.display(),
            documents = collection.document_count(),
            "store loaded"
        );
        Ok(Self {
            path,
            collection: Mutex::new(collection),
            writer: Mutex::new(Some(writer)),
        })
    }

    /// The backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of documents currently in memory.
    pub fn document_count(&self) -> u64 {
        self.lock_collection().document_count()
    }

    /// Insert a new document. See `RecordCollection::create`.
    pub fn create(&self, body: Value, id: Option<DocumentId>) -> CollectionResult<Document> {
        self.lock_collection().create(body, id)
    }

    /// Query documents. See `RecordCollection::read`.
    pub fn read(&self, selector: &Selector) -> Vec<Document> {
        self.lock_collection().read(selector)
    }

    /// Deep-merge a patch into an existing document. See
    /// `RecordCollection::update`.
    pub fn update(&self, patch: Value, id: &DocumentId) -> CollectionResult<Document> {
        self.lock_collection().update(patch, id)
    }

    /// Remove a document. See `RecordCollection::destroy`.
    pub fn destroy(&self, id: &DocumentId) -> CollectionResult<Document> {
        self.lock_collection().destroy(id)
    }

    /// Remove every document. See `RecordCollection::clear`.
    pub fn clear(&self) -> Vec<Document> {
        self.lock_collection().clear()
    }

    /// Stop the writer task. In-memory operations keep working, but
    /// mutations no longer reach the file. Called on registry eviction so
    /// that a freshly rebuilt store becomes the file's only writer.
    pub fn detach(&self) {
        if let Some(task) = self.writer.lock().expect("writer lock poisoned").take() {
            task.abort();
            debug!(path = %self.path.display(), "store detached from file");
        }
    }

    /// Whether the writer task is still attached.
    pub fn is_attached(&self) -> bool {
        self.writer.lock().expect("writer lock poisoned").is_some()
    }

    fn lock_collection(&self) -> std::sync::MutexGuard<'_, RecordCollection> {
        self.collection.lock().expect("collection lock poisoned")
    }
}

impl Drop for DataStore {
    fn drop(&mut self) {
        self.detach();
    }
}

impl std::fmt::Debug for DataStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataStore")
            .field("path", &self.path)
            .field("document_count", &self.document_count())
            .finish()
    }
}

/// Parse loaded file content into a collection.
///
/// `{}` (the blank-file case) hydrates silently; anything else that fails to
/// parse as a snapshot is logged and replaced with an empty collection. The
/// file itself is not rewritten until the first successful mutation.
fn hydrate(path: &Path, content: Value) -> RecordCollection {
    match serde_json::from_value::<CollectionSnapshot>(content) {
        Ok(snapshot) => RecordCollection::from_snapshot(snapshot),
        Err(error) => {
            warn!(
                path = %path.display(),
                %error,
                "unreadable store content, starting from an empty collection"
            );
            RecordCollection::new()
        }
    }
}

/// Writer loop: one full-snapshot write per mutation, in mutation order.
async fn persist_changes(mut events: ChangeStream, adapter: Arc<FileAdapter>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let content = match serde_json::to_value(&event.snapshot) {
                    Ok(content) => content,
                    Err(error) => {
                        warn!(
                            path = %adapter.path().display(),
                            %error,
                            "snapshot did not serialize, skipping write"
                        );
                        continue;
                    }
                };
                if let Err(error) = adapter.save(&content).await {
                    warn!(
                        path = %adapter.path().display(),
                        kind = %event.kind,
                        %error,
                        "failed to persist mutation, keeping in-memory state"
                    );
                }
            }
            // Missed snapshots are superseded by the ones still queued.
            Err(RecvError::Lagged(skipped)) => {
                warn!(
                    path = %adapter.path().display(),
                    skipped,
                    "change stream lagged"
                );
            }
            Err(RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    /// Poll the file until its parsed snapshot satisfies `pred`.
    async fn wait_for_file<F>(path: &Path, pred: F) -> CollectionSnapshot
    where
        F: Fn(&CollectionSnapshot) -> bool,
    {
        for _ in 0..100 {
            if let Ok(text) = tokio::fs::read_to_string(path).await {
                if let Ok(snapshot) = serde_json::from_str::<CollectionSnapshot>(&text) {
                    if pred(&snapshot) {
                        return snapshot;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("file at {} never reached the expected state", path.display());
    }

    async fn new_store(dir: &tempfile::TempDir, name: &str) -> DataStore {
        let path = dir.path().join(name);
        FileAdapter::new(&path).ensure_exists().await.unwrap();
        DataStore::open(path).await.unwrap()
    }

    #[tokio::test]
    async fn open_fails_on_missing_file() {
        let dir = tempdir().unwrap();
        let result = DataStore::open(dir.path().join("missing.json")).await;
        assert!(matches!(result, Err(crate::StoreError::Io(_))));
    }

    #[tokio::test]
    async fn open_empty_file_yields_empty_collection() {
        let dir = tempdir().unwrap();
        let store = new_store(&dir, "ns.json").await;
        assert_eq!(store.document_count(), 0);
        assert!(store.read(&Selector::All).is_empty());
    }

    #[tokio::test]
    async fn open_corrupt_file_yields_empty_collection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ns.json");
        tokio::fs::write(&path, b"###").await.unwrap();

        let store = DataStore::open(&path).await.unwrap();
        assert_eq!(store.document_count(), 0);
        // Nothing rewritten until a mutation happens.
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"###");
    }

    #[tokio::test]
    async fn mutations_are_persisted_in_order() {
        let dir = tempdir().unwrap();
        let store = new_store(&dir, "ns.json").await;

        store.create(json!({"a": 1}), Some("x".into())).unwrap();
        store.update(json!({"a": 2}), &"x".into()).unwrap();

        let snapshot = wait_for_file(store.path(), |s| {
            s.data
                .get(&DocumentId::new("x"))
                .is_some_and(|doc| doc.get("a") == Some(&json!(2)))
        })
        .await;
        assert_eq!(snapshot.document_count, 1);
    }

    #[tokio::test]
    async fn destroy_and_clear_reach_the_file() {
        let dir = tempdir().unwrap();
        let store = new_store(&dir, "ns.json").await;

        store.create(json!({}), Some("x".into())).unwrap();
        store.create(json!({}), Some("y".into())).unwrap();
        store.destroy(&"x".into()).unwrap();
        wait_for_file(store.path(), |s| {
            s.document_count == 1 && !s.data.contains_key(&DocumentId::new("x"))
        })
        .await;

        store.clear();
        wait_for_file(store.path(), |s| s.document_count == 0 && s.is_empty()).await;
    }

    #[tokio::test]
    async fn reopen_sees_persisted_documents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ns.json");
        {
            let store = new_store(&dir, "ns.json").await;
            store.create(json!({"kept": true}), Some("x".into())).unwrap();
            wait_for_file(&path, |s| s.document_count == 1).await;
        }

        let reopened = DataStore::open(&path).await.unwrap();
        let docs = reopened.read(&Selector::by_id("x"));
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("kept"), Some(&json!(true)));
    }

    #[tokio::test]
    async fn detached_store_keeps_memory_but_stops_writing() {
        let dir = tempdir().unwrap();
        let store = new_store(&dir, "ns.json").await;

        store.create(json!({}), Some("x".into())).unwrap();
        wait_for_file(store.path(), |s| s.document_count == 1).await;

        store.detach();
        assert!(!store.is_attached());
        store.create(json!({}), Some("y".into())).unwrap();
        assert_eq!(store.document_count(), 2);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let text = tokio::fs::read_to_string(store.path()).await.unwrap();
        let snapshot: CollectionSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(snapshot.document_count, 1);
    }

    #[tokio::test]
    async fn failed_mutations_do_not_write() {
        let dir = tempdir().unwrap();
        let store = new_store(&dir, "ns.json").await;

        store.create(json!({}), Some("x".into())).unwrap();
        wait_for_file(store.path(), |s| s.document_count == 1).await;
        let before = tokio::fs::read_to_string(store.path()).await.unwrap();

        assert!(store.create(json!({}), Some("x".into())).is_err());
        assert!(store.destroy(&"missing".into()).is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let after = tokio::fs::read_to_string(store.path()).await.unwrap();
        assert_eq!(before, after);
    }
}
