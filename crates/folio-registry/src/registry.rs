//! The namespace registry.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use folio_store::{DataStore, FileAdapter, StoreHandle};

use crate::error::{RegistryError, Result};

/// Base directory namespaces live under by default.
pub const DEFAULT_BASE_DIR: &str = "data";

/// Maps namespace names to file-backed stores, one live store per file.
///
/// A namespace `ns` resolves to `<base_dir>/<ns>.json`. The cache is keyed
/// by the resolved path, so two namespace spellings that resolve to the same
/// file share one store, and one in-memory source of truth.
///
/// The registry owns its cache explicitly: it is created with the registry,
/// entries are evicted only through [`clear_namespace`](Registry::clear_namespace),
/// and separate registries (e.g. one per test) never share state.
///
/// Cloning a `Registry` is cheap and clones share the cache.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

struct Inner {
    base_dir: PathBuf,
    stores: Mutex<HashMap<PathBuf, Arc<DataStore>>>,
}

impl Registry {
    /// Create a registry rooted at `base_dir`.
    ///
    /// The directory is not created here; building a namespace fails if it
    /// is missing.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                base_dir: base_dir.into(),
                stores: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The directory namespace files live under.
    pub fn base_dir(&self) -> &Path {
        &self.inner.base_dir
    }

    /// The file path a namespace resolves to.
    pub fn namespace_path(&self, namespace: &str) -> PathBuf {
        self.inner.base_dir.join(format!("{namespace}.json"))
    }

    /// Build (or reuse) the store for a namespace and return its façade.
    ///
    /// Creates the backing file when absent, opens the store when no cached
    /// one exists for the resolved path, and otherwise hands back a façade
    /// over the cached store. Idempotent: repeated calls for the same
    /// namespace are backed by the identical in-memory collection.
    pub async fn build(&self, namespace: &str) -> Result<StoreHandle> {
        let path = self.namespace_path(namespace);

        // The cache lock is held across store construction, so concurrent
        // builds of one namespace cannot race into two stores on one file.
        let mut stores = self.inner.stores.lock().await;
        if let Some(store) = stores.get(&path) {
            return Ok(StoreHandle::new(Arc::clone(store)));
        }

        FileAdapter::new(&path).ensure_exists().await?;
        let store = Arc::new(DataStore::open(&path).await?);
        debug!(namespace, path = %path.display(), "namespace store opened");
        stores.insert(path, Arc::clone(&store));
        Ok(StoreHandle::new(store))
    }

    /// Build several namespaces concurrently.
    ///
    /// Fails with [`RegistryError::MissingArguments`] when no names are
    /// given. Results come back in input order.
    pub async fn prepare_namespaces(&self, namespaces: &[&str]) -> Result<Vec<StoreHandle>> {
        if namespaces.is_empty() {
            return Err(RegistryError::MissingArguments);
        }

        let tasks: Vec<_> = namespaces
            .iter()
            .map(|namespace| {
                let registry = self.clone();
                let namespace = namespace.to_string();
                tokio::spawn(async move { registry.build(&namespace).await })
            })
            .collect();

        let mut handles = Vec::with_capacity(tasks.len());
        for task in tasks {
            let built = task
                .await
                .map_err(|e| RegistryError::TaskFailed(e.to_string()))??;
            handles.push(built);
        }
        Ok(handles)
    }

    /// Like [`build`](Registry::build), but only for namespaces whose file
    /// already exists.
    pub async fn get_if_file_exists(&self, namespace: &str) -> Result<StoreHandle> {
        let path = self.namespace_path(namespace);
        if !FileAdapter::new(&path).exists().await {
            return Err(RegistryError::NamespaceDoesNotExist(namespace.to_string()));
        }
        self.build(namespace).await
    }

    /// Ensure the namespace's file exists, then build.
    ///
    /// Fails when the file cannot be created, e.g. the base directory is
    /// missing or unwritable.
    pub async fn create_file_and_get(&self, namespace: &str) -> Result<StoreHandle> {
        FileAdapter::new(self.namespace_path(namespace))
            .ensure_exists()
            .await?;
        self.build(namespace).await
    }

    /// Evict the cached store for a namespace.
    ///
    /// The backing file is untouched; the evicted store is detached, so
    /// façades still holding it keep their in-memory collection but stop
    /// persisting. The next [`build`](Registry::build) re-loads from disk
    /// into a fresh collection. Returns `false` (a no-op) when nothing was
    /// cached.
    pub async fn clear_namespace(&self, namespace: &str) -> bool {
        let path = self.namespace_path(namespace);
        let mut stores = self.inner.stores.lock().await;
        match stores.remove(&path) {
            Some(store) => {
                store.detach();
                debug!(namespace, path = %path.display(), "namespace store evicted");
                true
            }
            None => false,
        }
    }

    /// Whether a store is currently cached for this namespace.
    pub async fn is_cached(&self, namespace: &str) -> bool {
        self.inner
            .stores
            .lock()
            .await
            .contains_key(&self.namespace_path(namespace))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_DIR)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("base_dir", &self.inner.base_dir)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_store::Selector;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn registry(dir: &tempfile::TempDir) -> Registry {
        Registry::new(dir.path())
    }

    async fn wait_for_document_count(path: &Path, expected: u64) {
        for _ in 0..100 {
            if let Ok(text) = tokio::fs::read_to_string(path).await {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) {
                    if value["documentCount"] == json!(expected) {
                        return;
                    }
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never reached documentCount {expected}", path.display());
    }

    #[tokio::test]
    async fn build_creates_the_backing_file() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);

        let handle = r.build("users").await.unwrap();
        assert_eq!(handle.path(), dir.path().join("users.json"));
        assert!(tokio::fs::metadata(handle.path()).await.is_ok());
    }

    #[tokio::test]
    async fn build_fails_when_base_dir_is_missing() {
        let dir = tempdir().unwrap();
        let r = Registry::new(dir.path().join("absent"));
        assert!(matches!(
            r.build("users").await.unwrap_err(),
            RegistryError::Store(_)
        ));
    }

    #[tokio::test]
    async fn repeated_builds_share_one_collection() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);

        let first = r.build("users").await.unwrap();
        let second = r.build("users").await.unwrap();

        first.create(json!({"a": 1}), Some("x".into())).await.unwrap();
        let seen = second.read(&Selector::by_id("x")).await;
        assert_eq!(seen.len(), 1);
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);

        let users = r.build("users").await.unwrap();
        let posts = r.build("posts").await.unwrap();

        users.create(json!({}), Some("x".into())).await.unwrap();
        assert!(posts.read(&Selector::by_id("x")).await.is_empty());
    }

    #[tokio::test]
    async fn prepare_namespaces_requires_names() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);
        assert!(matches!(
            r.prepare_namespaces(&[]).await.unwrap_err(),
            RegistryError::MissingArguments
        ));
    }

    #[tokio::test]
    async fn prepare_namespaces_builds_in_input_order() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);

        let handles = r
            .prepare_namespaces(&["users", "posts", "tags"])
            .await
            .unwrap();
        assert_eq!(handles.len(), 3);
        let names: Vec<_> = handles
            .iter()
            .map(|h| h.path().file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["users.json", "posts.json", "tags.json"]);
    }

    #[tokio::test]
    async fn prepare_namespaces_duplicates_share_a_store() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);

        let handles = r.prepare_namespaces(&["users", "users"]).await.unwrap();
        handles[0].create(json!({}), Some("x".into())).await.unwrap();
        assert_eq!(handles[1].read(&Selector::by_id("x")).await.len(), 1);
    }

    #[tokio::test]
    async fn get_if_file_exists_requires_the_file() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);

        assert!(matches!(
            r.get_if_file_exists("ghost").await.unwrap_err(),
            RegistryError::NamespaceDoesNotExist(ns) if ns == "ghost"
        ));

        r.create_file_and_get("ghost").await.unwrap();
        r.get_if_file_exists("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn create_file_and_get_fails_without_parent() {
        let dir = tempdir().unwrap();
        let r = Registry::new(dir.path().join("absent"));
        assert!(matches!(
            r.create_file_and_get("users").await.unwrap_err(),
            RegistryError::Store(_)
        ));
    }

    #[tokio::test]
    async fn clear_namespace_evicts_and_reloads_from_disk() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);

        let handle = r.build("users").await.unwrap();
        handle.create(json!({"n": 1}), Some("x".into())).await.unwrap();
        wait_for_document_count(&r.namespace_path("users"), 1).await;

        assert!(r.clear_namespace("users").await);
        assert!(!r.is_cached("users").await);
        // Clearing an uncached namespace is a no-op.
        assert!(!r.clear_namespace("users").await);

        let rebuilt = r.build("users").await.unwrap();
        let docs = rebuilt.read(&Selector::by_id("x")).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].get("n"), Some(&json!(1)));
    }

    #[tokio::test]
    async fn stale_facades_lose_persistence() {
        let dir = tempdir().unwrap();
        let r = registry(&dir);

        let stale = r.build("users").await.unwrap();
        stale.create(json!({}), Some("x".into())).await.unwrap();
        wait_for_document_count(&r.namespace_path("users"), 1).await;

        r.clear_namespace("users").await;

        // The stale façade still mutates its orphaned collection...
        stale.create(json!({}), Some("y".into())).await.unwrap();
        assert_eq!(stale.read(&Selector::All).await.len(), 2);

        // ...but the file no longer follows it.
        tokio::time::sleep(Duration::from_millis(50)).await;
        let fresh = r.build("users").await.unwrap();
        let ids: Vec<String> = fresh
            .read(&Selector::All)
            .await
            .iter()
            .map(|d| d.id.to_string())
            .collect();
        assert_eq!(ids, ["x"]);
        assert!(fresh.read(&Selector::by_id("y")).await.is_empty());
    }
}
