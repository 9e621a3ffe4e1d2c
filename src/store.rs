//! Core store type, handle, and builder.

use crate::error::{Error, Result};
use crate::persist;
use crate::shard::{ShardedMap, DEFAULT_SHARDS};
use crate::sync::SyncWorker;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use std::time::Duration;
use tracing::debug;

/// Conventional background sync interval. A reasonable argument for
/// [`SnapMap::open_with_sync`] when nothing about the workload says
/// otherwise.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(3);

/// Capacity of the error channel handed out by [`SnapMap::open_with_sync`].
pub const DEFAULT_ERROR_BACKLOG: usize = 16;

/// Concurrent string-keyed JSON store with snapshot persistence.
///
/// Mutations touch memory only; the file at [`path`](Self::path) is rewritten
/// in full by [`flush`](Self::flush), either called directly or on a timer by
/// the background sync thread. Use [`open`](Self::open) for a quick start or
/// [`builder`](Self::builder) for control over the sync interval, shard
/// count, and output format.
///
/// All operations are thread-safe; reads and writes to different keys
/// proceed in parallel across shards.
pub struct SnapMap {
    map: ShardedMap<String, Value>,
    path: PathBuf,
    pretty: bool,
    // Serializes whole flushes. Per-key locks live in the sharded map.
    write_lock: Mutex<()>,
}

impl SnapMap {
    /// Open (or create) a store at `path` with no background sync.
    pub fn open(path: impl AsRef<Path>) -> Result<SnapMapHandle> {
        Self::builder(path).build()
    }

    /// Open a store and start a background thread that flushes every
    /// `interval`. Flush errors arrive on the returned channel; the channel
    /// holds [`DEFAULT_ERROR_BACKLOG`] entries and overflow is logged and
    /// dropped, so ignoring the receiver is safe.
    pub fn open_with_sync(
        path: impl AsRef<Path>,
        interval: Duration,
    ) -> Result<(SnapMapHandle, mpsc::Receiver<Error>)> {
        let (tx, rx) = mpsc::sync_channel(DEFAULT_ERROR_BACKLOG);
        let handle = Self::builder(path)
            .sync_every(interval)
            .error_sink(tx)
            .build()?;
        Ok((handle, rx))
    }

    /// Start configuring a new store. Call [`.build()`](SnapMapBuilder::build)
    /// when ready.
    pub fn builder(path: impl AsRef<Path>) -> SnapMapBuilder {
        SnapMapBuilder::new(path)
    }

    // ---- reads ----

    /// Get the value for `key`, or `None` if absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.map.get(key)
    }

    /// `true` if the key exists. Does not clone the value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// `true` when the store has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Snapshot of all key-value pairs.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.map.entries()
    }

    /// Snapshot of all keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.map.keys()
    }

    /// Snapshot of all values.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        self.map.values()
    }

    /// Visit every entry without cloning the whole map. The callback runs
    /// under a shard lock, so it must not call back into the store.
    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&str, &Value),
    {
        self.map.for_each(|key, value| f(key.as_str(), value));
    }

    /// Path to the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---- writes (memory only) ----

    /// Set `key` to `value`, returning the previous value if the key existed.
    /// Nothing is written to disk until the next flush.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.map.insert(key.into(), value.into())
    }

    /// Set `key` to `value` only if the key is absent. Returns whether the
    /// value was stored. Atomic with respect to concurrent writers on the
    /// same key: of many racing callers, exactly one returns `true`.
    pub fn set_if_absent(&self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        self.map.insert_if_absent(key.into(), value.into())
    }

    /// Remove a key, returning its value if it was present.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.map.remove(key)
    }

    /// Drop all entries from the store.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Bulk-insert from an iterator.
    pub fn extend<I>(&self, iter: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.map.extend(iter);
    }

    // ---- persistence ----

    /// Write the current contents to disk as one JSON object.
    ///
    /// Flushes are serialized by an internal mutex, and the file is replaced
    /// by temp-file + rename, so a reader of the snapshot path never sees a
    /// torn write. Keys are sorted in the output, so two flushes of the same
    /// contents produce identical bytes.
    pub fn flush(&self) -> Result<()> {
        let _guard = self.write_lock.lock();
        let bytes = self.encode()?;
        persist::write_snapshot(&self.path, &bytes)
    }

    fn encode(&self) -> Result<Vec<u8>> {
        let mut data = Map::new();
        self.map.for_each(|key, value| {
            data.insert(key.clone(), value.clone());
        });
        let mut bytes = if self.pretty {
            serde_json::to_vec_pretty(&data)
        } else {
            serde_json::to_vec(&data)
        }
        .map_err(|err| Error::Encode(err.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

impl std::fmt::Debug for SnapMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapMap")
            .field("path", &self.path)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and opens a [`SnapMap`].
///
/// ```rust,no_run
/// use snapmap::SnapMap;
/// use std::time::Duration;
///
/// let db = SnapMap::builder("db.json")
///     .sync_every(Duration::from_secs(1))
///     .pretty(true)
///     .build()
///     .unwrap();
/// ```
pub struct SnapMapBuilder {
    path: PathBuf,
    sync: Option<Duration>,
    error_sink: Option<mpsc::SyncSender<Error>>,
    pretty: bool,
    shards: usize,
}

impl SnapMapBuilder {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            sync: None,
            error_sink: None,
            pretty: false,
            shards: DEFAULT_SHARDS,
        }
    }

    /// Flush on a background thread every `interval` (default: no background
    /// sync, flush manually).
    pub fn sync_every(mut self, interval: Duration) -> Self {
        self.sync = Some(interval);
        self
    }

    /// Where background flush errors go. Without a sink they are still
    /// logged. Sends never block; when the sink is full the error is
    /// dropped.
    pub fn error_sink(mut self, sink: mpsc::SyncSender<Error>) -> Self {
        self.error_sink = Some(sink);
        self
    }

    /// Write human-readable JSON with indentation (default: compact).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.pretty = yes;
        self
    }

    /// Number of shards for the in-memory map, rounded up to a power of two
    /// (default: 32). More shards means less contention and more memory.
    pub fn shards(mut self, count: usize) -> Self {
        self.shards = count;
        self
    }

    /// Load the snapshot (if any) and return a handle to the store.
    ///
    /// Fails with [`Error::Decode`] if a file exists at the path but does not
    /// hold a single JSON object. The file is not written here; the first
    /// write happens on the first flush.
    pub fn build(self) -> Result<SnapMapHandle> {
        let data = persist::load(&self.path)?;
        let map = ShardedMap::with_shards(self.shards);
        let entries = data.len();
        map.extend(data);
        debug!(path = %self.path.display(), entries, "store opened");

        let store = Arc::new(SnapMap {
            map,
            path: self.path,
            pretty: self.pretty,
            write_lock: Mutex::new(()),
        });

        let sync = self.sync.map(|interval| {
            let flush_store = Arc::clone(&store);
            SyncWorker::start(interval, self.error_sink, move || flush_store.flush())
        });

        Ok(SnapMapHandle { inner: store, sync })
    }
}

impl std::fmt::Debug for SnapMapBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapMapBuilder")
            .field("path", &self.path)
            .field("sync", &self.sync)
            .field("pretty", &self.pretty)
            .field("shards", &self.shards)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owns the store and, when sync is on, the background flush thread.
///
/// Derefs to [`SnapMap`] so store methods can be called directly on it.
/// Dropping the handle stops the sync thread, waiting for an in-flight write
/// to finish; it does not run a final flush, so call
/// [`flush`](SnapMap::flush) first if the latest state must hit disk.
pub struct SnapMapHandle {
    inner: Arc<SnapMap>,
    sync: Option<SyncWorker>,
}

impl SnapMapHandle {
    /// Stop the background sync thread and wait for it to exit. An in-flight
    /// write finishes first. No-op when sync was never started or has
    /// already been stopped.
    pub fn stop_sync(&mut self) {
        if let Some(worker) = &mut self.sync {
            worker.stop();
        }
    }

    /// Whether a background sync thread is currently running.
    #[must_use]
    pub fn sync_running(&self) -> bool {
        self.sync.as_ref().is_some_and(|worker| worker.is_running())
    }
}

impl std::ops::Deref for SnapMapHandle {
    type Target = SnapMap;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for SnapMapHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.inner, f)
    }
}
