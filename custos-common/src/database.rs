//! Database operation patterns and transactional store contexts
//!
//! Storage is split in two layers:
//!
//! - [`KvStore`] is the engine: ordered point reads, prefix scans and
//!   atomic batch writes. [`MemoryDatabase`] and [`CustosDatabase`]
//!   (RocksDB) implement it.
//! - [`Database`] hands out [`StoreContext`]s, the transactional scope
//!   every keeper operation runs under. A context buffers its writes,
//!   reads its own writes, and applies them as one atomic batch on
//!   [`StoreContext::commit`]. Dropping a context discards its writes.

use crate::error::{CustosError, CustosResult};
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

/// A single write inside an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOp {
    /// Insert or overwrite `key`
    Put {
        /// Key to write
        key: Vec<u8>,
        /// Value to store
        value: Vec<u8>,
    },
    /// Remove `key` if present
    Delete {
        /// Key to remove
        key: Vec<u8>,
    },
}

/// Ordered key-value storage engine
pub trait KvStore: Send + Sync {
    /// Get raw value from the store
    fn get_raw(&self, key: &[u8]) -> CustosResult<Option<Vec<u8>>>;

    /// Entries whose key starts with `prefix` and is not below `start`,
    /// in ascending key order
    fn scan_from(&self, prefix: &[u8], start: &[u8]) -> CustosResult<Vec<(Vec<u8>, Vec<u8>)>>;

    /// All entries whose key starts with `prefix`, in ascending key order
    fn scan_prefix(&self, prefix: &[u8]) -> CustosResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.scan_from(prefix, prefix)
    }

    /// Apply every operation or none of them
    fn write_batch(&self, ops: Vec<BatchOp>) -> CustosResult<()>;
}

fn scan_start<'k>(prefix: &'k [u8], start: &'k [u8]) -> &'k [u8] {
    if start > prefix {
        start
    } else {
        prefix
    }
}

/// In-memory ordered store, used for tests and ephemeral registries
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryDatabase {
    /// Create an empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys
    pub fn len(&self) -> CustosResult<usize> {
        Ok(self.entries.read()?.len())
    }

    /// True when nothing is stored
    pub fn is_empty(&self) -> CustosResult<bool> {
        Ok(self.entries.read()?.is_empty())
    }
}

impl KvStore for MemoryDatabase {
    fn get_raw(&self, key: &[u8]) -> CustosResult<Option<Vec<u8>>> {
        Ok(self.entries.read()?.get(key).cloned())
    }

    fn scan_from(&self, prefix: &[u8], start: &[u8]) -> CustosResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let entries = self.entries.read()?;
        Ok(entries
            .range(scan_start(prefix, start).to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> CustosResult<()> {
        let mut entries = self.entries.write()?;
        for op in ops {
            match op {
                BatchOp::Put { key, value } => {
                    entries.insert(key, value);
                }
                BatchOp::Delete { key } => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Directory holding the RocksDB files
    pub path: String,
    /// Maximum number of open files RocksDB may keep
    pub max_open_files: i32,
    /// Size of a single memtable in bytes
    pub write_buffer_size: usize,
    /// fsync every write batch
    pub use_fsync: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./custos_data".to_string(),
            max_open_files: 1000,
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            use_fsync: true,
        }
    }
}

impl DatabaseConfig {
    /// Create RocksDB options from this configuration
    pub fn create_options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.set_max_open_files(self.max_open_files);
        opts.set_use_fsync(self.use_fsync);
        opts.set_bytes_per_sync(8388608);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts
    }
}

/// RocksDB-backed store
pub struct CustosDatabase {
    db: Arc<DB>,
}

impl CustosDatabase {
    /// Open (creating if missing) a database at `path` with default tuning
    pub fn new(path: &str) -> CustosResult<Self> {
        Self::with_config(&DatabaseConfig {
            path: path.to_string(),
            ..DatabaseConfig::default()
        })
    }

    /// Open a database described by `config`
    pub fn with_config(config: &DatabaseConfig) -> CustosResult<Self> {
        let opts = config.create_options();
        let db = DB::open(&opts, &config.path)?;
        tracing::debug!(path = %config.path, "opened rocksdb store");
        Ok(Self { db: Arc::new(db) })
    }
}

impl KvStore for CustosDatabase {
    fn get_raw(&self, key: &[u8]) -> CustosResult<Option<Vec<u8>>> {
        self.db.get(key).map_err(CustosError::from)
    }

    fn scan_from(&self, prefix: &[u8], start: &[u8]) -> CustosResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut out = Vec::new();
        let iter = self.db.iterator(IteratorMode::From(
            scan_start(prefix, start),
            Direction::Forward,
        ));

        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }

        Ok(out)
    }

    fn write_batch(&self, ops: Vec<BatchOp>) -> CustosResult<()> {
        let mut batch = WriteBatch::default();
        for op in ops {
            match op {
                BatchOp::Put { key, value } => batch.put(key, value),
                BatchOp::Delete { key } => batch.delete(key),
            }
        }
        self.db.write(batch).map_err(CustosError::from)
    }
}

/// Transactional front of a [`KvStore`]
///
/// Writing contexts are serialized: at most one [`StoreContext`] is open
/// at a time, which gives every context a stable view of committed state
/// and makes read-modify-write sequences (such as bumping a counter)
/// race free.
pub struct Database {
    backend: Arc<dyn KvStore>,
    writer: Mutex<()>,
}

impl Database {
    /// Wrap an existing engine
    pub fn new(backend: Arc<dyn KvStore>) -> Self {
        Self {
            backend,
            writer: Mutex::new(()),
        }
    }

    /// Fresh in-memory database
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryDatabase::new()))
    }

    /// Open a RocksDB database at `path`
    pub fn open(path: &str) -> CustosResult<Self> {
        Ok(Self::new(Arc::new(CustosDatabase::new(path)?)))
    }

    /// Open a RocksDB database described by `config`
    pub fn open_with_config(config: &DatabaseConfig) -> CustosResult<Self> {
        Ok(Self::new(Arc::new(CustosDatabase::with_config(config)?)))
    }

    /// The underlying engine
    pub fn backend(&self) -> Arc<dyn KvStore> {
        Arc::clone(&self.backend)
    }

    /// Open a transactional scope, blocking while another one is open
    pub fn begin(&self) -> CustosResult<StoreContext<'_>> {
        let guard = self.writer.lock()?;
        Ok(StoreContext {
            backend: self.backend.as_ref(),
            pending: BTreeMap::new(),
            _guard: guard,
        })
    }
}

/// One transactional scope over a [`Database`]
pub struct StoreContext<'a> {
    backend: &'a dyn KvStore,
    // None marks a pending delete
    pending: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
    _guard: MutexGuard<'a, ()>,
}

impl StoreContext<'_> {
    /// Read a key, observing this scope's own pending writes
    pub fn get(&self, key: &[u8]) -> CustosResult<Option<Vec<u8>>> {
        match self.pending.get(key) {
            Some(value) => Ok(value.clone()),
            None => self.backend.get_raw(key),
        }
    }

    /// Check if key exists
    pub fn has(&self, key: &[u8]) -> CustosResult<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Stage a write
    pub fn set(&mut self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) {
        self.pending.insert(key.into(), Some(value.into()));
    }

    /// Stage a delete
    pub fn delete(&mut self, key: impl Into<Vec<u8>>) {
        self.pending.insert(key.into(), None);
    }

    /// Ordered scan of `prefix` as seen from inside this scope
    pub fn scan_prefix(&self, prefix: &[u8]) -> CustosResult<Vec<(Vec<u8>, Vec<u8>)>> {
        self.scan_from(prefix, prefix)
    }

    /// Ordered scan of `prefix` starting at `start` (inclusive), as seen
    /// from inside this scope
    pub fn scan_from(
        &self,
        prefix: &[u8],
        start: &[u8],
    ) -> CustosResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.backend.scan_from(prefix, start)?.into_iter().collect();

        for (key, value) in self
            .pending
            .range(scan_start(prefix, start).to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
        {
            match value {
                Some(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        Ok(merged.into_iter().collect())
    }

    /// Number of staged writes
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Apply all staged writes atomically and close the scope
    pub fn commit(self) -> CustosResult<usize> {
        let count = self.pending.len();
        if count == 0 {
            return Ok(0);
        }

        let ops = self
            .pending
            .into_iter()
            .map(|(key, value)| match value {
                Some(value) => BatchOp::Put { key, value },
                None => BatchOp::Delete { key },
            })
            .collect();

        self.backend.write_batch(ops)?;
        tracing::trace!(writes = count, "committed store context");
        Ok(count)
    }

    /// Drop all staged writes and close the scope
    pub fn discard(self) {
        if !self.pending.is_empty() {
            tracing::debug!(writes = self.pending.len(), "discarding store context");
        }
    }
}
