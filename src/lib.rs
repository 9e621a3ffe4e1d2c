//! Concurrent in-memory key-value store that snapshots itself to a JSON
//! file.
//!
//! Keys are strings, values are arbitrary JSON. Mutations are memory-only
//! and lock one shard at a time; a flush rewrites the whole file atomically,
//! either on demand or every few seconds from a background thread.
//!
//! ```rust,no_run
//! use snapmap::SnapMap;
//! use std::time::Duration;
//!
//! let (db, _errors) = SnapMap::open_with_sync("db.json", Duration::from_secs(3)).unwrap();
//! db.set("hello", "world");
//! db.flush().unwrap(); // or wait for the next background sync
//! ```
//!
//! **Durability is bounded, not immediate.** Writes between the last flush
//! and a crash are lost; the file on disk is at most one sync interval
//! stale. Call [`SnapMap::flush`] before exiting if that matters.
//!
//! **Single-process only.** If multiple processes open the same file they
//! will clobber each other. The `.lock` marker next to the file only makes
//! an in-flight write visible; it does not arbitrate access.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod persist;
pub mod shard;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
pub use shard::ShardedMap;
pub use store::{SnapMap, SnapMapBuilder, SnapMapHandle};
pub use store::{DEFAULT_ERROR_BACKLOG, DEFAULT_SYNC_INTERVAL};
pub use sync::SyncWorker;

/// The JSON value type stored in the map, re-exported from `serde_json`.
pub use serde_json::Value;
