//! Store Module
//!
//! The key-value store bound to one backing file.
//!
//! ## Responsibilities
//! - Check, read, verify and decode the file on open
//! - Domain-scoped key/value operations against the in-memory state
//! - Dirty tracking and whole-file flushes
//!
//! ## Lifecycle
//! ```text
//!   open ──► check writable ──► read ──► verify checksum ──► decode
//!                                              │
//!        ┌─────────────────────────────────────┘
//!        ▼
//!   put / get / remove / domain ops (memory only, mark dirty)
//!        │
//!        ▼
//!   flush (if dirty) ──► close / drop
//! ```
//!
//! The file is not locked while open. Two stores on the same path, in one
//! process or several, will overwrite each other's flushes.

mod file;
mod flat_store;

pub use flat_store::{Store, DEFAULT_DOMAIN};

use crate::error::Result;
use crate::value::Value;

/// Programmatic contract of a domain-partitioned key-value store.
///
/// `domain` arguments of `None` refer to the store's active domain. Misses
/// are reported through return values, never as errors.
pub trait KeyValueStore {
    /// Write pending changes to the backing file
    fn flush(&mut self) -> Result<()>;

    /// Store `value` under `key`. False if the domain does not exist.
    fn put(&mut self, key: &str, value: Value, domain: Option<&str>) -> bool;

    /// Whether `key` is present
    fn exists(&self, key: &str, domain: Option<&str>) -> bool;

    /// A copy of the value under `key`
    fn get(&self, key: &str, domain: Option<&str>) -> Option<Value>;

    /// Delete `key`. True if something was deleted.
    fn remove(&mut self, key: &str, domain: Option<&str>) -> bool;

    fn domain_exists(&self, domain: &str) -> bool;

    /// Create an empty domain. False if the name is empty or taken.
    fn domain_add(&mut self, domain: &str) -> bool;

    /// Delete a domain and every key in it
    fn domain_remove(&mut self, domain: &str) -> bool;
}
