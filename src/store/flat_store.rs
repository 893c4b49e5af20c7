//! The flat-file Store
//!
//! All reads and writes go against the in-memory domain map. Only `open`
//! touches the file for reading and only `flush` writes it back.

use std::io;
use std::path::Path;

use tracing::{debug, error, warn};

use crate::codec::{decode_domains, encode_domains, ChecksumKind, Domain, Domains, Envelope, Meta};
use crate::config::Config;
use crate::error::{FlatKvError, Result};
use crate::value::Value;

use super::{file, KeyValueStore};

/// Domain used when none is configured
pub const DEFAULT_DOMAIN: &str = "default";

/// Entry placed in the default domain of a fresh store
const SEED_KEY: &str = "foo";
const SEED_VALUE: &str = "bar";

/// A key-value store persisted to a single file
///
/// ## Closing
/// Call [`close`](Store::close) (or use [`scoped`](Store::scoped)) to write
/// pending changes and observe the result. A store that is merely dropped
/// still flushes, but a failure there can only be logged.
pub struct Store {
    /// Store configuration (backing path, flush options)
    config: Config,

    /// Domain name → keys and values
    domains: Domains,

    /// Active domain for calls that don't name one
    domain: String,

    /// Unwritten changes exist since open or the last flush
    dirty: bool,

    /// Meta block of the last envelope read or written
    meta: Option<Meta>,

    /// Set by close(), disarms the flush in Drop
    closed: bool,
}

impl Store {
    /// Open a store over the configured file
    ///
    /// On open:
    /// 1. Check the path can be written
    /// 2. Read the file (missing or empty means a fresh store)
    /// 3. Verify the checksum, then decode the domain map
    /// 4. Make sure the active domain exists
    pub fn open(config: Config) -> Result<Self> {
        if config.path.as_os_str().is_empty() {
            return Err(FlatKvError::Config("Storage path is empty".to_string()));
        }

        // Step 1: Writability comes before any read
        file::check_writable(&config.path)?;

        // Step 2: Read
        let contents = file::read_contents(&config.path)?;

        let mut domains = seeded_domains();
        let mut meta = None;

        // Step 3: Verify and decode; a loaded map replaces the seed entirely
        if !contents.is_empty() {
            let envelope = Envelope::decode(&contents)?;

            if envelope.verify()? == ChecksumKind::Legacy {
                warn!(
                    path = %config.path.display(),
                    "accepted legacy checksum, next flush rewrites it"
                );
            }

            domains = decode_domains(&envelope.domains)?;
            meta = Some(envelope.meta);

            debug!(
                path = %config.path.display(),
                domains = domains.len(),
                "loaded store"
            );
        } else {
            debug!(path = %config.path.display(), "empty store file, starting fresh");
        }

        let domain = config.resolved_domain().to_string();

        let mut store = Self {
            config,
            domains,
            domain,
            dirty: false,
            meta,
            closed: false,
        };

        // Step 4: Active domain
        if !store.domains.contains_key(&store.domain) {
            let name = store.domain.clone();
            store.domain_add(&name);
        }

        Ok(store)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the given file and active domain
    pub fn open_path(path: impl AsRef<Path>, domain: Option<&str>) -> Result<Self> {
        let mut config = Config::default();
        config.path = path.as_ref().to_path_buf();
        config.domain = domain.map(str::to_string);
        Self::open(config)
    }

    /// Open a store, hand it to `f`, and close it on every exit path
    ///
    /// An error from `f` takes precedence over an error from closing.
    pub fn scoped<T, F>(config: Config, f: F) -> Result<T>
    where
        F: FnOnce(&mut Store) -> Result<T>,
    {
        let mut store = Self::open(config)?;
        let outcome = f(&mut store);
        let closed = store.close();

        let value = outcome?;
        closed?;
        Ok(value)
    }

    /// Write the domain map back to the file if anything changed
    ///
    /// A clean store is left alone, so repeated flushes write at most once.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }

        // Rendering failures surface as write failures
        let (envelope, contents) = self.render().map_err(|source| FlatKvError::Write {
            path: self.config.path.clone(),
            source,
        })?;

        file::write_contents(
            &self.config.path,
            &contents,
            self.config.lock_on_flush,
            self.config.sync_on_flush,
        )?;

        debug!(
            path = %self.config.path.display(),
            bytes = contents.len(),
            checksum = %envelope.meta.checksum,
            "flushed store"
        );

        self.meta = Some(envelope.meta);
        self.dirty = false;

        Ok(())
    }

    /// Flush and release the store
    pub fn close(mut self) -> Result<()> {
        self.closed = true;
        self.flush()
    }

    // =========================================================================
    // Key Operations
    // =========================================================================

    /// Store `value` under `key` in `domain` (or the active domain)
    ///
    /// Returns false, changing nothing, if the domain does not exist.
    pub fn put(&mut self, key: &str, value: impl Into<Value>, domain: Option<&str>) -> bool {
        let name = domain.unwrap_or(self.domain.as_str());

        match self.domains.get_mut(name) {
            Some(entries) => {
                entries.insert(key.to_string(), value.into());
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Whether `key` is present in `domain` (or the active domain)
    pub fn exists(&self, key: &str, domain: Option<&str>) -> bool {
        self.resolve(domain)
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }

    /// A copy of the value under `key`, or `None` if the key or domain is missing
    pub fn get(&self, key: &str, domain: Option<&str>) -> Option<Value> {
        self.resolve(domain)?.get(key).cloned()
    }

    /// Delete `key`. Returns whether anything was deleted.
    pub fn remove(&mut self, key: &str, domain: Option<&str>) -> bool {
        let name = domain.unwrap_or(self.domain.as_str());

        let removed = self
            .domains
            .get_mut(name)
            .and_then(|entries| entries.remove(key))
            .is_some();

        if removed {
            self.dirty = true;
        }
        removed
    }

    /// Sorted keys of `domain` (or the active domain), `None` if it is missing
    pub fn keys(&self, domain: Option<&str>) -> Option<Vec<String>> {
        self.resolve(domain)
            .map(|entries| entries.keys().cloned().collect())
    }

    // =========================================================================
    // Domain Operations
    // =========================================================================

    pub fn domain_exists(&self, domain: &str) -> bool {
        self.domains.contains_key(domain)
    }

    /// Create an empty domain. False if the name is empty or already taken.
    pub fn domain_add(&mut self, domain: &str) -> bool {
        if domain.is_empty() || self.domains.contains_key(domain) {
            return false;
        }

        self.domains.insert(domain.to_string(), Domain::new());
        self.dirty = true;
        debug!(domain, "added domain");
        true
    }

    /// Delete a domain with all of its keys
    ///
    /// The active domain can be removed too; calls relying on it then miss
    /// until it is added again.
    pub fn domain_remove(&mut self, domain: &str) -> bool {
        if self.domains.remove(domain).is_none() {
            return false;
        }

        self.dirty = true;
        debug!(domain, "removed domain");
        true
    }

    /// Sorted names of all domains
    pub fn domains(&self) -> Vec<String> {
        self.domains.keys().cloned().collect()
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The active domain
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The backing file path
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Timestamp of the last envelope read or written
    pub fn updated(&self) -> Option<&str> {
        self.meta.as_ref().map(|meta| meta.updated.as_str())
    }

    /// Checksum of the last envelope read or written
    pub fn checksum(&self) -> Option<&str> {
        self.meta.as_ref().map(|meta| meta.checksum.as_str())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    fn resolve(&self, domain: Option<&str>) -> Option<&Domain> {
        self.domains.get(domain.unwrap_or(self.domain.as_str()))
    }

    /// Build the envelope and its on-disk text
    fn render(&self) -> io::Result<(Envelope, String)> {
        let envelope = Envelope::seal(encode_domains(&self.domains)?)?;
        let contents = envelope.encode(self.config.pretty)?;
        Ok((envelope, contents))
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.closed {
            return;
        }

        if let Err(e) = self.flush() {
            error!(
                path = %self.config.path.display(),
                error = %e,
                "flush on drop failed, unsaved changes are lost"
            );
        }
    }
}

impl KeyValueStore for Store {
    fn flush(&mut self) -> Result<()> {
        Store::flush(self)
    }

    fn put(&mut self, key: &str, value: Value, domain: Option<&str>) -> bool {
        Store::put(self, key, value, domain)
    }

    fn exists(&self, key: &str, domain: Option<&str>) -> bool {
        Store::exists(self, key, domain)
    }

    fn get(&self, key: &str, domain: Option<&str>) -> Option<Value> {
        Store::get(self, key, domain)
    }

    fn remove(&mut self, key: &str, domain: Option<&str>) -> bool {
        Store::remove(self, key, domain)
    }

    fn domain_exists(&self, domain: &str) -> bool {
        Store::domain_exists(self, domain)
    }

    fn domain_add(&mut self, domain: &str) -> bool {
        Store::domain_add(self, domain)
    }

    fn domain_remove(&mut self, domain: &str) -> bool {
        Store::domain_remove(self, domain)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.config.path)
            .field("domain", &self.domain)
            .field("domains", &self.domains.len())
            .field("dirty", &self.dirty)
            .finish()
    }
}

/// State of a store before any file contents are applied
fn seeded_domains() -> Domains {
    let mut seed = Domain::new();
    seed.insert(SEED_KEY.to_string(), Value::from(SEED_VALUE));

    let mut domains = Domains::new();
    domains.insert(DEFAULT_DOMAIN.to_string(), seed);
    domains
}
