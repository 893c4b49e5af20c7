//! Configuration for FlatKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Main configuration for a Store instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// The backing file. It does not have to exist yet, but its parent
    /// directory must, and both must be writable.
    pub path: PathBuf,

    /// Active domain for operations that don't name one.
    /// `None` (or an empty name) selects [`DEFAULT_DOMAIN`](crate::DEFAULT_DOMAIN).
    pub domain: Option<String>,

    // -------------------------------------------------------------------------
    // Flush Configuration
    // -------------------------------------------------------------------------
    /// Hold an advisory exclusive lock on the file while flushing (unix only)
    pub lock_on_flush: bool,

    /// fsync the file after every flush
    pub sync_on_flush: bool,

    /// Pretty-print the outer envelope
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./flatkv.json"),
            domain: None,
            lock_on_flush: false,
            sync_on_flush: true,
            pretty: true,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// The domain name this config resolves to
    pub fn resolved_domain(&self) -> &str {
        match self.domain.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => crate::DEFAULT_DOMAIN,
        }
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the backing file path
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.path = path.into();
        self
    }

    /// Set the active domain
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.config.domain = Some(domain.into());
        self
    }

    /// Enable or disable the advisory lock around flush
    pub fn lock_on_flush(mut self, enabled: bool) -> Self {
        self.config.lock_on_flush = enabled;
        self
    }

    /// Enable or disable fsync after flush
    pub fn sync_on_flush(mut self, enabled: bool) -> Self {
        self.config.sync_on_flush = enabled;
        self
    }

    /// Pretty-print (true) or compact (false) envelope output
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
