//! # FlatKV
//!
//! A small key-value store persisted to one flat file, with:
//! - Named domains so unrelated consumers can share a file
//! - A checksummed JSON envelope, verified before anything is trusted
//! - Dirty tracking, so unchanged stores are never rewritten
//! - Explicit close (or scoped use) to observe flush errors
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Store                                │
//! │   put / get / exists / remove / domain_add / domain_remove  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ in-memory domain map (dirty flag)
//!          ┌────────────┴────────────┐
//!          │ open                    │ flush
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   verify    │          │    seal     │
//!   │  + decode   │          │  + encode   │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          └──────────┬─────────────┘
//!                     ▼
//!             ┌──────────────┐
//!             │ Backing file │
//!             │  (envelope)  │
//!             └──────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use flatkv::{Config, Store};
//!
//! # fn main() -> flatkv::Result<()> {
//! let config = Config::builder().path("settings.json").build();
//!
//! Store::scoped(config, |store| {
//!     store.domain_add("ui");
//!     store.put("theme", "dark", Some("ui"));
//!     Ok(())
//! })?;
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod codec;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{FlatKvError, Result};
pub use config::Config;
pub use store::{KeyValueStore, Store, DEFAULT_DOMAIN};
pub use value::Value;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of FlatKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
