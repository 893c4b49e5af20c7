//! Codec Module
//!
//! Encoding of the backing file. Two independent JSON layers are stacked:
//! the domain map is encoded to a string, and that string is embedded in
//! the envelope, which is what actually lands on disk.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Envelope (outer JSON object)                            │
//! │   "domains": "<inner JSON, as a string>"                │
//! │   "meta":                                               │
//! │     "updated":  RFC 3339 timestamp of the last flush    │
//! │     "checksum": md5 hex over the encoded domains string │
//! ├─────────────────────────────────────────────────────────┤
//! │ Inner JSON (the domains string)                         │
//! │   { "<domain>": { "<key>": <value>, ... }, ... }        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The checksum covers exactly the bytes that are re-parsed on load, so
//! verification is a string comparison of digests.

mod checksum;
mod domains;
mod envelope;

pub use checksum::{
    encode_json_string, legacy_checksum, primary_checksum, verify_checksum, ChecksumKind,
};
pub use domains::{decode_domains, encode_domains, Domain, Domains};
pub use envelope::{Envelope, Meta};
