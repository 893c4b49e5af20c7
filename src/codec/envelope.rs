//! Outer encoding layer: the envelope written to the backing file

use std::io;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{FlatKvError, Result};

use super::checksum::{primary_checksum, verify_checksum, ChecksumKind};

/// The on-disk document
///
/// `domains` holds the *encoded* domain map, not the map itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub domains: String,
    pub meta: Meta,
}

/// Envelope metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meta {
    /// RFC 3339 timestamp of the flush that wrote this envelope
    pub updated: String,

    /// Hex digest of the domains string
    pub checksum: String,
}

impl Envelope {
    /// Wrap an encoded domain map, stamping it with the current time and
    /// its primary checksum
    pub fn seal(domains: String) -> io::Result<Self> {
        let meta = Meta {
            updated: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, false),
            checksum: primary_checksum(&domains)?,
        };

        Ok(Self { domains, meta })
    }

    /// Parse the file contents
    pub fn decode(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| FlatKvError::CorruptData(format!("Unable to decode file: {}", e)))
    }

    /// Render the envelope for writing
    pub fn encode(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Check the stored checksum against the domains string
    pub fn verify(&self) -> Result<ChecksumKind> {
        verify_checksum(&self.meta.checksum, &self.domains)
    }
}
