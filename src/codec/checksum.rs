//! Envelope checksums
//!
//! The primary digest is `md5(json_string(domains))`: the domains string is
//! quoted as a JSON string literal once more before hashing. Files written by
//! the first version of the format hashed the raw string instead, and that
//! legacy digest stays accepted on read.

use std::io::{self, Write};

use md5::{Digest, Md5};
use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

use crate::error::{FlatKvError, Result};

/// Which digest matched during verification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Primary,
    Legacy,
}

/// Digest written by every flush
pub fn primary_checksum(domains: &str) -> io::Result<String> {
    Ok(md5_hex(encode_json_string(domains)?.as_bytes()))
}

/// Digest of the raw string, as written by old files
pub fn legacy_checksum(domains: &str) -> String {
    md5_hex(domains.as_bytes())
}

/// Check `stored` against the primary digest, then the legacy one
pub fn verify_checksum(stored: &str, domains: &str) -> Result<ChecksumKind> {
    let computed = primary_checksum(domains)?;
    if stored == computed {
        return Ok(ChecksumKind::Primary);
    }

    if stored == legacy_checksum(domains) {
        return Ok(ChecksumKind::Legacy);
    }

    Err(FlatKvError::Integrity {
        stored: stored.to_string(),
        computed,
    })
}

/// Quote `s` as a JSON string literal.
///
/// Escaping is fixed because it feeds the checksum: on top of serde_json's
/// escapes, `/` is escaped and everything outside ASCII becomes lowercase
/// `\uXXXX` UTF-16 units, so the output is always ASCII.
pub fn encode_json_string(s: &str) -> io::Result<String> {
    let mut out = Vec::with_capacity(s.len() + 2);
    let mut serializer = Serializer::with_formatter(&mut out, ChecksumFormatter);
    s.serialize(&mut serializer)?;

    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// Compact formatter with the extra escapes the checksum input needs
struct ChecksumFormatter;

impl Formatter for ChecksumFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        let mut start = 0;

        for (i, ch) in fragment.char_indices() {
            if ch.is_ascii() && ch != '/' {
                continue;
            }

            writer.write_all(fragment[start..i].as_bytes())?;
            if ch == '/' {
                writer.write_all(b"\\/")?;
            } else {
                let mut units = [0u16; 2];
                for unit in ch.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
            start = i + ch.len_utf8();
        }

        writer.write_all(fragment[start..].as_bytes())
    }
}

fn md5_hex(bytes: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
