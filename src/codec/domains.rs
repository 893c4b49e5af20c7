//! Inner encoding layer: domain map <-> string

use std::collections::BTreeMap;

use crate::error::{FlatKvError, Result};
use crate::value::Value;

/// Keys and values of a single domain
pub type Domain = BTreeMap<String, Value>;

/// All domains, by name
pub type Domains = BTreeMap<String, Domain>;

/// Encode the domain map as compact JSON
pub fn encode_domains(domains: &Domains) -> serde_json::Result<String> {
    serde_json::to_string(domains)
}

/// Decode a domains string read back from an envelope.
///
/// Older writers emitted list-shaped maps as JSON arrays, so an array is
/// read as a map keyed by element position (`"0"`, `"1"`, ...). This holds
/// for the top level and for each domain; `[]` is therefore an empty map.
pub fn decode_domains(encoded: &str) -> Result<Domains> {
    let json: serde_json::Value = serde_json::from_str(encoded).map_err(|e| {
        FlatKvError::CorruptData(format!("Unable to decode domain data from file: {}", e))
    })?;

    let Some(entries) = into_map(json) else {
        return Err(FlatKvError::CorruptData(
            "Domain data is not an object".to_string(),
        ));
    };

    let mut domains = Domains::new();
    for (name, body) in entries {
        let domain = match into_map(body) {
            Some(map) => map
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect(),
            None => {
                return Err(FlatKvError::CorruptData(format!(
                    "Domain '{}' is not an object or array",
                    name
                )))
            }
        };
        domains.insert(name, domain);
    }

    Ok(domains)
}

/// A JSON object as-is, or an array keyed by element position
fn into_map(json: serde_json::Value) -> Option<serde_json::Map<String, serde_json::Value>> {
    match json {
        serde_json::Value::Object(map) => Some(map),
        serde_json::Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (index.to_string(), item))
                .collect(),
        ),
        _ => None,
    }
}
