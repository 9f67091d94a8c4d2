use gleaner_core::{Error, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Derive a stable cache key from an operation identity and its arguments.
///
/// The key is a hex SHA-256 over the operation name and the JSON-serialized
/// arguments, so it is stable across process runs: no object identity, and
/// field order follows the argument type's declaration order.
pub fn cache_key<A: Serialize>(operation: &str, args: &A) -> Result<String> {
    let serialized = serde_json::to_string(args)
        .map_err(|e| Error::json("Failed to serialize cache key arguments", e))?;

    let mut hasher = Sha256::new();
    hasher.update(operation.as_bytes());
    hasher.update(serialized.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}
