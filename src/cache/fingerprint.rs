use serde::Serialize;
use sha2::{Digest, Sha256};

/// Deterministic cache key: SHA-256 over the JSON encoding of `params`.
///
/// Field order follows the struct definition, so two requests with the same
/// normalized parameters always hash alike.
pub fn fingerprint<T: Serialize>(params: &T) -> Result<String, serde_json::Error> {
    let encoded = serde_json::to_vec(params)?;
    let mut hasher = Sha256::new();
    hasher.update(&encoded);
    Ok(format!("{:x}", hasher.finalize()))
}
