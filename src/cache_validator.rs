use sha2::{Digest, Sha256};

/// Validates cached extraction payloads using SHA-256 checksums.
///
/// Listing extraction responses are cached for an hour keyed by URL. A
/// checksum is generated when a payload is cached and validated on
/// retrieval; corrupted entries are rejected and the listing is refetched
/// from the source.

/// Wrapper for a cached payload with integrity validation
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ValidatedCacheEntry {
    /// The cached payload (JSON string)
    pub data: String,
    /// SHA-256 checksum of the payload (hex encoded)
    pub checksum: String,
}

impl ValidatedCacheEntry {
    /// Creates a new validated cache entry with computed checksum
    pub fn new(data: String) -> Self {
        let checksum = Self::compute_checksum(&data);
        Self { data, checksum }
    }

    fn compute_checksum(data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns true if the checksum matches the payload
    pub fn is_valid(&self) -> bool {
        let computed = Self::compute_checksum(&self.data);
        computed == self.checksum
    }

    /// Serializes the entry for storage in the cache
    pub fn serialize(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Deserializes and validates a cache entry.
    ///
    /// Returns `Some(payload)` if valid, `None` if corrupted or not valid
    /// JSON - the caller falls back to a fresh fetch in that case.
    pub fn deserialize_and_validate(serialized: &str) -> Option<String> {
        let entry: ValidatedCacheEntry = serde_json::from_str(serialized).ok()?;

        if entry.is_valid() {
            Some(entry.data)
        } else {
            tracing::warn!(
                "Cache validation failed: checksum mismatch. Expected: {}, Data length: {}",
                entry.checksum,
                entry.data.len()
            );
            None
        }
    }
}
