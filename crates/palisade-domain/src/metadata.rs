use serde_json::Value;

use crate::error::{DomainError, DomainResult};

/// Open key-value metadata attached to domain entities.
pub type Metadata = serde_json::Map<String, Value>;

/// Validates that every metadata key is present in the registered allow-list.
///
/// User metadata is constrained to server-registered keys; other entities
/// accept arbitrary keys and skip this check.
pub fn validate_metadata_keys(metadata: &Metadata, allowed: &[String]) -> DomainResult<()> {
    for key in metadata.keys() {
        if !allowed.iter().any(|a| a == key) {
            return Err(DomainError::UnknownMetadataKey(key.clone()));
        }
    }
    Ok(())
}
