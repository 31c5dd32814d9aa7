//! Key/value storage placeholders.
//!
//! The storage facility is not supported by this core: the client operations
//! taking these types always resolve with a `not_implemented` error. The
//! types exist so the client API keeps the full protocol surface.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Address of a stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageKey {
    /// Storage region the key lives in.
    pub region: u32,
    /// Key within the region.
    pub key: String,
}

/// A stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageValue {
    /// Opaque value bytes.
    pub data: Bytes,
    /// Optional caller-defined tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// A key together with the values read for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageData {
    /// The key that was read.
    pub key: StorageKey,
    /// Values found for the key.
    pub values: Vec<StorageValue>,
}
