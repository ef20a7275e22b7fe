//! Storage and mirroring ports.
//!
//! These traits define the interfaces the persistence layer talks to, so the
//! dashboard can run against a directory on disk, an in-memory map in tests,
//! or with a remote mirror attached.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;

// =============================================================================
// LOCAL STORAGE
// =============================================================================

/// Durable string-keyed document store. One document per key.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a document. Absent keys are `Ok(None)`.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a document, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a document. Deleting an absent key succeeds.
    async fn remove(&self, key: &str) -> Result<()>;
}

// =============================================================================
// REMOTE MIRROR
// =============================================================================

/// Best-effort remote copy of selected collections, addressed by module name.
#[async_trait]
pub trait RemoteMirror: Send + Sync {
    /// Upload the full collection for `module`.
    async fn push(&self, module: &str, data: &JsonValue) -> Result<()>;

    /// Download the stored entries for `module`.
    async fn fetch(&self, module: &str) -> Result<Vec<JsonValue>>;
}
