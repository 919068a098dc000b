//! Defines the storage capability the resizer depends on.

use crate::error::ResizeError;
use async_trait::async_trait;

/// An object store addressed by bucket and key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the whole contents of an object.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, ResizeError>;

    /// Create or replace an object.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), ResizeError>;
}
