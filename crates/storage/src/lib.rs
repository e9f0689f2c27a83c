//! Asset store client for the image CDN.
//!
//! Uploaded images live in an external CDN, addressed by a key derived from
//! the owning event (`events/{event_id}/{asset_id}`). The [`AssetStore`]
//! trait is the seam the API server and the cleanup sweeper program against;
//! [`cdn::CdnStore`] is the HTTP implementation. Deletes must distinguish
//! "not found" from failure: the sweeper treats a missing asset as already
//! deleted so interrupted runs can be replayed.

use async_trait::async_trait;

use proofroom_core::types::DbId;

pub mod cdn;

/// Errors from asset store operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Transport-level failure reaching the CDN.
    #[error("Asset store request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The CDN answered with a non-success status.
    #[error("Asset store rejected the request ({status}): {message}")]
    Api { status: u16, message: String },

    /// The CDN answered 200 but the body was not the expected shape.
    #[error("Unexpected asset store response: {0}")]
    UnexpectedResponse(String),
}

/// Outcome of a delete request.
///
/// `NotFound` is a success for every caller in this codebase: it means the
/// asset is gone, which is the post-condition a delete wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The asset existed and was removed.
    Deleted,
    /// The asset was already absent (e.g. removed by a prior partial sweep).
    NotFound,
}

/// A successfully uploaded asset.
#[derive(Debug, Clone)]
pub struct UploadedAsset {
    /// Durable reference URL served by the CDN.
    pub url: String,
    /// The key the asset was stored under; the same key deletes it.
    pub key: String,
}

/// Remote image storage: authenticated upload and signed delete.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Upload image bytes under `key`, returning the durable reference.
    async fn upload(
        &self,
        key: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedAsset, StorageError>;

    /// Delete the asset stored under `key`.
    async fn delete(&self, key: &str) -> Result<DeleteOutcome, StorageError>;
}

/// Key for a proof photo asset: `events/{event_id}/{asset_id}`.
pub fn proof_key(event_id: DbId, asset_id: &str) -> String {
    format!("events/{event_id}/{asset_id}")
}

/// Key for a final (edited) photo asset: `events/{event_id}/finals/{asset_id}`.
pub fn final_key(event_id: DbId, asset_id: &str) -> String {
    format!("events/{event_id}/finals/{asset_id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_proof_key_scheme() {
        assert_eq!(proof_key(42, "a1b2"), "events/42/a1b2");
    }

    #[test]
    fn test_final_key_scheme() {
        assert_eq!(final_key(42, "a1b2"), "events/42/finals/a1b2");
    }

    #[test]
    fn test_final_keys_never_collide_with_proof_keys() {
        assert_ne!(proof_key(1, "x"), final_key(1, "x"));
    }
}
