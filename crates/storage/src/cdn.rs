//! HTTP implementation of [`AssetStore`] against the image CDN's REST API.
//!
//! Uploads are multipart POSTs to `{base_url}/image/upload`; deletes are
//! POSTs to `{base_url}/image/destroy`. Both carry an API key and a SHA-256
//! request signature over the sorted parameters (the account is configured
//! for SHA-256 signing). A destroy of a missing asset answers
//! `{"result": "not found"}` with HTTP 200, which maps to
//! [`DeleteOutcome::NotFound`].

use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{AssetStore, DeleteOutcome, StorageError, UploadedAsset};

/// Configuration for the CDN client.
#[derive(Debug, Clone)]
pub struct CdnConfig {
    /// API base, e.g. `https://api.cdn.example/v1_1/my-cloud`.
    pub base_url: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CdnConfig {
    /// Load CDN configuration from environment variables.
    ///
    /// | Env Var              | Required |
    /// |----------------------|----------|
    /// | `ASSET_STORE_URL`    | **yes**  |
    /// | `ASSET_STORE_KEY`    | **yes**  |
    /// | `ASSET_STORE_SECRET` | **yes**  |
    ///
    /// # Panics
    ///
    /// Panics if any required variable is missing; asset storage is not
    /// optional for either binary that constructs this.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("ASSET_STORE_URL")
                .expect("ASSET_STORE_URL must be set in the environment"),
            api_key: std::env::var("ASSET_STORE_KEY")
                .expect("ASSET_STORE_KEY must be set in the environment"),
            api_secret: std::env::var("ASSET_STORE_SECRET")
                .expect("ASSET_STORE_SECRET must be set in the environment"),
        }
    }
}

/// Reqwest-backed CDN client.
pub struct CdnStore {
    config: CdnConfig,
    client: reqwest::Client,
}

/// Body of a successful upload response.
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

/// Body of a destroy response. `result` is `"ok"` or `"not found"`.
#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

impl CdnStore {
    /// Create a client with the given configuration.
    pub fn new(config: CdnConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Sign request parameters: sort by name, join as a query string, append
    /// the API secret, SHA-256, hex-encode.
    fn sign(params: &[(&str, String)], api_secret: &str) -> String {
        let mut sorted: Vec<(&str, &str)> = params
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        sorted.sort_by_key(|&(name, _)| name);
        let joined = sorted
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha256::new();
        hasher.update(joined.as_bytes());
        hasher.update(api_secret.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn now_timestamp() -> i64 {
        chrono::Utc::now().timestamp()
    }
}

#[async_trait::async_trait]
impl AssetStore for CdnStore {
    async fn upload(
        &self,
        key: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<UploadedAsset, StorageError> {
        let timestamp = Self::now_timestamp().to_string();
        let params = [
            ("public_id", key.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = Self::sign(&params, &self.config.api_secret);

        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("public_id", key.to_string())
            .text("timestamp", timestamp)
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature);

        let response = self
            .client
            .post(format!("{}/image/upload", self.config.base_url))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UnexpectedResponse(e.to_string()))?;

        tracing::debug!(key = %body.public_id, "Asset uploaded");
        Ok(UploadedAsset {
            url: body.secure_url,
            key: body.public_id,
        })
    }

    async fn delete(&self, key: &str) -> Result<DeleteOutcome, StorageError> {
        let timestamp = Self::now_timestamp().to_string();
        let params = [
            ("public_id", key.to_string()),
            ("timestamp", timestamp.clone()),
        ];
        let signature = Self::sign(&params, &self.config.api_secret);

        let response = self
            .client
            .post(format!("{}/image/destroy", self.config.base_url))
            .json(&serde_json::json!({
                "public_id": key,
                "api_key": self.config.api_key,
                "timestamp": timestamp,
                "signature": signature,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: DestroyResponse = response
            .json()
            .await
            .map_err(|e| StorageError::UnexpectedResponse(e.to_string()))?;

        match body.result.as_str() {
            "ok" => Ok(DeleteOutcome::Deleted),
            "not found" => Ok(DeleteOutcome::NotFound),
            other => Err(StorageError::UnexpectedResponse(format!(
                "destroy returned result '{other}' for key '{key}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_sorts_params_by_name() {
        let secret = "shhh";
        let forward = [
            ("public_id", "events/1/a".to_string()),
            ("timestamp", "1700000000".to_string()),
        ];
        let reversed = [
            ("timestamp", "1700000000".to_string()),
            ("public_id", "events/1/a".to_string()),
        ];
        assert_eq!(
            CdnStore::sign(&forward, secret),
            CdnStore::sign(&reversed, secret)
        );
    }

    #[test]
    fn test_signature_matches_known_digest() {
        // sha256("public_id=events/1/a&timestamp=1700000000" + "shhh")
        let params = [
            ("public_id", "events/1/a".to_string()),
            ("timestamp", "1700000000".to_string()),
        ];
        let signature = CdnStore::sign(&params, "shhh");
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));

        // Changing any input changes the digest.
        let other = CdnStore::sign(&params, "different-secret");
        assert_ne!(signature, other);
    }
}
