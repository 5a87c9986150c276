use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::CloudinaryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Resource type segment in the provider's upload URL.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RelayOptions {
    /// Caller-assigned identifier for the remote asset.
    pub public_id: String,

    /// Upload in ranged chunks of this many bytes when the file is larger.
    pub chunk_size: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct RelayResult {
    /// Publicly resolvable URL of the relayed asset.
    pub remote_url: String,

    /// Provider-side identifier of the asset.
    pub provider_id: String,

    pub media_kind: MediaKind,
}

#[derive(Error, Debug)]
pub enum RelayError {
    /// The provider rejected the upload; the message is passed through verbatim.
    #[error("{message}")]
    Rejected { message: String },

    #[error("media service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response from media service: {0}")]
    Malformed(String),

    #[error("failed to read staged file: {0}")]
    Io(#[from] std::io::Error),
}

/// Uploads a locally staged file to the remote media store.
///
/// A single attempt, no local retry: the provider's outcome is passed
/// through as-is. Implementations must not delete or modify the local
/// file.
#[async_trait]
pub trait MediaRelay: Send + Sync {
    async fn relay(
        &self,
        local_path: &Path,
        kind: MediaKind,
        opts: RelayOptions,
    ) -> Result<RelayResult, RelayError>;
}

#[derive(Deserialize)]
struct UploadApiResponse {
    public_id: String,
    secure_url: String,
}

#[derive(Deserialize)]
struct UploadApiError {
    error: UploadApiErrorBody,
}

#[derive(Deserialize)]
struct UploadApiErrorBody {
    message: String,
}

/// Relay client for the Cloudinary upload API.
pub struct CloudinaryRelay {
    http: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryRelay {
    pub fn new(http: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self { http, config }
    }

    fn endpoint(&self, kind: MediaKind) -> String {
        format!(
            "{}/v1_1/{}/{}/upload",
            self.config.upload_prefix,
            self.config.cloud_name,
            kind.as_str()
        )
    }

    /// Request signature: sorted `key=value` pairs joined with `&`, the
    /// API secret appended, SHA-256 hex digest of the whole string.
    fn sign(&self, params: &[(&str, String)]) -> String {
        let mut pairs: Vec<String> = params.iter().map(|(k, v)| format!("{k}={v}")).collect();
        pairs.sort();

        let mut hasher = Sha256::new();
        hasher.update(pairs.join("&").as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }

    fn signed_form(&self, opts: &RelayOptions, timestamp: i64) -> Form {
        let params = [
            ("public_id", opts.public_id.clone()),
            ("timestamp", timestamp.to_string()),
        ];
        let signature = self.sign(&params);

        Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("public_id", opts.public_id.clone())
            .text("signature", signature)
    }

    async fn upload_single(
        &self,
        path: &Path,
        kind: MediaKind,
        opts: &RelayOptions,
        size: u64,
    ) -> Result<RelayResult, RelayError> {
        let timestamp = Utc::now().timestamp();
        let file = tokio::fs::File::open(path).await?;
        let part = Part::stream_with_length(reqwest::Body::wrap_stream(ReaderStream::new(file)), size)
            .file_name(file_name_of(path));
        let form = self.signed_form(opts, timestamp).part("file", part);

        debug!("relaying {} ({} bytes) as {}", path.display(), size, opts.public_id);
        let response = self.http.post(self.endpoint(kind)).multipart(form).send().await?;
        let body = Self::check(response).await?;
        Self::parse_result(&body, kind)
    }

    /// Ranged upload: every chunk carries the same signed parameters and a
    /// shared upload id; the provider returns the finished asset on the
    /// final chunk.
    async fn upload_chunked(
        &self,
        path: &Path,
        kind: MediaKind,
        opts: &RelayOptions,
        total: u64,
        chunk_size: u64,
    ) -> Result<RelayResult, RelayError> {
        let timestamp = Utc::now().timestamp();
        let upload_id = Uuid::new_v4().simple().to_string();
        let file_name = file_name_of(path);
        let mut file = tokio::fs::File::open(path).await?;

        debug!(
            "relaying {} in {} byte chunks as {}",
            path.display(),
            chunk_size,
            opts.public_id
        );

        let mut offset = 0u64;
        let mut last_body: Option<Bytes> = None;
        while offset < total {
            let end = (offset + chunk_size).min(total);
            let mut buf = vec![0u8; (end - offset) as usize];
            file.read_exact(&mut buf).await?;

            let part = Part::bytes(buf).file_name(file_name.clone());
            let form = self.signed_form(opts, timestamp).part("file", part);

            let response = self
                .http
                .post(self.endpoint(kind))
                .header("X-Unique-Upload-Id", &upload_id)
                .header(
                    reqwest::header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", offset, end - 1, total),
                )
                .multipart(form)
                .send()
                .await?;

            last_body = Some(Self::check(response).await?);
            offset = end;
        }

        let body = last_body.ok_or_else(|| RelayError::Malformed("empty upload".into()))?;
        Self::parse_result(&body, kind)
    }

    async fn check(response: reqwest::Response) -> Result<Bytes, RelayError> {
        let status = response.status();
        let body = response.bytes().await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_slice::<UploadApiError>(&body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| format!("media service returned {status}"));
        Err(RelayError::Rejected { message })
    }

    fn parse_result(body: &[u8], kind: MediaKind) -> Result<RelayResult, RelayError> {
        let parsed: UploadApiResponse =
            serde_json::from_slice(body).map_err(|e| RelayError::Malformed(e.to_string()))?;
        Ok(RelayResult {
            remote_url: parsed.secure_url,
            provider_id: parsed.public_id,
            media_kind: kind,
        })
    }
}

#[async_trait]
impl MediaRelay for CloudinaryRelay {
    async fn relay(
        &self,
        local_path: &Path,
        kind: MediaKind,
        opts: RelayOptions,
    ) -> Result<RelayResult, RelayError> {
        let size = tokio::fs::metadata(local_path).await?.len();

        let result = match opts.chunk_size {
            Some(chunk) if size > chunk => {
                self.upload_chunked(local_path, kind, &opts, size, chunk).await?
            }
            _ => self.upload_single(local_path, kind, &opts, size).await?,
        };

        info!("relayed {} to {}", opts.public_id, result.remote_url);
        Ok(result)
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "file".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_relay() -> CloudinaryRelay {
        CloudinaryRelay::new(
            reqwest::Client::new(),
            CloudinaryConfig {
                cloud_name: "demo".to_string(),
                api_key: "key123".to_string(),
                api_secret: "topsecret".to_string(),
                upload_prefix: "https://api.cloudinary.com".to_string(),
            },
        )
    }

    #[test]
    fn signature_is_deterministic_hex() {
        let relay = test_relay();
        let params = [
            ("public_id", "image_1".to_string()),
            ("timestamp", "1700000000".to_string()),
        ];

        let first = relay.sign(&params);
        let second = relay.sign(&params);

        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_is_order_insensitive() {
        let relay = test_relay();
        let forward = [
            ("public_id", "image_1".to_string()),
            ("timestamp", "1700000000".to_string()),
        ];
        let reversed = [
            ("timestamp", "1700000000".to_string()),
            ("public_id", "image_1".to_string()),
        ];

        assert_eq!(relay.sign(&forward), relay.sign(&reversed));
    }

    #[test]
    fn signature_depends_on_secret() {
        let relay = test_relay();
        let other = CloudinaryRelay::new(
            reqwest::Client::new(),
            CloudinaryConfig {
                api_secret: "differentsecret".to_string(),
                ..relay.config.clone()
            },
        );
        let params = [("timestamp", "1700000000".to_string())];

        assert_ne!(relay.sign(&params), other.sign(&params));
    }

    #[test]
    fn endpoint_targets_resource_kind() {
        let relay = test_relay();
        assert_eq!(
            relay.endpoint(MediaKind::Image),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
        assert_eq!(
            relay.endpoint(MediaKind::Video),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
    }
}
