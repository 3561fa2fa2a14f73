use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::config::AppConfig;

/// Every image lands with the same bounded transformation the gallery
/// expects: fit inside 1200x1200, automatic quality.
const FIXED_TRANSFORMATION: &str = "c_limit,w_1200,h_1200/q_auto:good";

pub const MAX_BATCH_FILES: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("media client configuration error: {0}")]
    Configuration(String),
    #[error("media bad request: {0}")]
    BadRequest(String),
    #[error("media upstream error: {0}")]
    Upstream(String),
    #[error("media transport error: {0}")]
    Transport(String),
    #[error("media response decode error: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaUpload {
    pub secure_url: String,
    pub public_id: String,
}

/// Thin relay to the image CDN: one signed multipart POST per file, no
/// retries. A failed upload surfaces to the caller as-is.
#[derive(Debug, Clone)]
pub struct MediaClient {
    http: reqwest::Client,
    upload_url: String,
    api_key: String,
    api_secret: String,
    folder: String,
}

impl MediaClient {
    pub fn from_config(config: &AppConfig) -> Self {
        let timeout = Duration::from_millis(config.media_timeout_ms.max(1));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            http,
            upload_url: config.media_upload_url.trim_end_matches('/').to_string(),
            api_key: config.media_api_key.trim().to_string(),
            api_secret: config.media_api_secret.trim().to_string(),
            folder: config.media_folder.trim().to_string(),
        }
    }

    pub async fn upload_image(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<MediaUpload, MediaError> {
        if bytes.is_empty() {
            return Err(MediaError::BadRequest("empty file".to_string()));
        }
        if self.api_key.is_empty() || self.api_secret.is_empty() {
            return Err(MediaError::Configuration(
                "media api credentials are not configured".to_string(),
            ));
        }

        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
            .to_string();
        let signature = sign_upload_params(
            &[
                ("folder", self.folder.as_str()),
                ("timestamp", timestamp.as_str()),
                ("transformation", FIXED_TRANSFORMATION),
            ],
            &self.api_secret,
        );

        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(content_type)
            .map_err(|err| MediaError::BadRequest(format!("invalid content type: {err}")))?;
        let form = Form::new()
            .part("file", part)
            .text("api_key", self.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("transformation", FIXED_TRANSFORMATION)
            .text("signature", signature);

        let response = self
            .http
            .post(&self.upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|err| MediaError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body = response
                .json::<Value>()
                .await
                .map_err(|err| MediaError::InvalidResponse(err.to_string()))?;
            return serde_json::from_value::<MediaUpload>(body)
                .map_err(|err| MediaError::InvalidResponse(err.to_string()));
        }

        let message = response.text().await.unwrap_or_default();
        match status {
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(MediaError::BadRequest(message))
            }
            _ => Err(MediaError::Upstream(format!(
                "status {}: {}",
                status.as_u16(),
                message
            ))),
        }
    }
}

/// Hex sha256 over the sorted `key=value` pairs joined with `&`, with the
/// API secret appended.
fn sign_upload_params(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut params: Vec<_> = params.to_vec();
    params.sort_by(|a, b| a.0.cmp(b.0));
    let joined = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    let digest = Sha256::digest(format!("{joined}{api_secret}").as_bytes());
    hex::encode(digest)
}
