//! HTTP client for the remove.bg background-removal API

use crate::compositor::Compositor;
use crate::config::{EditorConfig, OutputFormat};
use crate::error::{EditorError, Result};
use crate::remote::BackgroundRemover;
use crate::types::RasterImage;
use async_trait::async_trait;
use instant::Instant;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

/// Quality used when re-encoding oversized uploads
const UPLOAD_JPEG_QUALITY: u8 = 95;

/// Error body returned by the service on failure
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    errors: Vec<ApiErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEntry {
    #[serde(default)]
    title: String,
}

/// Background-removal client backed by the remove.bg HTTP API
///
/// Oversized inputs are downscaled to the configured upload cap and
/// re-encoded as JPEG before upload, trading a little quality for a much
/// smaller request body.
#[derive(Debug)]
pub struct RemoveBgClient {
    client: Client,
    endpoint: String,
    api_key: String,
    upload_max_dimension: u32,
}

impl RemoveBgClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidConfig` when the API key is empty or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &EditorConfig) -> Result<Self> {
        if config.remove_bg_api_key.is_empty() {
            return Err(EditorError::invalid_config(
                "background-removal API key is not set",
            ));
        }
        let client = Client::builder()
            .timeout(config.remote_timeout)
            .build()
            .map_err(|e| {
                EditorError::invalid_config(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            endpoint: config.remove_bg_endpoint.clone(),
            api_key: config.remove_bg_api_key.clone(),
            upload_max_dimension: config.upload_max_dimension,
        })
    }

    /// Shrink the upload below the dimension cap, re-encoding as JPEG
    fn prepare_upload(&self, image: &[u8]) -> Result<(Vec<u8>, &'static str)> {
        let raster = RasterImage::from_bytes(image.to_vec())?;
        let (width, height) = raster.dimensions();
        if width <= self.upload_max_dimension && height <= self.upload_max_dimension {
            let mime = raster.mime_type();
            return Ok((raster.into_bytes(), mime));
        }
        debug!(
            width,
            height,
            cap = self.upload_max_dimension,
            "downscaling image before upload"
        );
        let shrinker = Compositor::new(OutputFormat::Jpeg, UPLOAD_JPEG_QUALITY);
        let shrunk = shrinker.downscale_to_fit(&raster, self.upload_max_dimension)?;
        Ok((shrunk.into_bytes(), "image/jpeg"))
    }

    /// Extract a human-readable message from an error response body
    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        if let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body) {
            if let Some(entry) = parsed.errors.first() {
                if !entry.title.is_empty() {
                    return entry.title.clone();
                }
            }
        }
        format!("HTTP {}", status)
    }
}

#[async_trait]
impl BackgroundRemover for RemoveBgClient {
    async fn remove_background(&self, image: &[u8]) -> Result<Vec<u8>> {
        let start = Instant::now();
        let (upload, mime) = self.prepare_upload(image)?;
        let upload_len = upload.len();

        let part = Part::bytes(upload)
            .file_name("image")
            .mime_str(mime)
            .map_err(|e| EditorError::internal(format!("invalid upload mime type: {}", e)))?;
        let form = Form::new().part("image_file", part).text("size", "auto");

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-Api-Key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                EditorError::remote_service_with_endpoint(
                    "background removal",
                    &self.endpoint,
                    &e.to_string(),
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = Self::error_message(status, &body);
            warn!(%status, error = %message, "background removal rejected");
            return Err(EditorError::remote_service_with_endpoint(
                "background removal",
                &self.endpoint,
                &message,
            ));
        }

        let bytes = response.bytes().await.map_err(|e| {
            EditorError::remote_service_with_endpoint(
                "background removal",
                &self.endpoint,
                &e.to_string(),
            )
        })?;
        if bytes.is_empty() {
            return Err(EditorError::remote_service(
                "background removal returned an empty body",
            ));
        }

        debug!(
            upload_bytes = upload_len,
            result_bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "background removal complete"
        );
        Ok(bytes.to_vec())
    }
}
