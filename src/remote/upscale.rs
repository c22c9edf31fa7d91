//! HTTP client for the torch-srgan super-resolution API
//!
//! The service works in two hops: a multipart POST returns a JSON body with
//! an `output_url`, and the enhanced image is fetched from that URL.

use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::remote::{UpscaleFactor, Upscaler};
use async_trait::async_trait;
use instant::Instant;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct UpscaleResponse {
    #[serde(default)]
    output_url: String,
}

/// Upscaling client backed by the DeepAI torch-srgan HTTP API
#[derive(Debug)]
pub struct SrganClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl SrganClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidConfig` when the API key is empty or the
    /// HTTP client cannot be constructed.
    pub fn new(config: &EditorConfig) -> Result<Self> {
        if config.upscale_api_key.is_empty() {
            return Err(EditorError::invalid_config("upscaling API key is not set"));
        }
        let client = Client::builder()
            .timeout(config.remote_timeout)
            .build()
            .map_err(|e| {
                EditorError::invalid_config(format!("failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            endpoint: config.upscale_endpoint.clone(),
            api_key: config.upscale_api_key.clone(),
        })
    }

    fn remote_err(&self, detail: &str) -> EditorError {
        EditorError::remote_service_with_endpoint("upscaling", &self.endpoint, detail)
    }
}

#[async_trait]
impl Upscaler for SrganClient {
    async fn upscale(&self, image: &[u8], factor: UpscaleFactor) -> Result<Vec<u8>> {
        let start = Instant::now();

        let part = Part::bytes(image.to_vec()).file_name("image");
        let form = Form::new()
            .part("image", part)
            .text("scale", factor.multiplier().to_string());

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.remote_err(&e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, body = %body, "upscaling rejected");
            return Err(self.remote_err(&format!("HTTP {}", status)));
        }

        let parsed: UpscaleResponse = response
            .json()
            .await
            .map_err(|e| self.remote_err(&format!("malformed response: {}", e)))?;
        if parsed.output_url.is_empty() {
            return Err(self.remote_err("response carried no output URL"));
        }

        // Second hop: fetch the enhanced image itself
        let result = self
            .client
            .get(&parsed.output_url)
            .send()
            .await
            .map_err(|e| self.remote_err(&e.to_string()))?;
        if !result.status().is_success() {
            return Err(self.remote_err(&format!(
                "result fetch failed with HTTP {}",
                result.status()
            )));
        }
        let bytes = result
            .bytes()
            .await
            .map_err(|e| self.remote_err(&e.to_string()))?;
        if bytes.is_empty() {
            return Err(EditorError::remote_service(
                "upscaling returned an empty body",
            ));
        }

        debug!(
            %factor,
            result_bytes = bytes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "upscaling complete"
        );
        Ok(bytes.to_vec())
    }
}
