//! SHARP Client - HTTP client for the SHARP Studio prediction service
//!
//! Talks to the endpoints served next to the studio page:
//!
//!   POST /api/predict               → multipart upload, returns the run manifest
//!   GET  /api/output-root           → current output folder
//!   POST /api/output-root/select    → server-side folder picker
//!   POST /api/output-root/open      → open the folder in the file browser
//!
//! Result URLs in responses are root-relative (`/api/file/<run>/<name>`);
//! [`SharpClient::resolve`] turns them into absolute URLs for downloads.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::backend::StudioBackend;
use crate::error::{StudioError, StudioResult, GENERIC_FAILURE, UNREACHABLE};
use crate::input::PredictRequest;
use crate::prediction::{
    check_status, error_detail, parse_json_body, parse_predict_response, OutputRootPath, OutputRootSelection,
    PredictionResult,
};

/// Request ceilings per endpoint family.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Prediction runs inference and optional rendering, which can take minutes.
    pub predict_timeout: Duration,
    /// The select endpoint blocks on a native folder dialog.
    pub select_timeout: Duration,
    /// Everything else.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            predict_timeout: Duration::from_secs(600),
            select_timeout: Duration::from_secs(300),
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
struct SharpClientInner {
    base_url: Url,
    client: reqwest::Client,
    config: ClientConfig,
}

/// Cheaply cloneable handle to one prediction service.
#[derive(Debug, Clone)]
pub struct SharpClient(Arc<SharpClientInner>);

impl SharpClient {
    /// Create a client for the service rooted at `base_url`.
    pub fn new(base_url: &str) -> StudioResult<Self> {
        Self::with_config(base_url, ClientConfig::default())
    }

    pub fn with_config(base_url: &str, config: ClientConfig) -> StudioResult<Self> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| StudioError::validation(format!("Invalid server URL '{base_url}': {e}")))?;

        let client = reqwest::Client::builder()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self(Arc::new(SharpClientInner {
            base_url,
            client,
            config,
        })))
    }

    pub fn base_url(&self) -> &Url {
        &self.0.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.0.config
    }

    /// Resolve a (possibly root-relative) result URL against the service.
    pub fn resolve(&self, href: &str) -> StudioResult<Url> {
        self.0
            .base_url
            .join(href)
            .map_err(|e| StudioError::validation(format!("Invalid result URL '{href}': {e}")))
    }

    fn endpoint(&self, path: &str) -> Url {
        // Endpoint paths are constants, join cannot fail for them.
        self.0
            .base_url
            .join(path)
            .unwrap_or_else(|_| self.0.base_url.clone())
    }

    async fn send(
        request: reqwest::RequestBuilder,
        url: &Url,
    ) -> StudioResult<(u16, String)> {
        let response = request.send().await.map_err(|e| {
            log::warn!("Could not send request to {}: {}", url, e);
            StudioError::transport(None, UNREACHABLE)
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| {
            log::warn!("Failed to read response body from {}: {}", url, e);
            StudioError::transport(Some(status), UNREACHABLE)
        })?;

        log::debug!("{} answered HTTP {} ({} bytes)", url, status, text.len());
        Ok((status, text))
    }

    /// Upload the selection and wait for the run manifest.
    pub async fn predict(&self, request: PredictRequest) -> StudioResult<PredictionResult> {
        let inner = Arc::clone(&self.0);
        let url = self.endpoint("/api/predict");

        log::info!(
            "Predict request to {}: {} image(s), device={}, render={}, checkpoint={}",
            url,
            request.images.len(),
            request.device,
            request.render,
            request.checkpoint.is_some()
        );

        let builder = inner
            .client
            .post(url.clone())
            .timeout(inner.config.predict_timeout)
            .multipart(request.to_form());

        let (status, text) = Self::send(builder, &url).await?;
        parse_predict_response(status, &text)
    }

    pub async fn output_root(&self) -> StudioResult<String> {
        let url = self.endpoint("/api/output-root");
        let builder = self
            .0
            .client
            .get(url.clone())
            .timeout(self.0.config.request_timeout);

        let (status, text) = Self::send(builder, &url).await?;
        let body: OutputRootPath = parse_json_body(status, &text)?;
        Ok(body.path)
    }

    pub async fn select_output_root(&self) -> StudioResult<OutputRootSelection> {
        let url = self.endpoint("/api/output-root/select");
        let builder = self
            .0
            .client
            .post(url.clone())
            .timeout(self.0.config.select_timeout);

        let (status, text) = Self::send(builder, &url).await?;
        parse_json_body(status, &text)
    }

    pub async fn open_output_root(&self) -> StudioResult<()> {
        let url = self.endpoint("/api/output-root/open");
        let builder = self
            .0
            .client
            .post(url.clone())
            .timeout(self.0.config.request_timeout);

        let (status, text) = Self::send(builder, &url).await?;
        check_status(status, &text)
    }

    /// Fetch one result artifact into `dest_dir`, named after the last URL
    /// segment. Returns the written path.
    pub async fn download(&self, href: &str, dest_dir: &Path) -> StudioResult<PathBuf> {
        let url = self.resolve(href)?;
        let file_name = url
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|name| !name.is_empty())
            .unwrap_or("download")
            .to_string();

        let response = self
            .0
            .client
            .get(url.clone())
            .timeout(self.0.config.predict_timeout)
            .send()
            .await
            .map_err(|e| {
                log::warn!("Failed to fetch {}: {}", url, e);
                StudioError::transport(None, UNREACHABLE)
            })?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = error_detail(&text).unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(StudioError::transport(Some(status), detail));
        }

        let path = dest_dir.join(&file_name);
        let write_error =
            |e: std::io::Error| StudioError::transport(Some(status), format!("Failed to write {}: {}", path.display(), e));
        tokio::fs::create_dir_all(dest_dir).await.map_err(write_error)?;
        let mut file = tokio::fs::File::create(&path).await.map_err(write_error)?;

        let mut written = 0usize;
        let mut chunks = response.bytes_stream();
        while let Some(chunk) = chunks.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    log::warn!("Failed to read bytes from {}: {}", url, e);
                    drop(file);
                    if let Err(e) = tokio::fs::remove_file(&path).await {
                        log::debug!("Failed to remove partial {}: {}", path.display(), e);
                    }
                    return Err(StudioError::transport(Some(status), UNREACHABLE));
                }
            };
            file.write_all(&chunk).await.map_err(write_error)?;
            written += chunk.len();
        }
        file.flush().await.map_err(write_error)?;

        log::info!("Downloaded {} ({} bytes) to {}", url, written, path.display());
        Ok(path)
    }
}

impl StudioBackend for SharpClient {
    fn predict(&self, request: PredictRequest) -> BoxFuture<'static, StudioResult<PredictionResult>> {
        let client = self.clone();
        Box::pin(async move { client.predict(request).await })
    }

    fn output_root(&self) -> BoxFuture<'static, StudioResult<String>> {
        let client = self.clone();
        Box::pin(async move { client.output_root().await })
    }

    fn select_output_root(&self) -> BoxFuture<'static, StudioResult<OutputRootSelection>> {
        let client = self.clone();
        Box::pin(async move { client.select_output_root().await })
    }

    fn open_output_root(&self) -> BoxFuture<'static, StudioResult<()>> {
        let client = self.clone();
        Box::pin(async move { client.open_output_root().await })
    }
}
