//! Destination platform client: upload-URL provisioning, upload, post creation
//!
//! One authenticated client per pipeline. Each contract is strict: HTTP 200
//! is success, anything else fails immediately with the literal status code
//! and response body. Nothing is retried.

use crate::config::PlatformConfig;
use crate::error::{Error, Result};
use crate::types::{PostRecord, UploadGrant};
use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use std::path::Path;
use tokio_util::io::ReaderStream;

/// Header carrying the pre-issued destination-platform credential
pub const TOKEN_HEADER: &str = "Flic-Token";

/// Path of the upload-URL provisioning endpoint
const GENERATE_UPLOAD_URL_PATH: &str = "/posts/generate-upload-url";

/// Path of the post-creation endpoint
const POSTS_PATH: &str = "/posts";

/// Authenticated client for the destination platform API
///
/// The credential is threaded in at construction and attached to every call
/// that targets the platform itself; the pre-signed upload URL needs no
/// further authentication.
pub struct PlatformClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl PlatformClient {
    /// Build a client from platform configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the underlying HTTP client cannot be
    /// constructed.
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        })
    }

    /// Request a pre-signed upload endpoint and content hash
    ///
    /// Issues a single authenticated GET; the grant is consumed by exactly
    /// one upload call and one post-creation call.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProvisionFailed`] with the status code and response
    /// body for any non-200 response. No retry.
    pub async fn generate_upload_url(&self) -> Result<UploadGrant> {
        let endpoint = format!("{}{}", self.api_base, GENERATE_UPLOAD_URL_PATH);
        let response = self
            .http
            .get(&endpoint)
            .header(TOKEN_HEADER, &self.token)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProvisionFailed { status, body });
        }

        let grant: UploadGrant = response.json().await?;
        tracing::debug!(url = %grant.url, "upload URL provisioned");
        Ok(grant)
    }

    /// Stream a staged file's full byte content to the pre-signed endpoint
    ///
    /// Single-shot PUT with the file length declared up front; the transfer
    /// either completes fully or fails. No chunking or resume semantics.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UploadFailed`] with the status code and response
    /// body for any non-200 response, or [`Error::Io`] if the file cannot be
    /// opened.
    pub async fn upload_file(&self, upload_url: &str, path: &Path) -> Result<()> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let body = reqwest::Body::wrap_stream(ReaderStream::new(file));

        tracing::debug!(file = %path.display(), bytes = length, "uploading video");
        let response = self
            .http
            .put(upload_url)
            .header(CONTENT_LENGTH, length)
            .body(body)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::UploadFailed { status, body });
        }

        Ok(())
    }

    /// Create the metadata post referencing the uploaded asset
    ///
    /// # Errors
    ///
    /// Returns [`Error::PostCreationFailed`] with the status code and
    /// response body for any non-200 response.
    pub async fn create_post(&self, record: &PostRecord) -> Result<()> {
        let endpoint = format!("{}{}", self.api_base, POSTS_PATH);
        let response = self
            .http
            .post(&endpoint)
            .header(TOKEN_HEADER, &self.token)
            .json(record)
            .send()
            .await?;

        if response.status() != StatusCode::OK {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::PostCreationFailed { status, body });
        }

        tracing::debug!(title = %record.title, hash = %record.hash, "post created");
        Ok(())
    }
}
