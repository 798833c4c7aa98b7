//! Error types for reel-relay
//!
//! This module provides the error taxonomy for the republishing pipeline:
//! - URL parsing and download failures from the fetch stage
//! - HTTP contract violations from the destination platform (each carrying
//!   the literal status code and response body for diagnostics)
//! - Staging-area scan failures

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for reel-relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for reel-relay
///
/// Every pipeline stage fails immediately with one of these variants; nothing
/// is retried. The pipeline driver is the only layer that catches them.
#[derive(Debug, Error)]
pub enum Error {
    /// Source URL does not contain a recognizable content identifier
    #[error("malformed source URL '{url}': {reason}")]
    MalformedUrl {
        /// The URL that could not be parsed
        url: String,
        /// Why identifier extraction failed
        reason: String,
    },

    /// The external download tool failed to produce artifacts
    #[error("download failed for '{shortcode}': {reason}")]
    DownloadFailed {
        /// The content identifier being fetched
        shortcode: String,
        /// Tool failure description (exit status, stderr tail, or timeout)
        reason: String,
    },

    /// No video file present in the staging area after the fetch stage
    #[error("no video file found in staging directory '{dir}'")]
    MissingVideo {
        /// The staging directory that was scanned
        dir: PathBuf,
    },

    /// No caption file present in the staging area
    ///
    /// Non-fatal at the pipeline level: the driver catches this and falls
    /// back to the configured default title.
    #[error("no caption file found in staging directory '{dir}'")]
    MissingCaption {
        /// The staging directory that was scanned
        dir: PathBuf,
    },

    /// Upload-URL provisioning returned a non-200 response
    #[error("failed to generate upload URL: {status}, {body}")]
    ProvisionFailed {
        /// HTTP status code returned by the provisioning endpoint
        status: u16,
        /// Response body text
        body: String,
    },

    /// Video upload returned a non-200 response
    #[error("failed to upload video: {status}, {body}")]
    UploadFailed {
        /// HTTP status code returned by the pre-signed endpoint
        status: u16,
        /// Response body text
        body: String,
    },

    /// Post creation returned a non-200 response
    #[error("failed to create post: {status}, {body}")]
    PostCreationFailed {
        /// HTTP status code returned by the post endpoint
        status: u16,
        /// Response body text
        body: String,
    },

    /// Required external tool could not be located
    #[error("external tool not found: {name}")]
    ToolNotFound {
        /// The binary name that was searched for
        name: String,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api_base")
        key: Option<String>,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
