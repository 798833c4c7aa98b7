//! Configuration types for reel-relay

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the destination-platform credential
pub const TOKEN_ENV_VAR: &str = "FLIC_TOKEN";

/// Destination platform configuration (endpoints, credential, defaults)
///
/// Groups settings for the platform that receives the upload and the post.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Base URL of the destination platform API
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Pre-issued credential sent as the `Flic-Token` header
    ///
    /// Absence is not validated up front; an empty token surfaces as an
    /// authentication failure from the first call that needs it.
    #[serde(default)]
    pub token: String,

    /// Timeout applied to each HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Category assigned to posts when the caller supplies none (default: 25)
    #[serde(default = "default_category_id")]
    pub default_category_id: u32,

    /// Title used when no explicit title is given and no caption was fetched
    #[serde(default = "default_title")]
    pub default_title: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            token: String::new(),
            request_timeout: default_request_timeout(),
            default_category_id: default_category_id(),
            default_title: default_title(),
        }
    }
}

/// Staging directory configuration
///
/// The staging area is created fresh before each fetch and removed when the
/// run finishes, success or failure. Used as a nested sub-config within
/// [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Staging directory (default: "./videos")
    #[serde(default = "default_staging_dir")]
    pub dir: PathBuf,

    /// Extension of the video container format (default: "mp4")
    #[serde(default = "default_video_extension")]
    pub video_extension: String,

    /// Extension of the plain-text caption sidecar (default: "txt")
    #[serde(default = "default_caption_extension")]
    pub caption_extension: String,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            dir: default_staging_dir(),
            video_extension: default_video_extension(),
            caption_extension: default_caption_extension(),
        }
    }
}

/// External download tool configuration
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// Path to the yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub tool_path: Option<PathBuf>,

    /// Whether to search PATH for the tool if no explicit path is set
    /// (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Capture the tool's stdout/stderr instead of inheriting the parent's
    /// streams, re-emitting them at debug level (default: true)
    #[serde(default = "default_true")]
    pub quiet: bool,

    /// Maximum time allowed for one download (default: 300 seconds)
    #[serde(default = "default_download_timeout", with = "duration_serde")]
    pub download_timeout: Duration,

    /// Base URL the shortcode is appended to when invoking the tool
    #[serde(default = "default_post_url_base")]
    pub post_url_base: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            tool_path: None,
            search_path: true,
            quiet: true,
            download_timeout: default_download_timeout(),
            post_url_base: default_post_url_base(),
        }
    }
}

/// Main configuration for the republishing pipeline
///
/// Fields are organized into logical sub-configs:
/// - [`platform`](PlatformConfig) — destination endpoints, credential, defaults
/// - [`staging`](StagingConfig) — staging directory and artifact extensions
/// - [`fetcher`](FetcherConfig) — external download tool behavior
///
/// All sub-config fields are flattened for serialization, so the JSON/TOML
/// format has no nesting.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Destination platform settings
    #[serde(flatten)]
    pub platform: PlatformConfig,

    /// Staging directory settings
    #[serde(flatten)]
    pub staging: StagingConfig,

    /// External download tool settings
    #[serde(flatten)]
    pub fetcher: FetcherConfig,
}

impl Config {
    /// Build a configuration from defaults plus process environment
    ///
    /// Reads the `FLIC_TOKEN` environment variable into the platform
    /// credential. A missing variable leaves the token empty; the failure
    /// surfaces later as an authentication error from the platform.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(token) = std::env::var(TOKEN_ENV_VAR) {
            config.platform.token = token;
        }
        config
    }
}

fn default_api_base() -> String {
    "https://api.socialverseapp.com".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_category_id() -> u32 {
    25
}

fn default_title() -> String {
    "Untitled reel".to_string()
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("videos")
}

fn default_video_extension() -> String {
    "mp4".to_string()
}

fn default_caption_extension() -> String {
    "txt".to_string()
}

fn default_download_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_post_url_base() -> String {
    "https://www.instagram.com/reel".to_string()
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (seconds as u64)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
