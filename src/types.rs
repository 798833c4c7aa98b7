//! Core types for reel-relay

use serde::{Deserialize, Serialize};

/// Unique content identifier extracted from a source-platform URL
///
/// The shortcode is the path segment that follows the reel marker in the
/// URL, e.g. `ABC123` in `https://www.instagram.com/reels/ABC123/`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Shortcode(pub String);

impl Shortcode {
    /// Create a new Shortcode
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Get the shortcode as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Shortcode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Shortcode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

/// A short-lived upload grant issued by the destination platform
///
/// Obtained once per run from the provisioning endpoint and consumed by
/// exactly one upload call and one post-creation call. Not reusable across
/// runs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadGrant {
    /// Pre-signed endpoint that accepts a direct file upload
    pub url: String,
    /// Opaque identifier binding the uploaded bytes to a post record
    pub hash: String,
}

/// Body of the post-creation request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostRecord {
    /// Post title (explicit, caption-derived, or the default)
    pub title: String,
    /// Content hash from the upload grant
    pub hash: String,
    /// Whether the post appears in the public feed
    pub is_available_in_public_feed: bool,
    /// Destination category identifier
    pub category_id: u32,
}

/// Caller-supplied options for a pipeline run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PostOptions {
    /// Explicit post title; always wins over any discovered caption
    #[serde(default)]
    pub title: Option<String>,

    /// Category to assign (None = use the configured default)
    #[serde(default)]
    pub category_id: Option<u32>,

    /// Publish into the public feed (default: false)
    #[serde(default)]
    pub public: bool,
}

/// Pipeline stage
///
/// The per-URL state machine is `Start → Fetched → Provisioned → Uploaded →
/// Posted → Done`; any stage may transition to failed instead. Used for
/// structured stage-transition logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Resolve the URL to staged artifact files
    Fetch,
    /// Obtain the upload grant from the destination platform
    Provision,
    /// Stream the video bytes to the pre-signed endpoint
    Upload,
    /// Create the metadata post referencing the uploaded asset
    Post,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Provision => "provision",
            Stage::Upload => "upload",
            Stage::Post => "post",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of processing a batch of URLs
///
/// Failures are recorded per URL; one URL failing never aborts the rest of
/// the batch.
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Number of URLs fully republished
    pub succeeded: usize,
    /// Failed URLs with their rendered error messages, in input order
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    /// True if every URL in the batch was republished
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
