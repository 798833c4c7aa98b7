//! Source-platform fetching: shortcode extraction and the download collaborator
//!
//! The download capability is an opaque collaborator — given a content
//! identifier, populate a directory with zero or more artifact files. The
//! production implementation shells out to yt-dlp; tests substitute doubles.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::Shortcode;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Fixed marker preceding the content identifier in a source URL
pub const REEL_MARKER: &str = "reels/";

/// Sidecar extension the download tool uses for caption/description files
const DESCRIPTION_EXTENSION: &str = "description";

/// Maximum number of stderr bytes folded into a download error
const STDERR_TAIL_BYTES: usize = 800;

/// Extract the unique content identifier from a source-platform URL
///
/// Locates the fixed `reels/` marker and takes the path segment immediately
/// following it, up to the next `/` (or the end of the string).
///
/// # Errors
///
/// Returns [`Error::MalformedUrl`] if the marker is absent or the segment
/// following it is empty.
///
/// # Examples
///
/// ```
/// use reel_relay::fetcher::extract_shortcode;
///
/// let code = extract_shortcode("https://www.instagram.com/reels/C_xnrVHyN7Y/").unwrap();
/// assert_eq!(code.as_str(), "C_xnrVHyN7Y");
/// ```
pub fn extract_shortcode(url: &str) -> Result<Shortcode> {
    let after_marker = url
        .split_once(REEL_MARKER)
        .map(|(_, rest)| rest)
        .ok_or_else(|| Error::MalformedUrl {
            url: url.to_string(),
            reason: format!("marker '{}' not found", REEL_MARKER),
        })?;

    let shortcode = after_marker.split('/').next().unwrap_or("");
    if shortcode.is_empty() {
        return Err(Error::MalformedUrl {
            url: url.to_string(),
            reason: "empty content identifier after marker".to_string(),
        });
    }

    Ok(Shortcode::new(shortcode))
}

/// Download collaborator: populate a directory with a post's artifact files
///
/// Implementations retrieve every artifact the source platform associates
/// with the identifier (video, caption sidecar, thumbnail, ...) into `dest`.
/// The caller owns filtering and cleanup of whatever lands there.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Fetch all artifacts for `shortcode` into the `dest` directory
    async fn fetch(&self, shortcode: &Shortcode, dest: &Path) -> Result<()>;
}

/// Production fetcher shelling out to the yt-dlp binary
///
/// The binary is taken from an explicit configured path or discovered on
/// PATH. Tool diagnostics are captured and re-emitted at debug level in
/// quiet mode, so the tool's noise never reaches the parent's streams; with
/// quiet disabled the tool inherits them instead.
pub struct YtDlpFetcher {
    binary_path: PathBuf,
    post_url_base: String,
    caption_extension: String,
    quiet: bool,
    timeout: Duration,
}

impl YtDlpFetcher {
    /// Binary name searched for on PATH when no explicit path is configured
    pub const BINARY_NAME: &'static str = "yt-dlp";

    /// Build a fetcher from configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::ToolNotFound`] when no explicit path is configured
    /// and the binary is absent from PATH (or PATH search is disabled).
    pub fn from_config(config: &Config) -> Result<Self> {
        let binary_path = match &config.fetcher.tool_path {
            Some(path) => path.clone(),
            None if config.fetcher.search_path => {
                which::which(Self::BINARY_NAME).map_err(|_| Error::ToolNotFound {
                    name: Self::BINARY_NAME.to_string(),
                })?
            }
            None => {
                return Err(Error::ToolNotFound {
                    name: Self::BINARY_NAME.to_string(),
                });
            }
        };

        Ok(Self {
            binary_path,
            post_url_base: config.fetcher.post_url_base.clone(),
            caption_extension: config.staging.caption_extension.clone(),
            quiet: config.fetcher.quiet,
            timeout: config.fetcher.download_timeout,
        })
    }

    /// Canonical post URL handed to the download tool
    fn post_url(&self, shortcode: &Shortcode) -> String {
        format!(
            "{}/{}/",
            self.post_url_base.trim_end_matches('/'),
            shortcode
        )
    }

    fn command(&self, shortcode: &Shortcode, dest: &Path) -> Command {
        let output_template = format!("{}/%(id)s.%(ext)s", dest.display());
        let mut command = Command::new(&self.binary_path);
        command
            .kill_on_drop(true)
            .arg("--no-playlist")
            .arg("--no-progress")
            .arg("--write-description")
            .arg("-o")
            .arg(output_template)
            .arg(self.post_url(shortcode));
        if self.quiet {
            command
                .arg("--no-warnings")
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        command
    }

    /// Rename caption sidecars to the staging caption extension
    ///
    /// The tool writes `<id>.description`; downstream scanning expects the
    /// configured caption extension, so the sidecar is renamed before the
    /// pruning pass would otherwise delete it.
    fn normalize_sidecars(&self, dest: &Path) -> Result<()> {
        for entry in std::fs::read_dir(dest)? {
            let path = entry?.path();
            let is_sidecar = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case(DESCRIPTION_EXTENSION));
            if path.is_file() && is_sidecar {
                let renamed = path.with_extension(&self.caption_extension);
                tracing::debug!(
                    from = %path.display(),
                    to = %renamed.display(),
                    "normalizing caption sidecar"
                );
                std::fs::rename(&path, &renamed)?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn fetch(&self, shortcode: &Shortcode, dest: &Path) -> Result<()> {
        let mut command = self.command(shortcode, dest);
        tracing::debug!(
            tool = %self.binary_path.display(),
            shortcode = %shortcode,
            "invoking download tool"
        );

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| Error::DownloadFailed {
                shortcode: shortcode.to_string(),
                reason: format!("download timed out after {:?}", self.timeout),
            })?
            .map_err(|e| Error::DownloadFailed {
                shortcode: shortcode.to_string(),
                reason: format!("failed to execute {}: {}", self.binary_path.display(), e),
            })?;

        if self.quiet {
            // Diagnostics stay off the parent's streams; surface them only
            // through the subscriber at debug level.
            if !output.stdout.is_empty() {
                tracing::debug!(
                    stdout = %String::from_utf8_lossy(&output.stdout),
                    "download tool stdout"
                );
            }
            if !output.stderr.is_empty() {
                tracing::debug!(
                    stderr = %String::from_utf8_lossy(&output.stderr),
                    "download tool stderr"
                );
            }
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let mut tail_start = stderr.len().saturating_sub(STDERR_TAIL_BYTES);
            while !stderr.is_char_boundary(tail_start) {
                tail_start += 1;
            }
            return Err(Error::DownloadFailed {
                shortcode: shortcode.to_string(),
                reason: format!(
                    "tool exited with {}: {}",
                    output.status,
                    stderr[tail_start..].trim()
                ),
            });
        }

        self.normalize_sidecars(dest)
    }
}
