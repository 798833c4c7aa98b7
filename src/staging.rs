//! Staging area lifecycle: fresh creation, artifact pruning, guaranteed removal
//!
//! The staging directory is the only resource in the pipeline requiring
//! guaranteed-release discipline. [`StagingArea`] owns it: creation clobbers
//! any stale directory, and `Drop` removes the tree on every exit path,
//! success or failure.

use crate::config::StagingConfig;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A transient directory holding downloaded artifacts between fetch and upload
///
/// At most one video file and at most one caption file survive the pruning
/// pass; every other artifact the download tool produced is deleted.
#[derive(Debug)]
pub struct StagingArea {
    root: PathBuf,
    video_extension: String,
    caption_extension: String,
}

impl StagingArea {
    /// Create a fresh staging directory
    ///
    /// Any pre-existing directory at the configured path is removed first:
    /// the staging area must not contain unrelated content that could be
    /// mistaken for pipeline artifacts.
    pub fn create(config: &StagingConfig) -> Result<Self> {
        if config.dir.exists() {
            tracing::debug!(dir = %config.dir.display(), "removing stale staging directory");
            fs::remove_dir_all(&config.dir)?;
        }
        fs::create_dir_all(&config.dir)?;

        Ok(Self {
            root: config.dir.clone(),
            video_extension: config.video_extension.clone(),
            caption_extension: config.caption_extension.clone(),
        })
    }

    /// Path of the staging directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete every staged file whose extension is neither the video nor the
    /// caption format
    ///
    /// Bounds the staging area to exactly the two artifact kinds consumed
    /// downstream (thumbnails, metadata sidecars, etc. are discarded).
    /// Returns the number of files removed.
    pub fn prune_artifacts(&self) -> Result<usize> {
        let mut removed = 0;
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if !self.has_extension(&path, &self.video_extension)
                && !self.has_extension(&path, &self.caption_extension)
            {
                tracing::debug!(file = %path.display(), "pruning staged artifact");
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Locate the staged video file
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingVideo`] if no file with the video extension
    /// exists — a hard stop for the pipeline.
    pub fn video_file(&self) -> Result<PathBuf> {
        self.find_by_extension(&self.video_extension)
            .ok_or_else(|| Error::MissingVideo {
                dir: self.root.clone(),
            })
    }

    /// Locate the staged caption file
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingCaption`] if no file with the caption
    /// extension exists. Callers treat this as non-fatal and fall back to a
    /// default title.
    pub fn caption_file(&self) -> Result<PathBuf> {
        self.find_by_extension(&self.caption_extension)
            .ok_or_else(|| Error::MissingCaption {
                dir: self.root.clone(),
            })
    }

    fn find_by_extension(&self, extension: &str) -> Option<PathBuf> {
        let mut matches: Vec<PathBuf> = fs::read_dir(&self.root)
            .ok()?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && self.has_extension(path, extension))
            .collect();
        // Deterministic pick if the tool ever produced more than one
        matches.sort();
        matches.into_iter().next()
    }

    fn has_extension(&self, path: &Path, extension: &str) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        match fs::remove_dir_all(&self.root) {
            Ok(()) => {
                tracing::debug!(dir = %self.root.display(), "removed staging directory");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(
                    dir = %self.root.display(),
                    error = %e,
                    "failed to remove staging directory"
                );
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn staging_config(root: &Path) -> StagingConfig {
        StagingConfig {
            dir: root.join("videos"),
            ..Default::default()
        }
    }

    fn touch(path: &Path) {
        fs::write(path, b"data").unwrap();
    }

    #[test]
    fn create_clobbers_preexisting_content() {
        let temp = tempdir().unwrap();
        let config = staging_config(temp.path());

        fs::create_dir_all(&config.dir).unwrap();
        touch(&config.dir.join("stale.mp4"));

        let staging = StagingArea::create(&config).unwrap();
        assert!(
            staging.video_file().is_err(),
            "stale video must not survive fresh creation"
        );
    }

    #[test]
    fn prune_keeps_only_video_and_caption_files() {
        let temp = tempdir().unwrap();
        let config = staging_config(temp.path());
        let staging = StagingArea::create(&config).unwrap();

        touch(&staging.root().join("reel.mp4"));
        touch(&staging.root().join("reel.txt"));
        touch(&staging.root().join("reel.jpg"));
        touch(&staging.root().join("reel.json.xz"));
        touch(&staging.root().join("reel.webp"));

        let removed = staging.prune_artifacts().unwrap();
        assert_eq!(removed, 3);

        let survivors: Vec<String> = fs::read_dir(staging.root())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(survivors.len(), 2);
        assert!(survivors.contains(&"reel.mp4".to_string()));
        assert!(survivors.contains(&"reel.txt".to_string()));
    }

    #[test]
    fn video_and_caption_scans_find_staged_files() {
        let temp = tempdir().unwrap();
        let config = staging_config(temp.path());
        let staging = StagingArea::create(&config).unwrap();

        touch(&staging.root().join("C_xnrVHyN7Y.mp4"));
        touch(&staging.root().join("C_xnrVHyN7Y.txt"));

        assert_eq!(
            staging.video_file().unwrap().file_name().unwrap(),
            "C_xnrVHyN7Y.mp4"
        );
        assert_eq!(
            staging.caption_file().unwrap().file_name().unwrap(),
            "C_xnrVHyN7Y.txt"
        );
    }

    #[test]
    fn missing_video_and_caption_return_dedicated_errors() {
        let temp = tempdir().unwrap();
        let config = staging_config(temp.path());
        let staging = StagingArea::create(&config).unwrap();

        assert!(matches!(
            staging.video_file(),
            Err(Error::MissingVideo { .. })
        ));
        assert!(matches!(
            staging.caption_file(),
            Err(Error::MissingCaption { .. })
        ));
    }

    #[test]
    fn drop_removes_staging_directory() {
        let temp = tempdir().unwrap();
        let config = staging_config(temp.path());

        let staging = StagingArea::create(&config).unwrap();
        touch(&staging.root().join("reel.mp4"));
        let root = staging.root().to_path_buf();
        assert!(root.exists());

        drop(staging);
        assert!(!root.exists(), "drop must remove the staging tree");
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let temp = tempdir().unwrap();
        let config = staging_config(temp.path());
        let staging = StagingArea::create(&config).unwrap();

        touch(&staging.root().join("REEL.MP4"));
        assert!(staging.video_file().is_ok());
    }
}
