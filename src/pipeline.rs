//! Pipeline orchestration: fetch → provision → upload → post, then cleanup
//!
//! One URL at a time, stages in strict order, each depending on the previous
//! stage's output. The staging area is removed on every exit path; the
//! driver here is the only layer that catches stage failures.

use crate::config::Config;
use crate::error::Result;
use crate::fetcher::{MediaFetcher, YtDlpFetcher, extract_shortcode};
use crate::platform::PlatformClient;
use crate::staging::StagingArea;
use crate::types::{PostOptions, PostRecord, RunSummary, Stage};
use std::sync::Arc;

/// End-to-end driver for republishing reels
///
/// Holds the configuration, the authenticated platform client, and the
/// download collaborator. One pipeline instance is active at a time within a
/// process; batches are processed sequentially in input order.
pub struct Pipeline {
    config: Config,
    client: PlatformClient,
    fetcher: Arc<dyn MediaFetcher>,
}

impl Pipeline {
    /// Build a pipeline with the production yt-dlp fetcher
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ToolNotFound`] if the download tool cannot be
    /// located, or [`crate::Error::Network`] if the HTTP client cannot be
    /// built.
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = Arc::new(YtDlpFetcher::from_config(&config)?);
        Self::with_fetcher(config, fetcher)
    }

    /// Build a pipeline with an injected download collaborator
    ///
    /// Used when the download capability is substituted, e.g. by a test
    /// double.
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn MediaFetcher>) -> Result<Self> {
        let client = PlatformClient::new(&config.platform)?;
        Ok(Self {
            config,
            client,
            fetcher,
        })
    }

    /// Republish one reel end to end
    ///
    /// Stage order: fetch the artifacts into a fresh staging area, request an
    /// upload grant, resolve the post title, stream the video to the
    /// pre-signed endpoint, create the post. The staging directory is
    /// removed when this returns, success or failure.
    ///
    /// A failure after the upload succeeded leaves an uploaded asset with no
    /// post record; that partial state is reported, not reconciled.
    ///
    /// # Errors
    ///
    /// Any stage's error propagates unchanged; nothing is retried.
    pub async fn process_url(&self, url: &str, options: &PostOptions) -> Result<()> {
        let shortcode = extract_shortcode(url)?;

        // Cleanup is owned by the staging area's Drop from here on, so every
        // early return below still removes the directory.
        let staging = StagingArea::create(&self.config.staging)?;

        tracing::info!(stage = %Stage::Fetch, url, shortcode = %shortcode, "fetching reel");
        self.fetcher.fetch(&shortcode, staging.root()).await?;
        let pruned = staging.prune_artifacts()?;
        if pruned > 0 {
            tracing::debug!(pruned, "discarded artifacts outside the video/caption formats");
        }
        let video = staging.video_file()?;

        tracing::info!(stage = %Stage::Provision, "requesting upload grant");
        let grant = self.client.generate_upload_url().await?;

        let title = self.resolve_title(options, &staging);

        tracing::info!(stage = %Stage::Upload, file = %video.display(), "uploading video");
        self.client.upload_file(&grant.url, &video).await?;

        let record = PostRecord {
            title,
            hash: grant.hash,
            is_available_in_public_feed: options.public,
            category_id: options
                .category_id
                .unwrap_or(self.config.platform.default_category_id),
        };
        tracing::info!(stage = %Stage::Post, category_id = record.category_id, "creating post");
        self.client.create_post(&record).await?;

        tracing::info!(url, "reel republished: video uploaded and post created");
        Ok(())
    }

    /// Process a batch of URLs sequentially, in input order
    ///
    /// A failed URL is logged with one line naming the URL and the
    /// underlying cause and never aborts the remaining URLs.
    pub async fn process_all(&self, urls: &[String], options: &PostOptions) -> RunSummary {
        let mut summary = RunSummary::default();
        for url in urls {
            match self.process_url(url, options).await {
                Ok(()) => summary.succeeded += 1,
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "failed to republish reel");
                    summary.failed.push((url.clone(), e.to_string()));
                }
            }
        }
        summary
    }

    /// Resolve the post title
    ///
    /// An explicit title always wins and the caption file is never read.
    /// Otherwise the staged caption's contents are used; a missing, empty,
    /// or unreadable caption degrades to the configured default title.
    fn resolve_title(&self, options: &PostOptions, staging: &StagingArea) -> String {
        if let Some(title) = &options.title {
            return title.clone();
        }

        match staging.caption_file() {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(contents) if !contents.trim().is_empty() => contents.trim().to_string(),
                Ok(_) => {
                    tracing::warn!(caption = %path.display(), "caption file empty, using default title");
                    self.config.platform.default_title.clone()
                }
                Err(e) => {
                    tracing::warn!(caption = %path.display(), error = %e, "caption unreadable, using default title");
                    self.config.platform.default_title.clone()
                }
            },
            Err(e) => {
                tracing::warn!(error = %e, "using default title");
                self.config.platform.default_title.clone()
            }
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Shortcode;
    use async_trait::async_trait;
    use std::path::Path;
    use tempfile::TempDir;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Test double: writes a fixed set of files into the staging directory.
    struct StubFetcher {
        files: Vec<(&'static str, &'static [u8])>,
    }

    #[async_trait]
    impl MediaFetcher for StubFetcher {
        async fn fetch(&self, _shortcode: &Shortcode, dest: &Path) -> crate::Result<()> {
            for (name, contents) in &self.files {
                std::fs::write(dest.join(name), contents)?;
            }
            Ok(())
        }
    }

    /// Test double: fails the way a network outage during download would.
    struct FailingFetcher;

    #[async_trait]
    impl MediaFetcher for FailingFetcher {
        async fn fetch(&self, shortcode: &Shortcode, _dest: &Path) -> crate::Result<()> {
            Err(Error::DownloadFailed {
                shortcode: shortcode.to_string(),
                reason: "connection reset".into(),
            })
        }
    }

    fn test_config(server: &MockServer, temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.platform.api_base = server.uri();
        config.platform.token = "test-token".to_string();
        config.staging.dir = temp.path().join("videos");
        config
    }

    async fn mount_happy_platform(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/posts/generate-upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/upload/slot-1", server.uri()),
                "hash": "h1",
            })))
            .mount(server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/slot-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(200))
            .mount(server)
            .await;
    }

    fn reel_fetcher() -> Arc<dyn MediaFetcher> {
        Arc::new(StubFetcher {
            files: vec![
                ("ABC123.mp4", b"video-bytes".as_slice()),
                ("ABC123.txt", b"A caption from the source".as_slice()),
                ("ABC123.jpg", b"thumbnail".as_slice()),
            ],
        })
    }

    #[tokio::test]
    async fn explicit_title_wins_over_caption() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/posts/generate-upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/upload/slot-1", server.uri()),
                "hash": "h1",
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/slot-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(body_json(serde_json::json!({
                "title": "Explicit title",
                "hash": "h1",
                "is_available_in_public_feed": false,
                "category_id": 25,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = Pipeline::with_fetcher(test_config(&server, &temp), reel_fetcher()).unwrap();
        let options = PostOptions {
            title: Some("Explicit title".to_string()),
            ..Default::default()
        };
        pipeline
            .process_url("https://source.example/reels/ABC123/", &options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn caption_contents_become_the_title() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/posts/generate-upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/upload/slot-1", server.uri()),
                "hash": "h1",
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/slot-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(body_json(serde_json::json!({
                "title": "A caption from the source",
                "hash": "h1",
                "is_available_in_public_feed": false,
                "category_id": 25,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = Pipeline::with_fetcher(test_config(&server, &temp), reel_fetcher()).unwrap();
        pipeline
            .process_url("https://source.example/reels/ABC123/", &PostOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_caption_falls_back_to_default_title() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/posts/generate-upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/upload/slot-1", server.uri()),
                "hash": "h1",
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/slot-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(body_json(serde_json::json!({
                "title": "Untitled reel",
                "hash": "h1",
                "is_available_in_public_feed": false,
                "category_id": 25,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = Arc::new(StubFetcher {
            files: vec![("ABC123.mp4", b"video-bytes".as_slice())],
        });
        let pipeline = Pipeline::with_fetcher(test_config(&server, &temp), fetcher).unwrap();
        pipeline
            .process_url("https://source.example/reels/ABC123/", &PostOptions::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn category_override_reaches_the_post_body() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/posts/generate-upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/upload/slot-1", server.uri()),
                "hash": "h1",
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/upload/slot-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .and(body_json(serde_json::json!({
                "title": "t",
                "hash": "h1",
                "is_available_in_public_feed": false,
                "category_id": 69,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let pipeline = Pipeline::with_fetcher(test_config(&server, &temp), reel_fetcher()).unwrap();
        let options = PostOptions {
            title: Some("t".to_string()),
            category_id: Some(69),
            ..Default::default()
        };
        pipeline
            .process_url("https://source.example/reels/ABC123/", &options)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_video_is_a_hard_stop_and_staging_is_removed() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        // Provisioner must never be reached
        Mock::given(method("GET"))
            .and(path("/posts/generate-upload-url"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let fetcher = Arc::new(StubFetcher {
            files: vec![("ABC123.txt", b"caption only".as_slice())],
        });
        let config = test_config(&server, &temp);
        let staging_dir = config.staging.dir.clone();
        let pipeline = Pipeline::with_fetcher(config, fetcher).unwrap();

        let result = pipeline
            .process_url("https://source.example/reels/ABC123/", &PostOptions::default())
            .await;

        assert!(matches!(result, Err(Error::MissingVideo { .. })));
        assert!(!staging_dir.exists(), "staging must be removed on failure");
    }

    #[tokio::test]
    async fn download_failure_propagates_and_staging_is_removed() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        let config = test_config(&server, &temp);
        let staging_dir = config.staging.dir.clone();
        let pipeline = Pipeline::with_fetcher(config, Arc::new(FailingFetcher)).unwrap();

        let result = pipeline
            .process_url("https://source.example/reels/ABC123/", &PostOptions::default())
            .await;

        assert!(matches!(result, Err(Error::DownloadFailed { .. })));
        assert!(!staging_dir.exists());
    }

    #[tokio::test]
    async fn malformed_url_fails_before_any_staging_exists() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        let config = test_config(&server, &temp);
        let staging_dir = config.staging.dir.clone();
        let pipeline = Pipeline::with_fetcher(config, reel_fetcher()).unwrap();

        let result = pipeline
            .process_url("https://source.example/stories/ABC123/", &PostOptions::default())
            .await;

        assert!(matches!(result, Err(Error::MalformedUrl { .. })));
        assert!(!staging_dir.exists());
    }

    #[tokio::test]
    async fn failed_post_leaves_uploaded_asset_unreconciled() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/posts/generate-upload-url"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "url": format!("{}/upload/slot-1", server.uri()),
                "hash": "h1",
            })))
            .mount(&server)
            .await;
        // Upload succeeds exactly once and no compensating call follows
        Mock::given(method("PUT"))
            .and(path("/upload/slot-1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/posts"))
            .respond_with(ResponseTemplate::new(500).set_body_string("server error"))
            .expect(1)
            .mount(&server)
            .await;

        let config = test_config(&server, &temp);
        let staging_dir = config.staging.dir.clone();
        let pipeline = Pipeline::with_fetcher(config, reel_fetcher()).unwrap();

        let result = pipeline
            .process_url("https://source.example/reels/ABC123/", &PostOptions::default())
            .await;

        match result {
            Err(Error::PostCreationFailed { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "server error");
            }
            other => panic!("expected PostCreationFailed, got {:?}", other.map(|_| ())),
        }
        assert!(!staging_dir.exists());
    }

    #[tokio::test]
    async fn batch_continues_past_failures_and_cleans_up() {
        let server = MockServer::start().await;
        let temp = TempDir::new().unwrap();
        mount_happy_platform(&server).await;

        let config = test_config(&server, &temp);
        let staging_dir = config.staging.dir.clone();
        let pipeline = Pipeline::with_fetcher(config, reel_fetcher()).unwrap();

        let urls = vec![
            "https://source.example/reels/ABC123/".to_string(),
            "https://source.example/stories/nope/".to_string(),
            "https://source.example/reels/DEF456/".to_string(),
        ];
        let summary = pipeline.process_all(&urls, &PostOptions::default()).await;

        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed.len(), 1);
        assert!(!summary.all_succeeded());
        assert_eq!(summary.failed[0].0, "https://source.example/stories/nope/");
        assert!(summary.failed[0].1.contains("malformed source URL"));
        assert!(
            !staging_dir.exists(),
            "staging must not exist once the batch completes"
        );
    }
}
