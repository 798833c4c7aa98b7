//! # reel-relay
//!
//! Republish a short-form video from a source platform to a destination
//! platform: fetch the reel by URL, stage it locally, upload the bytes to a
//! pre-signed endpoint, and create the metadata post referencing them.
//!
//! ## Design Philosophy
//!
//! reel-relay is designed to be:
//! - **A linear pipeline** - Four stages in strict order, no retries, no
//!   concurrency within a run
//! - **Leak-free** - The staging directory is removed on every exit path,
//!   success or failure
//! - **Library-first** - The CLI binary is a thin wrapper over [`Pipeline`]
//! - **Swappable at the seam** - The download capability is a trait; any
//!   equivalent tool or test double slots in
//!
//! ## Quick Start
//!
//! ```no_run
//! use reel_relay::{Config, Pipeline, PostOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env();
//!     let pipeline = Pipeline::new(config)?;
//!
//!     pipeline
//!         .process_url(
//!             "https://www.instagram.com/reels/C_xnrVHyN7Y/",
//!             &PostOptions::default(),
//!         )
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Shortcode extraction and the download collaborator
pub mod fetcher;
/// Destination platform client
pub mod platform;
/// End-to-end pipeline driver
pub mod pipeline;
/// Staging directory lifecycle
pub mod staging;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{Config, FetcherConfig, PlatformConfig, StagingConfig};
pub use error::{Error, Result};
pub use fetcher::{MediaFetcher, YtDlpFetcher, extract_shortcode};
pub use pipeline::Pipeline;
pub use platform::PlatformClient;
pub use staging::StagingArea;
pub use types::{PostOptions, PostRecord, RunSummary, Shortcode, Stage, UploadGrant};
