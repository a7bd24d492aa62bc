//! # bsdata
//!
//! Aggregation and caching service for BattleScribe data file repositories
//! hosted on GitHub. The library downloads release archives for an
//! organization's repositories, indexes the data files they contain, and
//! serves them with generated `index.bsi` catalogs, JSON view models and
//! Atom release feeds.
//!
//! The pieces:
//!
//! - [`files`] — data file classification, zip packing, XML reading and the
//!   data index format
//! - [`github`] — the GitHub REST client behind the [`github::ReleaseProvider`]
//!   seam
//! - [`repo`] — the indexer and the [`repo::DataHub`] read-through cache
//! - [`view`] — JSON view models and URL derivation
//! - [`feed`] — Atom release feeds
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bsdata::config::Config;
//! use bsdata::github::GithubClient;
//! use bsdata::repo::DataHub;
//!
//! # async fn run() -> bsdata::error::Result<()> {
//! let config = Config::from_env()?;
//! let client = Arc::new(GithubClient::new(&config)?);
//! let hub = DataHub::new(config, client);
//!
//! let source = hub.repository_source().await?;
//! for repo in &source.repositories {
//!     println!("{}: {}", repo.name, repo.description);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod feed;
pub mod files;
pub mod github;
pub mod repo;
pub mod view;

pub use config::Config;
pub use error::{Error, Result};
pub use repo::DataHub;
