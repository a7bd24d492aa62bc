//! GitHub integration
//!
//! [`ReleaseProvider`] is the seam between the cache layer and the network:
//! production code uses [`GithubClient`], tests swap in a mock provider.

pub mod client;
pub mod models;

use async_trait::async_trait;

use crate::error::Result;
pub use client::{GithubClient, RELEASE_FETCH_COUNT};
pub use models::{GithubRelease, GithubRepository};

/// Source of repositories, releases, and release archives.
#[async_trait]
pub trait ReleaseProvider: Send + Sync {
    /// All public repositories in the organization.
    async fn org_repositories(&self, organization: &str) -> Result<Vec<GithubRepository>>;

    /// The newest releases of a repository, non-draft, newest first.
    async fn releases(&self, repository: &GithubRepository) -> Result<Vec<GithubRelease>>;

    /// The source archive (zip) of a release.
    async fn download_archive(
        &self,
        repository: &GithubRepository,
        release: &GithubRelease,
    ) -> Result<Vec<u8>>;
}
