//! Cache state for the repository service
//!
//! Two layers: the organization-wide repository/release listing, refreshed on
//! a TTL, and the per-repository indexed file data, refreshed when a newer
//! release is published. Both are replaced wholesale so readers never observe
//! a half-updated view.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use time::OffsetDateTime;

use crate::feed::FeedEntry;
use crate::files::RepoFile;
use crate::github::{GithubRelease, GithubRepository};

/// Snapshot of the organization's repositories and their recent releases.
#[derive(Default)]
pub(crate) struct RepoState {
    pub repositories: HashMap<String, GithubRepository>,
    /// Releases per repository, non-draft, newest first.
    pub releases: HashMap<String, Vec<GithubRelease>>,
    /// When the listing must be fetched again. `None` until the first refresh.
    pub next_refresh: Option<Instant>,
}

impl RepoState {
    pub fn is_fresh(&self) -> bool {
        match self.next_refresh {
            Some(deadline) => Instant::now() < deadline,
            None => false,
        }
    }
}

/// Indexed data for one repository at one release.
pub struct RepoData {
    /// Compressed file name to packed file, index.bsi included.
    pub files: HashMap<String, RepoFile>,
    pub feed_entries: Vec<FeedEntry>,
    /// Publish date of the release the data was built from.
    pub release_date: Option<OffsetDateTime>,
    /// Forces the next read to refresh regardless of release dates.
    stale: AtomicBool,
}

impl RepoData {
    pub fn new(
        files: HashMap<String, RepoFile>,
        feed_entries: Vec<FeedEntry>,
        release_date: Option<OffsetDateTime>,
    ) -> Self {
        Self {
            files,
            feed_entries,
            release_date,
            stale: AtomicBool::new(false),
        }
    }

    /// Cached form of a repository with no releases.
    pub fn empty() -> Self {
        Self::new(HashMap::new(), Vec::new(), None)
    }

    pub fn mark_stale(&self) {
        self.stale.store(true, Ordering::Relaxed);
    }

    /// Whether the cached data is out of date relative to the newest release.
    pub fn requires_refresh(&self, latest_release: Option<&GithubRelease>) -> bool {
        let Some(latest) = latest_release else {
            return false;
        };
        if self.stale.load(Ordering::Relaxed) {
            return true;
        }
        latest.published_at > self.release_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn release(published: OffsetDateTime) -> GithubRelease {
        GithubRelease {
            tag_name: "v1.0.0".to_string(),
            name: None,
            body: None,
            draft: false,
            html_url: "https://github.com/test-org/wh40k/releases/tag/v1.0.0".to_string(),
            published_at: Some(published),
        }
    }

    #[test]
    fn no_release_never_requires_refresh() {
        let data = RepoData::empty();
        assert!(!data.requires_refresh(None));
        data.mark_stale();
        assert!(!data.requires_refresh(None));
    }

    #[test]
    fn newer_release_requires_refresh() {
        let data = RepoData::new(
            HashMap::new(),
            Vec::new(),
            Some(datetime!(2024-01-01 0:00 UTC)),
        );
        assert!(!data.requires_refresh(Some(&release(datetime!(2024-01-01 0:00 UTC)))));
        assert!(data.requires_refresh(Some(&release(datetime!(2024-02-01 0:00 UTC)))));
    }

    #[test]
    fn first_release_after_empty_cache_requires_refresh() {
        let data = RepoData::empty();
        assert!(data.requires_refresh(Some(&release(datetime!(2024-01-01 0:00 UTC)))));
    }

    #[test]
    fn stale_flag_forces_refresh() {
        let data = RepoData::new(
            HashMap::new(),
            Vec::new(),
            Some(datetime!(2024-01-01 0:00 UTC)),
        );
        data.mark_stale();
        assert!(data.requires_refresh(Some(&release(datetime!(2024-01-01 0:00 UTC)))));
    }

    #[test]
    fn state_freshness_follows_deadline() {
        let mut state = RepoState::default();
        assert!(!state.is_fresh());
        state.next_refresh = Some(Instant::now() + std::time::Duration::from_secs(60));
        assert!(state.is_fresh());
    }
}
