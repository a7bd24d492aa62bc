//! Repository data service
//!
//! [`DataHub`] is the read-through cache the HTTP surface talks to. It keeps
//! the organization's repository listing fresh on a TTL, downloads and
//! indexes release archives on demand, and maps the cached data to view
//! models. Refreshes for the same repository are single-flight; distinct
//! repositories refresh concurrently.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::feed::{self, FeedEntry};
use crate::files::classify;
use crate::github::{GithubRelease, GithubRepository, ReleaseProvider};
use crate::repo::cache::{RepoData, RepoState};
use crate::repo::indexer;
use crate::view::{self, RepositoryFileVm, RepositorySourceVm, RepositoryVm, SERVICE_PATH};

/// Feed name addressing the aggregate feed across every repository.
pub const ALL_REPO_FEEDS: &str = "all";

pub struct DataHub {
    config: Config,
    provider: Arc<dyn ReleaseProvider>,
    /// Public URL the repo service is mounted at, derived from the config.
    base_url: String,
    state: Mutex<RepoState>,
    data: Mutex<HashMap<String, Arc<RepoData>>>,
    /// Single-flight guards, one per concern.
    list_refresh_lock: tokio::sync::Mutex<()>,
    data_refresh_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl DataHub {
    pub fn new(config: Config, provider: Arc<dyn ReleaseProvider>) -> Self {
        let base_url = format!("{}/{}", config.external_url, SERVICE_PATH);
        Self {
            config,
            provider,
            base_url,
            state: Mutex::new(RepoState::default()),
            data: Mutex::new(HashMap::new()),
            list_refresh_lock: tokio::sync::Mutex::new(()),
            data_refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    //
    // Repository listing
    //

    /// Refresh the repository/release listing if the TTL has expired, then
    /// return a snapshot repository list.
    async fn repositories(&self) -> Result<Vec<GithubRepository>> {
        self.ensure_repositories().await?;
        let state = self.state.lock().unwrap();
        Ok(state.repositories.values().cloned().collect())
    }

    async fn ensure_repositories(&self) -> Result<()> {
        if self.state.lock().unwrap().is_fresh() {
            return Ok(());
        }
        let _guard = self.list_refresh_lock.lock().await;
        if self.state.lock().unwrap().is_fresh() {
            // Another task refreshed while we waited for the lock
            return Ok(());
        }
        self.refresh_repositories().await
    }

    /// Fetch the organization's repositories and their releases, then swap
    /// both maps in one critical section. A repository whose release fetch
    /// fails keeps its previous listing entry rather than vanishing.
    async fn refresh_repositories(&self) -> Result<()> {
        info!(
            "Refreshing repository listing for {}",
            self.config.organization
        );
        let repo_list = self
            .provider
            .org_repositories(&self.config.organization)
            .await?;

        let fetches = repo_list.iter().map(|repository| async move {
            (repository, self.provider.releases(repository).await)
        });
        let results = join_all(fetches).await;

        let mut repositories = HashMap::new();
        let mut releases = HashMap::new();
        let mut state = self.state.lock().unwrap();
        for (repository, result) in results {
            match result {
                Ok(repo_releases) => {
                    releases.insert(repository.name.clone(), repo_releases);
                    repositories.insert(repository.name.clone(), repository.clone());
                }
                Err(e) => {
                    warn!(
                        "Failed to fetch releases for {}, keeping previous listing: {}",
                        repository.name, e
                    );
                    if let Some(previous) = state.releases.get(&repository.name) {
                        releases.insert(repository.name.clone(), previous.clone());
                        repositories.insert(repository.name.clone(), repository.clone());
                    }
                }
            }
        }

        info!("Listing {} repositories with releases", repositories.len());
        state.repositories = repositories;
        state.releases = releases;
        state.next_refresh = Some(Instant::now() + self.config.repo_list_ttl);
        Ok(())
    }

    /// A repository and its releases by name, or [`Error::NotFound`].
    async fn repository(&self, name: &str) -> Result<(GithubRepository, Vec<GithubRelease>)> {
        self.ensure_repositories().await?;
        let state = self.state.lock().unwrap();
        let repository = state.repositories.get(name).ok_or_else(|| {
            Error::NotFound(format!(
                "Could not find repository {} in organization {}",
                name, self.config.organization
            ))
        })?;
        let releases = state.releases.get(name).cloned().unwrap_or_default();
        Ok((repository.clone(), releases))
    }

    //
    // Data refresh
    //

    fn cached(&self, name: &str) -> Option<Arc<RepoData>> {
        self.data.lock().unwrap().get(name).cloned()
    }

    fn data_refresh_lock(&self, name: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.data_refresh_locks.lock().unwrap();
        locks.entry(name.to_string()).or_default().clone()
    }

    /// Indexed data for a repository, downloading and indexing the newest
    /// release if the cache is missing or out of date. Concurrent calls for
    /// the same repository download at most once.
    pub async fn ensure_fresh(&self, name: &str) -> Result<Arc<RepoData>> {
        let (repository, releases) = self.repository(name).await?;
        let latest = releases.first();

        if let Some(data) = self.cached(name) {
            if !data.requires_refresh(latest) {
                return Ok(data);
            }
        }

        let lock = self.data_refresh_lock(name);
        let _guard = lock.lock().await;
        if let Some(data) = self.cached(name) {
            if !data.requires_refresh(latest) {
                // Refreshed while we waited for the lock
                return Ok(data);
            }
        }

        let Some(latest) = latest else {
            debug!("Repository {} has no releases, caching empty data", name);
            let data = Arc::new(RepoData::empty());
            self.data
                .lock()
                .unwrap()
                .insert(name.to_string(), data.clone());
            return Ok(data);
        };

        let data = Arc::new(self.refresh_data(&repository, latest, &releases).await?);
        self.data
            .lock()
            .unwrap()
            .insert(name.to_string(), data.clone());
        Ok(data)
    }

    /// Download the release archive, index its data files and build the
    /// release feed entries.
    async fn refresh_data(
        &self,
        repository: &GithubRepository,
        latest: &GithubRelease,
        releases: &[GithubRelease],
    ) -> Result<RepoData> {
        info!(
            "Refreshing data for {} at release {}",
            repository.name, latest.tag_name
        );
        let archive = self.provider.download_archive(repository, latest).await?;

        // Archive entries are prefixed with a top-level directory; data file
        // names in a repository are unique, so keying by base name is safe.
        let mut files: BTreeMap<String, Vec<u8>> = BTreeMap::new();
        for (path, bytes) in crate::files::archive::unpack(&archive)? {
            let file_name = path.rsplit('/').next().unwrap_or(&path);
            if classify::is_compressed_path(file_name) {
                // Committed pre-compressed files still exist in old repos.
                match crate::files::archive::decompress_single_entry(&bytes) {
                    Ok(Some(contents)) => {
                        files.insert(classify::uncompressed_file_name(file_name), contents);
                    }
                    Ok(None) => {
                        warn!("Skipping empty archive {} in {}", file_name, repository.name);
                    }
                    Err(e) => {
                        warn!("Skipping {} in {}: {}", file_name, repository.name, e);
                    }
                }
            } else {
                files.insert(file_name.to_string(), bytes);
            }
        }

        let index_url = format!(
            "{}/{}/{}",
            self.base_url,
            repository.name,
            classify::INDEX_COMPRESSED_FILE_NAME
        );
        let indexed = indexer::index_repository(&repository.name, &index_url, Vec::new(), &files)?;
        let feed_entries = feed::release_feed_entries(repository, releases);

        Ok(RepoData::new(indexed, feed_entries, latest.published_at))
    }

    /// Drop the cached data for one repository and rebuild it immediately.
    pub async fn prime_cache(&self, name: &str) -> Result<()> {
        if let Some(data) = self.cached(name) {
            data.mark_stale();
        }
        // Force the listing to re-check for a newer release as well
        self.state.lock().unwrap().next_refresh = None;
        self.ensure_fresh(name).await?;
        Ok(())
    }

    //
    // View models
    //

    /// The repository-source view: every repository with at least one
    /// release, sorted by description.
    pub async fn repository_source(&self) -> Result<RepositorySourceVm> {
        let repositories = self.repositories().await?;

        let mut vms = Vec::new();
        {
            let state = self.state.lock().unwrap();
            for repository in &repositories {
                if self
                    .config
                    .excluded_repositories
                    .iter()
                    .any(|excluded| excluded == &repository.name)
                {
                    continue;
                }
                let latest = state
                    .releases
                    .get(&repository.name)
                    .and_then(|releases| releases.first());
                if latest.is_none() {
                    continue;
                }
                vms.push(view::repository_vm(repository, latest, &self.base_url));
            }
        }
        vms.sort_by(|a, b| a.description.cmp(&b.description));

        Ok(view::repository_source_vm(
            &self.config,
            &self.base_url,
            vms,
        ))
    }

    /// The per-repository view with its indexed files. A failed refresh with
    /// stale data still cached serves the stale files and reports the
    /// failure in `errorMessage` instead of dropping the repository.
    pub async fn repository_files(&self, name: &str) -> Result<RepositoryVm> {
        let (repository, releases) = self.repository(name).await?;
        let mut vm = view::repository_vm(&repository, releases.first(), &self.base_url);

        match self.ensure_fresh(name).await {
            Ok(data) => {
                vm.repository_files = self.file_vms(&repository, &data);
            }
            Err(e) if e.is_recoverable() => {
                warn!("Failed to refresh data for {}: {}", name, e);
                if let Some(data) = self.cached(name) {
                    vm.repository_files = self.file_vms(&repository, &data);
                }
                vm.error_message = Some(format!("Could not refresh data for {name}: {e}"));
            }
            Err(e) => return Err(e),
        }
        Ok(vm)
    }

    fn file_vms(&self, repository: &GithubRepository, data: &RepoData) -> Vec<RepositoryFileVm> {
        let mut with_kind: Vec<_> = data
            .files
            .iter()
            .filter_map(|(file_name, file)| {
                let data_file = file.as_data_file()?;
                Some((
                    data_file.kind(),
                    view::repository_file_vm(repository, data_file, file_name, &self.base_url),
                ))
            })
            .collect();
        with_kind.sort_by(|(a_kind, a), (b_kind, b)| {
            a_kind.cmp(b_kind).then_with(|| a.name.cmp(&b.name))
        });
        with_kind.into_iter().map(|(_, vm)| vm).collect()
    }

    //
    // Feeds and file data
    //

    /// Render the Atom feed for one repository, or the aggregate feed when
    /// `name` is `all`.
    pub async fn release_feed(&self, name: &str) -> Result<String> {
        let (title, subtitle, entries) = if name.eq_ignore_ascii_case(ALL_REPO_FEEDS) {
            self.ensure_repositories().await?;
            let entries: Vec<FeedEntry> = self
                .data
                .lock()
                .unwrap()
                .values()
                .flat_map(|data| data.feed_entries.iter().cloned())
                .collect();
            (
                "All Repository Releases".to_string(),
                "Data file releases for all repositories".to_string(),
                feed::merge_feed_entries(entries),
            )
        } else {
            self.repository(name).await?;
            let entries = match self.ensure_fresh(name).await {
                Ok(data) => data.feed_entries.clone(),
                Err(e) => {
                    warn!("Serving empty feed for {}: {}", name, e);
                    Vec::new()
                }
            };
            (
                format!("{name} Releases"),
                format!("Data file releases for {name}"),
                entries,
            )
        };

        let feed_url = format!("{}/feeds/{}.atom", self.base_url, name.to_lowercase());
        feed::render_atom(
            &feed_url,
            &title,
            &subtitle,
            &self.config.site_name,
            &feed_url,
            &entries,
        )
    }

    /// Raw bytes of one cached file. The uncompressed name of a data file
    /// resolves to its compressed form.
    pub async fn file_data(&self, name: &str, file_name: &str) -> Result<Vec<u8>> {
        let data = self.ensure_fresh(name).await?;
        if let Some(file) = data.files.get(file_name) {
            return Ok(file.data().to_vec());
        }
        let compressed = classify::compressed_file_name(file_name);
        if let Some(file) = data.files.get(&compressed) {
            return Ok(file.data().to_vec());
        }
        Err(Error::NotFound(format!(
            "Could not find file {file_name} in repository {name}"
        )))
    }
}
