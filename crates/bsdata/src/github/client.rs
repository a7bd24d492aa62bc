//! GitHub REST API client
//!
//! Thin wrapper over the three endpoints the cache layer needs: the
//! organization repository listing, per-repository releases, and the release
//! source archive. All network failures surface as [`Error::Upstream`] with
//! the URL that was being fetched.

use async_trait::async_trait;
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::github::models::{GithubRelease, GithubRepository};
use crate::github::ReleaseProvider;

const GITHUB_API_BASE: &str = "https://api.github.com";
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Newest releases fetched per repository. Only the most recent matters for
/// staleness checks; the rest feed the release feed.
pub const RELEASE_FETCH_COUNT: usize = 5;

pub struct GithubClient {
    client: reqwest::Client,
    api_base: String,
    token: Option<String>,
}

impl GithubClient {
    pub fn new(config: &Config) -> Result<Self> {
        Self::with_api_base(config, GITHUB_API_BASE)
    }

    /// API base override for tests pointed at a mock server.
    pub fn with_api_base(config: &Config, api_base: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(config.github_username.clone())
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: config.github_token.clone(),
        })
    }

    fn get(&self, url: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .client
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }
        request
    }

    fn upstream(url: &str) -> impl FnOnce(reqwest::Error) -> Error + '_ {
        move |source| Error::Upstream {
            url: url.to_string(),
            source,
        }
    }
}

#[async_trait]
impl ReleaseProvider for GithubClient {
    async fn org_repositories(&self, organization: &str) -> Result<Vec<GithubRepository>> {
        let mut repositories = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}/orgs/{}/repos?type=public&per_page=100&page={}",
                self.api_base, organization, page
            );
            debug!("Fetching repository listing: {}", url);

            let batch: Vec<GithubRepository> = self
                .get(&url)
                .send()
                .await
                .map_err(Self::upstream(&url))?
                .error_for_status()
                .map_err(Self::upstream(&url))?
                .json()
                .await
                .map_err(Self::upstream(&url))?;

            let done = batch.len() < 100;
            repositories.extend(batch);
            if done {
                break;
            }
            page += 1;
        }

        debug!(
            "Found {} repositories in organization {}",
            repositories.len(),
            organization
        );
        Ok(repositories)
    }

    async fn releases(&self, repository: &GithubRepository) -> Result<Vec<GithubRelease>> {
        let url = format!(
            "{}/repos/{}/releases?per_page={}&page=1",
            self.api_base, repository.full_name, RELEASE_FETCH_COUNT
        );
        debug!("Fetching releases: {}", url);

        let mut releases: Vec<GithubRelease> = self
            .get(&url)
            .send()
            .await
            .map_err(Self::upstream(&url))?
            .error_for_status()
            .map_err(Self::upstream(&url))?
            .json()
            .await
            .map_err(Self::upstream(&url))?;

        releases.retain(|release| !release.draft);
        // Newest first. GitHub already orders this way, but the staleness
        // check depends on it, so don't trust the API.
        releases.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        Ok(releases)
    }

    async fn download_archive(
        &self,
        repository: &GithubRepository,
        release: &GithubRelease,
    ) -> Result<Vec<u8>> {
        let url = format!("{}/archive/{}.zip", repository.html_url, release.tag_name);
        debug!("Downloading release archive: {}", url);

        let bytes = self
            .get(&url)
            .send()
            .await
            .map_err(Self::upstream(&url))?
            .error_for_status()
            .map_err(Self::upstream(&url))?
            .bytes()
            .await
            .map_err(Self::upstream(&url))?;

        debug!(
            "Downloaded {} bytes for {} {}",
            bytes.len(),
            repository.name,
            release.tag_name
        );
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> GithubClient {
        GithubClient::with_api_base(&Config::default(), &server.uri()).unwrap()
    }

    fn repo_json(name: &str, html_url: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 1,
            "name": name,
            "full_name": format!("test-org/{name}"),
            "description": "Test repository",
            "html_url": html_url,
        })
    }

    #[tokio::test]
    async fn lists_organization_repositories() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/test-org/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                repo_json("wh40k", "https://github.com/test-org/wh40k"),
                repo_json("wfb", "https://github.com/test-org/wfb"),
            ])))
            .mount(&server)
            .await;

        let repos = test_client(&server)
            .org_repositories("test-org")
            .await
            .unwrap();
        assert_eq!(repos.len(), 2);
        assert_eq!(repos[0].name, "wh40k");
    }

    #[tokio::test]
    async fn releases_skip_drafts_and_sort_newest_first() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/test-org/wh40k/releases"))
            .and(query_param("per_page", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {
                    "tag_name": "v1.0.0",
                    "draft": false,
                    "html_url": "https://github.com/test-org/wh40k/releases/tag/v1.0.0",
                    "published_at": "2024-01-01T00:00:00Z"
                },
                {
                    "tag_name": "v1.1.0-draft",
                    "draft": true,
                    "html_url": "https://github.com/test-org/wh40k/releases/tag/v1.1.0-draft",
                    "published_at": "2024-02-01T00:00:00Z"
                },
                {
                    "tag_name": "v1.1.0",
                    "draft": false,
                    "html_url": "https://github.com/test-org/wh40k/releases/tag/v1.1.0",
                    "published_at": "2024-03-01T00:00:00Z"
                }
            ])))
            .mount(&server)
            .await;

        let repo: GithubRepository =
            serde_json::from_value(repo_json("wh40k", "https://github.com/test-org/wh40k"))
                .unwrap();
        let releases = test_client(&server).releases(&repo).await.unwrap();

        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].tag_name, "v1.1.0");
        assert_eq!(releases[1].tag_name, "v1.0.0");
    }

    #[tokio::test]
    async fn download_archive_uses_release_tag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/test-org/wh40k/archive/v1.0.0.zip"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04fake".to_vec()))
            .mount(&server)
            .await;

        let repo: GithubRepository = serde_json::from_value(repo_json(
            "wh40k",
            &format!("{}/test-org/wh40k", server.uri()),
        ))
        .unwrap();
        let release = GithubRelease {
            tag_name: "v1.0.0".to_string(),
            name: None,
            body: None,
            draft: false,
            html_url: format!("{}/test-org/wh40k/releases/tag/v1.0.0", server.uri()),
            published_at: None,
        };

        let bytes = test_client(&server)
            .download_archive(&repo, &release)
            .await
            .unwrap();
        assert!(bytes.starts_with(b"PK\x03\x04"));
    }

    #[tokio::test]
    async fn upstream_error_carries_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/orgs/test-org/repos"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .org_repositories("test-org")
            .await
            .unwrap_err();
        match err {
            Error::Upstream { url, .. } => assert!(url.contains("/orgs/test-org/repos")),
            other => panic!("expected upstream error, got {other:?}"),
        }
    }
}
