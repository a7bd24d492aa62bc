//! Service configuration
//!
//! Loaded once at startup from environment variables (a `.env` file is
//! honored when present). Everything the cache refresher and the view layer
//! need — GitHub credentials, the organization to mirror, and the site
//! metadata echoed into responses — lives here.

use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub organization whose repositories are mirrored
    pub organization: String,
    /// OAuth token for the service account (anonymous rate limits apply without it)
    pub github_token: Option<String>,
    /// Service account username, also used as the user agent
    pub github_username: String,

    /// Site metadata echoed in the repository-source view
    pub site_name: String,
    pub site_description: String,
    pub website_url: Option<String>,
    pub community_url: Option<String>,
    pub twitter_url: Option<String>,
    pub facebook_url: Option<String>,

    /// Public base URL the service is reachable at (no trailing slash)
    pub external_url: String,
    /// Address the HTTP server binds to
    pub bind_address: String,

    /// How long the repository/release listing is trusted before re-querying GitHub
    pub repo_list_ttl: Duration,
    /// Repository names hidden from listings (site repos, test fixtures)
    pub excluded_repositories: Vec<String>,
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{name} environment variable not set")))
}

fn optional_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok(); // Ignore error if .env not present

        let ttl_mins = optional_var("BSDATA_REPO_CACHE_TTL_MINS")
            .map(|v| {
                v.parse::<u64>()
                    .map_err(|e| Error::Config(format!("BSDATA_REPO_CACHE_TTL_MINS: {e}")))
            })
            .transpose()?
            .unwrap_or(24 * 60);

        let excluded_repositories = optional_var("BSDATA_EXCLUDED_REPOS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            organization: required_var("BSDATA_GITHUB_ORGANIZATION")?,
            github_token: optional_var("BSDATA_GITHUB_TOKEN"),
            github_username: optional_var("BSDATA_GITHUB_USERNAME")
                .unwrap_or_else(|| "bsdata".to_string()),
            site_name: optional_var("BSDATA_SITE_NAME")
                .unwrap_or_else(|| "BattleScribe Data".to_string()),
            site_description: optional_var("BSDATA_SITE_DESCRIPTION").unwrap_or_default(),
            website_url: optional_var("BSDATA_WEBSITE_URL"),
            community_url: optional_var("BSDATA_COMMUNITY_URL"),
            twitter_url: optional_var("BSDATA_TWITTER_URL"),
            facebook_url: optional_var("BSDATA_FACEBOOK_URL"),
            external_url: optional_var("BSDATA_EXTERNAL_URL")
                .unwrap_or_else(|| "http://localhost:8080".to_string())
                .trim_end_matches('/')
                .to_string(),
            bind_address: optional_var("BSDATA_BIND_ADDRESS")
                .unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            repo_list_ttl: Duration::from_secs(ttl_mins * 60),
            excluded_repositories,
        })
    }
}

#[cfg(test)]
impl Default for Config {
    /// Test configuration; never reads the environment.
    fn default() -> Self {
        Self {
            organization: "test-org".to_string(),
            github_token: None,
            github_username: "test-user".to_string(),
            site_name: "Test Data".to_string(),
            site_description: "Test data files".to_string(),
            website_url: Some("http://example.com".to_string()),
            community_url: None,
            twitter_url: None,
            facebook_url: None,
            external_url: "http://localhost:8080".to_string(),
            bind_address: "127.0.0.1:0".to_string(),
            repo_list_ttl: Duration::from_secs(60 * 60),
            excluded_repositories: Vec::new(),
        }
    }
}
