//! Presentation mapping
//!
//! Pure functions from cached domain data to the JSON view models the HTTP
//! surface serves. URL derivation and the lenient URL check live here so the
//! cache layer never thinks about presentation.

use serde::Serialize;

use crate::files::classify;
use crate::files::DataFile;
use crate::github::{GithubRelease, GithubRepository};

/// Path segment the repo service is mounted under.
pub const SERVICE_PATH: &str = "repos";

/// Normalize a candidate URL for presentation.
///
/// Trims, escapes spaces, defaults to `http://` when no scheme is present
/// and validates the result. Anything unusable becomes `None` rather than
/// an error since these URLs come from data-file author fields.
pub fn check_url(candidate: &str) -> Option<String> {
    let trimmed = candidate.trim().replace(' ', "%20");
    if trimmed.is_empty() {
        return None;
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed
    } else {
        format!("http://{trimmed}")
    };
    if with_scheme == "http://" {
        return None;
    }

    url::Url::parse(&with_scheme).ok().map(|_| with_scheme)
}

/// The client-side route for a repository page, derived from the service
/// base URL by swapping the `repos` segment for the SPA route fragment.
fn client_repo_url(base_url: &str, repository_name: &str) -> Option<String> {
    check_url(&base_url.replace(SERVICE_PATH, &format!("#/repo/{repository_name}")))
}

fn client_repo_list_url(base_url: &str) -> Option<String> {
    check_url(&base_url.replace(SERVICE_PATH, "#/repos"))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySourceVm {
    pub name: String,
    pub description: String,
    pub battle_scribe_version: String,
    pub repository_source_url: Option<String>,
    pub website_url: Option<String>,
    pub community_url: Option<String>,
    pub feed_url: Option<String>,
    pub twitter_url: Option<String>,
    pub facebook_url: Option<String>,
    pub repositories: Vec<RepositoryVm>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryVm {
    pub name: String,
    pub description: String,
    pub battle_scribe_version: String,
    pub version: Option<String>,
    pub last_updated: Option<String>,
    pub last_update_description: Option<String>,
    pub index_url: Option<String>,
    pub repository_url: Option<String>,
    #[serde(rename = "gitHubUrl")]
    pub github_url: Option<String>,
    pub bug_tracker_url: Option<String>,
    pub report_bug_url: Option<String>,
    pub feed_url: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repository_files: Vec<RepositoryFileVm>,
    /// Set when the repository's data could not be refreshed and stale or no
    /// file data is being served.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFileVm {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub revision: i32,
    pub battle_scribe_version: String,
    pub file_url: Option<String>,
    #[serde(rename = "gitHubUrl")]
    pub github_url: Option<String>,
    pub report_bug_url: Option<String>,
    pub author_name: Option<String>,
    pub author_contact: Option<String>,
    pub author_url: Option<String>,
}

/// Map a repository plus its newest release to the listing view.
pub fn repository_vm(
    repository: &GithubRepository,
    latest_release: Option<&GithubRelease>,
    base_url: &str,
) -> RepositoryVm {
    let last_updated = latest_release
        .and_then(|r| r.published_at)
        .and_then(|d| d.format(&time::format_description::well_known::Rfc2822).ok());

    RepositoryVm {
        name: repository.name.clone(),
        description: repository.description.clone().unwrap_or_default(),
        battle_scribe_version: crate::files::BATTLESCRIBE_VERSION.to_string(),
        version: latest_release.map(|r| r.tag_name.clone()),
        last_updated,
        last_update_description: latest_release
            .and_then(|r| r.name.clone().or_else(|| Some(r.tag_name.clone()))),
        index_url: check_url(&format!(
            "{base_url}/{}/{}",
            repository.name,
            classify::INDEX_COMPRESSED_FILE_NAME
        )),
        repository_url: check_url(&format!("{base_url}/{}", repository.name)),
        github_url: check_url(&repository.html_url),
        bug_tracker_url: check_url(&format!("{}/issues", repository.html_url)),
        report_bug_url: client_repo_url(base_url, &repository.name),
        feed_url: check_url(&format!("{base_url}/feeds/{}.atom", repository.name)),
        repository_files: Vec::new(),
        error_message: None,
    }
}

/// Map one indexed data file to the per-repository file view.
pub fn repository_file_vm(
    repository: &GithubRepository,
    data_file: &DataFile,
    file_name: &str,
    base_url: &str,
) -> RepositoryFileVm {
    let uncompressed = classify::uncompressed_file_name(file_name);
    RepositoryFileVm {
        id: data_file.id().to_string(),
        name: data_file.name().to_string(),
        kind: data_file.kind().as_str().to_string(),
        revision: data_file.revision(),
        battle_scribe_version: data_file.battle_scribe_version().to_string(),
        file_url: check_url(&format!("{base_url}/{}/{file_name}", repository.name)),
        github_url: check_url(&format!(
            "{}/blob/master/{uncompressed}",
            repository.html_url
        )),
        report_bug_url: client_repo_url(base_url, &repository.name),
        author_name: non_empty(data_file.author_name()),
        author_contact: non_empty(data_file.author_contact()),
        author_url: check_url(data_file.author_url()),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Assemble the repository-source view from sorted repository views plus the
/// configured site metadata.
pub fn repository_source_vm(
    config: &crate::config::Config,
    base_url: &str,
    repositories: Vec<RepositoryVm>,
) -> RepositorySourceVm {
    RepositorySourceVm {
        name: config.site_name.clone(),
        description: config.site_description.clone(),
        battle_scribe_version: crate::files::BATTLESCRIBE_VERSION.to_string(),
        repository_source_url: client_repo_list_url(base_url),
        website_url: config.website_url.as_deref().and_then(check_url),
        community_url: config.community_url.as_deref().and_then(check_url),
        feed_url: check_url(&format!("{base_url}/feeds/all.atom")),
        twitter_url: config.twitter_url.as_deref().and_then(check_url),
        facebook_url: config.facebook_url.as_deref().and_then(check_url),
        repositories,
    }
}
