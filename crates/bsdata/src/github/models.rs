//! GitHub REST API response models
//!
//! Only the fields the service consumes are deserialized; anything else in
//! the API payload is ignored.

use serde::Deserialize;
use time::OffsetDateTime;

/// A repository as returned by the organization listing endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GithubRepository {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub html_url: String,
}

/// A release as returned by the per-repository releases endpoint.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GithubRelease {
    pub tag_name: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub draft: bool,
    pub html_url: String,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
}
