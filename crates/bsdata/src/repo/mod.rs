//! Repository indexing and the cached data service.

pub mod cache;
pub mod indexer;
pub mod service;

pub use service::{DataHub, ALL_REPO_FEEDS};
