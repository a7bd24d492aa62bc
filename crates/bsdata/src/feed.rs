//! Atom release feeds
//!
//! Each repository gets a feed of its recent releases, and an aggregate feed
//! merges the newest entries across every repository. Rendering goes through
//! the same XML writer as the data index.

use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use crate::error::Result;
use crate::github::{GithubRelease, GithubRepository};

/// Entries kept per feed, matching the number of releases fetched.
pub const MAX_FEED_ENTRIES: usize = 5;

const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry {
    pub id: String,
    pub title: String,
    pub published: Option<OffsetDateTime>,
    pub alternate_href: String,
    pub html_content: String,
}

/// Feed entries for one repository's releases, newest first.
pub fn release_feed_entries(
    repository: &GithubRepository,
    releases: &[GithubRelease],
) -> Vec<FeedEntry> {
    releases
        .iter()
        .take(MAX_FEED_ENTRIES)
        .map(|release| {
            let release_name = release.name.as_deref().unwrap_or(&release.tag_name);
            FeedEntry {
                id: release.html_url.clone(),
                title: format!("{}: {}", repository.name, release_name),
                published: release.published_at,
                alternate_href: release.html_url.clone(),
                html_content: release
                    .body
                    .as_deref()
                    .unwrap_or("")
                    .replace("\r\n", "<br/>")
                    .replace('\n', "<br/>"),
            }
        })
        .collect()
}

/// Merge per-repository entries into one aggregate feed, newest first,
/// truncated to [`MAX_FEED_ENTRIES`].
pub fn merge_feed_entries(mut entries: Vec<FeedEntry>) -> Vec<FeedEntry> {
    entries.sort_by(|a, b| b.published.cmp(&a.published));
    entries.truncate(MAX_FEED_ENTRIES);
    entries
}

fn rfc3339(date: Option<OffsetDateTime>) -> String {
    date.and_then(|d| d.format(&Rfc3339).ok())
        .unwrap_or_else(|| "1970-01-01T00:00:00Z".to_string())
}

/// Render an Atom document for the given entries.
pub fn render_atom(
    feed_id: &str,
    title: &str,
    subtitle: &str,
    author: &str,
    self_href: &str,
    entries: &[FeedEntry],
) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let updated = rfc3339(entries.iter().filter_map(|e| e.published).max());

    writer
        .create_element("feed")
        .with_attribute(("xmlns", ATOM_NAMESPACE))
        .write_inner_content(|feed| -> std::io::Result<()> {
            feed.create_element("id").write_text_content(BytesText::new(feed_id))?;
            feed.create_element("title").write_text_content(BytesText::new(title))?;
            feed.create_element("subtitle")
                .with_attribute(("type", "text"))
                .write_text_content(BytesText::new(subtitle))?;
            feed.create_element("author")
                .write_inner_content(|a| -> std::io::Result<()> {
                    a.create_element("name").write_text_content(BytesText::new(author))?;
                    Ok(())
                })?;
            feed.create_element("updated")
                .write_text_content(BytesText::new(&updated))?;
            feed.create_element("link")
                .with_attribute(("rel", "self"))
                .with_attribute(("href", self_href))
                .write_empty()?;

            for entry in entries {
                feed.create_element("entry")
                    .write_inner_content(|e| -> std::io::Result<()> {
                        let published = rfc3339(entry.published);
                        e.create_element("id").write_text_content(BytesText::new(&entry.id))?;
                        e.create_element("title")
                            .write_text_content(BytesText::new(&entry.title))?;
                        e.create_element("published")
                            .write_text_content(BytesText::new(&published))?;
                        e.create_element("updated")
                            .write_text_content(BytesText::new(&published))?;
                        e.create_element("link")
                            .with_attribute(("rel", "alternate"))
                            .with_attribute(("href", entry.alternate_href.as_str()))
                            .write_empty()?;
                        e.create_element("content")
                            .with_attribute(("type", "html"))
                            .write_text_content(BytesText::new(&entry.html_content))?;
                        Ok(())
                    })?;
            }
            Ok(())
        })?;

    let bytes = writer.into_inner().into_inner();
    Ok(String::from_utf8(bytes).expect("writer emits UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn repo() -> GithubRepository {
        GithubRepository {
            id: 1,
            name: "wh40k".to_string(),
            full_name: "test-org/wh40k".to_string(),
            description: Some("Warhammer 40,000".to_string()),
            html_url: "https://github.com/test-org/wh40k".to_string(),
        }
    }

    fn release(tag: &str, published: OffsetDateTime) -> GithubRelease {
        GithubRelease {
            tag_name: tag.to_string(),
            name: None,
            body: Some("Points updates\nBug fixes".to_string()),
            draft: false,
            html_url: format!("https://github.com/test-org/wh40k/releases/tag/{tag}"),
            published_at: Some(published),
        }
    }

    #[test]
    fn entry_title_combines_repo_and_release() {
        let entries = release_feed_entries(&repo(), &[release("v1.0.0", datetime!(2024-01-01 0:00 UTC))]);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "wh40k: v1.0.0");
        assert_eq!(entries[0].html_content, "Points updates<br/>Bug fixes");
    }

    #[test]
    fn merge_sorts_and_truncates() {
        let mut entries = Vec::new();
        for day in 1..=8u8 {
            entries.extend(release_feed_entries(
                &repo(),
                &[release(
                    &format!("v1.0.{day}"),
                    datetime!(2024-01-01 0:00 UTC) + time::Duration::days(day as i64),
                )],
            ));
        }
        let merged = merge_feed_entries(entries);
        assert_eq!(merged.len(), MAX_FEED_ENTRIES);
        assert!(merged[0].title.contains("v1.0.8"));
        assert!(merged[0].published > merged[4].published);
    }

    #[test]
    fn atom_document_contains_entries() {
        let entries = release_feed_entries(&repo(), &[release("v1.0.0", datetime!(2024-01-01 0:00 UTC))]);
        let xml = render_atom(
            "http://localhost:8080/repos/feeds/wh40k.atom",
            "wh40k releases",
            "Data file releases for wh40k",
            "BattleScribe Data",
            "http://localhost:8080/repos/feeds/wh40k.atom",
            &entries,
        )
        .unwrap();
        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#));
        assert!(xml.contains("<title>wh40k: v1.0.0</title>"));
        assert!(xml.contains("<published>2024-01-01T00:00:00Z</published>"));
    }
}
