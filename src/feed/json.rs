//! JSON Feed 1.1 rendering

use anyhow::Result;
use serde::Serialize;

use super::Feed;

const VERSION: &str = "https://jsonfeed.org/version/1.1";

#[derive(Serialize)]
struct JsonFeed<'a> {
    version: &'static str,
    title: &'a str,
    home_page_url: &'a str,
    feed_url: String,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    language: &'a str,
    authors: Vec<Author<'a>>,
    items: Vec<Item<'a>>,
}

#[derive(Serialize)]
struct Author<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct Item<'a> {
    id: &'a str,
    url: &'a str,
    title: &'a str,
    summary: &'a str,
    content_html: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<&'a str>,
    date_published: String,
    date_modified: String,
    tags: &'a [String],
}

pub(super) fn render(feed: &Feed<'_>) -> Result<String> {
    let config = feed.config;

    let items = feed
        .entries
        .iter()
        .map(|entry| Item {
            id: &entry.link,
            url: &entry.link,
            title: &entry.title,
            summary: &entry.summary,
            content_html: &entry.content_html,
            image: entry.image.as_deref(),
            date_published: entry.published.to_rfc3339(),
            date_modified: entry.updated.to_rfc3339(),
            tags: &entry.tags,
        })
        .collect();

    let json = JsonFeed {
        version: VERSION,
        title: &config.title,
        home_page_url: &config.url,
        feed_url: config.full_url_for(&config.feed.json),
        description: &config.description,
        language: &config.language,
        authors: vec![Author {
            name: &config.author,
        }],
        items,
    };

    Ok(serde_json::to_string_pretty(&json)?)
}
