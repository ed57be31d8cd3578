//! RSS 2.0 rendering

use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use ::rss::validation::Validate;
use ::rss::{CategoryBuilder, ChannelBuilder, GuidBuilder, ItemBuilder};
use std::collections::BTreeMap;

use super::{Feed, FeedEntry};
use crate::config::SiteConfig;
use crate::helpers::date_rfc2822;

const CONTENT_NAMESPACE: &str = "http://purl.org/rss/1.0/modules/content/";

lazy_static! {
    /// `email@example.com (Name)`, the only author form RSS accepts
    static ref RSS_AUTHOR: Regex =
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}[ \t]*\([^)]+\)$").unwrap();
}

pub(super) fn render(feed: &Feed<'_>) -> Result<String> {
    let config = feed.config;
    let author = rss_author(config);

    let items: Vec<_> = feed
        .entries
        .iter()
        .map(|entry| entry_to_item(entry, author.clone()))
        .collect();

    let namespaces = BTreeMap::from([("content".to_string(), CONTENT_NAMESPACE.to_string())]);

    let channel = ChannelBuilder::default()
        .title(&config.title)
        .link(config.url.trim_end_matches('/'))
        .description(&config.description)
        .language(config.language.clone())
        .generator("folio".to_string())
        .last_build_date(date_rfc2822(&feed.updated()))
        .namespaces(namespaces)
        .items(items)
        .build();

    channel
        .validate()
        .map_err(|e| anyhow!("rss validation failed: {e}"))?;
    Ok(channel.to_string())
}

fn entry_to_item(entry: &FeedEntry, author: Option<String>) -> ::rss::Item {
    let categories = entry
        .tags
        .iter()
        .map(|tag| CategoryBuilder::default().name(tag.as_str()).build())
        .collect::<Vec<_>>();

    ItemBuilder::default()
        .title(entry.title.clone())
        .link(entry.link.clone())
        .guid(
            GuidBuilder::default()
                .permalink(true)
                .value(entry.link.as_str())
                .build(),
        )
        .description(entry.summary.clone())
        .content(entry.content_html.clone())
        .pub_date(date_rfc2822(&entry.published))
        .author(author)
        .categories(categories)
        .build()
}

/// Site author in RSS form, when an email is configured
fn rss_author(config: &SiteConfig) -> Option<String> {
    if RSS_AUTHOR.is_match(&config.author) {
        return Some(config.author.clone());
    }
    config
        .email
        .as_ref()
        .map(|email| format!("{} ({})", email, config.author))
}
