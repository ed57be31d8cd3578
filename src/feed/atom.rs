//! Atom 1.0 rendering

use super::Feed;
use crate::helpers::{date_xml, escape_xml};

pub(super) fn render(feed: &Feed<'_>) -> String {
    let config = feed.config;
    let base_url = config.url.trim_end_matches('/');

    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="utf-8"?>"#);
    xml.push('\n');
    xml.push_str(r#"<feed xmlns="http://www.w3.org/2005/Atom">"#);
    xml.push('\n');
    xml.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
    if !config.description.is_empty() {
        xml.push_str(&format!(
            "  <subtitle>{}</subtitle>\n",
            escape_xml(&config.description)
        ));
    }
    xml.push_str(&format!(
        "  <link href=\"{}\" rel=\"self\"/>\n",
        escape_xml(&config.full_url_for(&config.feed.atom))
    ));
    xml.push_str(&format!("  <link href=\"{}/\"/>\n", escape_xml(base_url)));
    xml.push_str(&format!(
        "  <updated>{}</updated>\n",
        date_xml(&feed.updated())
    ));
    xml.push_str(&format!("  <id>{}/</id>\n", escape_xml(base_url)));
    xml.push_str(&format!(
        "  <author><name>{}</name></author>\n",
        escape_xml(&config.author)
    ));
    xml.push_str("  <generator>folio</generator>\n");

    for entry in &feed.entries {
        let link = escape_xml(&entry.link);
        xml.push_str("  <entry>\n");
        xml.push_str(&format!("    <title>{}</title>\n", escape_xml(&entry.title)));
        xml.push_str(&format!("    <link href=\"{}\"/>\n", link));
        xml.push_str(&format!("    <id>{}</id>\n", link));
        xml.push_str(&format!(
            "    <published>{}</published>\n",
            date_xml(&entry.published)
        ));
        xml.push_str(&format!(
            "    <updated>{}</updated>\n",
            date_xml(&entry.updated)
        ));
        xml.push_str(&format!(
            "    <summary>{}</summary>\n",
            escape_xml(&entry.summary)
        ));
        for tag in &entry.tags {
            xml.push_str(&format!("    <category term=\"{}\"/>\n", escape_xml(tag)));
        }
        xml.push_str(&format!(
            "    <content type=\"html\"><![CDATA[{}]]></content>\n",
            escape_cdata(&entry.content_html)
        ));
        xml.push_str("  </entry>\n");
    }

    xml.push_str("</feed>\n");
    xml
}

/// Split any `]]>` so the body cannot close its CDATA section early
fn escape_cdata(s: &str) -> String {
    s.replace("]]>", "]]]]><![CDATA[>")
}
