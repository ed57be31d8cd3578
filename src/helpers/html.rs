//! Markup cleanup helpers used when publishing post bodies outside the site

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Opening, closing or self-closing JSX component tag (`<Chart a={1} />`, `</Note>`)
    static ref COMPONENT_TAG: Regex =
        Regex::new(r"</?[A-Z][A-Za-z0-9_.]*(?:\s[^<>]*?)?/?>").unwrap();

    /// Component tag still open at the end of the text, attributes continuing below
    static ref OPEN_COMPONENT: Regex =
        Regex::new(r"</?[A-Z][A-Za-z0-9_.]*(?:\s[^<>]*)?$").unwrap();

    /// Top-level ESM statement in an MDX file
    static ref ESM_LINE: Regex = Regex::new(r"^(import|export)\s").unwrap();
}

/// Remove MDX-only markup from a post body, leaving plain Markdown.
///
/// `import`/`export` lines and component tags are dropped, text between an
/// opening and closing component tag is kept. A tag may spread its attributes
/// over several lines. Fenced code blocks are left untouched.
pub fn strip_mdx(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut in_fence = false;
    // Lines of a component tag that has not seen its `>` yet
    let mut pending: Option<String> = None;

    for line in body.lines() {
        let trimmed = line.trim_start();
        let is_fence = trimmed.starts_with("```") || trimmed.starts_with("~~~");

        // Not a tag after all; give the text back unchanged
        if is_fence || in_fence || line.trim().is_empty() {
            if let Some(open) = pending.take() {
                push_line(&mut out, &open);
            }
        }

        if is_fence {
            in_fence = !in_fence;
            push_line(&mut out, line);
            continue;
        }

        if in_fence {
            push_line(&mut out, line);
            continue;
        }

        let chunk = match pending.take() {
            Some(mut open) => {
                open.push('\n');
                open.push_str(line);
                open
            }
            None if ESM_LINE.is_match(line) => continue,
            None => line.to_string(),
        };

        if OPEN_COMPONENT.is_match(&chunk) {
            pending = Some(chunk);
            continue;
        }

        let cleaned = COMPONENT_TAG.replace_all(&chunk, "");
        // Text that only held component tags disappears entirely
        if cleaned.trim().is_empty() && !chunk.trim().is_empty() {
            continue;
        }
        push_line(&mut out, &cleaned);
    }

    if let Some(open) = pending {
        push_line(&mut out, &open);
    }

    out
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

/// Escape XML special characters
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// Convert root-relative URLs in HTML content to absolute URLs
pub fn convert_relative_urls_to_absolute(content: &str, base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    content
        .replace("href=\"/", &format!("href=\"{}/", base_url))
        .replace("src=\"/", &format!("src=\"{}/", base_url))
        .replace("href='/", &format!("href='{}/", base_url))
        .replace("src='/", &format!("src='{}/", base_url))
}

/// Strip characters XML 1.0 does not allow
/// (`#x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]`)
pub fn strip_invalid_xml_chars(s: &str) -> String {
    s.chars()
        .filter(|&c| {
            c == '\t'
                || c == '\n'
                || c == '\r'
                || ('\u{0020}'..='\u{D7FF}').contains(&c)
                || ('\u{E000}'..='\u{FFFD}').contains(&c)
                || ('\u{10000}'..='\u{10FFFF}').contains(&c)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_mdx_imports_and_components() {
        let body = r#"import Chart from "../components/Chart"
export const meta = { draft: false }

# Heading

<Chart data={points} />

<Callout type="info">
Keep this text.
</Callout>

Inline <Badge>new</Badge> marker.
"#;
        let cleaned = strip_mdx(body);
        assert!(!cleaned.contains("import"));
        assert!(!cleaned.contains("export"));
        assert!(!cleaned.contains("<Chart"));
        assert!(!cleaned.contains("Callout"));
        assert!(cleaned.contains("# Heading"));
        assert!(cleaned.contains("Keep this text."));
        assert!(cleaned.contains("Inline new marker."));
    }

    #[test]
    fn test_strip_mdx_multiline_self_closing() {
        let body = "Intro\n\n<Chart\n  data={points}\n  title=\"Growth\"\n/>\n\nAfter\n";
        let cleaned = strip_mdx(body);
        assert_eq!(cleaned, "Intro\n\n\nAfter\n");
    }

    #[test]
    fn test_strip_mdx_multiline_opening_tag() {
        let body = "<Callout\n  type=\"info\"\n  icon={Star}\n>\nKeep this text.\n</Callout>\n";
        let cleaned = strip_mdx(body);
        assert_eq!(cleaned, "Keep this text.\n");
    }

    #[test]
    fn test_strip_mdx_text_before_multiline_tag() {
        let cleaned = strip_mdx("See the chart <Chart\n  data={points} /> below.\n");
        assert_eq!(cleaned, "See the chart  below.\n");
    }

    #[test]
    fn test_strip_mdx_unclosed_tag_is_kept() {
        let body = "Compare <Vec\n\nNext paragraph\n";
        let cleaned = strip_mdx(body);
        assert_eq!(cleaned, body);
    }

    #[test]
    fn test_strip_mdx_keeps_code_fences() {
        let body = "```tsx\nimport React from 'react'\n<App />\n```\n";
        let cleaned = strip_mdx(body);
        assert!(cleaned.contains("import React from 'react'"));
        assert!(cleaned.contains("<App />"));
    }

    #[test]
    fn test_strip_mdx_keeps_html() {
        let cleaned = strip_mdx("<em>plain html</em> stays\n");
        assert!(cleaned.contains("<em>plain html</em>"));
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a < b & \"c\""), "a &lt; b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_relative_urls() {
        let html = r#"<img src="/img/a.png"><a href="/about">x</a>"#;
        let out = convert_relative_urls_to_absolute(html, "https://example.org/");
        assert!(out.contains(r#"src="https://example.org/img/a.png""#));
        assert!(out.contains(r#"href="https://example.org/about""#));
    }

    #[test]
    fn test_strip_invalid_xml_chars() {
        assert_eq!(strip_invalid_xml_chars("a\u{0008}b\tc"), "ab\tc");
    }
}
