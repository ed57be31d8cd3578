//! Markdown rendering for syndicated content

use pulldown_cmark::{html, Options, Parser};

use crate::helpers::strip_mdx;

/// Renders post bodies to HTML for feeds.
///
/// Site pages go through their own MDX pipeline; this renderer only has to
/// produce self-contained HTML that feed readers can display.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownRenderer;

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        // Front-matter is already split off by FrontMatter::parse()
        let options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SMART_PUNCTUATION
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, options);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, parser);
        html_output
    }

    /// Strip MDX component markup, then render
    pub fn render_mdx(&self, body: &str) -> String {
        self.render(&strip_mdx(body))
    }
}
