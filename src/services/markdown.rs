//! Markdown rendering service
//!
//! This module provides Markdown to HTML conversion with syntax highlighting
//! for code blocks. It uses pulldown-cmark for Markdown parsing and syntect
//! for syntax highlighting. Headings receive anchor ids so a table of
//! contents can link to them.
//!
//! # Example
//!
//! ```
//! use folio::services::markdown::MarkdownRenderer;
//!
//! let renderer = MarkdownRenderer::new();
//! let html = renderer.render("# Hello World\n\nThis is **bold** text.");
//! assert!(html.contains("<h1 id=\"hello-world\">"));
//! assert!(html.contains("<strong>"));
//! ```

use once_cell::sync::Lazy;
use pulldown_cmark::{html, CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use syntect::highlighting::ThemeSet;
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

use crate::tools::text::{slugify, WORDS_PER_MINUTE};

const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Loaded once per process and shared by every renderer
static SYNTAX_SET: Lazy<SyntaxSet> = Lazy::new(SyntaxSet::load_defaults_newlines);
static THEME_SET: Lazy<ThemeSet> = Lazy::new(ThemeSet::load_defaults);

/// One heading of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocEntry {
    /// Heading level, 1 to 6
    pub level: u8,
    pub text: String,
    /// Anchor id assigned to the rendered heading
    pub id: String,
}

/// Rendered HTML together with its derived metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub html: String,
    pub toc: Vec<TocEntry>,
    pub reading_time_minutes: usize,
}

/// A thread-safe Markdown renderer with syntax highlighting support.
///
/// The renderer supports common Markdown features including:
/// - Headings (h1-h6) with anchor ids
/// - Lists (ordered and unordered)
/// - Links and images
/// - Blockquotes
/// - Code blocks with syntax highlighting
/// - Inline code
/// - Bold, italic, and strikethrough text
/// - Tables
/// - Task lists
/// - Smart punctuation
#[derive(Clone)]
pub struct MarkdownRenderer {
    syntax_set: &'static SyntaxSet,
    theme_set: &'static ThemeSet,
    theme_name: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn parser_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
    options
}

impl MarkdownRenderer {
    /// Creates a new MarkdownRenderer using the "base16-ocean.dark" theme.
    pub fn new() -> Self {
        Self::with_theme(DEFAULT_THEME)
    }

    /// Creates a new MarkdownRenderer with a specific theme.
    ///
    /// Falls back to "base16-ocean.dark" if the theme is not found.
    pub fn with_theme(theme_name: &str) -> Self {
        let theme_set: &'static ThemeSet = &THEME_SET;

        let validated_theme = if theme_set.themes.contains_key(theme_name) {
            theme_name.to_string()
        } else {
            DEFAULT_THEME.to_string()
        };

        Self {
            syntax_set: &SYNTAX_SET,
            theme_set,
            theme_name: validated_theme,
        }
    }

    /// Renders Markdown text to HTML.
    ///
    /// Code blocks with a recognised language hint are highlighted; unknown
    /// languages render as `<pre><code class="language-x">`.
    pub fn render(&self, markdown: &str) -> String {
        self.render_document(markdown).html
    }

    /// Renders Markdown and derives the table of contents and reading time
    /// from the same parse.
    pub fn render_document(&self, markdown: &str) -> RenderedDocument {
        let parser = Parser::new_ext(markdown, parser_options());
        let (events, toc) = anchor_headings(parser.collect());
        let events = self.process_events(events);

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        RenderedDocument {
            html: html_output,
            toc,
            reading_time_minutes: reading_time_minutes(markdown),
        }
    }

    /// Replaces code block events with highlighted HTML.
    fn process_events<'a>(&self, input: Vec<Event<'a>>) -> Vec<Event<'a>> {
        let mut events = Vec::with_capacity(input.len());
        let mut in_code_block = false;
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();

        for event in input {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    code_content.clear();
                    code_lang = match kind {
                        CodeBlockKind::Fenced(lang) => {
                            // Info strings may carry attributes after the language
                            let lang_str = lang.split_whitespace().next().unwrap_or_default();
                            (!lang_str.is_empty()).then(|| lang_str.to_string())
                        }
                        CodeBlockKind::Indented => None,
                    };
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;

                    let highlighted = match code_lang.take() {
                        Some(lang) => self.highlight_code(&code_content, &lang),
                        None => plain_code_block(&code_content),
                    };

                    events.push(Event::Html(highlighted.into()));
                }
                Event::Text(text) if in_code_block => {
                    code_content.push_str(&text);
                }
                _ => events.push(event),
            }
        }

        events
    }

    /// Applies syntax highlighting to a code block, or renders it plain with
    /// a language class when the language is not recognized.
    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang));

        let theme = self.theme_set.themes.get(&self.theme_name);
        match (syntax, theme) {
            (Some(syntax), Some(theme)) => {
                highlighted_html_for_string(code, &self.syntax_set, syntax, theme)
                    .unwrap_or_else(|_| plain_code_block(code))
            }
            _ => plain_code_block_with_lang(code, lang),
        }
    }
}

/// Assign unique anchor ids to headings and collect them as a TOC.
///
/// Explicit `{#id}` attributes are respected.
fn anchor_headings(mut events: Vec<Event<'_>>) -> (Vec<Event<'_>>, Vec<TocEntry>) {
    let mut toc = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    let mut i = 0;
    while i < events.len() {
        let Event::Start(Tag::Heading { level, .. }) = &events[i] else {
            i += 1;
            continue;
        };
        let level = *level as u8;

        let mut text = String::new();
        let mut j = i + 1;
        while j < events.len() {
            match &events[j] {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                _ => {}
            }
            j += 1;
        }

        if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
            let base = match id.as_deref() {
                Some(explicit) => explicit.to_string(),
                None => {
                    let slug = slugify(&text);
                    if slug.is_empty() {
                        "section".to_string()
                    } else {
                        slug
                    }
                }
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let unique = if *count == 0 {
                base
            } else {
                format!("{}-{}", base, count)
            };
            *count += 1;

            *id = Some(unique.clone().into());
            toc.push(TocEntry {
                level,
                text: text.trim().to_string(),
                id: unique,
            });
        }

        i = j + 1;
    }

    (events, toc)
}

/// Extract the table of contents without rendering
pub fn extract_toc(markdown: &str) -> Vec<TocEntry> {
    let parser = Parser::new_ext(markdown, parser_options());
    anchor_headings(parser.collect()).1
}

/// Estimated reading time at 200 words per minute, never less than one minute
pub fn reading_time_minutes(markdown: &str) -> usize {
    let words: usize = Parser::new_ext(markdown, parser_options())
        .map(|event| match event {
            Event::Text(text) | Event::Code(text) => text.split_whitespace().count(),
            _ => 0,
        })
        .sum();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Renders a plain code block without syntax highlighting.
fn plain_code_block(code: &str) -> String {
    format!("<pre><code>{}</code></pre>", html_escape(code))
}

/// Renders a plain code block with a language class.
fn plain_code_block_with_lang(code: &str, lang: &str) -> String {
    format!(
        "<pre><code class=\"language-{}\">{}</code></pre>",
        html_escape(lang),
        html_escape(code)
    )
}

/// Escapes HTML special characters in a string.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_renderer() {
        let renderer = MarkdownRenderer::new();
        assert_eq!(renderer.theme_name, "base16-ocean.dark");
    }

    #[test]
    fn test_with_valid_theme() {
        let renderer = MarkdownRenderer::with_theme("InspiredGitHub");
        assert_eq!(renderer.theme_name, "InspiredGitHub");
    }

    #[test]
    fn test_with_invalid_theme_falls_back() {
        let renderer = MarkdownRenderer::with_theme("nonexistent-theme");
        assert_eq!(renderer.theme_name, "base16-ocean.dark");
    }

    #[test]
    fn test_render_heading_gets_anchor() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("# Heading 1");
        assert!(html.contains("<h1 id=\"heading-1\">Heading 1</h1>"));
    }

    #[test]
    fn test_render_inline_formatting() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("**bold** *italic* ~~gone~~ `code`");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<del>gone</del>"));
        assert!(html.contains("<code>code</code>"));
    }

    #[test]
    fn test_render_lists() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("- Item 1\n- Item 2\n\n1. First\n2. Second");
        assert!(html.contains("<ul>"));
        assert!(html.contains("<ol>"));
        assert!(html.contains("Item 2"));
        assert!(html.contains("Second"));
    }

    #[test]
    fn test_render_link_and_image() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("[Example](https://example.com) ![Alt text](https://example.com/i.png)");
        assert!(html.contains("<a href=\"https://example.com\">Example</a>"));
        assert!(html.contains("src=\"https://example.com/i.png\""));
        assert!(html.contains("alt=\"Alt text\""));
    }

    #[test]
    fn test_render_code_block_without_language() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```\nlet x = 1;\n```");
        assert!(html.contains("<pre><code>let x = 1;"));
    }

    #[test]
    fn test_render_code_block_with_rust() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre"));
        assert!(html.contains("style="));
    }

    #[test]
    fn test_render_code_block_with_unknown_language() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("```unknownlang\nsome <code>\n```");
        assert!(html.contains("<pre><code class=\"language-unknownlang\">"));
        assert!(html.contains("some &lt;code&gt;"));
    }

    #[test]
    fn test_render_table_and_tasks() {
        let renderer = MarkdownRenderer::new();
        let html = renderer.render("| A | B |\n|---|---|\n| 1 | 2 |\n\n- [x] done\n- [ ] todo");
        assert!(html.contains("<table>"));
        assert!(html.contains("type=\"checkbox\""));
    }

    #[test]
    fn test_extract_toc() {
        let toc = extract_toc("# Intro\n\ntext\n\n## Getting `started`\n\n### Details\n\n## Intro");
        assert_eq!(
            toc,
            vec![
                TocEntry { level: 1, text: "Intro".into(), id: "intro".into() },
                TocEntry { level: 2, text: "Getting started".into(), id: "getting-started".into() },
                TocEntry { level: 3, text: "Details".into(), id: "details".into() },
                TocEntry { level: 2, text: "Intro".into(), id: "intro-1".into() },
            ]
        );
    }

    #[test]
    fn test_toc_ids_match_rendered_html() {
        let renderer = MarkdownRenderer::new();
        let doc = renderer.render_document("## Same\n\n## Same\n\n## !!!");
        let ids: Vec<&str> = doc.toc.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["same", "same-1", "section"]);
        for id in ids {
            assert!(doc.html.contains(&format!("id=\"{}\"", id)));
        }
    }

    #[test]
    fn test_explicit_heading_id() {
        let toc = extract_toc("## Setup {#install}");
        assert_eq!(toc[0].id, "install");
        assert_eq!(toc[0].text, "Setup");
    }

    #[test]
    fn test_reading_time() {
        assert_eq!(reading_time_minutes(""), 1);
        assert_eq!(reading_time_minutes("short post"), 1);
        let long = "word ".repeat(401);
        assert_eq!(reading_time_minutes(&long), 3);
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("<a href='x'>&</a>"), "&lt;a href=&#x27;x&#x27;&gt;&amp;&lt;/a&gt;");
    }
}
