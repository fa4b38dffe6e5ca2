//! Markdown path, delegated to pulldown-cmark.
//!
//! The event stream is adjusted before HTML generation: soft breaks become
//! hard breaks, bare URLs become links, emoji shortcodes are substituted,
//! fenced code is highlighted and tables get a scroll container.

mod emoji;
mod highlight;

pub use self::emoji::replace_shortcodes;
pub use self::highlight::highlight;

use crate::config::MarkdownConfig;
use crate::html::escape_html;
use log::debug;
use pulldown_cmark::{
    html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, TextMergeStream,
};
use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

static BARE_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\b(?:https?://|www\.)[^\s<>"']*[^\s<>"'.,;:!?)\]]"#).unwrap()
});

/// Renders markdown documents into `<div class="markdown-body">`.
#[derive(Debug, Clone, Default)]
pub struct MarkdownRenderer {
    config: MarkdownConfig,
}

impl MarkdownRenderer {
    pub fn new(config: MarkdownConfig) -> Self {
        Self { config }
    }

    fn options(&self) -> Options {
        let mut options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_SUPERSCRIPT
            | Options::ENABLE_SUBSCRIPT;
        if self.config.typographer {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        options
    }

    pub fn render(&self, content: &str) -> String {
        format!(r#"<div class="markdown-body">{}</div>"#, self.render_html(content))
    }

    /// HTML for `content` without the container.
    pub fn render_html(&self, content: &str) -> String {
        let content = content.replace("\r\n", "\n");
        let parser = Parser::new_ext(&content, self.options());
        let events = self.transform(TextMergeStream::new(parser));

        let mut output = String::with_capacity(content.len() * 3 / 2);
        html::push_html(&mut output, events.into_iter());
        output
    }

    fn transform<'a>(&self, parser: impl Iterator<Item = Event<'a>>) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        let mut link_depth = 0usize;
        let mut code: Option<(String, String)> = None;

        for event in parser {
            if let Some((language, buffer)) = code.as_mut() {
                match event {
                    Event::Text(text) => buffer.push_str(&text),
                    Event::End(TagEnd::CodeBlock) => {
                        let html = self.code_block(language, buffer);
                        events.push(Event::Html(html.into()));
                        code = None;
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    let language = match kind {
                        CodeBlockKind::Fenced(info) => {
                            info.split_whitespace().next().unwrap_or("").to_string()
                        }
                        CodeBlockKind::Indented => String::new(),
                    };
                    code = Some((language, String::new()));
                }
                Event::Start(Tag::Table(alignments)) => {
                    events.push(Event::Html(r#"<div class="table-container">"#.into()));
                    events.push(Event::Start(Tag::Table(alignments)));
                }
                Event::End(TagEnd::Table) => {
                    events.push(Event::End(TagEnd::Table));
                    events.push(Event::Html("</div>\n".into()));
                }
                Event::Start(tag @ Tag::Link { .. }) => {
                    link_depth += 1;
                    events.push(Event::Start(tag));
                }
                Event::End(TagEnd::Link) => {
                    link_depth = link_depth.saturating_sub(1);
                    events.push(Event::End(TagEnd::Link));
                }
                Event::SoftBreak if self.config.breaks => events.push(Event::HardBreak),
                Event::Text(text) => self.text(text, link_depth > 0, &mut events),
                other => events.push(other),
            }
        }

        events
    }

    fn text<'a>(&self, text: CowStr<'a>, in_link: bool, events: &mut Vec<Event<'a>>) {
        let mut text = text;
        if self.config.emoji {
            let replaced = match replace_shortcodes(&text) {
                Cow::Owned(replaced) => Some(replaced),
                Cow::Borrowed(_) => None,
            };
            if let Some(replaced) = replaced {
                text = replaced.into();
            }
        }
        if self.config.typographer {
            let (open, close) = &self.config.quotes;
            if text.contains(['\u{201C}', '\u{201D}']) {
                text = text
                    .replace('\u{201C}', open)
                    .replace('\u{201D}', close)
                    .into();
            }
        }

        if in_link || !self.config.linkify {
            events.push(Event::Text(text));
            return;
        }

        let mut cursor = 0;
        for found in BARE_URL.find_iter(&text) {
            if found.start() > cursor {
                events.push(Event::Text(text[cursor..found.start()].to_string().into()));
            }
            let url = found.as_str();
            let href = if url.starts_with("www.") {
                format!("http://{}", url)
            } else {
                url.to_string()
            };
            events.push(Event::InlineHtml(
                format!(r#"<a href="{}">{}</a>"#, escape_html(&href), escape_html(url)).into(),
            ));
            cursor = found.end();
        }
        if cursor == 0 {
            events.push(Event::Text(text));
        } else if cursor < text.len() {
            events.push(Event::Text(text[cursor..].to_string().into()));
        }
    }

    fn code_block(&self, language: &str, code: &str) -> String {
        let class = if language.is_empty() {
            String::new()
        } else {
            format!(r#" class="language-{}""#, escape_html(language))
        };

        if self.config.highlight && !language.is_empty() {
            match highlight(code, language) {
                Ok(html) => return format!("<pre><code{}>{}</code></pre>\n", class, html),
                Err(e) => debug!("code block left plain: {}", e),
            }
        }
        format!("<pre><code{}>{}</code></pre>\n", class, escape_html(code))
    }
}
