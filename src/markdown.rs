//! Markdown to HTML rendering.
//!
//! Parsing and HTML generation are left to pulldown-cmark. The event stream is
//! rewritten on the way through so that:
//!
//! - fenced code blocks are collected and handed to the [`Highlighter`], and
//!   the resulting `<pre class="hljs">` block is spliced back in as raw HTML
//! - raw HTML in the source is escaped and shown as text rather than being
//!   passed through to the browser; a raw HTML block becomes a paragraph

use crate::highlight::Highlighter;
use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};

/// A configured Markdown renderer.
///
/// Each converter owns its own renderer, so independent conversions don't
/// share highlighting state.
#[derive(Debug)]
pub struct MarkdownRenderer {
    highlighter: Highlighter,
    options: Options,
}

impl MarkdownRenderer {
    pub fn new(highlighter: Highlighter) -> MarkdownRenderer {
        MarkdownRenderer {
            highlighter,
            options: Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH,
        }
    }

    pub fn highlighter(&self) -> &Highlighter {
        &self.highlighter
    }

    /// Render a Markdown document to an HTML fragment.
    pub fn render(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let events = self.rewrite(parser);

        let mut html_output = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut html_output, events.into_iter());
        html_output
    }

    fn rewrite<'a>(&self, parser: Parser<'a>) -> Vec<Event<'a>> {
        let mut events = Vec::new();
        // (language, code) of the fenced block currently being collected
        let mut fence: Option<(Option<String>, String)> = None;

        for event in parser {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info))) => {
                    fence = Some((fence_language(&info), String::new()));
                }
                Event::Text(text) if fence.is_some() => {
                    if let Some((_, code)) = fence.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) if fence.is_some() => {
                    if let Some((language, code)) = fence.take() {
                        let block = self.highlighter.highlight(&code, language.as_deref());
                        let mut block = block.into_html();
                        block.push('\n');
                        events.push(Event::Html(CowStr::from(block)));
                    }
                }
                // raw HTML blocks read as paragraphs of escaped text
                Event::Start(Tag::HtmlBlock) => events.push(Event::Start(Tag::Paragraph)),
                Event::End(TagEnd::HtmlBlock) => {
                    if let Some(Event::Text(last)) = events.last_mut() {
                        let trimmed = last.trim_end_matches('\n').to_string();
                        *last = CowStr::from(trimmed);
                    }
                    events.push(Event::End(TagEnd::Paragraph));
                }
                Event::Html(raw) | Event::InlineHtml(raw) => events.push(Event::Text(raw)),
                event => events.push(event),
            }
        }

        events
    }
}

/// The fence language is the first word of the info string.
fn fence_language(info: &str) -> Option<String> {
    info.split_whitespace().next().map(ToString::to_string)
}
