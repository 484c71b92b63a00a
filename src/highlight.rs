//! Syntax highlighting for fenced code blocks.
//!
//! Highlighting uses syntect with the same hybrid styling the stylesheet is
//! generated for: inline RGB colours on every token, plus `syn-` classes for
//! bold/italic/underline. A block whose language can't be resolved, or that
//! syntect fails on, falls back to escaped plain text. That outcome is a
//! normal [`Highlighted::Escaped`] value rather than an error so a single bad
//! fence can never fail a conversion.

use crate::config::SyntaxTheme;
use crate::styles;
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

pub const SERIALIZED_SYNTAX: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/syntaxes.bin"));
pub const SERIALIZED_THEMES: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/themes.bin"));

/// The result of highlighting a single code fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Highlighted {
    /// Syntect recognised the language and produced coloured markup.
    Markup { language: String, html: String },
    /// No highlighting was possible; the fragment is HTML-escaped as-is.
    Escaped(String),
}

impl Highlighted {
    /// Wrap the fragment in the `<pre class="hljs">` block used by the stylesheet.
    pub fn into_html(self) -> String {
        match self {
            Highlighted::Markup { language, html } => format!(
                r#"<pre class="hljs"><code class="language-{}">{}</code></pre>"#,
                html_escape::encode_double_quoted_attribute(&language),
                html
            ),
            Highlighted::Escaped(text) => {
                format!(r#"<pre class="hljs"><code>{}</code></pre>"#, text)
            }
        }
    }
}

/// Syntax and theme assets for highlighting code blocks.
#[derive(Debug)]
pub struct Highlighter {
    ss: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    pub fn new(theme: SyntaxTheme) -> Highlighter {
        Highlighter {
            ss: load_syntaxes(),
            theme: load_theme(theme),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// Highlight `code` using the fence's declared language, if any.
    pub fn highlight(&self, code: &str, language: Option<&str>) -> Highlighted {
        let language = match language.map(str::trim).filter(|l| !l.is_empty()) {
            Some(language) => language,
            None => return Highlighted::Escaped(html_escape::encode_text(code).to_string()),
        };

        let Some(syntax) = self.ss.find_syntax_by_token(language) else {
            log::debug!("no syntax for language `{language}`, leaving block unhighlighted");
            return Highlighted::Escaped(html_escape::encode_text(code).to_string());
        };

        match self.highlight_with(code, syntax) {
            Ok(html) => Highlighted::Markup {
                language: language.to_string(),
                html,
            },
            Err(e) => {
                log::warn!("Failed to highlight `{language}` block: {e}");
                Highlighted::Escaped(html_escape::encode_text(code).to_string())
            }
        }
    }

    fn highlight_with(
        &self,
        code: &str,
        syntax: &SyntaxReference,
    ) -> Result<String, syntect::Error> {
        let prefix = styles::scope_prefix();
        let mut h = HighlightLines::new(syntax, &self.theme);
        let mut html = String::with_capacity(code.len() * 4);

        for line in LinesWithEndings::from(code) {
            let ranges = h.highlight_line(line, &self.ss)?;
            for (style, text) in ranges {
                let class = font_style_classes(style.font_style, prefix);
                let escaped = html_escape::encode_text(text);

                // always use inline colour, add classes for bold/italic/underline
                if class.is_empty() {
                    html.push_str(&format!(
                        r#"<span style="color: rgb({}, {}, {})">{}</span>"#,
                        style.foreground.r, style.foreground.g, style.foreground.b, escaped
                    ));
                } else {
                    html.push_str(&format!(
                        r#"<span class="{}" style="color: rgb({}, {}, {})">{}</span>"#,
                        class, style.foreground.r, style.foreground.g, style.foreground.b, escaped
                    ));
                }
            }
        }

        Ok(html)
    }
}

/// Map font style to CSS class names.
fn font_style_classes(font_style: FontStyle, prefix: &str) -> String {
    let mut classes = Vec::new();

    if font_style.intersects(FontStyle::BOLD) {
        classes.push(format!("{}bold", prefix));
    }
    if font_style.intersects(FontStyle::ITALIC) {
        classes.push(format!("{}italic", prefix));
    }
    if font_style.intersects(FontStyle::UNDERLINE) {
        classes.push(format!("{}underline", prefix));
    }

    classes.join(" ")
}

fn load_syntaxes() -> SyntaxSet {
    bincode::serde::decode_from_slice(SERIALIZED_SYNTAX, bincode::config::standard())
        .expect("can deserialise syntax set")
        .0
}

/// Load a theme by name from the serialised theme set.
pub fn load_theme(theme: SyntaxTheme) -> Theme {
    let ts: ThemeSet =
        bincode::serde::decode_from_slice(SERIALIZED_THEMES, bincode::config::standard())
            .expect("can deserialise theme set")
            .0;
    ts.themes
        .get(theme.name())
        .cloned()
        .expect("theme exists in set")
}
