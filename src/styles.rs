//! CSS generation for the rendered document.
//!
//! The stylesheet has two parts:
//!
//! - Base document styles (typography, headings, tables, code blocks) with the
//!   host font stack substituted in
//! - Theme styles derived from the syntect theme: the code block background and
//!   foreground, plus font style utility classes (`.syn-bold`, `.syn-italic`,
//!   `.syn-underline`) used by highlighted tokens
//!
//! Token colours themselves are written inline by the highlighter, so the theme
//! part only needs to cover what can't be expressed per token.

use crate::fonts::MONOSPACE_FONTS;
use syntect::highlighting::{Color, Theme};

/// CSS class prefix for syntax highlighting spans.
const SCOPE_PREFIX: &str = "syn-";

const WHITE: Color = Color {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
};
const BLACK: Color = Color {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
};

/// Generate the complete stylesheet embedded in the document head.
pub fn generate_stylesheet(theme: &Theme, font_family: &str) -> String {
    let mut css = String::with_capacity(4096);

    css.push_str(&generate_base_styles(font_family));

    css.push_str("\n/* Syntax highlighting */\n");
    css.push_str(&generate_theme_styles(theme));

    css
}

/// Generate base document styles.
fn generate_base_styles(font_family: &str) -> String {
    format!(
        r#"/* Base styles */
body {{
    font-family: {font_family};
    line-height: 1.6;
    padding: 2em;
    max-width: 900px;
    margin: 0 auto;
    color: #24292e;
}}

h1, h2, h3 {{
    color: #2c3e50;
}}

h1, h2 {{
    border-bottom: 1px solid #eaecef;
    padding-bottom: 0.3em;
}}

a {{
    color: #0366d6;
    text-decoration: none;
}}

img {{
    max-width: 100%;
}}

blockquote {{
    margin: 0 0 1em;
    padding: 0 1em;
    color: #6a737d;
    border-left: 0.25em solid #dfe2e5;
}}

table {{
    border-collapse: collapse;
    margin: 1em 0;
}}

th, td {{
    border: 1px solid #dfe2e5;
    padding: 6px 13px;
}}

tr:nth-child(2n) {{
    background-color: #f6f8fa;
}}

/* Code blocks */
code {{
    font-family: {mono};
}}

pre {{
    page-break-inside: avoid;
}}

pre.hljs {{
    padding: 1em;
    border-radius: 5px;
    overflow-x: auto;
    white-space: pre-wrap;
    word-wrap: break-word;
}}
"#,
        font_family = font_family,
        mono = MONOSPACE_FONTS,
    )
}

/// Generate the code block and font style rules for the highlighting theme.
fn generate_theme_styles(theme: &Theme) -> String {
    let bg = theme.settings.background.unwrap_or(WHITE);
    let fg = theme.settings.foreground.unwrap_or(BLACK);

    let mut css = format!(
        "pre.hljs {{ background-color: rgb({}, {}, {}); color: rgb({}, {}, {}); }}\n",
        bg.r, bg.g, bg.b, fg.r, fg.g, fg.b
    );

    if let Some(sel) = theme.settings.selection {
        css.push_str(&format!(
            "pre.hljs ::selection {{ background-color: rgb({}, {}, {}); }}\n",
            sel.r, sel.g, sel.b
        ));
    }

    // font style classes (used when tokens have bold/italic styling)
    css.push_str(&format!(".{SCOPE_PREFIX}bold {{ font-weight: bold; }}\n"));
    css.push_str(&format!(
        ".{SCOPE_PREFIX}italic {{ font-style: italic; }}\n"
    ));
    css.push_str(&format!(
        ".{SCOPE_PREFIX}underline {{ text-decoration: underline; }}\n"
    ));

    css
}

/// Returns the CSS class prefix used for syntax highlighting.
pub fn scope_prefix() -> &'static str {
    SCOPE_PREFIX
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyntaxTheme;
    use crate::highlight::load_theme;

    #[test]
    fn can_generate_stylesheet() {
        let theme = load_theme(SyntaxTheme::GitHub);
        let css = generate_stylesheet(&theme, "Arial, sans-serif");
        assert!(css.contains("body {"));
        assert!(css.contains("font-family: Arial, sans-serif;"));
        assert!(css.contains("pre.hljs {"));
        assert!(css.contains(".syn-bold"));
    }

    #[test]
    fn theme_background_is_applied_to_code_blocks() {
        for theme in SyntaxTheme::all() {
            let theme = load_theme(*theme);
            let css = generate_theme_styles(&theme);
            let bg = theme.settings.background.unwrap_or(WHITE);
            assert!(css.contains(&format!(
                "background-color: rgb({}, {}, {})",
                bg.r, bg.g, bg.b
            )));
        }
    }
}
