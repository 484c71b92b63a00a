//! Assembly of the standalone HTML document handed to the browser.

use crate::styles;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use syntect::highlighting::Theme;

/// Styling inputs for the document template.
#[derive(Debug, Clone)]
pub struct DocumentStyle {
    /// Body font-family list
    pub font_family: &'static str,
    /// Optional user stylesheet, read each time a document is built
    pub stylesheet: Option<PathBuf>,
}

impl DocumentStyle {
    /// Build the full stylesheet for the given highlighting theme.
    fn stylesheet(&self, theme: &Theme) -> Result<String> {
        let mut css = styles::generate_stylesheet(theme, self.font_family);
        if let Some(path) = &self.stylesheet {
            css.push_str("\n/* User styles */\n");
            css.push_str(&read_stylesheet(path)?);
        }
        Ok(css)
    }
}

fn read_stylesheet(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read stylesheet {}", path.display()))
}

/// Wrap a rendered HTML body in a complete document.
pub fn render(body: &str, title: &str, style: &DocumentStyle, theme: &Theme) -> Result<String> {
    let css = style.stylesheet(theme)?;

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
{body}
</body>
</html>
"#,
        title = html_escape::encode_text(title),
        css = css,
        body = body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyntaxTheme;
    use crate::fonts::LINUX_FONTS;
    use crate::highlight::load_theme;
    use std::io::Write;

    fn style() -> DocumentStyle {
        DocumentStyle {
            font_family: LINUX_FONTS,
            stylesheet: None,
        }
    }

    #[test]
    fn wraps_body_in_document() {
        let theme = load_theme(SyntaxTheme::GitHub);
        let html = render("<p>hi</p>", "notes <draft>", &style(), &theme).expect("can render");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<meta charset=\"UTF-8\">"));
        assert!(html.contains("<title>notes &lt;draft&gt;</title>"));
        assert!(html.contains("<body>\n<p>hi</p>\n</body>"));
        assert!(html.contains(LINUX_FONTS));
        assert!(html.contains("pre.hljs"));
    }

    #[test]
    fn appends_user_stylesheet() {
        let mut file = tempfile::NamedTempFile::new().expect("can create temp file");
        writeln!(file, "h1 {{ color: hotpink; }}").expect("can write stylesheet");

        let style = DocumentStyle {
            stylesheet: Some(file.path().to_path_buf()),
            ..style()
        };
        let theme = load_theme(SyntaxTheme::GitHub);
        let html = render("", "t", &style, &theme).expect("can render");
        assert!(html.contains("h1 { color: hotpink; }"));
    }

    #[test]
    fn missing_user_stylesheet_is_an_error() {
        let style = DocumentStyle {
            stylesheet: Some(PathBuf::from("/definitely/not/here.css")),
            ..style()
        };
        let theme = load_theme(SyntaxTheme::GitHub);
        assert!(render("", "t", &style, &theme).is_err());
    }
}
