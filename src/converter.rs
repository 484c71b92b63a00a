//! Markdown to PDF conversion.
//!
//! A conversion runs strictly in order: read the source, render it to HTML,
//! launch a browser, load the HTML, export the PDF, close the browser, and
//! write the output. The browser session is held in a [`SessionGuard`] so it
//! is closed exactly once whichever step fails.

use crate::browser::{Browser, BrowserSession, PdfOptions, Viewport};
use crate::document::{self, DocumentStyle};
use crate::markdown::MarkdownRenderer;
use anyhow::{anyhow, Context, Result};
use indicatif::ProgressBar;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Converts Markdown files to PDF with a given browser.
pub struct Converter<B: Browser> {
    renderer: MarkdownRenderer,
    style: DocumentStyle,
    browser: B,
    viewport: Viewport,
    pdf: PdfOptions,
    progress: ProgressBar,
}

/// Statistics from a conversion, used for user feedback.
#[derive(Debug)]
pub struct ConvertStats {
    /// Size of the written PDF in bytes
    pub pdf_bytes: usize,
}

impl<B: Browser> Converter<B> {
    pub fn new(renderer: MarkdownRenderer, style: DocumentStyle, browser: B) -> Converter<B> {
        Converter {
            renderer,
            style,
            browser,
            viewport: Viewport::default(),
            pdf: PdfOptions::default(),
            progress: ProgressBar::hidden(),
        }
    }

    /// Report each conversion step on `progress`.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Render Markdown into the complete HTML document sent to the browser.
    pub fn render_html(&self, markdown: &str, title: &str) -> Result<String> {
        let body = self.renderer.render(markdown);
        let theme = self.renderer.highlighter().theme();
        document::render(body.trim_end(), title, &self.style, theme)
            .with_context(|| "Failed to assemble HTML document")
    }

    /// Convert the Markdown file at `input` into a PDF at `output`.
    pub fn convert(&self, input: &Path, output: &Path) -> Result<ConvertStats> {
        let result = self.run(input, output, &self.progress);
        if let Err(e) = &result {
            log::error!(
                "Failed to convert {} to {}: {e:#}",
                input.display(),
                output.display()
            );
        }
        result
    }

    fn run(&self, input: &Path, output: &Path, progress: &ProgressBar) -> Result<ConvertStats> {
        progress.set_message("Reading Markdown...");
        let markdown = read_input(input)?;

        progress.set_message("Rendering HTML...");
        let html = self.render_html(&markdown, &document_title(input))?;
        log::debug!("Rendered {} bytes of HTML", html.len());

        progress.set_message("Launching browser...");
        let mut session = SessionGuard::new(
            self.browser
                .launch(self.viewport)
                .with_context(|| "Failed to launch browser")?,
        );

        progress.set_message("Loading page...");
        session
            .get()?
            .set_content(&html)
            .with_context(|| "Failed to load HTML into browser")?;

        progress.set_message("Printing PDF...");
        let pdf = session
            .get()?
            .export_pdf(&self.pdf)
            .with_context(|| "Failed to export PDF")?;

        session.close().with_context(|| "Failed to close browser")?;

        progress.set_message("Writing PDF...");
        write_atomically(output, &pdf)?;
        log::info!("Wrote {} ({} bytes)", output.display(), pdf.len());

        Ok(ConvertStats {
            pdf_bytes: pdf.len(),
        })
    }
}

/// Holds a browser session and closes it exactly once, either explicitly or
/// when dropped on an error path.
struct SessionGuard<S: BrowserSession> {
    session: Option<S>,
}

impl<S: BrowserSession> SessionGuard<S> {
    fn new(session: S) -> Self {
        SessionGuard {
            session: Some(session),
        }
    }

    fn get(&mut self) -> Result<&mut S> {
        self.session
            .as_mut()
            .ok_or_else(|| anyhow!("Browser session is already closed"))
    }

    fn close(mut self) -> Result<()> {
        match self.session.take() {
            Some(session) => session.close(),
            None => Ok(()),
        }
    }
}

impl<S: BrowserSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(e) = session.close() {
                log::error!("Failed to close browser: {e:#}");
            }
        }
    }
}

/// Error context marking a failure to read the Markdown input.
#[derive(Debug)]
pub struct UnreadableInput {
    pub path: PathBuf,
}

impl fmt::Display for UnreadableInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Failed to read {}", self.path.display())
    }
}

/// Read the Markdown source at `path` as UTF-8 text.
pub fn read_input(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| UnreadableInput {
        path: path.to_path_buf(),
    })
}

/// A short message for failures caused by the input file, or `None` when the
/// input was read fine and the error lies elsewhere.
pub fn input_failure(e: &anyhow::Error) -> Option<String> {
    let input = e.downcast_ref::<UnreadableInput>()?;
    let io = e
        .chain()
        .find_map(|cause| cause.downcast_ref::<std::io::Error>());
    Some(match io {
        Some(io) if io.kind() == std::io::ErrorKind::NotFound => {
            format!("input file not found: {}", input.path.display())
        }
        Some(io) => format!("cannot read input file {}: {io}", input.path.display()),
        None => format!("cannot read input file {}", input.path.display()),
    })
}

/// The output path for an input: same directory and stem, `.pdf` extension.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("pdf")
}

/// The document title: the input's file stem.
pub fn document_title(input: &Path) -> String {
    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_else(|| "Untitled".to_string())
}

/// Write `bytes` to a temporary file next to `path` and move it into place,
/// so a failed write never leaves a partial file at `path`.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    file.write_all(bytes)
        .with_context(|| format!("Failed to write PDF for {}", path.display()))?;

    // temp files are created owner-only; match an existing target or 0644
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = std::fs::metadata(path)
            .map(|metadata| metadata.permissions())
            .unwrap_or_else(|_| std::fs::Permissions::from_mode(0o644));
        file.as_file()
            .set_permissions(permissions)
            .with_context(|| format!("Failed to set permissions for {}", path.display()))?;
    }

    file.persist(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    Ok(())
}
