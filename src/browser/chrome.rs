//! Chrome/Chromium driven from the command line in headless mode.
//!
//! Headless Chrome prints a page with a single invocation, so a session stages
//! everything in a private temporary directory (the page, a throwaway profile,
//! the browser log) and runs the browser process when the PDF is requested.
//! The process is owned by the session until it exits; closing or dropping the
//! session kills and reaps it if it's still running.
//!
//! Page geometry is applied through an injected print stylesheet since the
//! command line has no switches for paper size or margins.

use super::{Browser, BrowserSession, PdfOptions, Viewport};
use crate::config::BrowserConfig;
use anyhow::{anyhow, bail, Context, Result};
use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Virtual time Chrome lets the page run before printing, letting fonts and
/// images settle.
const VIRTUAL_TIME_BUDGET_MS: u64 = 10_000;

/// Executable names searched for on `PATH`.
const EXECUTABLE_NAMES: &[&str] = &[
    "google-chrome",
    "google-chrome-stable",
    "chromium",
    "chromium-browser",
    "chrome",
    "msedge",
];

#[cfg(target_os = "macos")]
const INSTALL_LOCATIONS: &[&str] = &[
    "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
    "/Applications/Chromium.app/Contents/MacOS/Chromium",
    "/Applications/Microsoft Edge.app/Contents/MacOS/Microsoft Edge",
];

#[cfg(target_os = "windows")]
const INSTALL_LOCATIONS: &[&str] = &[
    r"C:\Program Files\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Google\Chrome\Application\chrome.exe",
    r"C:\Program Files (x86)\Microsoft\Edge\Application\msedge.exe",
];

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const INSTALL_LOCATIONS: &[&str] = &[];

/// A Chrome installation used to print pages.
#[derive(Debug, Clone)]
pub struct Chrome {
    executable: Option<PathBuf>,
    timeout: Duration,
    sandbox: bool,
}

impl Chrome {
    /// Configure a browser. The executable is resolved on each launch, so
    /// constructing this never fails.
    pub fn new(config: &BrowserConfig) -> Chrome {
        Chrome {
            executable: config.executable.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            sandbox: config.sandbox,
        }
    }

    /// Resolve the browser executable: the configured one, a well-known
    /// install location, or a known name on `PATH`.
    pub fn discover(&self) -> Result<PathBuf> {
        if let Some(executable) = &self.executable {
            if executable.is_file() {
                return Ok(executable.clone());
            }
            bail!(
                "Configured browser executable `{}` does not exist",
                executable.display()
            );
        }

        if let Some(found) = INSTALL_LOCATIONS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.is_file())
        {
            return Ok(found);
        }

        let search_path = std::env::var_os("PATH").unwrap_or_default();
        find_on_path(&search_path).ok_or_else(|| {
            anyhow!(
                "No Chrome or Chromium executable found; install one or set `browser.executable` in {}",
                crate::config::DEFAULT_CONFIG_FILE
            )
        })
    }
}

fn find_on_path(search_path: &std::ffi::OsStr) -> Option<PathBuf> {
    for name in EXECUTABLE_NAMES {
        for dir in std::env::split_paths(search_path) {
            let mut candidate = dir.join(name);
            if cfg!(windows) {
                candidate.set_extension("exe");
            }
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

impl Browser for Chrome {
    type Session = ChromeSession;

    fn launch(&self, viewport: Viewport) -> Result<ChromeSession> {
        let executable = self.discover()?;
        log::debug!("Using browser {}", executable.display());

        let workdir = tempfile::Builder::new()
            .prefix("md2pdf-")
            .tempdir()
            .with_context(|| "Failed to create browser working directory")?;
        std::fs::create_dir(workdir.path().join("profile"))
            .with_context(|| "Failed to create browser profile directory")?;

        Ok(ChromeSession {
            executable,
            timeout: self.timeout,
            sandbox: self.sandbox,
            viewport,
            workdir,
            content: None,
            child: None,
        })
    }
}

/// One Chrome page, staged in its own temporary directory.
#[derive(Debug)]
pub struct ChromeSession {
    executable: PathBuf,
    timeout: Duration,
    sandbox: bool,
    viewport: Viewport,
    workdir: TempDir,
    content: Option<String>,
    child: Option<Child>,
}

impl ChromeSession {
    fn page_path(&self) -> PathBuf {
        self.workdir.path().join("page.html")
    }

    fn pdf_path(&self) -> PathBuf {
        self.workdir.path().join("page.pdf")
    }

    fn log_path(&self) -> PathBuf {
        self.workdir.path().join("chrome.log")
    }

    fn args(&self, page: &Path, pdf: &Path) -> Vec<OsString> {
        let mut profile = OsString::from("--user-data-dir=");
        profile.push(self.workdir.path().join("profile"));
        let mut print_to = OsString::from("--print-to-pdf=");
        print_to.push(pdf);

        let mut args: Vec<OsString> = vec![
            "--headless".into(),
            "--disable-gpu".into(),
            "--disable-extensions".into(),
            "--no-first-run".into(),
            "--no-default-browser-check".into(),
            "--hide-scrollbars".into(),
            "--run-all-compositor-stages-before-draw".into(),
            format!("--virtual-time-budget={VIRTUAL_TIME_BUDGET_MS}").into(),
            format!(
                "--window-size={},{}",
                self.viewport.width, self.viewport.height
            )
            .into(),
            format!(
                "--force-device-scale-factor={}",
                self.viewport.device_scale_factor
            )
            .into(),
            "--no-pdf-header-footer".into(),
            "--print-to-pdf-no-header".into(),
            profile,
            print_to,
        ];
        if !self.sandbox {
            args.push("--no-sandbox".into());
        }
        args.push(page.as_os_str().to_os_string());
        args
    }

    /// Wait for the running browser, killing it if it overruns the timeout.
    fn wait(&mut self, deadline: Instant) -> Result<ExitStatus> {
        loop {
            let child = self
                .child
                .as_mut()
                .ok_or_else(|| anyhow!("Browser process is not running"))?;
            if let Some(status) = child
                .try_wait()
                .with_context(|| "Failed to poll browser process")?
            {
                self.child = None;
                return Ok(status);
            }
            if Instant::now() >= deadline {
                self.terminate()?;
                bail!(
                    "Browser did not finish printing within {} seconds",
                    self.timeout.as_secs_f32()
                );
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Kill and reap the browser process if it's still running.
    fn terminate(&mut self) -> Result<()> {
        if let Some(mut child) = self.child.take() {
            log::debug!("Killing browser process {}", child.id());
            // the process may have exited on its own since we last polled
            let _ = child.kill();
            child
                .wait()
                .with_context(|| "Failed to reap browser process")?;
        }
        Ok(())
    }

    fn browser_log(&self) -> String {
        std::fs::read_to_string(self.log_path())
            .map(|log| log.trim().to_string())
            .unwrap_or_default()
    }
}

impl BrowserSession for ChromeSession {
    fn set_content(&mut self, html: &str) -> Result<()> {
        self.content = Some(html.to_string());
        Ok(())
    }

    fn export_pdf(&mut self, options: &PdfOptions) -> Result<Vec<u8>> {
        let html = self
            .content
            .as_deref()
            .ok_or_else(|| anyhow!("No content was loaded before exporting"))?;

        let page = self.page_path();
        let pdf = self.pdf_path();
        std::fs::write(&page, inject_print_styles(html, options))
            .with_context(|| format!("Failed to stage page at {}", page.display()))?;

        let deadline = Instant::now().checked_add(self.timeout).ok_or_else(|| {
            anyhow!(
                "Browser timeout of {} seconds is too large",
                self.timeout.as_secs()
            )
        })?;

        let log = File::create(self.log_path())
            .with_context(|| "Failed to create browser log file")?;
        let args = self.args(&page, &pdf);
        log::debug!("Running {} {:?}", self.executable.display(), args);

        let child = Command::new(&self.executable)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn()
            .with_context(|| format!("Failed to launch {}", self.executable.display()))?;
        self.child = Some(child);

        let status = self.wait(deadline)?;
        if !status.success() {
            bail!("Browser exited with {status}: {}", self.browser_log());
        }

        let bytes = std::fs::read(&pdf).with_context(|| {
            format!(
                "Browser did not produce a PDF: {}",
                self.browser_log()
            )
        })?;
        if !bytes.starts_with(b"%PDF-") {
            bail!("Browser output is not a PDF ({} bytes)", bytes.len());
        }
        Ok(bytes)
    }

    fn close(mut self) -> Result<()> {
        self.terminate()
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.terminate() {
            log::error!("{e:#}");
        }
    }
}

/// Insert the print stylesheet at the end of the document head.
fn inject_print_styles(html: &str, options: &PdfOptions) -> String {
    let style = format!("<style>\n{}</style>\n", options.print_stylesheet());
    match html.find("</head>") {
        Some(at) => {
            let mut out = String::with_capacity(html.len() + style.len());
            out.push_str(&html[..at]);
            out.push_str(&style);
            out.push_str(&html[at..]);
            out
        }
        None => format!("{style}{html}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrome(executable: PathBuf, timeout: Duration) -> Chrome {
        Chrome {
            executable: Some(executable),
            timeout,
            sandbox: true,
        }
    }

    #[test]
    fn print_styles_go_before_head_end() {
        let html = "<html><head><title>x</title></head><body></body></html>";
        let out = inject_print_styles(html, &PdfOptions::default());
        let style_at = out.find("@page").expect("has page rule");
        let head_end = out.find("</head>").expect("still has head");
        assert!(style_at < head_end);
        assert!(out.ends_with("<body></body></html>"));
    }

    #[test]
    fn print_styles_are_prepended_without_head() {
        let out = inject_print_styles("<p>hi</p>", &PdfOptions::default());
        assert!(out.starts_with("<style>"));
        assert!(out.ends_with("<p>hi</p>"));
    }

    #[test]
    fn configured_executable_must_exist() {
        let browser = chrome(
            PathBuf::from("/definitely/not/chrome"),
            Duration::from_secs(1),
        );
        let err = browser.discover().expect_err("missing executable");
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn finds_executables_on_path() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let mut exe = dir.path().join("chromium");
        if cfg!(windows) {
            exe.set_extension("exe");
        }
        std::fs::write(&exe, b"").expect("can write fake executable");

        let found = find_on_path(dir.path().as_os_str()).expect("finds chromium");
        assert_eq!(found, exe);

        let empty = tempfile::tempdir().expect("can create temp dir");
        assert!(find_on_path(empty.path().as_os_str()).is_none());
    }

    #[test]
    fn args_describe_viewport_and_output() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let exe = dir.path().join("chrome");
        std::fs::write(&exe, b"").expect("can write fake executable");

        let mut browser = chrome(exe, Duration::from_secs(1));
        browser.sandbox = false;
        let session = browser.launch(Viewport::default()).expect("can launch");
        let args: Vec<String> = session
            .args(Path::new("page.html"), Path::new("out.pdf"))
            .into_iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        assert!(args.contains(&"--headless".to_string()));
        assert!(args.contains(&"--window-size=1200,1600".to_string()));
        assert!(args.contains(&"--force-device-scale-factor=2".to_string()));
        assert!(args.contains(&"--print-to-pdf=out.pdf".to_string()));
        assert!(args.contains(&"--no-sandbox".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("page.html"));
    }

    #[test]
    fn export_requires_content() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let exe = dir.path().join("chrome");
        std::fs::write(&exe, b"").expect("can write fake executable");

        let mut session = chrome(exe, Duration::from_secs(1))
            .launch(Viewport::default())
            .expect("can launch");
        assert!(session.export_pdf(&PdfOptions::default()).is_err());
        session.close().expect("can close");
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("fake-chrome");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("can write script");
        let mut perms = std::fs::metadata(&path).expect("has metadata").permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).expect("can make script executable");
        path
    }

    #[cfg(unix)]
    #[test]
    fn exports_pdf_written_by_browser() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let exe = script(
            dir.path(),
            r#"for arg in "$@"; do
    case "$arg" in
        --print-to-pdf=*) printf '%%PDF-1.4\n%%%%EOF\n' > "${arg#--print-to-pdf=}" ;;
    esac
done"#,
        );

        let mut session = chrome(exe, Duration::from_secs(10))
            .launch(Viewport::default())
            .expect("can launch");
        session
            .set_content("<html><head></head><body>hi</body></html>")
            .expect("can set content");
        let pdf = session
            .export_pdf(&PdfOptions::default())
            .expect("can export");
        assert!(pdf.starts_with(b"%PDF-1.4"));

        let staged = std::fs::read_to_string(session.page_path()).expect("page was staged");
        assert!(staged.contains("@page"));
        session.close().expect("can close");
    }

    #[cfg(unix)]
    #[test]
    fn failing_browser_reports_its_log() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let exe = script(dir.path(), "echo 'cannot open display' >&2\nexit 3");

        let mut session = chrome(exe, Duration::from_secs(10))
            .launch(Viewport::default())
            .expect("can launch");
        session.set_content("<p>hi</p>").expect("can set content");
        let err = session
            .export_pdf(&PdfOptions::default())
            .expect_err("browser failed");
        assert!(err.to_string().contains("cannot open display"));
    }

    #[cfg(unix)]
    #[test]
    fn slow_browser_is_killed() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let exe = script(dir.path(), "exec sleep 30");

        let mut session = chrome(exe, Duration::from_millis(200))
            .launch(Viewport::default())
            .expect("can launch");
        session.set_content("<p>hi</p>").expect("can set content");

        let started = Instant::now();
        let err = session
            .export_pdf(&PdfOptions::default())
            .expect_err("browser timed out");
        assert!(err.to_string().contains("did not finish"));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(session.child.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn oversized_timeout_is_an_error() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let exe = script(dir.path(), "exit 0");

        let mut session = chrome(exe, Duration::from_secs(u64::MAX))
            .launch(Viewport::default())
            .expect("can launch");
        session.set_content("<p>hi</p>").expect("can set content");

        let err = session
            .export_pdf(&PdfOptions::default())
            .expect_err("timeout cannot be represented");
        assert!(err.to_string().contains("too large"));
        assert!(session.child.is_none());
    }

    #[test]
    fn oversized_timeout_from_config_does_not_panic() {
        let config: BrowserConfig = toml::from_str(
            "executable = \"/definitely/not/chrome\"\ntimeout_secs = 9223372036854775807\n",
        )
        .expect("can parse browser config");
        let browser = Chrome::new(&config);
        assert_eq!(browser.timeout, Duration::from_secs(9223372036854775807));
        assert!(browser.launch(Viewport::default()).is_err());
    }
}
