//! Optional `md2pdf.toml` configuration.
//!
//! Every field has a default so an empty (or absent) file gives the stock
//! behaviour. Page geometry is fixed and not configurable here; see
//! [`crate::browser::PdfOptions`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Name of the configuration file picked up from the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "md2pdf.toml";

#[derive(Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Debug, Default)]
pub enum SyntaxTheme {
    #[default]
    #[serde(rename = "InspiredGitHub")]
    GitHub,
    #[serde(rename = "Solarized (light)")]
    SolarizedLight,
    #[serde(rename = "base16-ocean.light")]
    OceanLight,
}

impl fmt::Display for SyntaxTheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for SyntaxTheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        SyntaxTheme::all()
            .iter()
            .find(|theme| theme.name().eq_ignore_ascii_case(s))
            .copied()
            .with_context(|| {
                let names: Vec<&str> = SyntaxTheme::all().iter().map(|t| t.name()).collect();
                format!("Unknown theme `{s}`, expected one of: {}", names.join(", "))
            })
    }
}

impl SyntaxTheme {
    pub fn name(&self) -> &'static str {
        match self {
            SyntaxTheme::GitHub => "InspiredGitHub",
            SyntaxTheme::SolarizedLight => "Solarized (light)",
            SyntaxTheme::OceanLight => "base16-ocean.light",
        }
    }

    pub fn all() -> &'static [SyntaxTheme] {
        &[
            SyntaxTheme::GitHub,
            SyntaxTheme::SolarizedLight,
            SyntaxTheme::OceanLight,
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    /// Syntax highlighting theme for code blocks
    pub theme: SyntaxTheme,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Extra stylesheet appended after the built-in styles, read at render time
    pub stylesheet: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Chrome/Chromium executable; discovered on the host when unset
    pub executable: Option<PathBuf>,
    /// Seconds to wait for the browser to print before killing it
    pub timeout_secs: u64,
    /// Run the browser with its sandbox (disable when running as root)
    pub sandbox: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        BrowserConfig {
            executable: None,
            timeout_secs: 60,
            sandbox: true,
        }
    }
}

/// Complete configuration for an md2pdf run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub highlight: HighlightConfig,
    pub style: StyleConfig,
    pub browser: BrowserConfig,
}

impl Configuration {
    /// Load configuration from an explicit path, or from `md2pdf.toml` in the
    /// working directory if it exists.
    ///
    /// An explicit path must be readable; the implicit file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Configuration> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !path.is_file() {
                    log::debug!("no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Configuration::default());
                }
                path
            }
        };

        log::info!("Loading configuration from {}", path.display());
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to load {} contents", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse TOML in {}", path.display()))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn can_serialize_configuration() {
        let config = Configuration::default();
        toml::to_string(&config).expect("can serialize configuration to TOML");
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config: Configuration = toml::from_str("").expect("can parse empty config");
        assert_eq!(config.highlight.theme, SyntaxTheme::GitHub);
        assert_eq!(config.browser.timeout_secs, 60);
        assert!(config.browser.sandbox);
        assert!(config.browser.executable.is_none());
        assert!(config.style.stylesheet.is_none());
    }

    #[test]
    fn can_parse_partial_config() {
        let config: Configuration = toml::from_str(
            r#"
            [highlight]
            theme = "Solarized (light)"

            [browser]
            executable = "/usr/bin/chromium"
            sandbox = false
            "#,
        )
        .expect("can parse config");
        assert_eq!(config.highlight.theme, SyntaxTheme::SolarizedLight);
        assert_eq!(
            config.browser.executable,
            Some(PathBuf::from("/usr/bin/chromium"))
        );
        assert!(!config.browser.sandbox);
        assert_eq!(config.browser.timeout_secs, 60);
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let dir = tempfile::tempdir().expect("can create temp dir");
        let missing = dir.path().join("nope.toml");
        assert!(Configuration::load(Some(&missing)).is_err());
    }

    #[test]
    fn theme_names_parse_case_insensitively() {
        assert_eq!(
            "inspiredgithub".parse::<SyntaxTheme>().expect("known theme"),
            SyntaxTheme::GitHub
        );
        assert!("monokai".parse::<SyntaxTheme>().is_err());
    }
}
