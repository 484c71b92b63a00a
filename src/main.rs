use anyhow::{Context, Result};
use browser::Chrome;
use cli::Cli;
use config::Configuration;
use converter::Converter;
use document::DocumentStyle;
use highlight::Highlighter;
use indicatif::{ProgressBar, ProgressStyle};
use markdown::MarkdownRenderer;
use std::process::ExitCode;
use std::time::Duration;

mod browser;
mod cli;
mod config;
mod converter;
mod document;
mod fonts;
mod highlight;
mod markdown;
mod styles;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_module_path(false)
        .init();

    use clap::Parser;
    let cli = Cli::parse();

    if let Err(e) = try_main(&cli) {
        if let Some(message) = converter::input_failure(&e) {
            eprintln!("{}: {message}", console::style("Error").red());
        } else {
            eprintln!("{}: {e:#}", console::style("Error").red());
        }
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main(cli: &Cli) -> Result<()> {
    let mut config = Configuration::load(cli.config.as_deref())?;
    if let Some(theme) = cli.theme {
        config.highlight.theme = theme;
    }

    let renderer = MarkdownRenderer::new(Highlighter::new(config.highlight.theme));
    let style = DocumentStyle {
        font_family: fonts::host_font_family(),
        stylesheet: config.style.stylesheet.clone(),
    };
    let progress = ProgressBar::new_spinner();
    progress.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("can parse progress style"),
    );
    let converter = Converter::new(renderer, style, Chrome::new(&config.browser))
        .with_progress(progress.clone());

    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| converter::default_output_path(&cli.input));

    if let Some(html_path) = &cli.html {
        let markdown = converter::read_input(&cli.input)?;
        let title = converter::document_title(&cli.input);
        let html = converter.render_html(&markdown, &title)?;
        std::fs::write(html_path, html)
            .with_context(|| format!("Failed to write HTML to {}", html_path.display()))?;
        println!("  HTML: {}", html_path.display());
    }

    progress.enable_steady_tick(Duration::from_millis(100));
    let stats = converter.convert(&cli.input, &output);
    progress.finish_and_clear();
    let stats = stats.with_context(|| format!("Failed to convert {}", cli.input.display()))?;

    let size = byte_unit::Byte::from_u128(stats.pdf_bytes as u128)
        .map(|size| {
            size.get_appropriate_unit(byte_unit::UnitType::Binary)
                .to_string()
        })
        .unwrap_or_else(|| format!("{} B", stats.pdf_bytes));
    println!(
        "{} {} ({size})",
        console::style("PDF generated:").green(),
        output.display()
    );

    Ok(())
}

