use crate::config::SyntaxTheme;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about)]
pub struct Cli {
    /// Markdown file to convert
    pub input: PathBuf,

    /// Where to write the PDF [default: the input path with a .pdf extension]
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file [default: md2pdf.toml in the working directory, if present]
    #[clap(short, long)]
    pub config: Option<PathBuf>,

    /// Syntax highlighting theme for code blocks, overriding the configuration
    #[clap(long)]
    pub theme: Option<SyntaxTheme>,

    /// Also write the intermediate HTML document to this path
    #[clap(long)]
    pub html: Option<PathBuf>,
}
