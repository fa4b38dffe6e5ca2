//! preview-render: render a LaTeX-dialect, Markdown or text file to HTML.
//!
//! Run with: cargo run --bin preview-render --features cli -- notes.tex

use clap::Parser;
use log::{debug, error, LevelFilter};
use preview_render::{ContentKind, RenderConfig, Renderer};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "preview-render")]
#[command(version)]
#[command(about = "Render LaTeX-dialect, Markdown or plain text to HTML", long_about = None)]
struct Cli {
    /// Input file (reads stdin if not provided)
    input: Option<PathBuf>,

    /// File type token: md, tex, or anything else for plain text (defaults to the input extension)
    #[arg(short = 't', long = "type")]
    file_type: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit a complete HTML page
    #[arg(short, long)]
    standalone: bool,

    /// Output file (writes stdout if not provided)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// More logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    if let Err(e) = run(&cli) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> preview_render::Result<()> {
    let mut config = match &cli.config {
        Some(path) => RenderConfig::from_file(path)?,
        None => RenderConfig::default(),
    };
    config.standalone |= cli.standalone;

    let content = match &cli.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let kind = match (&cli.file_type, &cli.input) {
        (Some(token), _) => ContentKind::from_file_type(token),
        (None, Some(path)) => ContentKind::from_path(path),
        (None, None) => ContentKind::Plain,
    };
    debug!("rendering {} bytes as {}", content.len(), kind);

    let renderer = Renderer::new(config)?;
    let html = renderer.render_kind(&content, kind);

    match &cli.output {
        Some(path) => fs::write(path, html)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(html.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
