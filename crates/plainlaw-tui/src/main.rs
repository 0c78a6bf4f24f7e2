use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use plainlaw_core::mode::LEVEL_OPTIONS;
use plainlaw_core::{
    BackendClient, Config, InputMode, OutputSurface, PdfFile, SelectionSource, SimplicityLevel,
    Workflow,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;

#[derive(Parser)]
#[command(name = "plainlaw", version)]
#[command(about = "Simplify legal documents and ask questions about them")]
struct Cli {
    /// Base URL of the simplification backend
    #[arg(long, global = true)]
    backend_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive terminal UI (default)
    Tui,
    /// Simplify one document and print the result
    Simplify {
        /// PDF to upload for extraction
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Legal text to simplify (reads stdin when neither --file nor --text is given)
        #[arg(short, long)]
        text: Option<String>,
        /// Simplicity level sent to the backend
        #[arg(short, long)]
        level: Option<String>,
    },
    /// List the simplicity levels
    Levels,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load().unwrap_or_else(|_| Config::new());
    let backend_url = config.resolve_backend_url(cli.backend_url.as_deref());

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            init_file_logging()?;
            run_tui(&config, backend_url).await
        }
        Commands::Simplify { file, text, level } => {
            init_stderr_logging();
            let level = level
                .map(SimplicityLevel::new)
                .unwrap_or_else(|| default_level(&config));
            simplify_once(&backend_url, file, text, level).await
        }
        Commands::Levels => {
            for level in LEVEL_OPTIONS {
                println!("{}", level);
            }
            Ok(())
        }
    }
}

fn default_level(config: &Config) -> SimplicityLevel {
    config
        .default_level
        .clone()
        .map(SimplicityLevel::new)
        .unwrap_or_default()
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(io::stderr)
        .init();
}

/// The alternate screen owns stderr, so the TUI logs to a file.
fn init_file_logging() -> Result<()> {
    let dir = Config::config_dir()?;
    std::fs::create_dir_all(&dir)?;
    let log_file = File::create(dir.join("plainlaw.log"))
        .with_context(|| format!("could not create log file in {}", dir.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

async fn run_tui(config: &Config, backend_url: String) -> Result<()> {
    info!(backend = %backend_url, "starting TUI");

    let backend = Arc::new(BackendClient::new(&backend_url));
    let workflow = Workflow::new(default_level(config));
    let mut app = App::new(workflow, backend, backend_url);
    app.persist_level = true;

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            if let Some(event) = events.next().await {
                handler::handle_event(&mut app, event).await?;
            }
        }
        anyhow::Ok(())
    }
    .await;

    tui::restore()?;
    result
}

async fn simplify_once(
    backend_url: &str,
    file: Option<PathBuf>,
    text: Option<String>,
    level: SimplicityLevel,
) -> Result<()> {
    let backend = BackendClient::new(backend_url);
    let mut workflow = Workflow::new(level);

    match (file, text) {
        (Some(path), _) => {
            let pdf = PdfFile::load(&path).await?;
            workflow.set_mode(InputMode::Pdf);
            workflow.select_file(pdf, SelectionSource::Browse);
        }
        (None, Some(text)) => workflow.pasted_text_mut().push_str(&text),
        (None, None) => {
            io::stdin()
                .read_to_string(workflow.pasted_text_mut())
                .context("could not read stdin")?;
        }
    }

    workflow.submit(&backend).await?;

    match workflow.output() {
        OutputSurface::Warning(message) => anyhow::bail!("{}", message),
        output => println!("{}", output.plain_text()),
    }
    Ok(())
}
