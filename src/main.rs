use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use newscast_tts::config::{BioSettings, NewscastConfig};
use newscast_tts::logger::init_logger;
use newscast_tts::notification::ConsoleProgressObserver;
use newscast_tts::store::{JsonFileStore, MemoryStore, StateStore};
use newscast_tts::NewscastTts;

#[derive(Parser, Debug)]
#[command(
    name = "newscast-tts",
    version,
    about = "Turn a news script into humanized speech with synchronized subtitles"
)]
struct Cli {
    /// Script file to read
    #[arg(short, long, value_name = "FILE", conflicts_with = "text")]
    input: Option<PathBuf>,

    /// Script text given inline
    #[arg(short, long)]
    text: Option<String>,

    /// Directory for the generated files
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Base name of the generated files (':' becomes '.')
    #[arg(short, long)]
    name: Option<String>,

    /// Humanizer settings (JSON, camelCase fields)
    #[arg(long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Library configuration (JSON)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// File that keeps the last used credential between runs
    #[arg(long, value_name = "FILE")]
    state_file: Option<PathBuf>,

    /// Override the chunk size limit in characters
    #[arg(long)]
    max_chars: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logger();
    let cli = Cli::parse();

    let script = match (&cli.input, &cli.text) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?,
        (None, Some(text)) => text.clone(),
        (None, None) => bail!("either --input or --text is required"),
    };

    let mut config = match &cli.config {
        Some(path) => NewscastConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => NewscastConfig::default(),
    };
    if let Some(max_chars) = cli.max_chars {
        config.max_chunk_chars = max_chars;
    }

    let settings = match &cli.settings {
        Some(path) => BioSettings::load(path)
            .with_context(|| format!("failed to load settings {}", path.display()))?,
        None => BioSettings::default(),
    };

    let store: Arc<dyn StateStore> = match &cli.state_file {
        Some(path) => Arc::new(
            JsonFileStore::open(path)
                .with_context(|| format!("failed to open state file {}", path.display()))?,
        ),
        None => Arc::new(MemoryStore::new()),
    };

    let mut tts = NewscastTts::from_env(config, store)?;
    tts.add_observer(Box::new(ConsoleProgressObserver::new()));

    let name = cli
        .name
        .clone()
        .unwrap_or_else(|| format!("newscast-{}", chrono::Local::now().format("%Y-%m-%d %H:%M")));

    let package = tts.generate_package(&script, &settings).await?;
    let paths = package.save(&cli.output_dir, &name)?;

    println!("{}", paths.wav.display());
    println!("{}", paths.srt.display());
    println!("{}", paths.zip.display());
    Ok(())
}
