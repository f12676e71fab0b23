use std::path::PathBuf;

use anyhow::{ensure, Result};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "vocalyzer",
    version,
    about = "Score a sung recording against a stored reference melody"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Score a recording and print the result as JSON.
    Score(ScoreArgs),
    /// Extract a reference pitch contour and store it under a song id.
    Extract(ExtractArgs),
}

#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Directory holding `<song-id>.json` reference features.
    #[arg(long, value_name = "DIR")]
    pub store: PathBuf,
    /// Optional JSON file overriding analysis settings.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ScoreArgs {
    #[arg(long = "song-id")]
    pub song_id: String,
    /// Recording to score (WAV, MP3, FLAC, OGG, ...).
    #[arg(long, value_name = "PATH")]
    pub audio: PathBuf,
    #[command(flatten)]
    pub store: StoreArgs,
    /// Sakoe-Chiba band radius in frames; unbounded when omitted.
    #[arg(long, value_name = "FRAMES")]
    pub band: Option<usize>,
    /// Print a markdown report with coaching text instead of JSON.
    #[arg(long)]
    pub report: bool,
}

impl ScoreArgs {
    pub fn validate(&self) -> Result<()> {
        if let Some(band) = self.band {
            ensure!(band > 0, "band radius must be at least 1 frame");
        }
        Ok(())
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    #[arg(long = "song-id")]
    pub song_id: String,
    /// Reference vocal recording.
    #[arg(long, value_name = "PATH")]
    pub audio: PathBuf,
    #[command(flatten)]
    pub store: StoreArgs,
}
