use std::fs;
use std::io;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::error;
use tracing_subscriber::EnvFilter;

use vocalyzer::audio::decoder::decode_audio;
use vocalyzer::config::AppConfig;
use vocalyzer::error::ErrorKind;
use vocalyzer::scoring::cli::{Cli, Command, ExtractArgs, ScoreArgs, StoreArgs};
use vocalyzer::scoring::session::{ScoreResponse, VocalAnalyser};
use vocalyzer::services::{JsonFeatureStore, PassthroughIsolator, ScoreBandFeedback};

type Analyser = VocalAnalyser<JsonFeatureStore, PassthroughIsolator>;

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let outcome = match cli.command {
        Command::Score(args) => handle_score(&args),
        Command::Extract(args) => handle_extract(&args),
    };
    match outcome {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout carries only the JSON result.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn handle_score(args: &ScoreArgs) -> Result<ExitCode> {
    args.validate()
        .context("Failed to validate command-line arguments")?;
    let analyser = build_analyser(&args.store, args.band)?;

    let recording = match decode_audio(&args.audio) {
        Ok(recording) => recording,
        Err(err) => {
            error!(path = %args.audio.display(), error = %err, "failed to decode recording");
            return emit(&ScoreResponse::failure(
                ErrorKind::InputError,
                format!("{err:#}"),
            ));
        }
    };

    if !args.report {
        return emit(&analyser.respond(&args.song_id, recording));
    }
    match analyser.analyse(&args.song_id, recording) {
        Ok(report) => {
            print!("{}", analyser.feedback_report(&report, &ScoreBandFeedback));
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(song_id = %args.song_id, kind = %err.kind(), error = %err, "scoring failed");
            emit(&ScoreResponse::failure(err.kind(), err.to_string()))
        }
    }
}

fn handle_extract(args: &ExtractArgs) -> Result<ExitCode> {
    fs::create_dir_all(&args.store.store).with_context(|| {
        format!("Failed to create feature store directory {:?}", args.store.store)
    })?;
    let analyser = build_analyser(&args.store, None)?;
    let recording = decode_audio(&args.audio)
        .with_context(|| format!("Failed to decode reference audio {:?}", args.audio))?;
    let features = analyser
        .publish_reference(&args.song_id, recording)
        .with_context(|| format!("Failed to publish reference for {:?}", args.song_id))?;

    let voiced = features
        .pitch_contour_hz
        .iter()
        .filter(|&&hz| hz > 0.0)
        .count();
    let summary = json!({
        "song_id": args.song_id,
        "frames": features.pitch_contour_hz.len(),
        "voiced_frames": voiced,
    });
    println!("{summary}");
    Ok(ExitCode::SUCCESS)
}

fn build_analyser(store: &StoreArgs, band: Option<usize>) -> Result<Analyser> {
    let app = AppConfig::from_override(store.config.as_deref(), &store.store)?;
    let analysis = app.analysis.with_band_radius(band);
    VocalAnalyser::new(
        JsonFeatureStore::new(app.store_root),
        PassthroughIsolator,
        &analysis,
    )
    .context("Invalid analysis settings")
}

fn emit(response: &ScoreResponse) -> Result<ExitCode> {
    let encoded = serde_json::to_string(response).context("Failed to encode response")?;
    println!("{encoded}");
    Ok(if response.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
