use std::f32::consts::PI;
use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;
use hound::{SampleFormat, WavSpec, WavWriter};
use predicates::prelude::*;
use tempfile::tempdir;

const SAMPLE_RATE: u32 = 22_050;

#[test]
fn extracted_reference_scores_its_source_perfectly() -> Result<()> {
    let temp = tempdir()?;
    let audio = temp.path().join("take.wav");
    let store = temp.path().join("features");
    write_sine_wave(&audio, 330.0)?;

    Command::cargo_bin("vocalyzer")?
        .args(["extract", "--song-id", "demo"])
        .arg("--audio")
        .arg(&audio)
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"song_id\":\"demo\""));
    assert!(store.join("demo.json").is_file());

    Command::cargo_bin("vocalyzer")?
        .args(["score", "--song-id", "demo", "--band", "8"])
        .arg("--audio")
        .arg(&audio)
        .arg("--store")
        .arg(&store)
        .assert()
        .success()
        .stdout(predicate::str::contains("{\"score\":100.0}"));
    Ok(())
}

#[test]
fn report_flag_prints_markdown() -> Result<()> {
    let temp = tempdir()?;
    let audio = temp.path().join("take.wav");
    write_sine_wave(&audio, 262.0)?;

    Command::cargo_bin("vocalyzer")?
        .args(["extract", "--song-id", "demo"])
        .arg("--audio")
        .arg(&audio)
        .arg("--store")
        .arg(temp.path())
        .assert()
        .success();

    Command::cargo_bin("vocalyzer")?
        .args(["score", "--song-id", "demo", "--report"])
        .arg("--audio")
        .arg(&audio)
        .arg("--store")
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("## Vocal Analysis Report"))
        .stdout(predicate::str::contains("**100.00%**"))
        .stdout(predicate::str::contains("Wonderful work on 'demo'"));
    Ok(())
}

#[test]
fn unknown_song_prints_classified_error() -> Result<()> {
    let temp = tempdir()?;
    let audio = temp.path().join("take.wav");
    write_sine_wave(&audio, 220.0)?;

    Command::cargo_bin("vocalyzer")?
        .args(["score", "--song-id", "missing"])
        .arg("--audio")
        .arg(&audio)
        .arg("--store")
        .arg(temp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"kind\":\"input_error\""))
        .stdout(predicate::str::contains("score").not());
    Ok(())
}

#[test]
fn undecodable_audio_is_an_input_error() -> Result<()> {
    let temp = tempdir()?;
    let bogus = temp.path().join("noise.wav");
    std::fs::write(&bogus, b"not really audio")?;

    Command::cargo_bin("vocalyzer")?
        .args(["score", "--song-id", "demo"])
        .arg("--audio")
        .arg(&bogus)
        .arg("--store")
        .arg(temp.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("input_error"));
    Ok(())
}

#[test]
fn zero_band_is_rejected() -> Result<()> {
    let temp = tempdir()?;
    Command::cargo_bin("vocalyzer")?
        .args(["score", "--song-id", "demo", "--audio", "take.wav", "--band", "0"])
        .arg("--store")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("band radius"));
    Ok(())
}

fn write_sine_wave(path: &Path, frequency: f32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for n in 0..SAMPLE_RATE as usize {
        let t = n as f32 / SAMPLE_RATE as f32;
        let sample = (2.0 * PI * frequency * t).sin() * 0.4;
        writer.write_sample((sample * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}
