use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::scoring::alignment::{AlignmentConfig, AlignmentEngine};
use crate::scoring::features::{ContourNormalizer, NormalizerConfig, PitchTracker, TrackerConfig};

/// Sample rate every recording is brought to before pitch tracking.
pub const DEFAULT_SAMPLE_RATE: u32 = 22_050;

/// Tunables for the whole scoring pipeline; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub sample_rate: u32,
    pub tracker: TrackerConfig,
    pub normalizer: NormalizerConfig,
    pub alignment: AlignmentConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            tracker: TrackerConfig::default(),
            normalizer: NormalizerConfig::default(),
            alignment: AlignmentConfig::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.sample_rate == 0 {
            return Err(crate::error::ScoringError::invalid_config(
                "sample_rate must be positive",
            ));
        }
        PitchTracker::new(self.tracker.clone())?.supports_rate(self.sample_rate)?;
        ContourNormalizer::new(self.normalizer)?;
        AlignmentEngine::new(self.alignment)?;
        Ok(())
    }

    pub fn with_band_radius(mut self, radius: Option<usize>) -> Self {
        if radius.is_some() {
            self.alignment.band_radius = radius;
        }
        self
    }
}

/// Settings resolved from the command line: analysis tunables plus the feature store location.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub analysis: AnalysisConfig,
    pub store_root: PathBuf,
}

impl AppConfig {
    pub fn from_override(settings: Option<&Path>, store_root: &Path) -> Result<Self> {
        let analysis = match settings {
            Some(path) => load_settings(path)?,
            None => AnalysisConfig::default(),
        };
        analysis
            .validate()
            .context("analysis settings failed validation")?;
        Ok(Self {
            analysis,
            store_root: canonicalize_dir(store_root)?,
        })
    }
}

fn load_settings(path: &Path) -> Result<AnalysisConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file {:?}", path))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse settings file {:?}", path))
}

fn canonicalize_dir(path: &Path) -> Result<PathBuf> {
    let canonical = path
        .canonicalize()
        .with_context(|| format!("failed to resolve feature store directory at {:?}", path))?;
    if canonical.is_dir() {
        Ok(canonical)
    } else {
        Err(anyhow!("feature store path {:?} is not a directory", canonical))
    }
}
