use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ScoringError};
use crate::scoring::PitchContour;

const SERVICE: &str = "feature store";

/// Persisted reference features for one song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFeatures {
    /// One value per hop; `0` marks an unvoiced frame.
    pub pitch_contour_hz: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_rate: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hop_length: Option<usize>,
}

impl ReferenceFeatures {
    pub fn from_contour(contour: &PitchContour, sample_rate: u32, hop_length: usize) -> Self {
        Self {
            pitch_contour_hz: contour.to_hz(),
            sample_rate: Some(sample_rate),
            hop_length: Some(hop_length),
        }
    }

    pub fn contour(&self) -> PitchContour {
        PitchContour::from_hz(&self.pitch_contour_hz)
    }
}

/// Key-value lookup of reference features by song identifier.
pub trait FeatureStore: Send + Sync {
    /// Fails with [`ScoringError::UnknownSong`] on a miss and an upstream error when the backend fails.
    fn get(&self, song_id: &str) -> Result<ReferenceFeatures>;

    fn put(&self, song_id: &str, features: &ReferenceFeatures) -> Result<()>;
}

/// Directory of `<song_id>.json` blobs.
#[derive(Debug, Clone)]
pub struct JsonFeatureStore {
    root: PathBuf,
}

impl JsonFeatureStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, song_id: &str) -> Result<PathBuf> {
        validate_song_id(song_id)?;
        Ok(self.root.join(format!("{song_id}.json")))
    }
}

impl FeatureStore for JsonFeatureStore {
    fn get(&self, song_id: &str) -> Result<ReferenceFeatures> {
        let path = self.blob_path(song_id)?;
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                return Err(ScoringError::UnknownSong {
                    song_id: song_id.to_string(),
                })
            }
            Err(err) => {
                return Err(ScoringError::upstream(
                    SERVICE,
                    format!("failed to read {}: {err}", path.display()),
                ))
            }
        };
        let features: ReferenceFeatures = serde_json::from_str(&raw).map_err(|err| {
            ScoringError::upstream(
                SERVICE,
                format!("malformed features blob {}: {err}", path.display()),
            )
        })?;
        debug!(
            song_id,
            frames = features.pitch_contour_hz.len(),
            "loaded reference features"
        );
        Ok(features)
    }

    fn put(&self, song_id: &str, features: &ReferenceFeatures) -> Result<()> {
        let path = self.blob_path(song_id)?;
        let encoded = serde_json::to_string(features)
            .map_err(|err| ScoringError::upstream(SERVICE, err))?;
        fs::create_dir_all(&self.root).map_err(|err| {
            ScoringError::upstream(
                SERVICE,
                format!("failed to create {}: {err}", self.root.display()),
            )
        })?;
        fs::write(&path, encoded).map_err(|err| {
            ScoringError::upstream(SERVICE, format!("failed to write {}: {err}", path.display()))
        })?;
        debug!(song_id, path = %path.display(), "stored reference features");
        Ok(())
    }
}

/// In-process store, handy for embedding and tests.
#[derive(Debug, Default)]
pub struct MemoryFeatureStore {
    entries: RwLock<HashMap<String, ReferenceFeatures>>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_song(mut self, song_id: impl Into<String>, pitch_contour_hz: Vec<f64>) -> Self {
        self.entries
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                song_id.into(),
                ReferenceFeatures {
                    pitch_contour_hz,
                    sample_rate: None,
                    hop_length: None,
                },
            );
        self
    }
}

impl FeatureStore for MemoryFeatureStore {
    fn get(&self, song_id: &str) -> Result<ReferenceFeatures> {
        validate_song_id(song_id)?;
        let entries = self
            .entries
            .read()
            .map_err(|_| ScoringError::upstream(SERVICE, "store lock poisoned"))?;
        entries
            .get(song_id)
            .cloned()
            .ok_or_else(|| ScoringError::UnknownSong {
                song_id: song_id.to_string(),
            })
    }

    fn put(&self, song_id: &str, features: &ReferenceFeatures) -> Result<()> {
        validate_song_id(song_id)?;
        let mut entries = self
            .entries
            .write()
            .map_err(|_| ScoringError::upstream(SERVICE, "store lock poisoned"))?;
        entries.insert(song_id.to_string(), features.clone());
        Ok(())
    }
}

/// Song identifiers double as file stems, so they are restricted to `[A-Za-z0-9_.-]`.
fn validate_song_id(song_id: &str) -> Result<()> {
    let valid = !song_id.is_empty()
        && !song_id.starts_with('.')
        && song_id
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
    if valid {
        Ok(())
    } else {
        Err(ScoringError::invalid_request(format!(
            "invalid song id \"{song_id}\""
        )))
    }
}
