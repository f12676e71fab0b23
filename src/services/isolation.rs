use crate::error::Result;
use crate::types::AudioData;

/// Separates the vocal stem from a full mix.
pub trait VocalIsolator: Send + Sync {
    fn isolate(&self, recording: AudioData) -> Result<AudioData>;
}

/// For recordings that already are a vocal stem.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughIsolator;

impl VocalIsolator for PassthroughIsolator {
    fn isolate(&self, recording: AudioData) -> Result<AudioData> {
        Ok(recording)
    }
}

impl<F> VocalIsolator for F
where
    F: Fn(AudioData) -> Result<AudioData> + Send + Sync,
{
    fn isolate(&self, recording: AudioData) -> Result<AudioData> {
        self(recording)
    }
}
