//! Error taxonomy for the scoring engine and its collaborators.

use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// Convenient alias for results returned by the scoring modules.
pub type Result<T> = std::result::Result<T, ScoringError>;

/// Coarse failure category surfaced to callers alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputError,
    VoicingError,
    AlignmentError,
    UpstreamError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputError => "input_error",
            ErrorKind::VoicingError => "voicing_error",
            ErrorKind::AlignmentError => "alignment_error",
            ErrorKind::UpstreamError => "upstream_error",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side of a comparison a sequence belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContourRole {
    Reference,
    User,
}

impl Display for ContourRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ContourRole::Reference => f.write_str("reference"),
            ContourRole::User => f.write_str("user"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid audio: {reason}")]
    InvalidAudio { reason: String },
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },
    #[error("invalid request: {message}")]
    InvalidRequest { message: String },
    #[error("song \"{song_id}\" not found in feature store")]
    UnknownSong { song_id: String },
    #[error("{role} sequence is empty")]
    EmptySequence { role: ContourRole },
    #[error("{} contour contains no voiced frames", OptionalRole(.role))]
    NoVoicedFrames { role: Option<ContourRole> },
    #[error("alignment failed: {message}")]
    Alignment { message: String },
    #[error("{service} failed: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
}

impl ScoringError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScoringError::InvalidAudio { .. }
            | ScoringError::InvalidConfig { .. }
            | ScoringError::InvalidRequest { .. }
            | ScoringError::UnknownSong { .. }
            | ScoringError::EmptySequence { .. } => ErrorKind::InputError,
            ScoringError::NoVoicedFrames { .. } => ErrorKind::VoicingError,
            ScoringError::Alignment { .. } => ErrorKind::AlignmentError,
            ScoringError::Upstream { .. } => ErrorKind::UpstreamError,
        }
    }

    pub(crate) fn invalid_audio(reason: impl Into<String>) -> Self {
        Self::InvalidAudio {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    pub(crate) fn alignment(message: impl Into<String>) -> Self {
        Self::Alignment {
            message: message.into(),
        }
    }

    pub fn upstream(service: &'static str, err: impl Display) -> Self {
        Self::Upstream {
            service,
            message: err.to_string(),
        }
    }

    /// Tags a voicing failure with the side of the comparison it came from.
    pub(crate) fn for_role(self, role: ContourRole) -> Self {
        match self {
            ScoringError::NoVoicedFrames { role: None } => {
                ScoringError::NoVoicedFrames { role: Some(role) }
            }
            ScoringError::EmptySequence { .. } => ScoringError::EmptySequence { role },
            other => other,
        }
    }
}

struct OptionalRole<'a>(&'a Option<ContourRole>);

impl Display for OptionalRole<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(role) => write!(f, "{role}"),
            None => f.write_str("pitch"),
        }
    }
}
