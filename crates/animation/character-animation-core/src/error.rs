//! Error types for the character animation engine.
//!
//! Two families exist:
//! - [`AnimatorError`] is returned to callers. Validation and readiness errors
//!   are fatal for the operation that produced them.
//! - [`ResourceError`] describes a media load or playback failure. These never
//!   leave the engine; they are logged and the affected resource is skipped.

use thiserror::Error;

use crate::data::TrackName;

/// Errors surfaced to the caller of the animator.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum AnimatorError {
    /// The sequence document is not a JSON object or could not be parsed.
    #[error("sequence document parse error: {reason}")]
    DocumentParse { reason: String },

    /// A known track key holds something other than an array.
    #[error("track '{track}' must be an array")]
    TrackNotArray { track: String },

    /// An event could not be decoded into the shape its track expects.
    #[error("track '{track}' event {index} is malformed: {reason}")]
    MalformedEvent {
        track: String,
        index: usize,
        reason: String,
    },

    /// `start_time` or `end_time` is missing or null.
    #[error("track '{track}' event {index} is missing {field}")]
    MissingTime {
        track: String,
        index: usize,
        field: &'static str,
    },

    /// `start_time` or `end_time` is NaN or infinite.
    #[error("track '{track}' event {index} has a non-finite {field}")]
    NonFiniteTime {
        track: String,
        index: usize,
        field: &'static str,
    },

    /// `end_time < start_time`.
    #[error("track '{track}' event {index} ends before it starts ({start} > {end})")]
    InvertedWindow {
        track: String,
        index: usize,
        start: f64,
        end: f64,
    },

    /// A typed track was stored under a name of a different kind.
    #[error("track '{track}' expects {expected} events but holds {actual} events")]
    TrackKindMismatch {
        track: TrackName,
        expected: &'static str,
        actual: &'static str,
    },

    /// A required character definition field is absent or empty.
    #[error("character definition is missing required field '{field}'")]
    MissingCharacterField { field: &'static str },

    /// The character definition could not be decoded.
    #[error("character definition parse error: {reason}")]
    CharacterParse { reason: String },

    /// Configuration payload could not be decoded or is out of range.
    #[error("invalid animator config: {reason}")]
    InvalidConfig { reason: String },

    /// A playback control was used before `init()` built the timeline.
    #[error("{operation} called before init(): the timeline has not been built")]
    NotReady { operation: &'static str },
}

impl AnimatorError {
    /// Get error category for logging.
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::DocumentParse { .. }
            | Self::TrackNotArray { .. }
            | Self::MalformedEvent { .. }
            | Self::MissingTime { .. }
            | Self::NonFiniteTime { .. }
            | Self::InvertedWindow { .. }
            | Self::TrackKindMismatch { .. } => "sequence",
            Self::MissingCharacterField { .. } | Self::CharacterParse { .. } => "character",
            Self::InvalidConfig { .. } => "config",
            Self::NotReady { .. } => "lifecycle",
        }
    }
}

impl From<serde_json::Error> for AnimatorError {
    fn from(err: serde_json::Error) -> Self {
        Self::DocumentParse {
            reason: err.to_string(),
        }
    }
}

/// Media failures. Always recovered locally by the engine.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ResourceError {
    #[error("failed to load '{url}': {reason}")]
    LoadFailed { url: String, reason: String },

    #[error("timed out after {timeout_ms} ms waiting for '{url}'")]
    TimedOut { url: String, timeout_ms: u64 },

    #[error("playback of '{url}' was rejected: {reason}")]
    PlaybackRejected { url: String, reason: String },
}

impl ResourceError {
    /// URL of the resource that failed.
    pub fn url(&self) -> &str {
        match self {
            Self::LoadFailed { url, .. }
            | Self::TimedOut { url, .. }
            | Self::PlaybackRejected { url, .. } => url,
        }
    }
}

/// Animator result type
pub type Result<T> = core::result::Result<T, AnimatorError>;
