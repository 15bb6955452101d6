//! Sequence data model: typed events, named tracks and the sequence root.
//!
//! Each track kind carries its own event shape. Tracks are a tagged union
//! ([`Track`]) so the sampler matches on the kind instead of probing fields.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AnimatorError, Result};
use crate::pose::InitialPose;
use crate::transform::Transform;

/// Anything with a `[start_time, end_time)` window in sequence seconds.
pub trait TimedEvent {
    fn start_time(&self) -> f64;
    fn end_time(&self) -> f64;

    /// Half-open containment: active on `[start, end)`.
    #[inline]
    fn is_active_at(&self, t: f64) -> bool {
        t >= self.start_time() && t < self.end_time()
    }
}

macro_rules! impl_timed_event {
    ($($ty:ty),* $(,)?) => {
        $(
            impl TimedEvent for $ty {
                #[inline]
                fn start_time(&self) -> f64 {
                    self.start_time
                }
                #[inline]
                fn end_time(&self) -> f64 {
                    self.end_time
                }
            }
        )*
    };
}

/// Boolean flag held on its window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoolEvent {
    pub start_time: f64,
    pub end_time: f64,
    pub value: bool,
}

/// Transform keyframe: interpolated from the previous target toward `target_transform`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformEvent {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default, deserialize_with = "crate::transform::null_as_default")]
    pub target_transform: Transform,
}

/// Scalar keyframe: interpolated from the previous target toward `target_value`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FloatEvent {
    pub start_time: f64,
    pub end_time: f64,
    pub target_value: f64,
}

/// Mouth shape held (no interpolation) on its window.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MouthEvent {
    pub start_time: f64,
    pub end_time: f64,
    pub mouth_state: MouthState,
}

/// Audio cue: played at `start_time`, stopped at `end_time`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoundEvent {
    pub start_time: f64,
    pub end_time: f64,
    pub gcs_uri: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f32>,
}

impl_timed_event!(BoolEvent, TransformEvent, FloatEvent, MouthEvent, SoundEvent);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MouthState {
    Open,
    #[default]
    Closed,
    O,
}

impl MouthState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
            Self::O => "O",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TrackKind {
    Bool,
    Transform,
    Float,
    Mouth,
    Sound,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::Transform => "transform",
            Self::Float => "float",
            Self::Mouth => "mouth",
            Self::Sound => "sound",
        }
    }
}

/// Every track a sequence document can carry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrackName {
    LeftEyeOpen,
    RightEyeOpen,
    MouthState,
    LeftHandVisible,
    RightHandVisible,
    LeftHandTransform,
    RightHandTransform,
    HeadTransform,
    SurfaceLineOffset,
    SurfaceLineVisible,
    MaskBoundaryOffset,
    HeadMaskingEnabled,
    LeftHandMaskingEnabled,
    RightHandMaskingEnabled,
    SoundEvents,
}

impl TrackName {
    pub const ALL: [TrackName; 15] = [
        TrackName::LeftEyeOpen,
        TrackName::RightEyeOpen,
        TrackName::MouthState,
        TrackName::LeftHandVisible,
        TrackName::RightHandVisible,
        TrackName::LeftHandTransform,
        TrackName::RightHandTransform,
        TrackName::HeadTransform,
        TrackName::SurfaceLineOffset,
        TrackName::SurfaceLineVisible,
        TrackName::MaskBoundaryOffset,
        TrackName::HeadMaskingEnabled,
        TrackName::LeftHandMaskingEnabled,
        TrackName::RightHandMaskingEnabled,
        TrackName::SoundEvents,
    ];

    /// Document key for this track.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftEyeOpen => "sequence_left_eye_open",
            Self::RightEyeOpen => "sequence_right_eye_open",
            Self::MouthState => "sequence_mouth_state",
            Self::LeftHandVisible => "sequence_left_hand_visible",
            Self::RightHandVisible => "sequence_right_hand_visible",
            Self::LeftHandTransform => "sequence_left_hand_transform",
            Self::RightHandTransform => "sequence_right_hand_transform",
            Self::HeadTransform => "sequence_head_transform",
            Self::SurfaceLineOffset => "sequence_surface_line_offset",
            Self::SurfaceLineVisible => "sequence_surface_line_visible",
            Self::MaskBoundaryOffset => "sequence_mask_boundary_offset",
            Self::HeadMaskingEnabled => "sequence_head_masking_enabled",
            Self::LeftHandMaskingEnabled => "sequence_left_hand_masking_enabled",
            Self::RightHandMaskingEnabled => "sequence_right_hand_masking_enabled",
            Self::SoundEvents => "sequence_sound_events",
        }
    }

    pub fn from_key(key: &str) -> Option<TrackName> {
        Self::ALL.iter().copied().find(|n| n.as_str() == key)
    }

    pub fn kind(&self) -> TrackKind {
        match self {
            Self::LeftEyeOpen
            | Self::RightEyeOpen
            | Self::LeftHandVisible
            | Self::RightHandVisible
            | Self::SurfaceLineVisible
            | Self::HeadMaskingEnabled
            | Self::LeftHandMaskingEnabled
            | Self::RightHandMaskingEnabled => TrackKind::Bool,
            Self::LeftHandTransform | Self::RightHandTransform | Self::HeadTransform => {
                TrackKind::Transform
            }
            Self::SurfaceLineOffset | Self::MaskBoundaryOffset => TrackKind::Float,
            Self::MouthState => TrackKind::Mouth,
            Self::SoundEvents => TrackKind::Sound,
        }
    }
}

impl fmt::Display for TrackName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named, time-ordered list of events of one kind.
#[derive(Clone, Debug, PartialEq)]
pub enum Track {
    Bool(Vec<BoolEvent>),
    Transform(Vec<TransformEvent>),
    Float(Vec<FloatEvent>),
    Mouth(Vec<MouthEvent>),
    Sound(Vec<SoundEvent>),
}

fn sort_events<E: TimedEvent>(events: &mut [E]) {
    events.sort_by(|a, b| {
        a.start_time()
            .total_cmp(&b.start_time())
            .then(a.end_time().total_cmp(&b.end_time()))
    });
}

fn windows_of<E: TimedEvent>(events: &[E]) -> Vec<(f64, f64)> {
    events
        .iter()
        .map(|e| (e.start_time(), e.end_time()))
        .collect()
}

impl Track {
    pub fn empty(kind: TrackKind) -> Self {
        match kind {
            TrackKind::Bool => Track::Bool(Vec::new()),
            TrackKind::Transform => Track::Transform(Vec::new()),
            TrackKind::Float => Track::Float(Vec::new()),
            TrackKind::Mouth => Track::Mouth(Vec::new()),
            TrackKind::Sound => Track::Sound(Vec::new()),
        }
    }

    pub fn kind(&self) -> TrackKind {
        match self {
            Track::Bool(_) => TrackKind::Bool,
            Track::Transform(_) => TrackKind::Transform,
            Track::Float(_) => TrackKind::Float,
            Track::Mouth(_) => TrackKind::Mouth,
            Track::Sound(_) => TrackKind::Sound,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Track::Bool(e) => e.len(),
            Track::Transform(e) => e.len(),
            Track::Float(e) => e.len(),
            Track::Mouth(e) => e.len(),
            Track::Sound(e) => e.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(start_time, end_time)` of every event, in stored order.
    pub fn windows(&self) -> Vec<(f64, f64)> {
        match self {
            Track::Bool(e) => windows_of(e),
            Track::Transform(e) => windows_of(e),
            Track::Float(e) => windows_of(e),
            Track::Mouth(e) => windows_of(e),
            Track::Sound(e) => windows_of(e),
        }
    }

    /// Largest `end_time` in the track, or `None` when empty.
    pub fn max_end_time(&self) -> Option<f64> {
        self.windows()
            .into_iter()
            .map(|(_, end)| end)
            .reduce(f64::max)
    }

    /// Copy of this track sorted ascending by `(start_time, end_time)`.
    /// The sort is stable, so equal windows keep their supplied order.
    pub fn sorted(&self) -> Track {
        let mut out = self.clone();
        match &mut out {
            Track::Bool(e) => sort_events(e),
            Track::Transform(e) => sort_events(e),
            Track::Float(e) => sort_events(e),
            Track::Mouth(e) => sort_events(e),
            Track::Sound(e) => sort_events(e),
        }
        out
    }
}

/// Root document: every named track plus the initial pose.
///
/// Duration is never stored; see [`Sequence::duration_sec`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Sequence {
    tracks: BTreeMap<TrackName, Track>,
    pub initial_pose: InitialPose,
}

impl Sequence {
    pub fn new(initial_pose: InitialPose) -> Self {
        Self {
            tracks: BTreeMap::new(),
            initial_pose,
        }
    }

    /// Insert (or replace) a track. Kind agreement is checked by [`Sequence::validate`].
    pub fn with_track(mut self, name: TrackName, track: Track) -> Self {
        self.tracks.insert(name, track);
        self
    }

    pub fn set_track(&mut self, name: TrackName, track: Track) {
        self.tracks.insert(name, track);
    }

    pub fn track(&self, name: TrackName) -> Option<&Track> {
        self.tracks.get(&name)
    }

    pub fn tracks(&self) -> impl Iterator<Item = (TrackName, &Track)> {
        self.tracks.iter().map(|(name, track)| (*name, track))
    }

    /// `max(end_time)` over every event of every track, 0 when empty.
    pub fn duration_sec(&self) -> f64 {
        self.tracks
            .values()
            .filter_map(Track::max_end_time)
            .fold(0.0, f64::max)
    }

    /// Check per-event invariants and that each track matches its name's kind.
    pub fn validate(&self) -> Result<()> {
        for (name, track) in &self.tracks {
            let expected = name.kind();
            if track.kind() != expected {
                return Err(AnimatorError::TrackKindMismatch {
                    track: *name,
                    expected: expected.as_str(),
                    actual: track.kind().as_str(),
                });
            }
            for (index, (start, end)) in track.windows().into_iter().enumerate() {
                check_window(name.as_str(), index, start, end)?;
            }
        }
        Ok(())
    }
}

pub(crate) fn check_window(track: &str, index: usize, start: f64, end: f64) -> Result<()> {
    if !start.is_finite() {
        return Err(AnimatorError::NonFiniteTime {
            track: track.to_string(),
            index,
            field: "start_time",
        });
    }
    if !end.is_finite() {
        return Err(AnimatorError::NonFiniteTime {
            track: track.to_string(),
            index,
            field: "end_time",
        });
    }
    if end < start {
        return Err(AnimatorError::InvertedWindow {
            track: track.to_string(),
            index,
            start,
            end,
        });
    }
    Ok(())
}
