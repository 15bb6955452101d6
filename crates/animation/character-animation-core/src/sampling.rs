//! Time-indexed pose sampling over the track store.
//!
//! Model:
//! - An event is active on the half-open window `[start_time, end_time)`.
//! - Bool/mouth tracks hold the value of the first active event, else the default.
//! - Transform/float tracks interpolate linearly from the previous target (the
//!   default before the first event) toward the active event's target, hold the
//!   previous target between events, and hold the last target after all events.
//! - Interpolated tracks sampled at or past the sequence end are pulled back by
//!   a small epsilon so the last keyframe is shown instead of the defaults.
//!   Step tracks use the raw time: a flag whose window ends at the sequence
//!   end reads as released there.
//!
//! Every field is sampled independently; there is no cross-track coupling.

use serde::{Deserialize, Serialize};

use crate::data::{MouthState, Sequence, SoundEvent, TimedEvent, Track, TrackName};
use crate::error::Result;
use crate::pose::Pose;
use crate::store::TrackStore;
use crate::transform::{Lerp, Transform};

/// Step sampling: value of the first event containing `t`, else `default`.
/// Events must be sorted by start time; the scan stops at the first event
/// starting after `t`.
pub fn sample_step<E, V>(events: &[E], t: f64, default: V, value: impl Fn(&E) -> V) -> V
where
    E: TimedEvent,
{
    for event in events {
        if event.start_time() > t {
            break;
        }
        if event.is_active_at(t) {
            return value(event);
        }
    }
    default
}

/// Interpolated sampling from the previous target toward the active event's target.
/// Zero-length windows snap straight to their target.
pub fn sample_interpolated<E, V>(events: &[E], t: f64, default: V, target: impl Fn(&E) -> V) -> V
where
    E: TimedEvent,
    V: Lerp,
{
    let mut previous = default;
    for event in events {
        let start = event.start_time();
        let end = event.end_time();
        if t < start {
            return previous;
        }
        if t < end {
            let progress = (t - start) / (end - start);
            return previous.lerp_to(&target(event), progress);
        }
        previous = target(event);
    }
    previous
}

/// Inclusive/exclusive bounds for [`PoseSampler::sound_events_between`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundWindowOptions {
    pub include_start: bool,
    pub include_end: bool,
}

impl Default for SoundWindowOptions {
    fn default() -> Self {
        Self {
            include_start: true,
            include_end: false,
        }
    }
}

/// Pure pose sampler backed by a [`TrackStore`].
#[derive(Debug)]
pub struct PoseSampler {
    store: TrackStore,
    terminal_epsilon: f64,
}

impl PoseSampler {
    pub fn new(sequence: Sequence, terminal_epsilon: f64) -> Result<Self> {
        Ok(Self {
            store: TrackStore::new(sequence)?,
            terminal_epsilon,
        })
    }

    /// Replace the backing sequence; all cached sorted tracks are dropped.
    pub fn replace(&mut self, sequence: Sequence) -> Result<()> {
        self.store.replace(sequence)
    }

    pub fn store(&self) -> &TrackStore {
        &self.store
    }

    #[inline]
    pub fn duration_sec(&self) -> f64 {
        self.store.duration_sec()
    }

    /// Time at which interpolated tracks are evaluated for a request at `t`.
    pub fn effective_time(&self, t: f64) -> f64 {
        let duration = self.duration_sec();
        if duration > 0.0 && t >= duration {
            (duration - self.terminal_epsilon).max(0.0)
        } else {
            t
        }
    }

    /// Sample the complete pose at `t` seconds. Safe for any `t`.
    pub fn sample_pose_at_time(&self, t: f64) -> Pose {
        let te = self.effective_time(t);
        let d = self.store.sequence().initial_pose.resolve();
        Pose {
            left_eye_open: self.sample_bool(TrackName::LeftEyeOpen, t, d.left_eye_open),
            right_eye_open: self.sample_bool(TrackName::RightEyeOpen, t, d.right_eye_open),
            mouth_state: self.sample_mouth(t, d.mouth_state),
            left_hand_visible: self.sample_bool(
                TrackName::LeftHandVisible,
                t,
                d.left_hand_visible,
            ),
            right_hand_visible: self.sample_bool(
                TrackName::RightHandVisible,
                t,
                d.right_hand_visible,
            ),
            left_hand_transform: self.sample_transform(
                TrackName::LeftHandTransform,
                te,
                d.left_hand_transform,
            ),
            right_hand_transform: self.sample_transform(
                TrackName::RightHandTransform,
                te,
                d.right_hand_transform,
            ),
            head_transform: self.sample_transform(TrackName::HeadTransform, te, d.head_transform),
            surface_line_offset: self.sample_float(
                TrackName::SurfaceLineOffset,
                te,
                d.surface_line_offset,
            ),
            surface_line_visible: self.sample_bool(
                TrackName::SurfaceLineVisible,
                t,
                d.surface_line_visible,
            ),
            mask_boundary_offset: self.sample_float(
                TrackName::MaskBoundaryOffset,
                te,
                d.mask_boundary_offset,
            ),
            head_masking_enabled: self.sample_bool(
                TrackName::HeadMaskingEnabled,
                t,
                d.head_masking_enabled,
            ),
            left_hand_masking_enabled: self.sample_bool(
                TrackName::LeftHandMaskingEnabled,
                t,
                d.left_hand_masking_enabled,
            ),
            right_hand_masking_enabled: self.sample_bool(
                TrackName::RightHandMaskingEnabled,
                t,
                d.right_hand_masking_enabled,
            ),
        }
    }

    /// Sorted sound cues.
    pub fn sound_events(&self) -> &[SoundEvent] {
        match self.store.track(TrackName::SoundEvents) {
            Track::Sound(events) => events,
            _ => &[],
        }
    }

    /// Sound cues whose `start_time` lies between `start_sec` and `end_sec`.
    /// The cue's own `end_time` is not considered.
    pub fn sound_events_between(
        &self,
        start_sec: f64,
        end_sec: f64,
        opts: SoundWindowOptions,
    ) -> Vec<&SoundEvent> {
        self.sound_events()
            .iter()
            .filter(|e| {
                let s = e.start_time;
                let after_start = if opts.include_start {
                    s >= start_sec
                } else {
                    s > start_sec
                };
                let before_end = if opts.include_end {
                    s <= end_sec
                } else {
                    s < end_sec
                };
                after_start && before_end
            })
            .collect()
    }

    fn sample_bool(&self, name: TrackName, t: f64, default: bool) -> bool {
        match self.store.track(name) {
            Track::Bool(events) => sample_step(events, t, default, |e| e.value),
            _ => default,
        }
    }

    fn sample_mouth(&self, t: f64, default: MouthState) -> MouthState {
        match self.store.track(TrackName::MouthState) {
            Track::Mouth(events) => sample_step(events, t, default, |e| e.mouth_state),
            _ => default,
        }
    }

    fn sample_transform(&self, name: TrackName, t: f64, default: Transform) -> Transform {
        match self.store.track(name) {
            Track::Transform(events) => {
                sample_interpolated(events, t, default, |e| e.target_transform)
            }
            _ => default,
        }
    }

    fn sample_float(&self, name: TrackName, t: f64, default: f64) -> f64 {
        match self.store.track(name) {
            Track::Float(events) => sample_interpolated(events, t, default, |e| e.target_value),
            _ => default,
        }
    }
}
