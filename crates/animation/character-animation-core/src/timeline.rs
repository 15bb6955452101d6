//! Playback clock with one-shot cue callbacks.
//!
//! The clock spans `[0, duration]`. The host advances it with `advance(dt)`;
//! every callback whose instant is crossed is returned exactly once, in time
//! order. Seeking moves the playhead without firing callbacks.

use serde::{Deserialize, Serialize};

/// Playback state of the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// Built, never started.
    Stopped,
    Playing,
    Paused,
    /// Reached the end of the clock.
    Ended,
}

impl PlaybackState {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Which edge of a sound cue a callback marks.
/// At equal instants `Start` sorts before `End`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CueEdge {
    Start,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CueCallback {
    pub at: f64,
    pub cue_index: usize,
    pub edge: CueEdge,
}

#[derive(Debug, Clone)]
pub struct Clock {
    duration: f64,
    position: f64,
    state: PlaybackState,
    callbacks: Vec<CueCallback>,
    next_callback: usize,
}

impl Clock {
    /// Build a stopped clock at position 0.
    pub fn new(duration: f64, mut callbacks: Vec<CueCallback>) -> Self {
        callbacks.sort_by(|a, b| {
            a.at.total_cmp(&b.at)
                .then(a.edge.cmp(&b.edge))
                .then(a.cue_index.cmp(&b.cue_index))
        });
        Self {
            duration: duration.max(0.0),
            position: 0.0,
            state: PlaybackState::Stopped,
            callbacks,
            next_callback: 0,
        }
    }

    #[inline]
    pub fn duration(&self) -> f64 {
        self.duration
    }

    #[inline]
    pub fn position(&self) -> f64 {
        self.position
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    pub fn callbacks(&self) -> &[CueCallback] {
        &self.callbacks
    }

    fn clamp(&self, t: f64) -> f64 {
        if t.is_nan() {
            return 0.0;
        }
        t.clamp(0.0, self.duration)
    }

    /// Start playing from `t`. Callbacks at or after `t` are armed.
    pub fn play_from(&mut self, t: f64) {
        self.position = self.clamp(t);
        self.next_callback = self.callbacks.partition_point(|c| c.at < self.position);
        self.state = PlaybackState::Playing;
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
    }

    /// Continue from the current position. No-op once ended.
    pub fn resume(&mut self) {
        if matches!(self.state, PlaybackState::Stopped | PlaybackState::Paused) {
            self.state = PlaybackState::Playing;
        }
    }

    /// Jump to `t` without firing callbacks; callbacks at exactly `t` are skipped.
    pub fn seek(&mut self, t: f64) {
        self.position = self.clamp(t);
        self.next_callback = self.callbacks.partition_point(|c| c.at <= self.position);
        if self.state == PlaybackState::Ended && self.position < self.duration {
            self.state = PlaybackState::Paused;
        }
    }

    /// Move forward by `dt` seconds while playing and return the crossed callbacks.
    pub fn advance(&mut self, dt: f64) -> Vec<CueCallback> {
        if !self.is_playing() {
            return Vec::new();
        }
        let step = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let target = (self.position + step).min(self.duration);

        let mut fired = Vec::new();
        while let Some(cb) = self.callbacks.get(self.next_callback) {
            if cb.at > target {
                break;
            }
            fired.push(*cb);
            self.next_callback += 1;
        }

        self.position = target;
        if self.position >= self.duration {
            self.state = PlaybackState::Ended;
        }
        fired
    }
}
