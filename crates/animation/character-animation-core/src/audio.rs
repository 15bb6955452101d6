//! Audio cue scheduling.
//!
//! The scheduler never talks to a sound device directly. A host supplies an
//! [`AudioBackend`] that can load a URL into an [`AudioClip`]; the scheduler
//! keeps one preloaded clip per unique URL and plays independent duplicates
//! of it for each cue so overlapping plays of the same resource are possible.
//!
//! Failures here never reach the caller: a resource that fails or times out
//! during preload is left out of the cache, and a cue that refers to it is a
//! no-op. A rejected `play()` drops that duplicate, whether the host refuses
//! it on the spot or later through [`AudioClip::is_discarded`].

use std::time::Duration;

use futures_util::future::{join_all, select, Either, LocalBoxFuture};
use hashbrown::{HashMap, HashSet};

use crate::data::{SoundEvent, TimedEvent};
use crate::error::ResourceError;
use crate::uri::normalize_uri;

/// One playable audio instance.
pub trait AudioClip {
    /// Independent instance sharing the loaded media.
    fn duplicate(&self) -> Result<Self, ResourceError>
    where
        Self: Sized;

    fn set_volume(&mut self, volume: f32);

    /// Move the playhead, in seconds from the start of the clip.
    fn set_position(&mut self, position_sec: f64);

    /// Start or continue playback. An `Err` means the host refused to play.
    fn play(&mut self) -> Result<(), ResourceError>;

    fn pause(&mut self);

    fn is_playing(&self) -> bool;

    /// Set once the host has rejected playback after `play()` returned `Ok`.
    /// The scheduler forgets such duplicates and never plays them again.
    fn is_discarded(&self) -> bool {
        false
    }

    /// Pause and rewind to the start.
    fn stop(&mut self) {
        self.pause();
        self.set_position(0.0);
    }
}

/// Host hooks for loading audio and waiting on a timer.
pub trait AudioBackend {
    type Clip: AudioClip + 'static;

    /// Resolve once the clip at `url` can play through, or fail.
    fn load(&self, url: &str) -> LocalBoxFuture<'static, Result<Self::Clip, ResourceError>>;

    /// Resolve after `duration` has elapsed.
    fn sleep(&self, duration: Duration) -> LocalBoxFuture<'static, ()>;
}

/// Synthetic per-cue key: `index:uri:start:end`.
pub fn cue_key(index: usize, event: &SoundEvent) -> String {
    format!(
        "{index}:{}:{}:{}",
        event.gcs_uri, event.start_time, event.end_time
    )
}

/// Deduplicated, normalized URLs referenced by `events`, in first-seen order.
pub fn unique_urls<'a>(events: impl IntoIterator<Item = &'a SoundEvent>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for event in events {
        if event.gcs_uri.is_empty() {
            continue;
        }
        let url = normalize_uri(&event.gcs_uri);
        if seen.insert(url.clone()) {
            out.push(url);
        }
    }
    out
}

/// Load every URL concurrently, each raced against its own timeout.
///
/// The returned future never fails; resources that error or time out are
/// logged and omitted from the result.
pub fn preload_clips<B: AudioBackend>(
    backend: &B,
    urls: Vec<String>,
    timeout: Duration,
) -> LocalBoxFuture<'static, Vec<(String, B::Clip)>> {
    let timeout_ms = timeout.as_millis() as u64;
    let attempts: Vec<_> = urls
        .into_iter()
        .map(|url| {
            let load = backend.load(&url);
            let timer = backend.sleep(timeout);
            async move {
                match select(load, timer).await {
                    Either::Left((Ok(clip), _)) => Some((url, clip)),
                    Either::Left((Err(err), _)) => {
                        log::warn!("audio preload failed: {err}");
                        None
                    }
                    Either::Right(((), _)) => {
                        let err = ResourceError::TimedOut { url, timeout_ms };
                        log::warn!("audio preload skipped: {err}");
                        None
                    }
                }
            }
        })
        .collect();

    Box::pin(async move {
        let requested = attempts.len();
        let loaded: Vec<_> = join_all(attempts).await.into_iter().flatten().collect();
        log::debug!("audio preload: {}/{} resources ready", loaded.len(), requested);
        loaded
    })
}

/// Plays, stops and resynchronizes cue duplicates against a preloaded cache.
#[derive(Debug)]
pub struct AudioScheduler<C> {
    /// URL -> preloaded clip. Entries are only ever added.
    cache: HashMap<String, C>,
    /// Cue key -> playing (or paused) duplicate.
    active: HashMap<String, C>,
    default_volume: f32,
}

impl<C: AudioClip> AudioScheduler<C> {
    pub fn new(default_volume: f32) -> Self {
        Self {
            cache: HashMap::new(),
            active: HashMap::new(),
            default_volume,
        }
    }

    /// Add freshly loaded clips. Existing entries are kept.
    pub fn install(&mut self, clips: Vec<(String, C)>) {
        for (url, clip) in clips {
            self.cache.entry(url).or_insert(clip);
        }
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache.contains_key(url)
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// URLs referenced by `events` that are not in the cache yet.
    pub fn missing_urls<'a>(&self, events: impl IntoIterator<Item = &'a SoundEvent>) -> Vec<String> {
        unique_urls(events)
            .into_iter()
            .filter(|url| !self.cache.contains_key(url))
            .collect()
    }

    /// Number of tracked cue duplicates.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.active.contains_key(key)
    }

    fn spawn(&self, event: &SoundEvent) -> Option<C> {
        let url = normalize_uri(&event.gcs_uri);
        let Some(base) = self.cache.get(&url) else {
            log::trace!("no preloaded audio for '{url}', cue skipped");
            return None;
        };
        let mut clip = match base.duplicate() {
            Ok(clip) => clip,
            Err(err) => {
                log::warn!("could not duplicate preloaded audio: {err}");
                return None;
            }
        };
        clip.set_volume(self.cue_volume(event));
        Some(clip)
    }

    /// Cue volume, falling back to the default and clamped to `[0, 1]`.
    fn cue_volume(&self, event: &SoundEvent) -> f32 {
        let volume = event
            .volume
            .filter(|v| v.is_finite())
            .unwrap_or(self.default_volume);
        if !(0.0..=1.0).contains(&volume) {
            log::debug!("cue volume {volume} clamped to [0, 1]");
        }
        volume.clamp(0.0, 1.0)
    }

    /// Forget duplicates the host rejected after the fact.
    fn prune_discarded(&mut self) {
        self.active.retain(|key, clip| {
            if clip.is_discarded() {
                log::debug!("cue '{key}' was rejected by the host; dropped");
                false
            } else {
                true
            }
        });
    }

    fn track(&mut self, key: String, clip: C) {
        if let Some(mut previous) = self.active.insert(key, clip) {
            previous.stop();
        }
    }

    /// Cue start: play a fresh duplicate and track it under the cue key.
    pub fn start_cue(&mut self, index: usize, event: &SoundEvent) {
        let Some(mut clip) = self.spawn(event) else {
            return;
        };
        match clip.play() {
            Ok(()) => self.track(cue_key(index, event), clip),
            Err(err) => log::warn!("sound cue {index} dropped: {err}"),
        }
    }

    /// Cue end: stop and rewind that cue's duplicate if it is still playing.
    pub fn end_cue(&mut self, index: usize, event: &SoundEvent) {
        if let Some(mut clip) = self.active.remove(&cue_key(index, event)) {
            if !clip.is_discarded() && clip.is_playing() {
                clip.stop();
            }
        }
    }

    /// Stop, rewind and forget every tracked duplicate.
    pub fn stop_all(&mut self) {
        for (_, mut clip) in self.active.drain() {
            clip.stop();
        }
    }

    /// Pause every tracked duplicate, keeping its position.
    pub fn pause_all(&mut self) {
        self.prune_discarded();
        for clip in self.active.values_mut() {
            clip.pause();
        }
    }

    /// Resume every tracked duplicate; any that the host refuses are dropped.
    pub fn resume_all(&mut self) {
        self.prune_discarded();
        self.active.retain(|key, clip| match clip.play() {
            Ok(()) => true,
            Err(err) => {
                log::warn!("resume of cue '{key}' dropped: {err}");
                false
            }
        });
    }

    /// Start every cue whose window contains `t` at its intra-cue offset.
    /// Cues that already have a tracked duplicate are left alone. Nothing
    /// starts unless `playing` is set.
    pub fn resync(&mut self, events: &[SoundEvent], t: f64, playing: bool) {
        if !playing {
            return;
        }
        self.prune_discarded();
        for (index, event) in events.iter().enumerate() {
            if !event.is_active_at(t) || self.active.contains_key(&cue_key(index, event)) {
                continue;
            }
            let Some(mut clip) = self.spawn(event) else {
                continue;
            };
            clip.set_position(t - event.start_time);
            match clip.play() {
                Ok(()) => self.track(cue_key(index, event), clip),
                Err(err) => log::warn!("sound cue {index} dropped after seek: {err}"),
            }
        }
    }
}
