//! Timeline driver: ties the sampler, the audio scheduler and a render sink
//! to a playback clock.
//!
//! Preloading is split in two halves so hosts that keep the animator behind a
//! `RefCell` can drop their borrow across the await:
//! [`CharacterAnimator::begin_preload`] returns a `'static` future, and
//! [`CharacterAnimator::finish_init`] / [`CharacterAnimator::finish_update`]
//! consume its output. [`CharacterAnimator::init`] and
//! [`CharacterAnimator::update_sequence`] chain both halves for hosts that
//! own the animator outright.

use futures_util::future::{join, LocalBoxFuture};

use crate::audio::{preload_clips, AudioBackend, AudioScheduler};
use crate::character::CharacterDefinition;
use crate::config::AnimatorConfig;
use crate::data::{Sequence, SoundEvent};
use crate::error::{AnimatorError, Result};
use crate::pose::Pose;
use crate::render::{apply_pose, apply_static_images, preload_images, ImagePreload, RenderSink};
use crate::sampling::{PoseSampler, SoundWindowOptions};
use crate::timeline::{Clock, CueCallback, CueEdge, PlaybackState};

/// Output of one preload pass, tagged with the sequence generation it was
/// started for.
pub struct Preloaded<C> {
    generation: u64,
    clips: Vec<(String, C)>,
    images: Option<ImagePreload>,
}

impl<C> Preloaded<C> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn clip_count(&self) -> usize {
        self.clips.len()
    }
}

pub struct CharacterAnimator<A: AudioBackend, S: RenderSink> {
    config: AnimatorConfig,
    character: CharacterDefinition,
    sampler: PoseSampler,
    backend: A,
    audio: AudioScheduler<A::Clip>,
    sink: S,
    clock: Option<Clock>,
    /// Bumped on every accepted sequence replacement.
    generation: u64,
    images_ready: bool,
}

impl<A: AudioBackend, S: RenderSink> CharacterAnimator<A, S> {
    /// Validate inputs and build an animator. Playback controls fail with
    /// [`AnimatorError::NotReady`] until [`init`](Self::init) completes.
    pub fn new(
        sequence: Sequence,
        sink: S,
        character: CharacterDefinition,
        backend: A,
        config: AnimatorConfig,
    ) -> Result<Self> {
        config.validate()?;
        let sampler = PoseSampler::new(sequence, config.terminal_epsilon_sec)?;
        log::debug!(
            "animator created: duration {:.3}s, {} sound cues",
            sampler.duration_sec(),
            sampler.sound_events().len()
        );
        Ok(Self {
            audio: AudioScheduler::new(config.default_volume),
            config,
            character,
            sampler,
            backend,
            sink,
            clock: None,
            generation: 0,
            images_ready: false,
        })
    }

    // --- lifecycle ---

    /// Preload audio (and images, on the first pass) then build the clock and
    /// render the pose at time 0.
    pub async fn init(&mut self) {
        let preloaded = self.begin_preload().await;
        self.finish_init(preloaded);
    }

    /// Start loading every audio resource not yet cached, plus the character
    /// images if they have not been loaded before.
    pub fn begin_preload(&self) -> LocalBoxFuture<'static, Preloaded<A::Clip>> {
        let urls = self.audio.missing_urls(self.sampler.sound_events());
        let audio = preload_clips(&self.backend, urls, self.config.audio_preload_timeout());
        let images = (!self.images_ready)
            .then(|| preload_images(&self.sink, self.character.image_urls()));
        let generation = self.generation;
        Box::pin(async move {
            let (clips, images) = match images {
                Some(images) => {
                    let (clips, images) = join(audio, images).await;
                    (clips, Some(images))
                }
                None => (audio.await, None),
            };
            Preloaded {
                generation,
                clips,
                images,
            }
        })
    }

    pub fn finish_init(&mut self, preloaded: Preloaded<A::Clip>) {
        self.absorb(preloaded);
        self.rebuild_clock();
        apply_static_images(&mut self.sink, &self.character);
        self.render_at(0.0);
        log::info!(
            "animator ready: clock {:.3}s, {} audio resources cached",
            self.clock.as_ref().map_or(0.0, Clock::duration),
            self.audio.cached_len()
        );
    }

    /// Replace the sequence, then preload any audio it newly references.
    pub async fn update_sequence(&mut self, sequence: Sequence) -> Result<()> {
        self.replace_sequence(sequence)?;
        let preloaded = self.begin_preload().await;
        self.finish_update(preloaded);
        Ok(())
    }

    /// Validate and swap in `sequence`. Stops all audio; if the clock exists
    /// it is rebuilt, so position and play state reset. A rejected sequence
    /// leaves everything untouched.
    pub fn replace_sequence(&mut self, sequence: Sequence) -> Result<()> {
        self.sampler.replace(sequence)?;
        self.audio.stop_all();
        self.generation += 1;
        log::debug!(
            "sequence replaced (generation {}): duration {:.3}s",
            self.generation,
            self.sampler.duration_sec()
        );
        if self.clock.is_some() {
            self.rebuild_clock();
            self.render_at(0.0);
        }
        Ok(())
    }

    /// Install the resources from a preload pass started after a replacement.
    /// Results from superseded passes still extend the cache.
    pub fn finish_update(&mut self, preloaded: Preloaded<A::Clip>) {
        self.absorb(preloaded);
    }

    fn absorb(&mut self, preloaded: Preloaded<A::Clip>) {
        if preloaded.generation != self.generation {
            log::debug!(
                "preload for generation {} finished after generation {}; caching only",
                preloaded.generation,
                self.generation
            );
        }
        self.audio.install(preloaded.clips);
        if let Some(images) = preloaded.images {
            log::debug!(
                "image preload: {}/{} ready",
                images.requested - images.failed,
                images.requested
            );
            self.images_ready = true;
        }
    }

    fn rebuild_clock(&mut self) {
        self.audio.stop_all();
        let mut callbacks = Vec::new();
        for (cue_index, event) in self.sampler.sound_events().iter().enumerate() {
            callbacks.push(CueCallback {
                at: event.start_time,
                cue_index,
                edge: CueEdge::Start,
            });
            callbacks.push(CueCallback {
                at: event.end_time,
                cue_index,
                edge: CueEdge::End,
            });
        }
        let length = self
            .sampler
            .duration_sec()
            .max(self.config.min_clock_duration_sec);
        log::debug!("clock built: {length:.3}s, {} callbacks", callbacks.len());
        self.clock = Some(Clock::new(length, callbacks));
    }

    /// Stop all audio and drop the clock. Controls fail with `NotReady` afterward.
    pub fn dispose(&mut self) {
        self.audio.stop_all();
        self.clock = None;
    }

    // --- controls ---

    fn clock_mut(&mut self, operation: &'static str) -> Result<&mut Clock> {
        self.clock
            .as_mut()
            .ok_or(AnimatorError::NotReady { operation })
    }

    /// Rewind to 0 and play. Tracked audio duplicates are resumed.
    pub fn play(&mut self) -> Result<()> {
        self.clock_mut("play")?.play_from(0.0);
        self.audio.resume_all();
        self.render_at(0.0);
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.clock_mut("pause")?.pause();
        self.audio.pause_all();
        Ok(())
    }

    /// Continue from the current position. Does nothing once the clock has ended.
    ///
    /// Tracked duplicates are resumed, and cues spanning the position that
    /// have none (after a seek while paused) start at their offset.
    pub fn resume(&mut self) -> Result<()> {
        let clock = self.clock_mut("resume")?;
        clock.resume();
        if !clock.is_playing() {
            return Ok(());
        }
        let position = clock.position();
        self.audio.resume_all();
        self.audio
            .resync(self.sampler.sound_events(), position, true);
        Ok(())
    }

    /// Jump to `time_sec` (clamped to the clock), re-render and resync audio.
    pub fn seek(&mut self, time_sec: f64) -> Result<()> {
        self.audio.stop_all();
        let clock = self.clock_mut("seek")?;
        clock.seek(time_sec);
        let position = clock.position();
        let playing = clock.is_playing();
        self.render_at(position);
        self.audio
            .resync(self.sampler.sound_events(), position, playing);
        Ok(())
    }

    /// Advance the clock by `dt` seconds of host time, fire crossed cue edges,
    /// and render the pose at the new position. No-op unless playing.
    pub fn tick(&mut self, dt: f64) -> Result<()> {
        let clock = self.clock_mut("tick")?;
        if !clock.is_playing() {
            return Ok(());
        }
        let fired = clock.advance(dt);
        let position = clock.position();
        for callback in fired {
            self.dispatch(callback);
        }
        self.render_at(position);
        Ok(())
    }

    fn dispatch(&mut self, callback: CueCallback) {
        let Some(event) = self.sampler.sound_events().get(callback.cue_index) else {
            return;
        };
        match callback.edge {
            CueEdge::Start => self.audio.start_cue(callback.cue_index, event),
            CueEdge::End => self.audio.end_cue(callback.cue_index, event),
        }
    }

    fn render_at(&mut self, time_sec: f64) {
        let pose = self.sampler.sample_pose_at_time(time_sec);
        apply_pose(&mut self.sink, &self.character, &pose);
    }

    // --- queries ---

    pub fn duration_sec(&self) -> f64 {
        self.sampler.duration_sec()
    }

    pub fn sample_pose_at_time(&self, time_sec: f64) -> Pose {
        self.sampler.sample_pose_at_time(time_sec)
    }

    pub fn sound_events_between(
        &self,
        start_sec: f64,
        end_sec: f64,
        opts: SoundWindowOptions,
    ) -> Vec<&SoundEvent> {
        self.sampler.sound_events_between(start_sec, end_sec, opts)
    }

    /// `None` until the clock has been built.
    pub fn playback_state(&self) -> Option<PlaybackState> {
        self.clock.as_ref().map(Clock::state)
    }

    pub fn position_sec(&self) -> f64 {
        self.clock.as_ref().map_or(0.0, Clock::position)
    }

    pub fn is_ready(&self) -> bool {
        self.clock.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    // --- accessors ---

    pub fn config(&self) -> &AnimatorConfig {
        &self.config
    }

    pub fn character(&self) -> &CharacterDefinition {
        &self.character
    }

    pub fn sampler(&self) -> &PoseSampler {
        &self.sampler
    }

    pub fn audio(&self) -> &AudioScheduler<A::Clip> {
        &self.audio
    }

    pub fn backend(&self) -> &A {
        &self.backend
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
