//! Character Animation Core (host-agnostic)
//!
//! Samples a 2D character's pose from time-indexed tracks, schedules audio
//! cues against a playback clock, and pushes each pose through a render sink.
//! Hosts provide the audio backend and render sink; the web adapter lives in
//! `character-animation-wasm`.

pub mod animator;
pub mod audio;
pub mod character;
pub mod config;
pub mod data;
pub mod document;
pub mod error;
pub mod pose;
pub mod render;
pub mod sampling;
pub mod store;
pub mod timeline;
pub mod transform;
pub mod uri;

// Re-exports for consumers (adapters)
pub use animator::{CharacterAnimator, Preloaded};
pub use audio::{cue_key, preload_clips, unique_urls, AudioBackend, AudioClip, AudioScheduler};
pub use character::{CharacterDefinition, CharacterDocument, EyeImages, MouthImages};
pub use config::AnimatorConfig;
pub use data::{
    BoolEvent, FloatEvent, MouthEvent, MouthState, Sequence, SoundEvent, TimedEvent, Track,
    TrackKind, TrackName, TransformEvent,
};
pub use document::{parse_sequence_json, sequence_from_value};
pub use error::{AnimatorError, ResourceError, Result};
pub use pose::{InitialPose, Pose};
pub use render::{apply_pose, apply_static_images, BottomClip, ImagePreload, RenderSink, Role};
pub use sampling::{PoseSampler, SoundWindowOptions};
pub use store::TrackStore;
pub use timeline::{Clock, CueCallback, CueEdge, PlaybackState};
pub use transform::Transform;
pub use uri::normalize_uri;
