mod common;

use std::time::Duration;

use character_animation_core::audio::{cue_key, preload_clips, unique_urls, AudioScheduler};
use character_animation_core::SoundEvent;
use common::{LoadBehavior, MockAudio, MockClip};
use futures_executor::block_on;

const BEEP: &str = "https://storage.googleapis.com/sfx/beep.mp3";
const BOOP: &str = "https://cdn.example.com/boop.mp3";

fn cue(start: f64, end: f64, uri: &str, volume: Option<f32>) -> SoundEvent {
    SoundEvent {
        start_time: start,
        end_time: end,
        gcs_uri: uri.to_string(),
        volume,
    }
}

fn scheduler_with(backend: &MockAudio, urls: &[&str]) -> AudioScheduler<MockClip> {
    let clips = block_on(preload_clips(
        backend,
        urls.iter().map(|u| u.to_string()).collect(),
        Duration::from_secs(5),
    ));
    let mut scheduler = AudioScheduler::new(1.0);
    scheduler.install(clips);
    scheduler
}

#[test]
fn unique_urls_normalize_and_dedupe() {
    let events = vec![
        cue(0.0, 1.0, "gs://sfx/beep.mp3", None),
        cue(1.0, 2.0, BEEP, None),
        cue(2.0, 3.0, "gs://cdn.example.com/boop.mp3", None),
        cue(3.0, 4.0, "", None),
    ];
    assert_eq!(unique_urls(&events), vec![BEEP.to_string(), BOOP.to_string()]);
}

#[test]
fn preload_tolerates_failures_and_timeouts() {
    let backend = MockAudio::new()
        .with_behavior("https://a/broken.mp3", LoadBehavior::Fail)
        .with_behavior("https://a/slow.mp3", LoadBehavior::Hang);
    let clips = block_on(preload_clips(
        &backend,
        vec![
            BEEP.to_string(),
            "https://a/broken.mp3".to_string(),
            "https://a/slow.mp3".to_string(),
            BOOP.to_string(),
        ],
        Duration::from_millis(10),
    ));
    let urls: Vec<&str> = clips.iter().map(|(url, _)| url.as_str()).collect();
    assert_eq!(urls, vec![BEEP, BOOP]);
    assert_eq!(backend.loads().len(), 4);
}

#[test]
fn cue_start_plays_a_fresh_duplicate_with_volume() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    let quiet = cue(0.0, 1.0, "gs://sfx/beep.mp3", Some(0.25));
    let loud = cue(0.5, 1.5, "gs://sfx/beep.mp3", None);

    scheduler.start_cue(0, &quiet);
    scheduler.start_cue(1, &loud);

    assert_eq!(scheduler.active_len(), 2);
    assert!(scheduler.is_active(&cue_key(0, &quiet)));
    assert!(scheduler.is_active(&cue_key(1, &loud)));
    assert_eq!(
        backend.plays(),
        vec![(BEEP.to_string(), 0.25, 0.0), (BEEP.to_string(), 1.0, 0.0)]
    );
}

#[test]
fn cue_end_stops_only_its_own_duplicate() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    let a = cue(0.0, 1.0, BEEP, None);
    let b = cue(0.5, 2.0, BEEP, None);
    scheduler.start_cue(0, &a);
    scheduler.start_cue(1, &b);

    scheduler.end_cue(0, &a);
    assert!(!scheduler.is_active(&cue_key(0, &a)));
    assert!(scheduler.is_active(&cue_key(1, &b)));
    assert_eq!(backend.log.borrow().stops.len(), 1);

    // Ending twice is harmless.
    scheduler.end_cue(0, &a);
    assert_eq!(backend.log.borrow().stops.len(), 1);
}

#[test]
fn uncached_resource_is_a_silent_noop() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    scheduler.start_cue(0, &cue(0.0, 1.0, "https://a/missing.mp3", None));
    assert_eq!(scheduler.active_len(), 0);
    assert!(backend.plays().is_empty());
}

#[test]
fn rejected_play_discards_the_duplicate() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    backend.reject_play_of(BEEP);
    scheduler.start_cue(0, &cue(0.0, 1.0, BEEP, None));
    assert_eq!(scheduler.active_len(), 0);
    assert_eq!(backend.log.borrow().rejected, vec![BEEP.to_string()]);
}

#[test]
fn stop_all_rewinds_and_forgets() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP, BOOP]);
    scheduler.start_cue(0, &cue(0.0, 1.0, BEEP, None));
    scheduler.start_cue(1, &cue(0.0, 1.0, BOOP, None));
    scheduler.stop_all();
    assert_eq!(scheduler.active_len(), 0);
    assert_eq!(backend.log.borrow().stops.len(), 2);
    assert_eq!(scheduler.cached_len(), 2);
}

#[test]
fn pause_keeps_duplicates_and_resume_replays_them() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    scheduler.start_cue(0, &cue(0.0, 1.0, BEEP, None));
    scheduler.pause_all();
    assert_eq!(scheduler.active_len(), 1);
    assert_eq!(backend.log.borrow().pauses.len(), 1);

    scheduler.resume_all();
    assert_eq!(scheduler.active_len(), 1);
    assert_eq!(backend.plays().len(), 2);

    backend.reject_play_of(BEEP);
    scheduler.pause_all();
    scheduler.resume_all();
    assert_eq!(scheduler.active_len(), 0);
}

#[test]
fn resync_starts_active_cues_at_their_offset() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP, BOOP]);
    let events = vec![
        cue(0.0, 2.0, BEEP, None),
        cue(1.0, 3.0, BOOP, Some(0.5)),
        cue(2.5, 4.0, BEEP, None),
    ];

    scheduler.resync(&events, 1.5, false);
    assert_eq!(scheduler.active_len(), 0);

    scheduler.resync(&events, 1.5, true);
    assert_eq!(scheduler.active_len(), 2);
    let plays = backend.plays();
    assert_eq!(plays[0], (BEEP.to_string(), 1.0, 1.5));
    assert_eq!(plays[1], (BOOP.to_string(), 0.5, 0.5));
}

#[test]
fn late_rejection_is_dropped_and_never_replayed() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    backend.reject_play_later_of(BEEP);
    let beep = cue(0.0, 1.0, BEEP, None);

    scheduler.start_cue(0, &beep);
    assert_eq!(backend.plays().len(), 1);

    scheduler.pause_all();
    assert_eq!(scheduler.active_len(), 0);
    assert!(backend.log.borrow().pauses.is_empty());
    scheduler.resume_all();
    assert_eq!(backend.plays().len(), 1);
}

#[test]
fn cue_end_of_late_rejection_does_not_stop_again() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    backend.reject_play_later_of(BEEP);
    let beep = cue(0.0, 1.0, BEEP, None);

    scheduler.start_cue(0, &beep);
    scheduler.end_cue(0, &beep);
    assert_eq!(scheduler.active_len(), 0);
    assert!(backend.log.borrow().stops.is_empty());
}

#[test]
fn cue_volume_is_clamped_to_unit_range() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    scheduler.start_cue(0, &cue(0.0, 1.0, BEEP, Some(7.5)));
    scheduler.start_cue(1, &cue(0.0, 1.0, BEEP, Some(-0.5)));
    scheduler.start_cue(2, &cue(0.0, 1.0, BEEP, Some(f32::NAN)));
    let volumes: Vec<f32> = backend.plays().iter().map(|(_, v, _)| *v).collect();
    assert_eq!(volumes, vec![1.0, 0.0, 1.0]);
}

#[test]
fn resync_leaves_tracked_cues_alone() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    let events = vec![cue(0.0, 2.0, BEEP, None)];
    scheduler.resync(&events, 0.5, true);
    scheduler.resync(&events, 0.75, true);
    assert_eq!(scheduler.active_len(), 1);
    assert_eq!(backend.plays(), vec![(BEEP.to_string(), 1.0, 0.5)]);
}

#[test]
fn install_never_replaces_cached_entries() {
    let backend = MockAudio::new();
    let mut scheduler = scheduler_with(&backend, &[BEEP]);
    let events = vec![cue(0.0, 1.0, BEEP, None), cue(0.0, 1.0, BOOP, None)];
    assert_eq!(scheduler.missing_urls(&events), vec![BOOP.to_string()]);

    let again = block_on(preload_clips(
        &backend,
        vec![BEEP.to_string(), BOOP.to_string()],
        Duration::from_secs(1),
    ));
    scheduler.install(again);
    assert_eq!(scheduler.cached_len(), 2);
    assert!(scheduler.missing_urls(&events).is_empty());
}
