mod common;

use character_animation_core::{
    data::{BoolEvent, FloatEvent, MouthEvent, MouthState, SoundEvent, Track, TrackName, TransformEvent},
    pose::{InitialPose, Pose},
    sampling::{PoseSampler, SoundWindowOptions},
    transform::Transform,
    Sequence,
};
use common::approx;

const EPS: f64 = 1e-6;

fn flags(events: &[(f64, f64, bool)]) -> Track {
    Track::Bool(
        events
            .iter()
            .map(|(s, e, v)| BoolEvent {
                start_time: *s,
                end_time: *e,
                value: *v,
            })
            .collect(),
    )
}

fn moves(events: &[(f64, f64, Transform)]) -> Track {
    Track::Transform(
        events
            .iter()
            .map(|(s, e, t)| TransformEvent {
                start_time: *s,
                end_time: *e,
                target_transform: *t,
            })
            .collect(),
    )
}

fn floats(events: &[(f64, f64, f64)]) -> Track {
    Track::Float(
        events
            .iter()
            .map(|(s, e, v)| FloatEvent {
                start_time: *s,
                end_time: *e,
                target_value: *v,
            })
            .collect(),
    )
}

fn cues(starts: &[f64]) -> Track {
    Track::Sound(
        starts
            .iter()
            .map(|s| SoundEvent {
                start_time: *s,
                end_time: s + 0.5,
                gcs_uri: format!("gs://sfx/{s}.mp3"),
                volume: None,
            })
            .collect(),
    )
}

fn sampler(seq: Sequence) -> PoseSampler {
    PoseSampler::new(seq, EPS).expect("valid sequence")
}

#[test]
fn left_eye_end_to_end() {
    let seq = Sequence::default().with_track(TrackName::LeftEyeOpen, flags(&[(0.0, 2.0, false)]));
    let s = sampler(seq);
    assert!(!s.sample_pose_at_time(0.0).left_eye_open);
    assert!(!s.sample_pose_at_time(1.999).left_eye_open);
    assert!(s.sample_pose_at_time(2.0).left_eye_open);
    assert!(s.sample_pose_at_time(2.5).left_eye_open);
    assert_eq!(s.duration_sec(), 2.0);
}

#[test]
fn boolean_window_is_half_open() {
    let seq = Sequence::new(InitialPose {
        right_hand_visible: Some(false),
        ..InitialPose::default()
    })
    .with_track(TrackName::RightHandVisible, flags(&[(2.0, 4.0, true)]))
    .with_track(TrackName::LeftEyeOpen, flags(&[(9.0, 10.0, true)]));
    let s = sampler(seq);
    assert!(!s.sample_pose_at_time(1.999).right_hand_visible);
    assert!(s.sample_pose_at_time(2.0).right_hand_visible);
    assert!(s.sample_pose_at_time(3.999).right_hand_visible);
    assert!(!s.sample_pose_at_time(4.0).right_hand_visible);
}

#[test]
fn adjacent_window_takes_over_at_shared_boundary() {
    let seq = Sequence::default().with_track(
        TrackName::MouthState,
        Track::Mouth(vec![
            MouthEvent {
                start_time: 0.0,
                end_time: 1.0,
                mouth_state: MouthState::Open,
            },
            MouthEvent {
                start_time: 1.0,
                end_time: 2.0,
                mouth_state: MouthState::O,
            },
        ]),
    );
    let s = sampler(seq);
    assert_eq!(s.sample_pose_at_time(0.5).mouth_state, MouthState::Open);
    assert_eq!(s.sample_pose_at_time(1.0).mouth_state, MouthState::O);
    assert_eq!(s.sample_pose_at_time(-1.0).mouth_state, MouthState::Closed);
}

#[test]
fn unsorted_events_sample_as_if_sorted() {
    let seq = Sequence::default().with_track(
        TrackName::LeftHandVisible,
        flags(&[(5.0, 6.0, false), (1.0, 2.0, false)]),
    );
    let s = sampler(seq);
    assert!(!s.sample_pose_at_time(1.5).left_hand_visible);
    assert!(s.sample_pose_at_time(3.0).left_hand_visible);
    assert!(!s.sample_pose_at_time(5.5).left_hand_visible);
}

#[test]
fn transform_holds_default_before_first_event() {
    let target = Transform::new(100.0, -20.0, 2.0, 2.0);
    let seq = Sequence::default().with_track(
        TrackName::HeadTransform,
        moves(&[(2.0, 4.0, target)]),
    );
    let s = sampler(seq);
    for t in [-5.0, 0.0, 1.0, 1.999] {
        assert_eq!(s.sample_pose_at_time(t).head_transform, Transform::IDENTITY);
    }
}

#[test]
fn transform_interpolates_from_previous_target() {
    let a = Transform::new(10.0, 0.0, 1.0, 1.0);
    let b = Transform::new(30.0, 40.0, 3.0, 1.0);
    let seq = Sequence::default().with_track(
        TrackName::LeftHandTransform,
        moves(&[(0.0, 1.0, a), (2.0, 4.0, b), (10.0, 11.0, a)]),
    );
    let s = sampler(seq);

    // Start of the first window equals the default.
    assert_eq!(s.sample_pose_at_time(0.0).left_hand_transform, Transform::IDENTITY);
    // Hold between events.
    assert_eq!(s.sample_pose_at_time(1.5).left_hand_transform, a);
    // Start of the second window equals the previous target exactly.
    assert_eq!(s.sample_pose_at_time(2.0).left_hand_transform, a);
    // Halfway.
    let mid = s.sample_pose_at_time(3.0).left_hand_transform;
    approx(mid.translate_x, 20.0, 1e-9);
    approx(mid.translate_y, 20.0, 1e-9);
    approx(mid.scale_x, 2.0, 1e-9);
    // Approaching the end tends to the target.
    let near = s.sample_pose_at_time(4.0 - 1e-9).left_hand_transform;
    approx(near.translate_x, 30.0, 1e-6);
    // Exactly at the end the next segment's behavior applies: hold `b`.
    assert_eq!(s.sample_pose_at_time(4.0).left_hand_transform, b);
}

#[test]
fn zero_length_window_snaps_to_target() {
    let seq = Sequence::default()
        .with_track(TrackName::SurfaceLineOffset, floats(&[(1.0, 1.0, 80.0)]))
        .with_track(TrackName::LeftEyeOpen, flags(&[(0.0, 3.0, true)]));
    let s = sampler(seq);
    assert_eq!(s.sample_pose_at_time(0.5).surface_line_offset, 50.0);
    assert_eq!(s.sample_pose_at_time(1.0).surface_line_offset, 80.0);
    assert_eq!(s.sample_pose_at_time(2.0).surface_line_offset, 80.0);
}

#[test]
fn terminal_sample_shows_last_keyframe() {
    let target = Transform::new(-40.0, 12.0, 0.5, 0.5);
    let seq = Sequence::default()
        .with_track(TrackName::RightHandTransform, moves(&[(0.0, 5.0, target)]))
        .with_track(TrackName::MaskBoundaryOffset, floats(&[(1.0, 5.0, 120.0)]));
    let s = sampler(seq);
    assert_eq!(s.duration_sec(), 5.0);
    for t in [5.0, 6.0, 1e9] {
        let pose = s.sample_pose_at_time(t);
        approx(pose.right_hand_transform.translate_x, -40.0, 1e-4);
        approx(pose.right_hand_transform.scale_y, 0.5, 1e-4);
        approx(pose.mask_boundary_offset, 120.0, 1e-4);
    }
}

#[test]
fn sampling_is_deterministic() {
    let seq = Sequence::default()
        .with_track(
            TrackName::HeadTransform,
            moves(&[(0.5, 2.5, Transform::new(3.0, 4.0, 1.2, 0.8))]),
        )
        .with_track(TrackName::RightEyeOpen, flags(&[(0.0, 0.1, false), (1.0, 1.1, false)]))
        .with_track(TrackName::MaskBoundaryOffset, floats(&[(0.0, 3.0, 10.0)]));
    let s = sampler(seq);
    for i in -10..400 {
        let t = i as f64 * 0.0125;
        assert_eq!(s.sample_pose_at_time(t), s.sample_pose_at_time(t));
    }
}

#[test]
fn empty_sequence_samples_defaults() {
    let s = sampler(Sequence::default());
    assert_eq!(s.duration_sec(), 0.0);
    assert_eq!(s.sample_pose_at_time(0.0), Pose::default());
    assert_eq!(s.sample_pose_at_time(123.0), Pose::default());
}

#[test]
fn initial_pose_overrides_engine_defaults() {
    let seq = Sequence::new(InitialPose {
        left_eye_open: Some(false),
        mouth_state: Some(MouthState::Open),
        surface_line_offset: Some(75.0),
        head_masking_enabled: Some(false),
        ..InitialPose::default()
    });
    let pose = sampler(seq).sample_pose_at_time(0.0);
    assert!(!pose.left_eye_open);
    assert!(pose.right_eye_open);
    assert_eq!(pose.mouth_state, MouthState::Open);
    assert_eq!(pose.surface_line_offset, 75.0);
    assert!(!pose.head_masking_enabled);
}

#[test]
fn duration_is_max_end_across_tracks() {
    let base = Sequence::default()
        .with_track(TrackName::LeftEyeOpen, flags(&[(0.0, 2.0, false)]))
        .with_track(TrackName::SoundEvents, cues(&[3.0]));
    assert_eq!(sampler(base.clone()).duration_sec(), 3.5);

    let longer = base.with_track(TrackName::MaskBoundaryOffset, floats(&[(1.0, 7.25, 0.0)]));
    assert_eq!(sampler(longer).duration_sec(), 7.25);
}

#[test]
fn sound_window_filters_by_start_time() {
    let s = sampler(Sequence::default().with_track(TrackName::SoundEvents, cues(&[5.0, 1.0, 3.0])));
    let starts = |opts| -> Vec<f64> {
        s.sound_events_between(1.0, 5.0, opts)
            .into_iter()
            .map(|e| e.start_time)
            .collect()
    };
    assert_eq!(starts(SoundWindowOptions::default()), vec![1.0, 3.0]);
    assert_eq!(
        starts(SoundWindowOptions {
            include_start: false,
            include_end: true,
        }),
        vec![3.0, 5.0]
    );
    assert_eq!(
        starts(SoundWindowOptions {
            include_start: true,
            include_end: true,
        }),
        vec![1.0, 3.0, 5.0]
    );
}

#[test]
fn invalid_sequences_are_rejected() {
    let inverted = Sequence::default().with_track(TrackName::LeftEyeOpen, flags(&[(3.0, 2.0, true)]));
    assert!(PoseSampler::new(inverted, EPS).is_err());

    let mismatched = Sequence::default().with_track(TrackName::HeadTransform, flags(&[(0.0, 1.0, true)]));
    assert!(PoseSampler::new(mismatched, EPS).is_err());

    let nan = Sequence::default().with_track(TrackName::SurfaceLineOffset, floats(&[(f64::NAN, 1.0, 0.0)]));
    assert!(PoseSampler::new(nan, EPS).is_err());
}
