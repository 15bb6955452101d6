//! JSON ingestion for sequence documents.
//!
//! A document is a flat object: one key per track (see [`TrackName::as_str`])
//! holding an array of events, plus an optional `initial_pose` object.
//!
//! Notes:
//! - Absent or `null` track keys are treated as empty tracks.
//! - Any other non-array track value is rejected with [`AnimatorError::TrackNotArray`].
//! - `start_time`/`end_time` are checked before the rest of the event is decoded,
//!   so a missing time is reported by name rather than as a serde error.
//! - Unknown keys are ignored.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value as JsonValue};

use crate::data::{
    check_window, BoolEvent, FloatEvent, MouthEvent, Sequence, SoundEvent, Track, TrackKind,
    TrackName, TransformEvent,
};
use crate::error::{AnimatorError, Result};
use crate::pose::InitialPose;

const INITIAL_POSE_KEY: &str = "initial_pose";

/// Parse a sequence document from JSON text.
pub fn parse_sequence_json(s: &str) -> Result<Sequence> {
    let value: JsonValue = serde_json::from_str(s)?;
    sequence_from_value(value)
}

/// Build a validated [`Sequence`] from an already-parsed JSON value.
pub fn sequence_from_value(value: JsonValue) -> Result<Sequence> {
    let JsonValue::Object(obj) = value else {
        return Err(AnimatorError::DocumentParse {
            reason: "sequence document must be a JSON object".into(),
        });
    };

    let initial_pose = match obj.get(INITIAL_POSE_KEY) {
        None | Some(JsonValue::Null) => InitialPose::default(),
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| AnimatorError::DocumentParse {
            reason: format!("initial_pose: {e}"),
        })?,
    };

    let mut sequence = Sequence::new(initial_pose);
    for (key, value) in &obj {
        if key == INITIAL_POSE_KEY {
            continue;
        }
        let Some(name) = TrackName::from_key(key) else {
            log::debug!("ignoring unknown sequence key '{key}'");
            continue;
        };
        let items = match value {
            JsonValue::Null => continue,
            JsonValue::Array(items) => items,
            _ => {
                return Err(AnimatorError::TrackNotArray {
                    track: key.clone(),
                })
            }
        };
        sequence.set_track(name, parse_track(name, items)?);
    }
    sequence.validate()?;
    Ok(sequence)
}

fn parse_track(name: TrackName, items: &[JsonValue]) -> Result<Track> {
    let track = match name.kind() {
        TrackKind::Bool => Track::Bool(parse_events::<BoolEvent>(name, items)?),
        TrackKind::Transform => Track::Transform(parse_events::<TransformEvent>(name, items)?),
        TrackKind::Float => Track::Float(parse_events::<FloatEvent>(name, items)?),
        TrackKind::Mouth => Track::Mouth(parse_events::<MouthEvent>(name, items)?),
        TrackKind::Sound => Track::Sound(parse_events::<SoundEvent>(name, items)?),
    };
    Ok(track)
}

fn parse_events<E: DeserializeOwned>(name: TrackName, items: &[JsonValue]) -> Result<Vec<E>> {
    let track = name.as_str();
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let JsonValue::Object(obj) = item else {
            return Err(AnimatorError::MalformedEvent {
                track: track.to_string(),
                index,
                reason: "event must be an object".into(),
            });
        };
        let start = read_time(obj, track, index, "start_time")?;
        let end = read_time(obj, track, index, "end_time")?;
        check_window(track, index, start, end)?;
        let event = serde_json::from_value(item.clone()).map_err(|e| {
            AnimatorError::MalformedEvent {
                track: track.to_string(),
                index,
                reason: e.to_string(),
            }
        })?;
        out.push(event);
    }
    Ok(out)
}

fn read_time(
    obj: &Map<String, JsonValue>,
    track: &str,
    index: usize,
    field: &'static str,
) -> Result<f64> {
    match obj.get(field) {
        None | Some(JsonValue::Null) => Err(AnimatorError::MissingTime {
            track: track.to_string(),
            index,
            field,
        }),
        Some(v) => v.as_f64().ok_or_else(|| AnimatorError::MalformedEvent {
            track: track.to_string(),
            index,
            reason: format!("{field} must be a number"),
        }),
    }
}
