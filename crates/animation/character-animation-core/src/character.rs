//! Static per-character metadata: image URLs for each discrete visual state
//! and the geometry used by masking and surface-line placement.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::data::MouthState;
use crate::error::{AnimatorError, Result};
use crate::uri::{normalize_opt, normalize_uri};

/// Character definition as stored (storage-bucket URIs, every field optional).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterDocument {
    pub height: Option<f64>,
    pub surface_line_gcs_uri: Option<String>,
    pub left_eye_open_gcs_uri: Option<String>,
    pub left_eye_closed_gcs_uri: Option<String>,
    pub right_eye_open_gcs_uri: Option<String>,
    pub right_eye_closed_gcs_uri: Option<String>,
    pub mouth_open_gcs_uri: Option<String>,
    pub mouth_closed_gcs_uri: Option<String>,
    pub mouth_o_gcs_uri: Option<String>,
    pub head_gcs_uri: Option<String>,
    pub left_hand_gcs_uri: Option<String>,
    pub right_hand_gcs_uri: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct EyeImages {
    pub open: Option<String>,
    pub closed: Option<String>,
}

impl EyeImages {
    pub fn url(&self, open: bool) -> Option<&str> {
        if open {
            self.open.as_deref()
        } else {
            self.closed.as_deref()
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct MouthImages {
    pub open: Option<String>,
    pub closed: Option<String>,
    pub o: Option<String>,
}

impl MouthImages {
    pub fn url(&self, state: MouthState) -> Option<&str> {
        match state {
            MouthState::Open => self.open.as_deref(),
            MouthState::Closed => self.closed.as_deref(),
            MouthState::O => self.o.as_deref(),
        }
    }
}

/// Validated character with every URL already normalized to HTTP(S).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CharacterDefinition {
    pub height: f64,
    pub surface_line_url: String,
    pub left_eye: EyeImages,
    pub right_eye: EyeImages,
    pub mouth: MouthImages,
    pub head_url: Option<String>,
    pub left_hand_url: Option<String>,
    pub right_hand_url: Option<String>,
}

impl CharacterDefinition {
    pub fn from_json(s: &str) -> Result<Self> {
        let value: JsonValue =
            serde_json::from_str(s).map_err(|e| AnimatorError::CharacterParse {
                reason: e.to_string(),
            })?;
        Self::from_value(value)
    }

    pub fn from_value(value: JsonValue) -> Result<Self> {
        let doc: CharacterDocument =
            serde_json::from_value(value).map_err(|e| AnimatorError::CharacterParse {
                reason: e.to_string(),
            })?;
        Self::try_from(doc)
    }

    /// Every image URL the renderer may display, deduplicated, in a stable order.
    pub fn image_urls(&self) -> Vec<String> {
        let candidates = [
            Some(self.surface_line_url.as_str()),
            self.left_eye.open.as_deref(),
            self.left_eye.closed.as_deref(),
            self.right_eye.open.as_deref(),
            self.right_eye.closed.as_deref(),
            self.mouth.open.as_deref(),
            self.mouth.closed.as_deref(),
            self.mouth.o.as_deref(),
            self.head_url.as_deref(),
            self.left_hand_url.as_deref(),
            self.right_hand_url.as_deref(),
        ];
        let mut out: Vec<String> = Vec::new();
        for url in candidates.into_iter().flatten() {
            if !url.is_empty() && !out.iter().any(|u| u == url) {
                out.push(url.to_string());
            }
        }
        out
    }
}

impl TryFrom<CharacterDocument> for CharacterDefinition {
    type Error = AnimatorError;

    fn try_from(doc: CharacterDocument) -> Result<Self> {
        let surface_line = doc
            .surface_line_gcs_uri
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(AnimatorError::MissingCharacterField {
                field: "surface_line_gcs_uri",
            })?;
        let height = doc.height.ok_or(AnimatorError::MissingCharacterField { field: "height" })?;
        if !height.is_finite() || height < 0.0 {
            return Err(AnimatorError::CharacterParse {
                reason: format!("height must be finite and >= 0, got {height}"),
            });
        }

        Ok(Self {
            height,
            surface_line_url: normalize_uri(surface_line),
            left_eye: EyeImages {
                open: normalize_opt(doc.left_eye_open_gcs_uri.as_deref()),
                closed: normalize_opt(doc.left_eye_closed_gcs_uri.as_deref()),
            },
            right_eye: EyeImages {
                open: normalize_opt(doc.right_eye_open_gcs_uri.as_deref()),
                closed: normalize_opt(doc.right_eye_closed_gcs_uri.as_deref()),
            },
            mouth: MouthImages {
                open: normalize_opt(doc.mouth_open_gcs_uri.as_deref()),
                closed: normalize_opt(doc.mouth_closed_gcs_uri.as_deref()),
                o: normalize_opt(doc.mouth_o_gcs_uri.as_deref()),
            },
            head_url: normalize_opt(doc.head_gcs_uri.as_deref()),
            left_hand_url: normalize_opt(doc.left_hand_gcs_uri.as_deref()),
            right_hand_url: normalize_opt(doc.right_hand_gcs_uri.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_surface_line_fails_construction() {
        let err = CharacterDefinition::from_value(json!({ "height": 300 })).unwrap_err();
        assert_eq!(
            err,
            AnimatorError::MissingCharacterField {
                field: "surface_line_gcs_uri"
            }
        );
        let empty = CharacterDefinition::from_value(json!({
            "height": 300,
            "surface_line_gcs_uri": ""
        }));
        assert!(empty.is_err());
    }

    #[test]
    fn uris_are_normalized_on_ingestion() {
        let c = CharacterDefinition::from_value(json!({
            "height": 300,
            "surface_line_gcs_uri": "gs://chars/line.png",
            "mouth_o_gcs_uri": "gs://cdn.example.com/o.png",
            "left_eye_open_gcs_uri": "https://x.example.com/eye.png"
        }))
        .unwrap();
        assert_eq!(
            c.surface_line_url,
            "https://storage.googleapis.com/chars/line.png"
        );
        assert_eq!(c.mouth.url(MouthState::O), Some("https://cdn.example.com/o.png"));
        assert_eq!(c.left_eye.url(true), Some("https://x.example.com/eye.png"));
        assert_eq!(c.left_eye.url(false), None);
    }

    #[test]
    fn image_urls_are_deduplicated() {
        let c = CharacterDefinition::from_value(json!({
            "height": 10,
            "surface_line_gcs_uri": "https://a/line.png",
            "left_eye_open_gcs_uri": "https://a/eye.png",
            "right_eye_open_gcs_uri": "https://a/eye.png"
        }))
        .unwrap();
        assert_eq!(c.image_urls(), vec!["https://a/line.png", "https://a/eye.png"]);
    }
}
