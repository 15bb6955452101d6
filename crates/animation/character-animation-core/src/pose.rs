//! Sampled pose and per-sequence initial pose.

use serde::{Deserialize, Serialize};

use crate::data::MouthState;
use crate::transform::Transform;

/// Default offset (px from the character's base) for the surface line and mask boundary.
pub const DEFAULT_OFFSET: f64 = 50.0;

/// Complete visual state of the character at one instant.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub left_eye_open: bool,
    pub right_eye_open: bool,
    pub mouth_state: MouthState,
    pub left_hand_visible: bool,
    pub right_hand_visible: bool,
    pub left_hand_transform: Transform,
    pub right_hand_transform: Transform,
    pub head_transform: Transform,
    pub surface_line_offset: f64,
    pub surface_line_visible: bool,
    pub mask_boundary_offset: f64,
    pub head_masking_enabled: bool,
    pub left_hand_masking_enabled: bool,
    pub right_hand_masking_enabled: bool,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            left_eye_open: true,
            right_eye_open: true,
            mouth_state: MouthState::Closed,
            left_hand_visible: true,
            right_hand_visible: true,
            left_hand_transform: Transform::IDENTITY,
            right_hand_transform: Transform::IDENTITY,
            head_transform: Transform::IDENTITY,
            surface_line_offset: DEFAULT_OFFSET,
            surface_line_visible: true,
            mask_boundary_offset: DEFAULT_OFFSET,
            head_masking_enabled: true,
            left_hand_masking_enabled: false,
            right_hand_masking_enabled: false,
        }
    }
}

/// Fallback values supplied with a sequence. Any field left out uses the
/// engine default from [`Pose::default`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialPose {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_eye_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_eye_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mouth_state: Option<MouthState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_hand_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_hand_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_hand_transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_hand_transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_transform: Option<Transform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_line_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surface_line_visible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mask_boundary_offset: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub head_masking_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_hand_masking_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right_hand_masking_enabled: Option<bool>,
}

impl InitialPose {
    /// Fill unspecified fields from the engine defaults.
    pub fn resolve(&self) -> Pose {
        let d = Pose::default();
        Pose {
            left_eye_open: self.left_eye_open.unwrap_or(d.left_eye_open),
            right_eye_open: self.right_eye_open.unwrap_or(d.right_eye_open),
            mouth_state: self.mouth_state.unwrap_or(d.mouth_state),
            left_hand_visible: self.left_hand_visible.unwrap_or(d.left_hand_visible),
            right_hand_visible: self.right_hand_visible.unwrap_or(d.right_hand_visible),
            left_hand_transform: self.left_hand_transform.unwrap_or(d.left_hand_transform),
            right_hand_transform: self.right_hand_transform.unwrap_or(d.right_hand_transform),
            head_transform: self.head_transform.unwrap_or(d.head_transform),
            surface_line_offset: self.surface_line_offset.unwrap_or(d.surface_line_offset),
            surface_line_visible: self.surface_line_visible.unwrap_or(d.surface_line_visible),
            mask_boundary_offset: self.mask_boundary_offset.unwrap_or(d.mask_boundary_offset),
            head_masking_enabled: self.head_masking_enabled.unwrap_or(d.head_masking_enabled),
            left_hand_masking_enabled: self
                .left_hand_masking_enabled
                .unwrap_or(d.left_hand_masking_enabled),
            right_hand_masking_enabled: self
                .right_hand_masking_enabled
                .unwrap_or(d.right_hand_masking_enabled),
        }
    }
}
