//! Render sink abstraction and pose application.
//!
//! A pose is pushed to the host through a [`RenderSink`], one call per visual
//! role. Calls are issued in a fixed order: transforms, visibility, surface line
//! position, clipping, then image selection.

use futures_util::future::{join_all, ready, LocalBoxFuture};
use serde::{Deserialize, Serialize};

use crate::character::CharacterDefinition;
use crate::error::ResourceError;
use crate::pose::Pose;
use crate::transform::Transform;

/// Visual element a render call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    HeadClip,
    HeadTransform,
    Mouth,
    LeftEye,
    RightEye,
    LeftHandClip,
    LeftHandTransform,
    RightHandClip,
    RightHandTransform,
    SurfaceLine,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::HeadClip,
        Role::HeadTransform,
        Role::Mouth,
        Role::LeftEye,
        Role::RightEye,
        Role::LeftHandClip,
        Role::LeftHandTransform,
        Role::RightHandClip,
        Role::RightHandTransform,
        Role::SurfaceLine,
    ];

    /// Host-side key of the element handle.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::HeadClip => "headClip",
            Role::HeadTransform => "headTransform",
            Role::Mouth => "mouth",
            Role::LeftEye => "leftEye",
            Role::RightEye => "rightEye",
            Role::LeftHandClip => "leftHandClip",
            Role::LeftHandTransform => "leftHandTransform",
            Role::RightHandClip => "rightHandClip",
            Role::RightHandTransform => "rightHandTransform",
            Role::SurfaceLine => "surfaceLine",
        }
    }

    pub fn from_key(key: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == key)
    }
}

/// Hide the bottom `inset_px` pixels of a clip container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BottomClip {
    pub inset_px: f64,
}

impl BottomClip {
    /// CSS `clip-path` value.
    pub fn to_css(&self) -> String {
        format!("inset(0px 0px {}px 0px)", self.inset_px)
    }
}

/// Host surface that displays a character.
pub trait RenderSink {
    fn set_transform(&mut self, role: Role, transform: &Transform);
    fn set_visible(&mut self, role: Role, visible: bool);
    /// Vertical position of the element's top edge, in pixels.
    fn set_top(&mut self, role: Role, top_px: f64);
    /// `None` removes any clipping.
    fn set_clip(&mut self, role: Role, clip: Option<BottomClip>);
    fn set_image(&mut self, role: Role, url: &str);

    /// Resolve once `url` is decoded and ready to show. Sinks that do not
    /// preload resolve immediately.
    fn preload_image(&self, _url: &str) -> LocalBoxFuture<'static, Result<(), ResourceError>> {
        Box::pin(ready(Ok(())))
    }
}

fn mask_for(enabled: bool, boundary: f64, height: f64) -> Option<BottomClip> {
    enabled.then(|| BottomClip {
        inset_px: boundary.clamp(0.0, height.max(0.0)),
    })
}

fn set_image_opt<S: RenderSink + ?Sized>(sink: &mut S, role: Role, url: Option<&str>) {
    if let Some(url) = url.filter(|u| !u.is_empty()) {
        sink.set_image(role, url);
    }
}

/// Push `pose` to `sink`.
pub fn apply_pose<S: RenderSink + ?Sized>(
    sink: &mut S,
    character: &CharacterDefinition,
    pose: &Pose,
) {
    sink.set_transform(Role::HeadTransform, &pose.head_transform);
    sink.set_transform(Role::LeftHandTransform, &pose.left_hand_transform);
    sink.set_transform(Role::RightHandTransform, &pose.right_hand_transform);

    sink.set_visible(Role::LeftHandTransform, pose.left_hand_visible);
    sink.set_visible(Role::RightHandTransform, pose.right_hand_visible);
    sink.set_visible(Role::SurfaceLine, pose.surface_line_visible);

    sink.set_top(
        Role::SurfaceLine,
        character.height - pose.surface_line_offset,
    );

    let height = character.height;
    let boundary = pose.mask_boundary_offset;
    sink.set_clip(
        Role::HeadClip,
        mask_for(pose.head_masking_enabled, boundary, height),
    );
    sink.set_clip(
        Role::LeftHandClip,
        mask_for(pose.left_hand_masking_enabled, boundary, height),
    );
    sink.set_clip(
        Role::RightHandClip,
        mask_for(pose.right_hand_masking_enabled, boundary, height),
    );

    set_image_opt(sink, Role::LeftEye, character.left_eye.url(pose.left_eye_open));
    set_image_opt(sink, Role::RightEye, character.right_eye.url(pose.right_eye_open));
    set_image_opt(sink, Role::Mouth, character.mouth.url(pose.mouth_state));
}

/// Images that do not change with the pose.
pub fn apply_static_images<S: RenderSink + ?Sized>(sink: &mut S, character: &CharacterDefinition) {
    set_image_opt(sink, Role::SurfaceLine, Some(&character.surface_line_url));
    set_image_opt(sink, Role::HeadTransform, character.head_url.as_deref());
    set_image_opt(sink, Role::LeftHandTransform, character.left_hand_url.as_deref());
    set_image_opt(sink, Role::RightHandTransform, character.right_hand_url.as_deref());
}

/// Outcome of an image preload pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImagePreload {
    pub requested: usize,
    pub failed: usize,
}

/// Preload every URL concurrently. Failures are logged and counted, never returned.
pub fn preload_images<S: RenderSink + ?Sized>(
    sink: &S,
    urls: Vec<String>,
) -> LocalBoxFuture<'static, ImagePreload> {
    let requested = urls.len();
    let loads: Vec<_> = urls.iter().map(|url| sink.preload_image(url)).collect();
    Box::pin(async move {
        let mut failed = 0;
        for result in join_all(loads).await {
            if let Err(err) = result {
                log::warn!("image preload failed: {err}");
                failed += 1;
            }
        }
        ImagePreload { requested, failed }
    })
}
