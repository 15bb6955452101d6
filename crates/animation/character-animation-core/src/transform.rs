//! Numeric helpers and the 2D transform value used for head/hand placement.

use serde::{Deserialize, Deserializer, Serialize};

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f64(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Translate + non-uniform scale in CSS pixel space.
///
/// Missing or `null` fields in incoming JSON take the identity component, so
/// `{"translate_x": 4, "scale_y": null}` decodes to `{4, 0, 1, 1}`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "TransformDocument")]
pub struct Transform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        translate_x: 0.0,
        translate_y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    pub fn new(translate_x: f64, translate_y: f64, scale_x: f64, scale_y: f64) -> Self {
        Self {
            translate_x,
            translate_y,
            scale_x,
            scale_y,
        }
    }

    /// Component-wise linear blend from `self` toward `to`.
    #[inline]
    pub fn lerp(&self, to: &Transform, t: f64) -> Transform {
        Transform {
            translate_x: lerp_f64(self.translate_x, to.translate_x, t),
            translate_y: lerp_f64(self.translate_y, to.translate_y, t),
            scale_x: lerp_f64(self.scale_x, to.scale_x, t),
            scale_y: lerp_f64(self.scale_y, to.scale_y, t),
        }
    }

    /// CSS `transform` value: translate first, then scale.
    pub fn to_css(&self) -> String {
        format!(
            "translate({}px, {}px) scale({}, {})",
            self.translate_x, self.translate_y, self.scale_x, self.scale_y
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct TransformDocument {
    translate_x: Option<f64>,
    translate_y: Option<f64>,
    scale_x: Option<f64>,
    scale_y: Option<f64>,
}

impl From<TransformDocument> for Transform {
    fn from(doc: TransformDocument) -> Self {
        let id = Transform::IDENTITY;
        Transform {
            translate_x: doc.translate_x.unwrap_or(id.translate_x),
            translate_y: doc.translate_y.unwrap_or(id.translate_y),
            scale_x: doc.scale_x.unwrap_or(id.scale_x),
            scale_y: doc.scale_y.unwrap_or(id.scale_y),
        }
    }
}

/// Field deserializer that reads an explicit `null` as the default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Values the interpolating sampler can blend.
pub trait Lerp: Copy {
    fn lerp_to(&self, to: &Self, t: f64) -> Self;
}

impl Lerp for f64 {
    #[inline]
    fn lerp_to(&self, to: &Self, t: f64) -> Self {
        lerp_f64(*self, *to, t)
    }
}

impl Lerp for Transform {
    #[inline]
    fn lerp_to(&self, to: &Self, t: f64) -> Self {
        self.lerp(to, t)
    }
}
