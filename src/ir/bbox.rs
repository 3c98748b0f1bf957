//! Center-form boxes, the shape label files are written in.

use serde::{Deserialize, Serialize};

/// A box as fractions of the image size: center plus extent.
///
/// Construction does not check that the extent is positive or that the box
/// lies inside the unit square; the dataset check reports those problems
/// instead of panicking on them.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedBox {
    pub cx: f64,
    pub cy: f64,
    #[serde(rename = "w")]
    pub width: f64,
    #[serde(rename = "h")]
    pub height: f64,
}

impl NormalizedBox {
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            cx,
            cy,
            width,
            height,
        }
    }

    /// Returns `(cx, cy, w, h)`.
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        (self.cx, self.cy, self.width, self.height)
    }

    /// Returns true if every component lies in `[0, 1]`. NaN never does.
    pub fn is_within_unit(&self) -> bool {
        [self.cx, self.cy, self.width, self.height]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}
