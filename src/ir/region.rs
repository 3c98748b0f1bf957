//! Pixel-space candidate regions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::bbox::NormalizedBox;

/// An axis-aligned rectangle in pixel space, `(x, y)` being the top-left
/// corner.
///
/// Width and height are inclusive pixel counts, so a single pixel has
/// extent 1x1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Creates a new region.
    #[inline]
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// One past the right-most column.
    #[inline]
    pub fn right(&self) -> u64 {
        self.x as u64 + self.width as u64
    }

    /// One past the bottom-most row.
    #[inline]
    pub fn bottom(&self) -> u64 {
        self.y as u64 + self.height as u64
    }

    /// Returns the area in pixels.
    #[inline]
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Returns true if both sides are strictly greater than `min_size`.
    #[inline]
    pub fn exceeds(&self, min_size: u32) -> bool {
        self.width > min_size && self.height > min_size
    }

    /// Returns true if the region lies entirely inside a `width` x `height`
    /// image.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width as u64 && self.bottom() <= height as u64
    }

    /// Center of the region in pixel space (may fall between pixels).
    #[inline]
    pub fn center(&self) -> (f64, f64) {
        (
            self.x as f64 + self.width as f64 / 2.0,
            self.y as f64 + self.height as f64 / 2.0,
        )
    }

    /// Converts to a normalized center-form box for an image of the given
    /// size.
    pub fn to_normalized(&self, image_width: u32, image_height: u32) -> NormalizedBox {
        let iw = image_width as f64;
        let ih = image_height as f64;
        let (cx, cy) = self.center();

        NormalizedBox::from_cxcywh(
            cx / iw,
            cy / ih,
            self.width as f64 / iw,
            self.height as f64 / ih,
        )
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.x, self.y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_extents() {
        let region = Region::new(10, 20, 30, 40);
        assert_eq!(region.right(), 40);
        assert_eq!(region.bottom(), 60);
        assert_eq!(region.area(), 1200);
    }

    #[test]
    fn test_center_may_fall_between_pixels() {
        assert_eq!(Region::new(0, 0, 3, 4).center(), (1.5, 2.0));
    }

    #[test]
    fn test_exceeds_is_strict() {
        assert!(Region::new(0, 0, 21, 21).exceeds(20));
        assert!(!Region::new(0, 0, 20, 50).exceeds(20));
        assert!(!Region::new(0, 0, 50, 20).exceeds(20));
    }

    #[test]
    fn test_fits_within_touching_edge() {
        assert!(Region::new(70, 50, 30, 50).fits_within(100, 100));
        assert!(!Region::new(71, 50, 30, 50).fits_within(100, 100));
    }

    #[test]
    fn test_to_normalized_center_form() {
        let bbox = Region::new(10, 20, 40, 20).to_normalized(100, 80);
        let (cx, cy, w, h) = bbox.to_cxcywh();
        assert!((cx - 0.3).abs() < 1e-12);
        assert!((cy - 0.375).abs() < 1e-12);
        assert!((w - 0.4).abs() < 1e-12);
        assert!((h - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_full_image_region_normalizes_to_unit_box() {
        let bbox = Region::new(0, 0, 64, 48).to_normalized(64, 48);
        assert_eq!(bbox.to_cxcywh(), (0.5, 0.5, 1.0, 1.0));
        assert!(bbox.is_within_unit());
    }
}
