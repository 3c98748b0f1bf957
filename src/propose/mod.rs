//! Model-free region proposals from edges and contours.
//!
//! The default [`EdgeContourProposer`] runs Canny edge detection on the
//! intensity image, traces the outermost contours of the edge map, and keeps
//! the bounding rectangle of every contour larger than `min_size` on both
//! axes. Overlapping rectangles are kept as-is; nothing is merged.

use std::path::Path;

use image::{DynamicImage, GrayImage, ImageError, ImageReader};
use imageproc::contours::find_contours;
use imageproc::point::Point;

use crate::config::ProposerConfig;
use crate::error::BoxseedError;
use crate::ir::Region;

/// Turns one decoded image into candidate regions.
///
/// Implementations must return regions in a deterministic order and only
/// regions that lie inside the image.
pub trait RegionProposer {
    fn propose(&self, image: &DynamicImage) -> Vec<Region>;
}

/// Canny edges, external contours, bounding rectangles.
#[derive(Clone, Debug, Default)]
pub struct EdgeContourProposer {
    config: ProposerConfig,
}

impl EdgeContourProposer {
    pub fn new(config: ProposerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProposerConfig {
        &self.config
    }

    /// Binary edge map of `gray` (edge pixels are 255).
    pub fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        imageproc::edges::canny(
            gray,
            self.config.low_threshold,
            self.config.high_threshold,
        )
    }
}

impl RegionProposer for EdgeContourProposer {
    fn propose(&self, image: &DynamicImage) -> Vec<Region> {
        let gray = image.to_luma8();
        let edges = self.edge_map(&gray);
        regions_from_edges(&edges, self.config.min_size)
    }
}

/// Decode an image from disk.
///
/// Unreadable and undecodable files both surface as
/// [`BoxseedError::Decode`].
pub fn decode_image(path: &Path) -> Result<DynamicImage, BoxseedError> {
    let decode_err = |source: ImageError| BoxseedError::Decode {
        path: path.to_path_buf(),
        source,
    };

    ImageReader::open(path)
        .map_err(|e| decode_err(ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| decode_err(ImageError::IoError(e)))?
        .decode()
        .map_err(decode_err)
}

/// Bounding rectangles of the outermost contours in a binary edge map,
/// in contour discovery (raster) order, dropping any with a side of at most
/// `min_size` pixels.
///
/// Every contour without a parent is an external boundary. Its
/// `border_type` is not consulted: a boundary traced from a column-0 pixel
/// comes back as `Hole` even at the top level.
pub fn regions_from_edges(edges: &GrayImage, min_size: u32) -> Vec<Region> {
    find_contours::<u32>(edges)
        .into_iter()
        .filter(|contour| contour.parent.is_none())
        .filter_map(|contour| bounding_region(&compress_chain(&contour.points)))
        .filter(|region| region.exceeds(min_size))
        .collect()
}

/// Drop every point that lies in the middle of a straight horizontal,
/// vertical or diagonal run, keeping only the vertices needed to redraw the
/// closed boundary.
pub fn compress_chain(points: &[Point<u32>]) -> Vec<Point<u32>> {
    let n = points.len();
    if n < 3 {
        return points.to_vec();
    }

    let step = |a: Point<u32>, b: Point<u32>| {
        (
            (b.x as i64 - a.x as i64).signum(),
            (b.y as i64 - a.y as i64).signum(),
        )
    };

    let kept: Vec<Point<u32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();

    // A boundary with no turns at all is a straight run; keep its ends.
    if kept.is_empty() {
        vec![points[0], points[n - 1]]
    } else {
        kept
    }
}

/// Smallest axis-aligned rectangle containing every point, with inclusive
/// pixel extents.
pub fn bounding_region(points: &[Point<u32>]) -> Option<Region> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(Region::new(
        min_x,
        min_y,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}
