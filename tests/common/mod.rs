#![allow(dead_code)]

use std::fs;
use std::path::Path;

use boxseed::ir::Region;
use boxseed::propose::RegionProposer;
use image::{DynamicImage, Rgb, RgbImage};

/// Write a dark PNG whose top-left pixel's red channel is `marker`.
///
/// Paired with [`MarkerProposer`] this gives each test image an exact,
/// known number of regions.
pub fn write_marked_png(path: &Path, width: u32, height: u32, marker: u8) {
    let mut img = RgbImage::new(width, height);
    img.put_pixel(0, 0, Rgb([marker, 0, 0]));
    save(path, img);
}

/// Write a dark PNG with bright filled rectangles `(x, y, w, h)`.
pub fn write_rects_png(path: &Path, width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let inside = rects
            .iter()
            .any(|&(rx, ry, rw, rh)| x >= rx && x < rx + rw && y >= ry && y < ry + rh);
        if inside {
            Rgb([235, 235, 235])
        } else {
            Rgb([15, 15, 15])
        }
    });
    save(path, img);
}

pub fn write_corrupt_image(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, b"this is not an image").expect("write corrupt image");
}

fn save(path: &Path, img: RgbImage) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    img.save(path).expect("write png");
}

/// Sorted file names directly inside `dir` (empty if it does not exist).
pub fn file_names(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|e| e.expect("dir entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Proposes as many regions as the red value of the top-left pixel.
pub struct MarkerProposer;

impl RegionProposer for MarkerProposer {
    fn propose(&self, image: &DynamicImage) -> Vec<Region> {
        let count = image.to_rgb8().get_pixel(0, 0)[0] as u32;
        (0..count)
            .map(|i| Region::new(2 + i * 10, 2 + i * 5, 24, 21))
            .collect()
    }
}
