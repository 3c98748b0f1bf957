//! Crop export for manual review.
//!
//! Each proposed region is written as its own PNG so a person can look at
//! it and decide what it is. The pipeline never reads these files back.

use std::fs;
use std::path::Path;

use image::{DynamicImage, ImageFormat};
use tracing::debug;

use crate::error::BoxseedError;
use crate::ir::{ImageRecord, Region};

/// Extension used for every crop, whatever the source format.
pub const CROP_EXTENSION: &str = "png";

/// File name of the crop for the `index`th (1-based) region of `record`.
pub fn crop_file_name(record: &ImageRecord, index: usize) -> String {
    format!("{}.{}", record.id.object_key(index), CROP_EXTENSION)
}

/// Write one crop per region into `crops_dir`, in region order.
///
/// Returns the generated file names. The `n`th name corresponds to the `n`th
/// region and to the `n`th line of the image's label file.
pub fn export_crops(
    record: &ImageRecord,
    image: &DynamicImage,
    regions: &[Region],
    crops_dir: &Path,
) -> Result<Vec<String>, BoxseedError> {
    fs::create_dir_all(crops_dir).map_err(BoxseedError::Io)?;

    let mut names = Vec::with_capacity(regions.len());

    for (idx, region) in regions.iter().enumerate() {
        let name = crop_file_name(record, idx + 1);
        let path = crops_dir.join(&name);

        let cropped = image.crop_imm(region.x, region.y, region.width, region.height);
        cropped
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| BoxseedError::CropWrite {
                path: path.clone(),
                source,
            })?;

        names.push(name);
    }

    debug!(image_id = %record.id, crops = names.len(), "exported crops");
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn gradient_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([x as u8, y as u8, 0])
        }))
    }

    #[test]
    fn crop_names_use_one_based_index() {
        let record = ImageRecord::from_path("/raw/shelf.jpg").expect("record");
        assert_eq!(crop_file_name(&record, 1), "shelf_object_1.png");
        assert_eq!(crop_file_name(&record, 3), "shelf_object_3.png");
    }

    #[test]
    fn exports_exact_pixels_in_region_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let record = ImageRecord::from_path(temp.path().join("scene.png")).expect("record");
        let image = gradient_image(100, 80);
        let regions = [Region::new(10, 20, 30, 25), Region::new(50, 5, 22, 40)];

        let crops_dir = temp.path().join("crops");
        let names = export_crops(&record, &image, &regions, &crops_dir).expect("export");
        assert_eq!(names, vec!["scene_object_1.png", "scene_object_2.png"]);

        let first = image::open(crops_dir.join(&names[0])).expect("open first crop");
        assert_eq!(first.dimensions(), (30, 25));
        assert_eq!(first.to_rgb8().get_pixel(0, 0), &Rgb([10, 20, 0]));

        let second = image::open(crops_dir.join(&names[1])).expect("open second crop");
        assert_eq!(second.dimensions(), (22, 40));
        assert_eq!(second.to_rgb8().get_pixel(21, 39), &Rgb([71, 44, 0]));
    }

    #[test]
    fn no_regions_writes_nothing() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let record = ImageRecord::from_path(temp.path().join("empty.png")).expect("record");
        let crops_dir = temp.path().join("crops");

        let names = export_crops(&record, &gradient_image(10, 10), &[], &crops_dir)
            .expect("export");
        assert!(names.is_empty());
        assert_eq!(fs::read_dir(&crops_dir).expect("read dir").count(), 0);
    }
}
