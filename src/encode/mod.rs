//! Annotation encoding and placeholder label allocation.
//!
//! Regions become normalized center-form rows, one per region, each with a
//! freshly allocated [`LabelId`]. IDs count up from zero across the whole
//! run and are never reused, so every region is its own "class".

use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::BoxseedError;
use crate::ir::{Annotation, ImageRecord, LabelId, LabelMap, NormalizedBox, Region};

/// Extension of per-image label files.
pub const LABEL_EXTENSION: &str = "txt";

/// Hands out placeholder label IDs and records the key each was issued for.
///
/// One allocator serves the whole corpus, train and val alike.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    next: u64,
    label_map: LabelMap,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next ID for `key`.
    pub fn allocate(&mut self, key: String) -> LabelId {
        let id = LabelId::new(self.next);
        self.next += 1;
        self.label_map.push(id, key);
        id
    }

    /// Number of IDs handed out so far.
    pub fn allocated(&self) -> u64 {
        self.next
    }

    pub fn label_map(&self) -> &LabelMap {
        &self.label_map
    }

    pub fn into_label_map(self) -> LabelMap {
        self.label_map
    }
}

/// Encode `regions` of one image, allocating one label per region.
///
/// The `n`th annotation belongs to the `n`th region and is keyed
/// `{image_id}_object_{n}` (1-based).
pub fn encode_annotations(
    record: &ImageRecord,
    (width, height): (u32, u32),
    regions: &[Region],
    allocator: &mut LabelAllocator,
) -> Vec<Annotation> {
    regions
        .iter()
        .enumerate()
        .map(|(idx, region)| {
            debug_assert!(region.fits_within(width, height), "{region:?} outside image");
            let bbox = region.to_normalized(width, height);
            let label_id = allocator.allocate(record.id.object_key(idx + 1));
            Annotation::new(label_id, bbox)
        })
        .collect()
}

/// Label file name for an image.
pub fn label_file_name(record: &ImageRecord) -> String {
    format!("{}.{}", record.id, LABEL_EXTENSION)
}

/// Format one row as `<id> <cx> <cy> <w> <h>`.
pub fn format_label_line(annotation: &Annotation) -> String {
    let (cx, cy, w, h) = annotation.bbox.to_cxcywh();
    format!(
        "{} {:.6} {:.6} {:.6} {:.6}",
        annotation.label_id, cx, cy, w, h
    )
}

/// Write annotations to `path`, one line each, in order.
pub fn write_label_file(path: &Path, annotations: &[Annotation]) -> Result<(), BoxseedError> {
    let file = fs::File::create(path).map_err(BoxseedError::Io)?;
    let mut writer = BufWriter::new(file);

    for annotation in annotations {
        writeln!(writer, "{}", format_label_line(annotation)).map_err(BoxseedError::Io)?;
    }

    writer.flush().map_err(BoxseedError::Io)
}

/// Read every row of a label file. Blank lines are skipped.
pub fn read_label_file(path: &Path) -> Result<Vec<Annotation>, BoxseedError> {
    let content = fs::read_to_string(path).map_err(BoxseedError::Io)?;
    let mut annotations = Vec::new();

    for (line_idx, line) in content.lines().enumerate() {
        if let Some(annotation) = parse_label_line(line, path, line_idx + 1)? {
            annotations.push(annotation);
        }
    }

    Ok(annotations)
}

/// Parse one label row. Returns `Ok(None)` for blank lines.
///
/// Values are not range-checked here.
pub fn parse_label_line(
    line: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<Option<Annotation>, BoxseedError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    // Take at most 6 tokens so pathological inputs do not allocate unbounded memory.
    let tokens: Vec<&str> = trimmed.split_whitespace().take(6).collect();

    if tokens.len() != 5 {
        return Err(BoxseedError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "expected 5 tokens, found {}",
                if tokens.len() > 5 {
                    "more".to_string()
                } else {
                    tokens.len().to_string()
                }
            ),
        });
    }

    let label_id = tokens[0]
        .parse::<u64>()
        .map_err(|_| BoxseedError::LabelParse {
            path: file_path.to_path_buf(),
            line: line_num,
            message: format!(
                "invalid label id '{}'; expected non-negative integer",
                tokens[0]
            ),
        })?;

    let cx = parse_f64_token(tokens[1], "x_center", file_path, line_num)?;
    let cy = parse_f64_token(tokens[2], "y_center", file_path, line_num)?;
    let w = parse_f64_token(tokens[3], "width", file_path, line_num)?;
    let h = parse_f64_token(tokens[4], "height", file_path, line_num)?;

    Ok(Some(Annotation::new(
        label_id,
        NormalizedBox::from_cxcywh(cx, cy, w, h),
    )))
}

/// Fuzz-only entrypoint for single-line label parsing.
#[cfg(feature = "fuzzing")]
pub fn fuzz_parse_label_line(input: &str) -> Result<(), BoxseedError> {
    let _ = parse_label_line(input, Path::new("<fuzz>"), 1)?;
    Ok(())
}

fn parse_f64_token(
    raw: &str,
    field_name: &str,
    file_path: &Path,
    line_num: usize,
) -> Result<f64, BoxseedError> {
    raw.parse::<f64>().map_err(|_| BoxseedError::LabelParse {
        path: file_path.to_path_buf(),
        line: line_num,
        message: format!("invalid {field_name} '{raw}'; expected floating-point number"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> ImageRecord {
        ImageRecord::from_path(format!("/raw/{name}")).expect("record")
    }

    #[test]
    fn allocator_is_monotonic_from_zero() {
        let mut allocator = LabelAllocator::new();
        assert_eq!(allocator.allocate("a_object_1".into()), LabelId(0));
        assert_eq!(allocator.allocate("a_object_2".into()), LabelId(1));
        assert_eq!(allocator.allocate("b_object_1".into()), LabelId(2));
        assert_eq!(allocator.allocated(), 3);
        assert_eq!(allocator.label_map().len(), 3);
    }

    #[test]
    fn encode_keys_follow_region_order_across_images() {
        let mut allocator = LabelAllocator::new();
        let first = encode_annotations(
            &record("a.png"),
            (100, 100),
            &[Region::new(0, 0, 50, 50), Region::new(50, 50, 50, 50)],
            &mut allocator,
        );
        let second = encode_annotations(
            &record("b.jpg"),
            (200, 100),
            &[Region::new(0, 0, 200, 100)],
            &mut allocator,
        );

        assert_eq!(first[0].label_id, LabelId(0));
        assert_eq!(first[1].label_id, LabelId(1));
        assert_eq!(second[0].label_id, LabelId(2));

        let entries: Vec<(u64, &str)> = allocator
            .label_map()
            .iter()
            .map(|e| (e.id.as_u64(), e.key.as_str()))
            .collect();
        assert_eq!(
            entries,
            vec![(0, "a_object_1"), (1, "a_object_2"), (2, "b_object_1")]
        );
    }

    #[test]
    fn encode_normalizes_center_and_extent() {
        let mut allocator = LabelAllocator::new();
        let annotations = encode_annotations(
            &record("img.png"),
            (200, 100),
            &[Region::new(20, 10, 40, 30)],
            &mut allocator,
        );

        assert_eq!(
            format_label_line(&annotations[0]),
            "0 0.200000 0.250000 0.200000 0.300000"
        );
    }

    #[test]
    fn label_file_round_trips_line_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let path = temp.path().join("img.txt");
        let mut allocator = LabelAllocator::new();
        let annotations = encode_annotations(
            &record("img.png"),
            (64, 64),
            &[Region::new(0, 0, 32, 32), Region::new(10, 10, 40, 21)],
            &mut allocator,
        );

        write_label_file(&path, &annotations).expect("write labels");
        let content = fs::read_to_string(&path).expect("read labels");
        assert_eq!(content.lines().count(), 2);

        let restored = read_label_file(&path).expect("read back");
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[0].label_id, LabelId(0));
        assert_eq!(restored[1].label_id, LabelId(1));
        assert!((restored[1].bbox.cx - 30.0 / 64.0).abs() < 1e-6);
    }

    #[test]
    fn label_file_name_uses_image_id() {
        assert_eq!(label_file_name(&record("dock.JPEG")), "dock.txt");
    }

    #[test]
    fn parse_label_line_skips_blank_rows() {
        let parsed = parse_label_line("   ", Path::new("a.txt"), 1).expect("parse");
        assert!(parsed.is_none());
    }

    #[test]
    fn parse_label_line_rejects_wrong_token_counts() {
        let short = parse_label_line("0 0.1 0.2", Path::new("a.txt"), 2).unwrap_err();
        assert!(matches!(short, BoxseedError::LabelParse { line: 2, .. }));

        let long = parse_label_line("0 0.1 0.2 0.3 0.4 0.5", Path::new("a.txt"), 3).unwrap_err();
        assert!(matches!(long, BoxseedError::LabelParse { line: 3, .. }));
    }

    #[test]
    fn parse_label_line_rejects_negative_ids() {
        let err = parse_label_line("-1 0.5 0.5 0.1 0.1", Path::new("a.txt"), 1).unwrap_err();
        assert!(matches!(err, BoxseedError::LabelParse { .. }));
    }
}
