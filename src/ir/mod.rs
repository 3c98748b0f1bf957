//! Data model for the dataset-assembly pipeline.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: pixel regions (`u32`) and normalized boxes (`f64`)
//!    are distinct types, and newtype IDs keep image stems apart from class
//!    indices.
//!
//! 2. **One canonical region shape**: proposals are integer pixel rectangles
//!    (`x, y, width, height`); the only conversion is to the normalized
//!    center form written to label files.
//!
//! 3. **Permissive Construction**: normalized boxes may hold out-of-range
//!    values so that the dataset check can report them rather than panic.
//!
//! # Example
//!
//! ```
//! use boxseed::ir::{Annotation, LabelId, Region};
//!
//! let region = Region::new(10, 20, 40, 20);
//! let annotation = Annotation::new(LabelId::new(0), region.to_normalized(100, 80));
//! assert!(annotation.bbox.is_within_unit());
//! ```

mod bbox;
mod ids;
mod model;
mod region;

pub use bbox::NormalizedBox;
pub use ids::{ImageId, LabelId};
pub use model::{Annotation, ImageRecord, LabelEntry, LabelMap, Split};
pub use region::Region;
