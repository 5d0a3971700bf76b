//! Annotation model and the Pascal VOC reader.
//!
//! # Design Principles
//!
//! 1. **Type Safety**: Marker types keep pixel boxes (integers, as declared
//!    in VOC) apart from normalized boxes (`f32`, as written to TFRecord).
//!
//! 2. **Permissive Construction**: boxes may be degenerate or extend past
//!    the image. They are logged, not rejected, and pass through unchanged.
//!
//! # Example
//!
//! ```
//! use voc2tfrecord::ir::{BBoxXYXY, ImageAnnotationGroup, ObjectAnnotation, Pixel};
//!
//! let group = ImageAnnotationGroup::new("a.jpg", 100, 200).with_objects(vec![
//!     ObjectAnnotation::new("cat", BBoxXYXY::<Pixel>::from_xyxy(10, 20, 50, 80)),
//! ]);
//! let norm = group.objects[0].bbox.to_normalized(group.width, group.height);
//! assert_eq!(norm.xmax, 0.5);
//! ```

mod bbox;
pub mod io_voc_xml;
mod model;
mod space;

pub use bbox::BBoxXYXY;
pub use model::{ImageAnnotationGroup, ObjectAnnotation};
pub use space::{Normalized, Pixel, Space};
