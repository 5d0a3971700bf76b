//! Per-image annotation model.
//!
//! The VOC reader produces these types, and the record encoder consumes
//! them. A group is produced once, encoded once and then dropped.

use super::bbox::BBoxXYXY;
use super::space::Pixel;

/// One labeled rectangle inside an image, in pixel coordinates.
///
/// The label is kept as written in the annotation file. It is resolved to a
/// numeric id against the label map only at encoding time, so a name that is
/// missing from the map is not a parse error.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectAnnotation {
    /// Class name from the `<name>` element.
    pub label: String,

    /// Box from the `<bndbox>` element.
    pub bbox: BBoxXYXY<Pixel>,
}

impl ObjectAnnotation {
    /// Creates a new object annotation.
    pub fn new(label: impl Into<String>, bbox: BBoxXYXY<Pixel>) -> Self {
        Self {
            label: label.into(),
            bbox,
        }
    }
}

/// All objects belonging to one image, keyed by the image file name.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAnnotationGroup {
    /// Image file name, relative to the image directory.
    pub filename: String,

    /// Image width in pixels.
    pub width: u32,

    /// Image height in pixels.
    pub height: u32,

    /// Objects in declaration order.
    pub objects: Vec<ObjectAnnotation>,
}

impl ImageAnnotationGroup {
    /// Creates a group with no objects.
    pub fn new(filename: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            filename: filename.into(),
            width,
            height,
            objects: Vec::new(),
        }
    }

    /// Builder-style helper for attaching objects.
    pub fn with_objects(mut self, objects: Vec<ObjectAnnotation>) -> Self {
        self.objects = objects;
        self
    }
}
