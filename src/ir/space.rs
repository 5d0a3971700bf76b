//! Coordinate space marker types.
//!
//! These are zero-sized types (ZSTs) used as type parameters to distinguish
//! between different coordinate systems at compile time. Each space also
//! fixes the scalar type its coordinates are stored in.

use std::fmt;

/// A coordinate space with its own scalar representation.
pub trait Space {
    /// The numeric type used for coordinates in this space.
    type Scalar: Copy + PartialOrd + fmt::Debug;
}

/// Marker type for pixel coordinates (absolute integer values).
///
/// VOC annotations declare boxes in whole pixels, where (0, 0) is the
/// top-left corner of the image.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker type for normalized coordinates (fractions of the image size).
///
/// Stored as `f32` because that is the width of a TFRecord float feature.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl Space for Pixel {
    type Scalar = i64;
}

impl Space for Normalized {
    type Scalar = f32;
}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
