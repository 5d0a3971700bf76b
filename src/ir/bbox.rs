//! Bounding box types in canonical XYXY format.

use super::space::{Normalized, Pixel, Space};

/// An axis-aligned bounding box in XYXY format (xmin, ymin, xmax, ymax).
///
/// The `S` parameter should be either [`Pixel`] or [`Normalized`], which
/// also decides the scalar type of the coordinates.
///
/// Note: This type does NOT enforce that min < max in the constructor.
/// Degenerate or out-of-image boxes are carried through to the output
/// unchanged; [`BBoxXYXY::is_ordered`] lets callers detect them.
pub struct BBoxXYXY<S: Space> {
    pub xmin: S::Scalar,
    pub ymin: S::Scalar,
    pub xmax: S::Scalar,
    pub ymax: S::Scalar,
}

impl<S: Space> BBoxXYXY<S> {
    /// Creates a new bounding box from explicit coordinates.
    #[inline]
    pub fn from_xyxy(xmin: S::Scalar, ymin: S::Scalar, xmax: S::Scalar, ymax: S::Scalar) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    /// Returns true if the box is properly ordered (min < max for both axes).
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin < self.xmax && self.ymin < self.ymax
    }
}

impl BBoxXYXY<Pixel> {
    /// Rescales the box into the unit square of a `width` x `height` image.
    ///
    /// x coordinates are divided by `width`, y coordinates by `height`. The
    /// division happens in `f64` and is then narrowed to `f32`. No clamping
    /// is applied, so boxes outside the image produce values outside [0, 1].
    pub fn to_normalized(&self, width: u32, height: u32) -> BBoxXYXY<Normalized> {
        let w = f64::from(width);
        let h = f64::from(height);
        BBoxXYXY::from_xyxy(
            (self.xmin as f64 / w) as f32,
            (self.ymin as f64 / h) as f32,
            (self.xmax as f64 / w) as f32,
            (self.ymax as f64 / h) as f32,
        )
    }
}

// Manual impls avoid requiring the marker types themselves to implement
// these traits.
impl<S: Space> Clone for BBoxXYXY<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: Space> Copy for BBoxXYXY<S> {}

impl<S: Space> PartialEq for BBoxXYXY<S> {
    fn eq(&self, other: &Self) -> bool {
        self.xmin == other.xmin
            && self.ymin == other.ymin
            && self.xmax == other.xmax
            && self.ymax == other.ymax
    }
}

impl<S: Space> std::fmt::Debug for BBoxXYXY<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}
