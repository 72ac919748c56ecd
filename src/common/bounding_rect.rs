use serde::{Deserialize, Serialize};

/// Axis aligned rectangle in canvas space, stored as top-left corner plus size.
#[derive(Default, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingRect {
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Canvas rectangle spanning `width` x `height` from the origin.
    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0., 0., width, height)
    }

    /// Returns the width of the rectangle.
    pub fn width(&self) -> f32 {
        self.w
    }

    /// Returns the height of the rectangle.
    pub fn height(&self) -> f32 {
        self.h
    }

    pub fn x_min(&self) -> f32 {
        self.x
    }

    pub fn y_min(&self) -> f32 {
        self.y
    }

    pub fn x_max(&self) -> f32 {
        self.x + self.w
    }

    pub fn y_max(&self) -> f32 {
        self.y + self.h
    }

    /// Computes the area of the rectangle. Negative sizes give a non-positive area.
    pub fn area(&self) -> f32 {
        self.w * self.h
    }

    /// A rectangle without a positive area never takes part in overlap tests.
    pub fn is_degenerate(&self) -> bool {
        self.area() <= 0.
    }

    /// Computes the intersection area between this rectangle and another.
    pub fn intersect(&self, other: &BoundingRect) -> f32 {
        let left = self.x_min().max(other.x_min());
        let right = self.x_max().min(other.x_max());
        let top = self.y_min().max(other.y_min());
        let bottom = self.y_max().min(other.y_max());
        (right - left).max(0.) * (bottom - top).max(0.)
    }

    /// Computes the union area between this rectangle and another.
    pub fn union(&self, other: &BoundingRect) -> f32 {
        self.area() + other.area() - self.intersect(other)
    }

    /// Computes the intersection over union (IoU) between this rectangle and another.
    ///
    /// Degenerate rectangles (width or height not positive) have an IoU of 0 with
    /// anything, including themselves.
    pub fn iou(&self, other: &BoundingRect) -> f32 {
        if self.is_degenerate() || other.is_degenerate() {
            return 0.;
        }
        let intersection = self.intersect(other);
        intersection / (self.area() + other.area() - intersection)
    }

    /// Checks if this rectangle completely contains `other`.
    pub fn contains(&self, other: &BoundingRect) -> bool {
        self.x_min() <= other.x_min()
            && self.x_max() >= other.x_max()
            && self.y_min() <= other.y_min()
            && self.y_max() >= other.y_max()
    }

    /// Bit patterns of the four components, used for exact hashing.
    pub(crate) fn to_bits(&self) -> [u32; 4] {
        [identity_bits(self.x), identity_bits(self.y), identity_bits(self.w), identity_bits(self.h)]
    }
}

/// Bit pattern of `value` with `-0.0` folded into `0.0`, so bitwise identity
/// agrees with `==` on zeros.
pub(crate) fn identity_bits(value: f32) -> u32 {
    if value == 0. {
        0
    } else {
        value.to_bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iou_of_offset_squares() {
        let a = BoundingRect::new(0., 0., 10., 10.);
        let b = BoundingRect::new(5., 5., 10., 10.);
        assert_eq!(a.intersect(&b), 25.);
        assert_eq!(a.union(&b), 175.);
        assert!((a.iou(&b) - 25. / 175.).abs() < 1e-6);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn disjoint_rects_do_not_overlap() {
        let a = BoundingRect::new(0., 0., 10., 10.);
        let b = BoundingRect::new(20., 20., 5., 5.);
        assert_eq!(a.intersect(&b), 0.);
        assert_eq!(a.iou(&b), 0.);
    }

    #[test]
    fn degenerate_rect_has_zero_iou() {
        let a = BoundingRect::new(0., 0., 10., 10.);
        let flat = BoundingRect::new(0., 0., 10., 0.);
        let negative = BoundingRect::new(2., 2., -4., 4.);
        assert_eq!(a.iou(&flat), 0.);
        assert_eq!(flat.iou(&a), 0.);
        assert_eq!(negative.iou(&negative), 0.);
    }

    #[test]
    fn signed_zeros_share_identity() {
        assert_eq!(identity_bits(-0.), identity_bits(0.));
        assert_eq!(BoundingRect::new(-0., 0., 4., 4.).to_bits(), BoundingRect::new(0., -0., 4., 4.).to_bits());
        assert_ne!(identity_bits(1.), identity_bits(-1.));
    }

    #[test]
    fn contains_nested_rect() {
        let outer = BoundingRect::from_size(100., 50.);
        assert!(outer.contains(&BoundingRect::new(10., 10., 20., 20.)));
        assert!(!outer.contains(&BoundingRect::new(90., 10., 20., 20.)));
    }
}
