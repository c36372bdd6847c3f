//! Axis-aligned rectangles

use crate::vector::Vec2;

/// Axis-aligned rectangle, used for query boxes and image slices
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    /// Create from two corners in any order
    #[inline]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: Vec2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Vec2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// Create from top-left corner and size
    #[inline]
    pub fn from_origin_size(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            min: Vec2::new(x, y),
            max: Vec2::new(x + width, y + height),
        }
    }

    /// Degenerate rectangle covering a single point
    #[inline]
    pub fn point(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Closed-interval overlap test (touching edges count)
    #[inline]
    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_corners_normalizes() {
        let r = Rect::from_corners(Vec2::new(3.0, 1.0), Vec2::new(1.0, 4.0));
        assert_eq!(r.min, Vec2::new(1.0, 1.0));
        assert_eq!(r.max, Vec2::new(3.0, 4.0));
        assert_eq!(r.width(), 2.0);
        assert_eq!(r.height(), 3.0);
    }

    #[test]
    fn test_point_rect_intersects() {
        let r = Rect::from_origin_size(0.0, 0.0, 2.0, 2.0);
        assert!(Rect::point(Vec2::new(1.0, 1.0)).intersects(&r));
        assert!(Rect::point(Vec2::new(2.0, 2.0)).intersects(&r));
        assert!(!Rect::point(Vec2::new(2.5, 1.0)).intersects(&r));
    }
}
