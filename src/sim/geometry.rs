//! Lane/distance geometry
//!
//! Boxes are axis-aligned in grid units. Two boxes share a lane when their
//! horizontal extents overlap; only then does vertical distance matter.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned box: `pos` is the top-left corner, y grows downward
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub pos: Vec2,
    pub size: Vec2,
}

impl BoundingBox {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Horizontal extents overlap (touching edges do not count)
    #[inline]
    pub fn shares_lane(&self, other: &BoundingBox) -> bool {
        self.left() < other.right() && other.left() < self.right()
    }
}

/// Vertical gap between two boxes in the same lane
///
/// Returns `f32::INFINITY` when the boxes are in different lanes, `0.0` when
/// they overlap (or touch) vertically, otherwise the gap between the nearer
/// edges.
pub fn overlap_distance(a: &BoundingBox, b: &BoundingBox) -> f32 {
    if !a.shares_lane(b) {
        return f32::INFINITY;
    }
    if a.bottom() <= b.top() {
        b.top() - a.bottom()
    } else if b.bottom() <= a.top() {
        a.top() - b.bottom()
    } else {
        0.0
    }
}

/// Smallest `overlap_distance` from `target` to any of `others`
pub fn nearest_distance<'a, I>(target: &BoundingBox, others: I) -> f32
where
    I: IntoIterator<Item = &'a BoundingBox>,
{
    others
        .into_iter()
        .map(|other| overlap_distance(target, other))
        .fold(f32::INFINITY, f32::min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bx(x: f32, y: f32, w: f32, h: f32) -> BoundingBox {
        BoundingBox::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_different_lanes_are_infinite() {
        let a = bx(1.0, 0.0, 3.0, 4.0);
        let b = bx(10.0, 0.0, 3.0, 4.0);
        assert_eq!(overlap_distance(&a, &b), f32::INFINITY);

        // Touching horizontally is still a different lane
        let c = bx(4.0, 0.0, 3.0, 4.0);
        assert_eq!(overlap_distance(&a, &c), f32::INFINITY);
    }

    #[test]
    fn test_vertical_gap() {
        let a = bx(10.0, 0.0, 4.0, 5.0);
        let b = bx(11.0, 8.0, 2.0, 3.0);
        assert_eq!(overlap_distance(&a, &b), 3.0);
        assert_eq!(overlap_distance(&b, &a), 3.0);
    }

    #[test]
    fn test_vertical_overlap_is_zero() {
        let a = bx(10.0, 0.0, 4.0, 5.0);
        let b = bx(12.5, 4.5, 4.0, 5.0);
        assert_eq!(overlap_distance(&a, &b), 0.0);

        // Containment
        let c = bx(11.0, 1.0, 1.0, 1.0);
        assert_eq!(overlap_distance(&a, &c), 0.0);
    }

    #[test]
    fn test_nearest_distance() {
        let target = bx(10.0, 0.0, 2.0, 2.0);
        let others = [
            bx(10.0, 12.0, 2.0, 2.0),
            bx(10.5, 6.0, 2.0, 2.0),
            bx(30.0, 0.0, 2.0, 2.0),
        ];
        assert_eq!(nearest_distance(&target, &others), 4.0);
        assert_eq!(nearest_distance(&target, std::iter::empty()), f32::INFINITY);
    }

    fn arb_box() -> impl Strategy<Value = BoundingBox> {
        (0.0f32..40.0, -20.0f32..40.0, 0.5f32..8.0, 0.5f32..10.0)
            .prop_map(|(x, y, w, h)| bx(x, y, w, h))
    }

    proptest! {
        #[test]
        fn overlap_distance_is_symmetric(a in arb_box(), b in arb_box()) {
            prop_assert_eq!(overlap_distance(&a, &b), overlap_distance(&b, &a));
        }

        #[test]
        fn infinite_iff_lanes_disjoint(a in arb_box(), b in arb_box()) {
            let disjoint = a.left() >= b.right() || b.left() >= a.right();
            prop_assert_eq!(overlap_distance(&a, &b).is_infinite(), disjoint);
        }

        #[test]
        fn vertical_overlap_gives_zero(a in arb_box(), b in arb_box()) {
            let vertical_overlap = a.top() < b.bottom() && b.top() < a.bottom();
            if a.shares_lane(&b) && vertical_overlap {
                prop_assert_eq!(overlap_distance(&a, &b), 0.0);
            }
        }
    }
}
