//! Collision detection for axis-aligned boxes
//!
//! Every entity is a rectangle anchored at its top-left corner. The detector
//! only answers "do these touch"; the tick decides what a hit means.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle (min = top-left, max = bottom-right)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Scale around the centre (giant mode hitbox)
    pub fn scaled(&self, factor: f32) -> Self {
        let half = self.size() * 0.5 * factor;
        let c = self.center();
        Self {
            min: c - half,
            max: c + half,
        }
    }

    /// Grow on every side by `margin`
    pub fn inflated(&self, margin: Vec2) -> Self {
        Self {
            min: self.min - margin,
            max: self.max + margin,
        }
    }
}

/// Check whether two rectangles intersect
///
/// Rectangles that only share an edge coordinate are disjoint. Symmetric in
/// its arguments.
#[inline]
pub fn overlaps(a: &Rect, b: &Rect) -> bool {
    a.min.x < b.max.x && b.min.x < a.max.x && a.min.y < b.max.y && b.min.y < a.max.y
}

/// True once a rectangle has fully left the playfield, allowing a margin of
/// its own size so entities entering from off-screen are not culled.
pub fn left_playfield(rect: &Rect, width: f32, height: f32) -> bool {
    let bounds = Rect::new(Vec2::ZERO, Vec2::new(width, height)).inflated(rect.size());
    !overlaps(rect, &bounds)
}
