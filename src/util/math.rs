//! Math type re-exports and export-specific math utilities.
//!
//! This module re-exports types from `glam` and provides the axis-aligned
//! bound used for the selection header and the fixed-point formatting the
//! output document uses for every real number.

pub use glam::{Quat, Vec3, Vec4};

use serde::{Deserialize, Serialize};
use std::fmt;

/// 3D axis-aligned bounding box.
#[derive(Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3f {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand to include a point.
    #[inline]
    pub fn expand_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Expand to include a box centred at `center` with full extent `size`.
    pub fn expand_centered(&mut self, center: Vec3, size: Vec3) {
        let half = size.abs() * 0.5;
        self.expand_point(center - half);
        self.expand_point(center + half);
    }

    /// Center point, zero for an empty box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            (self.min + self.max) * 0.5
        }
    }

    /// Full extent, zero for an empty box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }
}

impl Default for BBox3f {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3f({:?} .. {:?})", self.min, self.max)
    }
}

/// Format a real number with five decimals.
#[inline]
pub fn fixed5(v: f32) -> String {
    format!("{:.5}", v)
}

/// Convert a unit colour channel to 0..=255, truncating.
#[inline]
pub fn channel_u8(v: f32) -> u32 {
    (v.clamp(0.0, 1.0) * 255.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox_expand_centered() {
        let mut b = BBox3f::EMPTY;
        assert!(b.is_empty());
        b.expand_centered(Vec3::new(10.0, 0.0, 0.0), Vec3::new(2.0, 4.0, 6.0));
        b.expand_centered(Vec3::new(-10.0, 0.0, 0.0), Vec3::splat(1.0));
        assert_eq!(b.min, Vec3::new(-10.5, -2.0, -3.0));
        assert_eq!(b.max, Vec3::new(11.0, 2.0, 3.0));
        assert_eq!(b.center(), Vec3::new(0.25, 0.0, 0.0));
    }

    #[test]
    fn test_empty_bbox_center_is_zero() {
        assert_eq!(BBox3f::EMPTY.center(), Vec3::ZERO);
        assert_eq!(BBox3f::EMPTY.size(), Vec3::ZERO);
    }

    #[test]
    fn test_fixed5_and_channel() {
        assert_eq!(fixed5(0.5), "0.50000");
        assert_eq!(fixed5(-1.0), "-1.00000");
        assert_eq!(channel_u8(1.0), 255);
        assert_eq!(channel_u8(0.5), 127);
        assert_eq!(channel_u8(2.0), 255);
    }
}
