//! Shape-specific reinterpretation of raw volume parameters.
//!
//! The same raw fields mean different things depending on the output
//! shape: circular sweeps take their path cut from T and their advanced
//! cut from S while linear ones swap the two; taper is `1 - ratio` on
//! linear shapes but the path taper on torus-like shapes, where the ratio
//! instead becomes the hole size.

use glam::Vec2;
use serde::Serialize;

use crate::scene::{HoleKind, VolumeParams};

use super::ShapeKind;

/// Hollow shape code written to the document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum HoleShape {
    Same,
    Square,
    Circle,
    Triangle,
}

impl HoleShape {
    /// Unknown hole bits export as "same".
    pub fn from_kind(kind: HoleKind) -> Self {
        match kind {
            HoleKind::Circle => Self::Circle,
            HoleKind::Square => Self::Square,
            HoleKind::Triangle => Self::Triangle,
            HoleKind::Same | HoleKind::Other(_) => Self::Same,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Same => 1,
            Self::Square => 2,
            Self::Circle => 3,
            Self::Triangle => 4,
        }
    }
}

/// Hollow amount (percent) and hole shape.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Hollow {
    pub amount: f32,
    pub shape: HoleShape,
}

/// Extra block emitted only for torus, tube and ring.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CircularBlock {
    pub hole_size: Vec2,
    pub profile_cut: (f32, f32),
    pub skew: f32,
    pub radius_offset: f32,
    pub revolutions: f32,
}

/// All shape-dependent output fields of one volume prim.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ShapeBlock {
    /// Every shape except sphere.
    pub top_shear: Option<Vec2>,
    /// Sphere only: the advanced cut.
    pub dimple: Option<(f32, f32)>,
    pub taper: Option<Vec2>,
    pub circular: Option<CircularBlock>,
    pub path_cut: (f32, f32),
    /// (begin, end) in degrees.
    pub twist: (f32, f32),
    pub hollow: Option<Hollow>,
}

impl ShapeBlock {
    /// Derive the block for `shape` from raw parameters.
    pub fn derive(shape: ShapeKind, volume: &VolumeParams) -> Self {
        let (path_cut, adv_cut) = if shape.is_circular_sweep() {
            (volume.t_range(), volume.s_range())
        } else {
            (volume.s_range(), volume.t_range())
        };

        let (top_shear, dimple) = if shape == ShapeKind::Sphere {
            (None, Some(adv_cut))
        } else {
            (Some(volume.path.shear), None)
        };

        let ratio = Vec2::new(volume.ratio_x(), volume.ratio_y());
        let (taper, circular) = if shape.has_ratio_taper() {
            (Some(Vec2::ONE - ratio), None)
        } else if shape.has_hole_block() {
            let block = CircularBlock {
                hole_size: ratio,
                profile_cut: adv_cut,
                skew: volume.path.skew,
                radius_offset: volume.path.radius_offset,
                revolutions: volume.path.revolutions,
            };
            (Some(volume.path.taper), Some(block))
        } else {
            (None, None)
        };

        let hollow = (volume.profile.hollow > 0.0).then(|| Hollow {
            amount: volume.profile.hollow * 100.0,
            shape: HoleShape::from_kind(volume.hole_kind()),
        });

        Self {
            top_shear,
            dimple,
            taper,
            circular,
            path_cut,
            twist: (volume.path.twist_begin * 180.0, volume.path.twist_end * 180.0),
            hollow,
        }
    }

    /// Block for trees and grass: linear cuts, shear, twist and hollow only.
    pub fn foliage(volume: &VolumeParams) -> Self {
        Self { taper: None, ..Self::derive(ShapeKind::Box, volume) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::volume::*;

    fn cut_volume() -> VolumeParams {
        let mut v = VolumeParams::default();
        v.profile.begin = 0.1;
        v.profile.end = 0.9;
        v.path.begin = 0.2;
        v.path.end = 0.8;
        v
    }

    #[test]
    fn test_cut_swap_by_shape() {
        let v = cut_volume();
        let boxy = ShapeBlock::derive(ShapeKind::Box, &v);
        assert_eq!(boxy.path_cut, (0.1, 0.9));

        let torus = ShapeBlock::derive(ShapeKind::Torus, &v);
        assert_eq!(torus.path_cut, (0.2, 0.8));
        assert_eq!(torus.circular.unwrap().profile_cut, (0.1, 0.9));

        let sphere = ShapeBlock::derive(ShapeKind::Sphere, &v);
        assert_eq!(sphere.dimple, Some((0.1, 0.9)));
        assert!(sphere.top_shear.is_none());
    }

    #[test]
    fn test_taper_sources() {
        let mut v = VolumeParams::default();
        v.path.scale = Vec2::new(0.25, 0.5);
        v.path.taper = Vec2::new(0.3, -0.3);

        let prism = ShapeBlock::derive(ShapeKind::Prism, &v);
        assert_eq!(prism.taper, Some(Vec2::new(0.75, 0.5)));
        assert!(prism.circular.is_none());

        let tube = ShapeBlock::derive(ShapeKind::Tube, &v);
        assert_eq!(tube.taper, Some(Vec2::new(0.3, -0.3)));
        assert_eq!(tube.circular.unwrap().hole_size, Vec2::new(0.25, 0.5));

        let sphere = ShapeBlock::derive(ShapeKind::Sphere, &v);
        assert!(sphere.taper.is_none());
    }

    #[test]
    fn test_hollow_shape_codes() {
        let mut v = VolumeParams::with_curves(PROFILE_SQUARE | HOLE_TRIANGLE, PATH_LINE);
        assert!(ShapeBlock::derive(ShapeKind::Box, &v).hollow.is_none());

        v.profile.hollow = 0.5;
        let hollow = ShapeBlock::derive(ShapeKind::Box, &v).hollow.unwrap();
        assert_eq!(hollow.amount, 50.0);
        assert_eq!(hollow.shape.code(), 4);

        v.profile.curve = PROFILE_SQUARE | 0x70;
        let hollow = ShapeBlock::derive(ShapeKind::Box, &v).hollow.unwrap();
        assert_eq!(hollow.shape, HoleShape::Same);
        assert_eq!(hollow.shape.code(), 1);
    }

    #[test]
    fn test_twist_in_degrees() {
        let mut v = VolumeParams::default();
        v.path.twist_begin = -0.5;
        v.path.twist_end = 1.0;
        assert_eq!(ShapeBlock::derive(ShapeKind::Box, &v).twist, (-90.0, 180.0));
    }

    #[test]
    fn test_foliage_block() {
        let v = cut_volume();
        let block = ShapeBlock::foliage(&v);
        assert_eq!(block.path_cut, (0.1, 0.9));
        assert!(block.top_shear.is_some());
        assert!(block.taper.is_none());
        assert!(block.circular.is_none());
        assert!(block.dimple.is_none());
    }
}
