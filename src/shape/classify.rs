//! Geometry-to-shape decision table.
//!
//! Rules are tried in order; the first match wins. The order matters:
//! a flexible path with a triangular profile must hit the linear prism
//! rule before the flexible catch-all, and the sphere/torus split is
//! decided by the path's Y scale ratio because both sweep a circle
//! around a circle.

use tracing::info;

use crate::scene::{HoleKind, PathKind, ProfileKind, SceneObject, VolumeParams};
use crate::scene::{PCODE_LEGACY_GRASS, PCODE_LEGACY_TREE, PCODE_TREE_NEW};

use super::{PrimShape, ShapeKind};

/// Y ratio above which a circle-on-circle sweep reads as a sphere.
pub const SPHERE_TORUS_SPLIT: f32 = 0.75;

/// Decoded classifier input.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeInput {
    pub path: PathKind,
    pub profile: ProfileKind,
    pub hole: HoleKind,
    pub scale_y: f32,
}

impl ShapeInput {
    pub fn new(path: PathKind, profile: ProfileKind, scale_y: f32) -> Self {
        Self { path, profile, hole: HoleKind::Same, scale_y }
    }

    pub fn from_volume(volume: &VolumeParams) -> Self {
        Self {
            path: volume.path_kind(),
            profile: volume.profile_kind(),
            hole: volume.hole_kind(),
            scale_y: volume.ratio_y(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathMatch {
    /// Line or flexible.
    Linear,
    Flexible,
    Circle,
    Circle2,
}

impl PathMatch {
    fn matches(self, path: PathKind) -> bool {
        match self {
            Self::Linear => path.is_linear(),
            Self::Flexible => path == PathKind::Flexible,
            Self::Circle => path == PathKind::Circle,
            Self::Circle2 => path == PathKind::Circle2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProfileMatch {
    Any,
    Is(ProfileKind),
    /// Isosceles, equilateral or right triangle.
    Triangle,
}

impl ProfileMatch {
    fn matches(self, profile: ProfileKind) -> bool {
        match self {
            Self::Any => true,
            Self::Is(kind) => profile == kind,
            Self::Triangle => profile.is_triangle(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScaleMatch {
    Any,
    Above(f32),
    AtMost(f32),
}

impl ScaleMatch {
    fn matches(self, scale_y: f32) -> bool {
        match self {
            Self::Any => true,
            Self::Above(t) => scale_y > t,
            Self::AtMost(t) => scale_y <= t,
        }
    }
}

/// One (pattern -> shape) entry of the decision table.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeRule {
    pub path: PathMatch,
    pub profile: ProfileMatch,
    pub scale_y: ScaleMatch,
    pub shape: ShapeKind,
}

impl ShapeRule {
    const fn new(path: PathMatch, profile: ProfileMatch, scale_y: ScaleMatch, shape: ShapeKind) -> Self {
        Self { path, profile, scale_y, shape }
    }

    pub fn matches(&self, input: &ShapeInput) -> bool {
        self.path.matches(input.path)
            && self.profile.matches(input.profile)
            && self.scale_y.matches(input.scale_y)
    }
}

use PathMatch as P;
use ProfileMatch as Pr;
use ScaleMatch as S;

/// The decision table, in priority order.
pub const SHAPE_RULES: &[ShapeRule] = &[
    ShapeRule::new(P::Linear, Pr::Is(ProfileKind::Circle), S::Any, ShapeKind::Cylinder),
    ShapeRule::new(P::Linear, Pr::Is(ProfileKind::Square), S::Any, ShapeKind::Box),
    ShapeRule::new(P::Linear, Pr::Triangle, S::Any, ShapeKind::Prism),
    // Flexible paths with any other profile.
    ShapeRule::new(P::Flexible, Pr::Any, S::Any, ShapeKind::Cylinder),
    ShapeRule::new(P::Circle, Pr::Is(ProfileKind::Circle), S::Above(SPHERE_TORUS_SPLIT), ShapeKind::Sphere),
    ShapeRule::new(P::Circle, Pr::Is(ProfileKind::Circle), S::AtMost(SPHERE_TORUS_SPLIT), ShapeKind::Torus),
    ShapeRule::new(P::Circle, Pr::Is(ProfileKind::HalfCircle), S::Any, ShapeKind::Sphere),
    // Spirals have no output shape of their own.
    ShapeRule::new(P::Circle2, Pr::Is(ProfileKind::Circle), S::Any, ShapeKind::Sphere),
    ShapeRule::new(P::Circle, Pr::Is(ProfileKind::EquilateralTriangle), S::Any, ShapeKind::Ring),
    ShapeRule::new(P::Circle, Pr::Is(ProfileKind::Square), S::AtMost(SPHERE_TORUS_SPLIT), ShapeKind::Tube),
];

/// First rule matching `input`, if any.
pub fn match_rule(input: &ShapeInput) -> Option<&'static ShapeRule> {
    SHAPE_RULES.iter().find(|rule| rule.matches(input))
}

/// Classify into a shape tag, falling back to box for unknown combinations.
pub fn classify(input: &ShapeInput) -> ShapeKind {
    match match_rule(input) {
        Some(rule) => rule.shape,
        None => {
            info!(
                "Unknown path {:?} profile {:?} (scale_y {:.3}), exporting as box",
                input.path, input.profile, input.scale_y
            );
            ShapeKind::Box
        }
    }
}

/// Output shape of a whole object: trees, grass and sculpts skip the table.
pub fn classify_object(object: &SceneObject) -> PrimShape {
    if object.sculpt.is_some() {
        return PrimShape::Sculpt;
    }
    match object.pcode {
        PCODE_LEGACY_GRASS => PrimShape::Grass { species: object.state },
        PCODE_LEGACY_TREE | PCODE_TREE_NEW => PrimShape::Tree { species: object.state },
        _ => PrimShape::Volume(classify(&ShapeInput::from_volume(&object.volume))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(path: PathKind, profile: ProfileKind, scale_y: f32) -> ShapeKind {
        classify(&ShapeInput::new(path, profile, scale_y))
    }

    #[test]
    fn test_linear_paths() {
        assert_eq!(shape(PathKind::Line, ProfileKind::Square, 1.0), ShapeKind::Box);
        assert_eq!(shape(PathKind::Line, ProfileKind::Circle, 1.0), ShapeKind::Cylinder);
        assert_eq!(shape(PathKind::Line, ProfileKind::RightTriangle, 1.0), ShapeKind::Prism);
        assert_eq!(shape(PathKind::Flexible, ProfileKind::IsoTriangle, 1.0), ShapeKind::Prism);
        assert_eq!(shape(PathKind::Flexible, ProfileKind::HalfCircle, 1.0), ShapeKind::Cylinder);
    }

    #[test]
    fn test_sphere_torus_split() {
        assert_eq!(shape(PathKind::Circle, ProfileKind::Circle, 0.9), ShapeKind::Sphere);
        assert_eq!(shape(PathKind::Circle, ProfileKind::Circle, 0.5), ShapeKind::Torus);
        assert_eq!(shape(PathKind::Circle, ProfileKind::Circle, 0.75), ShapeKind::Torus);
        assert_eq!(shape(PathKind::Circle, ProfileKind::HalfCircle, 0.1), ShapeKind::Sphere);
        assert_eq!(shape(PathKind::Circle2, ProfileKind::Circle, 0.1), ShapeKind::Sphere);
    }

    #[test]
    fn test_ring_and_tube() {
        assert_eq!(shape(PathKind::Circle, ProfileKind::EquilateralTriangle, 1.0), ShapeKind::Ring);
        assert_eq!(shape(PathKind::Circle, ProfileKind::Square, 0.25), ShapeKind::Tube);
    }

    #[test]
    fn test_unknown_combinations_fall_back_to_box() {
        let wide_tube = ShapeInput::new(PathKind::Circle, ProfileKind::Square, 0.9);
        assert!(match_rule(&wide_tube).is_none());
        assert_eq!(classify(&wide_tube), ShapeKind::Box);
        assert_eq!(shape(PathKind::Other(0x40), ProfileKind::Circle, 1.0), ShapeKind::Box);
        assert_eq!(shape(PathKind::Circle, ProfileKind::IsoTriangle, 1.0), ShapeKind::Box);
    }

    #[test]
    fn test_object_level_bypass() {
        use crate::scene::{SculptParams, PCODE_LEGACY_TREE};
        use uuid::Uuid;

        let mut obj = SceneObject::volume(Uuid::from_u128(1), 1);
        assert_eq!(classify_object(&obj), PrimShape::Volume(ShapeKind::Box));

        obj.sculpt = Some(SculptParams { texture: Uuid::from_u128(9), sculpt_type: 1 });
        assert_eq!(classify_object(&obj), PrimShape::Sculpt);

        obj.sculpt = None;
        obj.pcode = PCODE_LEGACY_TREE;
        obj.state = 3;
        assert_eq!(classify_object(&obj), PrimShape::Tree { species: 3 });
    }
}
