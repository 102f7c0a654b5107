//! Shape taxonomy: classification of raw prim geometry into output shapes.
//!
//! - [`classify`] / [`classify_object`] - the rule table
//! - [`ShapeBlock`] - shape-specific reinterpretation of cut/taper/hole fields

mod classify;
mod params;

pub use classify::{
    classify, classify_object, match_rule, PathMatch, ProfileMatch, ScaleMatch, ShapeInput,
    ShapeRule, SHAPE_RULES, SPHERE_TORUS_SPLIT,
};
pub use params::{CircularBlock, HoleShape, Hollow, ShapeBlock};

use serde::{Deserialize, Serialize};

/// Closed set of volumetric primitive shapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Box,
    Cylinder,
    Prism,
    Sphere,
    Torus,
    Ring,
    Tube,
}

impl ShapeKind {
    /// Element name in the output document.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Cylinder => "cylinder",
            Self::Prism => "prism",
            Self::Sphere => "sphere",
            Self::Torus => "torus",
            Self::Ring => "ring",
            Self::Tube => "tube",
        }
    }

    /// Shapes swept around a circular path; their cut ranges are swapped.
    #[inline]
    pub fn is_circular_sweep(self) -> bool {
        matches!(self, Self::Sphere | Self::Torus | Self::Tube | Self::Ring)
    }

    /// Shapes whose taper is `1 - ratio`.
    #[inline]
    pub fn has_ratio_taper(self) -> bool {
        matches!(self, Self::Box | Self::Cylinder | Self::Prism)
    }

    /// Shapes that carry hole size, profile cut, skew, radius offset, revolutions.
    #[inline]
    pub fn has_hole_block(self) -> bool {
        matches!(self, Self::Torus | Self::Tube | Self::Ring)
    }
}

/// Output shape of a node, including the non-volumetric cases.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimShape {
    Volume(ShapeKind),
    Sculpt,
    Tree { species: u8 },
    Grass { species: u8 },
}

impl PrimShape {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Volume(kind) => kind.tag(),
            Self::Sculpt => "sculpt",
            Self::Tree { .. } => "tree",
            Self::Grass { .. } => "grass",
        }
    }
}
