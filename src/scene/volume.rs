//! Raw volume (prim geometry) parameters.
//!
//! These mirror the wire representation a scene graph hands out: one
//! profile curve swept along one path curve, each with a raw type code
//! and a handful of cut/scale/shear ranges. Decoding the raw codes into
//! [`PathKind`] / [`ProfileKind`] / [`HoleKind`] is done here; mapping
//! those onto output shapes lives in [`crate::shape`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Low nibble of the profile code: the profile curve.
pub const PROFILE_MASK: u8 = 0x0f;
/// High nibble of the profile code: the hollow (hole) shape.
pub const HOLE_MASK: u8 = 0xf0;

pub const PROFILE_CIRCLE: u8 = 0x00;
pub const PROFILE_SQUARE: u8 = 0x01;
pub const PROFILE_ISOTRI: u8 = 0x02;
pub const PROFILE_EQUALTRI: u8 = 0x03;
pub const PROFILE_RIGHTTRI: u8 = 0x04;
pub const PROFILE_CIRCLE_HALF: u8 = 0x05;

pub const HOLE_SAME: u8 = 0x00;
pub const HOLE_CIRCLE: u8 = 0x10;
pub const HOLE_SQUARE: u8 = 0x20;
pub const HOLE_TRIANGLE: u8 = 0x30;

pub const PATH_LINE: u8 = 0x10;
pub const PATH_CIRCLE: u8 = 0x20;
pub const PATH_CIRCLE2: u8 = 0x30;
pub const PATH_TEST: u8 = 0x40;
pub const PATH_FLEXIBLE: u8 = 0x80;

/// Decoded path curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PathKind {
    Line,
    Circle,
    /// Secondary circular path (spiral sweep).
    Circle2,
    Flexible,
    Other(u8),
}

impl PathKind {
    /// Decode a raw path code.
    pub fn from_code(code: u8) -> Self {
        match code {
            PATH_LINE => Self::Line,
            PATH_CIRCLE => Self::Circle,
            PATH_CIRCLE2 => Self::Circle2,
            PATH_FLEXIBLE => Self::Flexible,
            other => Self::Other(other),
        }
    }

    /// Line and flexible paths sweep straight.
    #[inline]
    pub fn is_linear(self) -> bool {
        matches!(self, Self::Line | Self::Flexible)
    }
}

/// Decoded profile curve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProfileKind {
    Circle,
    Square,
    IsoTriangle,
    EquilateralTriangle,
    RightTriangle,
    HalfCircle,
    Other(u8),
}

impl ProfileKind {
    /// Decode the profile nibble of a raw profile code.
    pub fn from_code(code: u8) -> Self {
        match code & PROFILE_MASK {
            PROFILE_CIRCLE => Self::Circle,
            PROFILE_SQUARE => Self::Square,
            PROFILE_ISOTRI => Self::IsoTriangle,
            PROFILE_EQUALTRI => Self::EquilateralTriangle,
            PROFILE_RIGHTTRI => Self::RightTriangle,
            PROFILE_CIRCLE_HALF => Self::HalfCircle,
            other => Self::Other(other),
        }
    }

    #[inline]
    pub fn is_triangle(self) -> bool {
        matches!(
            self,
            Self::IsoTriangle | Self::EquilateralTriangle | Self::RightTriangle
        )
    }
}

/// Decoded hollow shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HoleKind {
    Same,
    Circle,
    Square,
    Triangle,
    Other(u8),
}

impl HoleKind {
    /// Decode the hole nibble of a raw profile code.
    pub fn from_code(code: u8) -> Self {
        match code & HOLE_MASK {
            HOLE_SAME => Self::Same,
            HOLE_CIRCLE => Self::Circle,
            HOLE_SQUARE => Self::Square,
            HOLE_TRIANGLE => Self::Triangle,
            other => Self::Other(other),
        }
    }
}

/// Profile (cross-section) parameters. `begin`/`end` are the S range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileParams {
    /// Raw code: profile nibble | hole nibble.
    pub curve: u8,
    pub begin: f32,
    pub end: f32,
    /// Hollow fraction, 0..0.95.
    pub hollow: f32,
}

impl Default for ProfileParams {
    fn default() -> Self {
        Self { curve: PROFILE_SQUARE, begin: 0.0, end: 1.0, hollow: 0.0 }
    }
}

/// Path (sweep) parameters. `begin`/`end` are the T range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathParams {
    pub curve: u8,
    pub begin: f32,
    pub end: f32,
    /// Top size ratio; also the hole size for circular sweeps.
    pub scale: Vec2,
    pub shear: Vec2,
    /// Twist at the start of the path, in half turns.
    pub twist_begin: f32,
    /// Twist at the end of the path, in half turns.
    pub twist_end: f32,
    pub radius_offset: f32,
    pub taper: Vec2,
    pub revolutions: f32,
    pub skew: f32,
}

impl Default for PathParams {
    fn default() -> Self {
        Self {
            curve: PATH_LINE,
            begin: 0.0,
            end: 1.0,
            scale: Vec2::ONE,
            shear: Vec2::ZERO,
            twist_begin: 0.0,
            twist_end: 0.0,
            radius_offset: 0.0,
            taper: Vec2::ZERO,
            revolutions: 1.0,
            skew: 0.0,
        }
    }
}

/// Full volume description of a prim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeParams {
    pub profile: ProfileParams,
    pub path: PathParams,
}

impl VolumeParams {
    /// Construct from raw curve codes with default ranges.
    pub fn with_curves(profile: u8, path: u8) -> Self {
        let mut params = Self::default();
        params.profile.curve = profile;
        params.path.curve = path;
        params
    }

    pub fn path_kind(&self) -> PathKind {
        PathKind::from_code(self.path.curve)
    }

    pub fn profile_kind(&self) -> ProfileKind {
        ProfileKind::from_code(self.profile.curve)
    }

    pub fn hole_kind(&self) -> HoleKind {
        HoleKind::from_code(self.profile.curve)
    }

    #[inline]
    pub fn ratio_x(&self) -> f32 {
        self.path.scale.x
    }

    #[inline]
    pub fn ratio_y(&self) -> f32 {
        self.path.scale.y
    }

    /// Profile cut range (S).
    #[inline]
    pub fn s_range(&self) -> (f32, f32) {
        (self.profile.begin, self.profile.end)
    }

    /// Path cut range (T).
    #[inline]
    pub fn t_range(&self) -> (f32, f32) {
        (self.path.begin, self.path.end)
    }
}
