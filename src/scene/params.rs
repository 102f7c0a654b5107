//! Optional extra-parameter blocks attached to volume prims.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Point light emitted by a prim. Colour alpha carries intensity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightParams {
    pub color: Vec4,
    pub radius: f32,
    pub cutoff: f32,
    pub falloff: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self { color: Vec4::ONE, radius: 10.0, cutoff: 0.0, falloff: 0.75 }
    }
}

/// Flexible-path simulation parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlexibleParams {
    /// Simulation level of detail, shown as softness.
    pub softness: i32,
    pub gravity: f32,
    /// Air friction, shown as drag.
    pub drag: f32,
    pub wind: f32,
    pub tension: f32,
    pub force: Vec3,
}

impl Default for FlexibleParams {
    fn default() -> Self {
        Self { softness: 2, gravity: 0.3, drag: 2.0, wind: 0.0, tension: 1.0, force: Vec3::ZERO }
    }
}

/// Sculpted-prim parameters: the sculpt map texture and its topology.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SculptParams {
    pub texture: Uuid,
    /// Topology code (sphere/torus/plane/cylinder plus flag bits).
    pub sculpt_type: u8,
}
