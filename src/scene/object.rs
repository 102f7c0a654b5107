//! Scene object snapshot handed out by a scene graph.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::params::{FlexibleParams, LightParams, SculptParams};
use super::permissions::ObjectPermissions;
use super::texture::TextureEntry;
use super::volume::VolumeParams;
use super::{LocalId, ObjectId, PCode, PCODE_VOLUME};

/// Attachment placement for a root object worn by an avatar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    /// Attachment point index, 0 means default location.
    pub point: u8,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Per-object state flags.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectFlags {
    pub phantom: bool,
    pub physical: bool,
    pub cast_shadows: bool,
}

/// Everything the exporter reads from one in-world object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub id: ObjectId,
    pub local_id: LocalId,
    #[serde(default)]
    pub parent: Option<ObjectId>,
    #[serde(default)]
    pub children: Vec<ObjectId>,
    #[serde(default = "default_pcode")]
    pub pcode: PCode,
    /// Species for trees and grass.
    #[serde(default)]
    pub state: u8,
    #[serde(default)]
    pub is_avatar: bool,
    #[serde(default = "full_permissions")]
    pub permissions: ObjectPermissions,
    /// Region-relative position.
    #[serde(default)]
    pub position: Vec3,
    #[serde(default)]
    pub rotation: Quat,
    #[serde(default = "default_scale")]
    pub scale: Vec3,
    #[serde(default)]
    pub flags: ObjectFlags,
    #[serde(default)]
    pub volume: VolumeParams,
    #[serde(default)]
    pub light: Option<LightParams>,
    #[serde(default)]
    pub flexible: Option<FlexibleParams>,
    #[serde(default)]
    pub sculpt: Option<SculptParams>,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    #[serde(default)]
    pub attachment: Option<Attachment>,
}

fn default_pcode() -> PCode {
    PCODE_VOLUME
}

fn full_permissions() -> ObjectPermissions {
    ObjectPermissions::FULL
}

fn default_scale() -> Vec3 {
    Vec3::splat(0.5)
}

impl SceneObject {
    /// Minimal volume object, used by hosts and tests as a starting point.
    pub fn volume(id: Uuid, local_id: LocalId) -> Self {
        Self {
            id,
            local_id,
            parent: None,
            children: Vec::new(),
            pcode: PCODE_VOLUME,
            state: 0,
            is_avatar: false,
            permissions: ObjectPermissions::FULL,
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: default_scale(),
            flags: ObjectFlags::default(),
            volume: VolumeParams::default(),
            light: None,
            flexible: None,
            sculpt: None,
            textures: vec![TextureEntry::default()],
            attachment: None,
        }
    }

    #[inline]
    pub fn is_volume(&self) -> bool {
        self.pcode == PCODE_VOLUME
    }
}
