//! Scene-side data the exporter consumes.
//!
//! - [`SceneObject`] - one in-world object as a scene graph reports it
//! - [`VolumeParams`] - raw profile/path geometry and its decoded kinds
//! - [`TextureEntry`] / [`RawImage`] - per-face textures and pixels
//! - [`InventoryItem`] - contained items with their permission blocks
//! - pcodes, permission masks and raw curve codes

mod inventory;
mod object;
mod params;
mod permissions;
mod texture;
pub mod volume;

pub use inventory::{AssetType, InventoryItem};
pub use object::{Attachment, ObjectFlags, SceneObject};
pub use params::{FlexibleParams, LightParams, SculptParams};
pub use permissions::*;
pub use texture::{RawImage, TextureEntry};
pub use volume::{HoleKind, PathKind, PathParams, ProfileKind, ProfileParams, VolumeParams};

use uuid::Uuid;

/// Persistent object identity.
pub type ObjectId = Uuid;
/// Texture / asset identity.
pub type AssetId = Uuid;
/// Region-local object id used on the wire.
pub type LocalId = u32;

/// Primitive code of an object.
pub type PCode = u8;

pub const PCODE_VOLUME: PCode = 9;
pub const PCODE_AVATAR: PCode = 47;
pub const PCODE_LEGACY_GRASS: PCode = 95;
pub const PCODE_TREE_NEW: PCode = 111;
pub const PCODE_LEGACY_TREE: PCode = 255;
