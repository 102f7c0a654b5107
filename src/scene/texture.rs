//! Per-face texture entries and decoded texture pixels.

use glam::Vec4;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One face's texture parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureEntry {
    pub image: Uuid,
    pub scale_s: f32,
    pub scale_t: f32,
    pub offset_s: f32,
    pub offset_t: f32,
    /// Rotation in radians.
    pub rotation: f32,
    pub color: Vec4,
    pub glow: f32,
    pub fullbright: bool,
    pub shiny: u8,
    pub bump: u8,
}

impl Default for TextureEntry {
    fn default() -> Self {
        Self {
            image: Uuid::nil(),
            scale_s: 1.0,
            scale_t: 1.0,
            offset_s: 0.0,
            offset_t: 0.0,
            rotation: 0.0,
            color: Vec4::ONE,
            glow: 0.0,
            fullbright: false,
            shiny: 0,
            bump: 0,
        }
    }
}

impl TextureEntry {
    /// Any of fullbright / shine / bump deviates from the default.
    #[inline]
    pub fn has_material_flags(&self) -> bool {
        self.fullbright || self.shiny != 0 || self.bump != 0
    }
}

/// Decoded texture pixels as handed back by the image subsystem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawImage {
    pub width: u32,
    pub height: u32,
    /// Channels per pixel: 1 (L), 2 (LA), 3 (RGB) or 4 (RGBA).
    pub components: u8,
    pub data: Vec<u8>,
}

impl RawImage {
    pub fn new(width: u32, height: u32, components: u8, data: Vec<u8>) -> Self {
        Self { width, height, components, data }
    }

    /// Byte length implied by the dimensions.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.components as usize
    }
}
