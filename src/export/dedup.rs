//! Per-job texture request deduplication.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use crate::scene::AssetId;

/// Which texture slot referenced an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Face,
    SculptMap,
}

impl TextureRole {
    /// Subfolder of the asset directory.
    pub fn folder(self) -> &'static str {
        match self {
            Self::Face => "textures",
            Self::SculptMap => "sculptmaps",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Face => "Prim Texture",
            Self::SculptMap => "Sculpt Texture",
        }
    }
}

/// A texture save in flight.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextureRequest {
    pub asset: AssetId,
    pub role: TextureRole,
    /// Destination without extension; one file per configured format.
    pub destination: PathBuf,
}

/// Tracks which texture assets were already requested this job.
#[derive(Debug, Default)]
pub struct AssetDeduplicator {
    seen: HashSet<AssetId>,
    outstanding: HashMap<AssetId, TextureRequest>,
}

impl AssetDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `request` unless its asset was seen before. Returns true on first sight.
    pub fn request_once(&mut self, request: TextureRequest) -> bool {
        if !self.seen.insert(request.asset) {
            return false;
        }
        self.outstanding.insert(request.asset, request);
        true
    }

    /// Take the request for a delivered texture. None if unknown or already delivered.
    pub fn complete(&mut self, asset: &AssetId) -> Option<TextureRequest> {
        self.outstanding.remove(asset)
    }

    pub fn contains(&self, asset: &AssetId) -> bool {
        self.seen.contains(asset)
    }

    pub fn requested(&self) -> usize {
        self.seen.len()
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding.len()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
        self.outstanding.clear();
    }
}
