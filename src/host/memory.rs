//! In-memory scene graph and its JSON scene file.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::export::NodeMetadata;
use crate::scene::{AssetId, InventoryItem, ObjectId, RawImage, SceneObject};
use crate::util::{Error, Result};

use super::SceneGraph;

/// Object map with a selection flag.
#[derive(Clone, Debug, Default)]
pub struct MemoryScene {
    objects: HashMap<ObjectId, SceneObject>,
    selection_cleared: bool,
}

impl MemoryScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_objects(objects: impl IntoIterator<Item = SceneObject>) -> Self {
        let mut scene = Self::new();
        for obj in objects {
            scene.insert(obj);
        }
        scene
    }

    pub fn insert(&mut self, object: SceneObject) {
        self.objects.insert(object.id, object);
    }

    pub fn remove(&mut self, id: &ObjectId) -> Option<SceneObject> {
        self.objects.remove(id)
    }

    pub fn object_mut(&mut self, id: &ObjectId) -> Option<&mut SceneObject> {
        self.objects.get_mut(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects without a parent.
    pub fn roots(&self) -> Vec<ObjectId> {
        let mut roots: Vec<_> = self
            .objects
            .values()
            .filter(|o| o.parent.is_none() && !o.is_avatar)
            .map(|o| o.id)
            .collect();
        roots.sort();
        roots
    }

    pub fn selection_cleared(&self) -> bool {
        self.selection_cleared
    }
}

impl SceneGraph for MemoryScene {
    fn object(&self, id: &ObjectId) -> Option<&SceneObject> {
        self.objects.get(id)
    }

    fn deselect_all(&mut self) {
        self.selection_cleared = true;
    }
}

/// A texture known to the scene file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTexture {
    /// Already decoded at full resolution.
    #[serde(default)]
    pub resident: bool,
    pub image: RawImage,
}

/// Self-contained scene plus the remote answers it should produce.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneFile {
    /// Grid or environment label for the document header.
    pub environment: String,
    /// Agent whose permissions filter inventory.
    pub agent_id: Uuid,
    pub objects: Vec<SceneObject>,
    /// Roots to export; empty selects every root.
    pub selection: Vec<ObjectId>,
    /// Properties replies. Objects without an entry never answer.
    pub properties: HashMap<ObjectId, NodeMetadata>,
    pub inventories: HashMap<ObjectId, Vec<InventoryItem>>,
    pub textures: HashMap<AssetId, SceneTexture>,
    /// Inventory asset contents by item id.
    pub assets: HashMap<Uuid, String>,
}

impl SceneFile {
    pub fn from_json(text: &str) -> Result<Self> {
        let file: Self = serde_json::from_str(text)?;
        file.validate()?;
        Ok(file)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Object ids must be unique and child links must point at known objects.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashMap::with_capacity(self.objects.len());
        for obj in &self.objects {
            if seen.insert(obj.id, obj).is_some() {
                return Err(Error::invalid_scene(format!("duplicate object id {}", obj.id)));
            }
        }
        for obj in &self.objects {
            if let Some(parent) = obj.parent {
                if !seen.contains_key(&parent) {
                    return Err(Error::invalid_scene(format!(
                        "object {} has unknown parent {}",
                        obj.id, parent
                    )));
                }
            }
        }
        Ok(())
    }

    /// Selection, defaulting to every root.
    pub fn effective_selection(&self, scene: &MemoryScene) -> Vec<ObjectId> {
        if self.selection.is_empty() {
            scene.roots()
        } else {
            self.selection.clone()
        }
    }

    pub fn scene(&self) -> MemoryScene {
        MemoryScene::from_objects(self.objects.iter().cloned())
    }
}
