//! In-memory export document: ordered linksets of node records.
//!
//! Records are created with the scene-side data at submission time; the
//! remote metadata and inventory fields are filled in later, once each,
//! as replies arrive.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::scene::{
    AssetType, Attachment, FlexibleParams, LightParams, LocalId, ObjectFlags, ObjectId, PCode,
    SceneObject, SculptParams, TextureEntry, VolumeParams,
};
use crate::shape::{classify_object, PrimShape};
use crate::util::{BBox3f, Quat, Vec3};

/// Node data captured from the scene graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeBase {
    pub id: ObjectId,
    pub local_id: LocalId,
    pub pcode: PCode,
    pub shape: PrimShape,
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
    pub flags: ObjectFlags,
    pub volume: VolumeParams,
    pub light: Option<LightParams>,
    pub flexible: Option<FlexibleParams>,
    pub sculpt: Option<SculptParams>,
    pub textures: Vec<TextureEntry>,
    pub attachment: Option<Attachment>,
}

impl NodeBase {
    pub fn capture(object: &SceneObject) -> Self {
        Self {
            id: object.id,
            local_id: object.local_id,
            pcode: object.pcode,
            shape: classify_object(object),
            position: object.position,
            rotation: object.rotation,
            scale: object.scale,
            flags: object.flags,
            volume: object.volume,
            light: object.light,
            flexible: object.flexible,
            sculpt: object.sculpt,
            textures: object.textures.clone(),
            attachment: object.attachment,
        }
    }
}

/// Object metadata delivered by a properties reply.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeMetadata {
    pub name: String,
    pub description: String,
    pub creator_id: Uuid,
    pub owner_id: Uuid,
    pub group_id: Uuid,
    pub last_owner_id: Uuid,
    pub creation_date: u64,
    pub base_mask: u32,
    pub owner_mask: u32,
    pub group_mask: u32,
    pub everyone_mask: u32,
    pub next_owner_mask: u32,
    pub sale_type: u8,
    pub sale_price: i32,
    pub touch_name: String,
    pub sit_name: String,
}

/// One exported inventory item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub item_id: Uuid,
    pub name: String,
    pub description: String,
    pub asset_type: AssetType,
    /// Mirror file, relative to the asset directory.
    pub file: Option<String>,
}

/// One node of the document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub base: NodeBase,
    pub metadata: Option<NodeMetadata>,
    pub inventory: Option<Vec<InventoryEntry>>,
}

impl NodeRecord {
    pub fn new(base: NodeBase) -> Self {
        Self { base, metadata: None, inventory: None }
    }
}

/// Root plus members, root first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinksetRecord {
    pub root: ObjectId,
    pub nodes: Vec<NodeRecord>,
}

/// Result of a write-once field update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldWrite {
    Written,
    /// The field was already set; the new value was dropped.
    AlreadySet,
    /// No record exists for the object.
    Orphan,
}

/// Ordered collection of linksets, indexed by object id.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DocumentModel {
    linksets: Vec<LinksetRecord>,
    #[serde(default, skip_serializing_if = "BBox3f::is_empty")]
    pub bounds: BBox3f,
    #[serde(skip)]
    index: HashMap<ObjectId, (usize, usize)>,
}

impl DocumentModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new linkset; returns its index.
    pub fn begin_linkset(&mut self, root: ObjectId) -> usize {
        self.linksets.push(LinksetRecord { root, nodes: Vec::new() });
        self.linksets.len() - 1
    }

    /// Append a node to linkset `linkset`. A node id already present is ignored.
    pub fn push_node(&mut self, linkset: usize, record: NodeRecord) -> bool {
        let id = record.base.id;
        if self.index.contains_key(&id) {
            return false;
        }
        let Some(ls) = self.linksets.get_mut(linkset) else {
            return false;
        };
        self.index.insert(id, (linkset, ls.nodes.len()));
        ls.nodes.push(record);
        true
    }

    pub fn get(&self, id: &ObjectId) -> Option<&NodeRecord> {
        let &(ls, node) = self.index.get(id)?;
        self.linksets.get(ls)?.nodes.get(node)
    }

    fn get_mut(&mut self, id: &ObjectId) -> Option<&mut NodeRecord> {
        let &(ls, node) = self.index.get(id)?;
        self.linksets.get_mut(ls)?.nodes.get_mut(node)
    }

    pub fn set_metadata(&mut self, id: &ObjectId, metadata: NodeMetadata) -> FieldWrite {
        match self.get_mut(id) {
            None => FieldWrite::Orphan,
            Some(node) if node.metadata.is_some() => FieldWrite::AlreadySet,
            Some(node) => {
                node.metadata = Some(metadata);
                FieldWrite::Written
            }
        }
    }

    pub fn set_inventory(&mut self, id: &ObjectId, items: Vec<InventoryEntry>) -> FieldWrite {
        match self.get_mut(id) {
            None => FieldWrite::Orphan,
            Some(node) if node.inventory.is_some() => FieldWrite::AlreadySet,
            Some(node) => {
                node.inventory = Some(items);
                FieldWrite::Written
            }
        }
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains_key(id)
    }

    pub fn linksets(&self) -> &[LinksetRecord] {
        &self.linksets
    }

    pub fn node_count(&self) -> usize {
        self.index.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeRecord> {
        self.linksets.iter().flat_map(|ls| ls.nodes.iter())
    }

    /// Rebuild the id index, e.g. after deserializing.
    pub fn reindex(&mut self) {
        self.index.clear();
        for (i, ls) in self.linksets.iter().enumerate() {
            for (j, node) in ls.nodes.iter().enumerate() {
                self.index.insert(node.base.id, (i, j));
            }
        }
    }

    pub fn clear(&mut self) {
        self.linksets.clear();
        self.index.clear();
        self.bounds = BBox3f::EMPTY;
    }
}
