//! Contained-inventory requests, filtering and asset mirroring.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::host::RemoteChannel;
use crate::scene::{AssetType, InventoryItem, LocalId, ObjectId};

use super::document::{DocumentModel, FieldWrite, InventoryEntry};
use super::pending::{PendingSet, RetryOutcome, RetryPolicy};
use super::query::ReplyOutcome;
use super::JobId;

/// Subfolder of the asset directory holding mirrored items.
pub const INVENTORY_FOLDER: &str = "inventory";

/// Request to copy one inventory item's bytes to disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetMirrorRequest {
    pub item_id: Uuid,
    pub asset_id: Uuid,
    pub asset_type: AssetType,
    /// Object holding the item.
    pub container: ObjectId,
    pub destination: PathBuf,
}

impl AssetMirrorRequest {
    /// `<item_id>.<type>`
    pub fn file_name(item_id: &Uuid, asset_type: AssetType) -> String {
        format!("{}.{}", item_id, asset_type.lookup())
    }
}

/// Items an agent may take out of a prim.
pub fn exportable(item: &InventoryItem, agent: &Uuid) -> bool {
    item.asset_type.is_downloadable() && item.permissions.allows_export_by(agent)
}

/// Tracks inventory requests and the mirror requests they spawn.
#[derive(Debug, Default)]
pub struct InventoryCollector {
    pending: PendingSet,
    answered: u32,
    abandoned: u32,
    mirrors: HashMap<Uuid, AssetMirrorRequest>,
}

impl InventoryCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(
        &mut self,
        job: JobId,
        object: ObjectId,
        local_id: LocalId,
        now: Instant,
        remote: &mut dyn RemoteChannel,
    ) -> bool {
        if !self.pending.insert(object, local_id, now) {
            debug!("inventory for {} already pending", object);
            return false;
        }
        remote.request_inventory(job, object, local_id);
        true
    }

    /// Filter a listing, store it on the node and plan mirror requests.
    ///
    /// Mirror requests are returned only for a first write; they are also
    /// remembered so the asset reply can be routed to its file.
    pub fn on_reply(
        &mut self,
        object: &ObjectId,
        items: &[InventoryItem],
        agent: &Uuid,
        asset_dir: &Path,
        document: &mut DocumentModel,
    ) -> (ReplyOutcome, Vec<AssetMirrorRequest>) {
        if self.pending.remove(object).is_none() {
            return (ReplyOutcome::Unmatched, Vec::new());
        }
        self.answered += 1;

        let mut entries = Vec::new();
        let mut mirrors = Vec::new();
        for item in items.iter().filter(|item| exportable(item, agent)) {
            let file_name = AssetMirrorRequest::file_name(&item.item_id, item.asset_type);
            entries.push(InventoryEntry {
                item_id: item.item_id,
                name: item.name.clone(),
                description: item.description.clone(),
                asset_type: item.asset_type,
                file: Some(format!("{}/{}", INVENTORY_FOLDER, file_name)),
            });
            mirrors.push(AssetMirrorRequest {
                item_id: item.item_id,
                asset_id: item.asset_id,
                asset_type: item.asset_type,
                container: *object,
                destination: asset_dir.join(INVENTORY_FOLDER).join(file_name),
            });
        }
        debug!("inventory of {}: {} of {} items exportable", object, entries.len(), items.len());

        match document.set_inventory(object, entries) {
            FieldWrite::Written => {
                for m in &mirrors {
                    self.mirrors.insert(m.item_id, m.clone());
                }
                (ReplyOutcome::Applied, mirrors)
            }
            FieldWrite::AlreadySet => (ReplyOutcome::Duplicate, Vec::new()),
            FieldWrite::Orphan => {
                warn!("inventory reply for {} has no node record", object);
                (ReplyOutcome::Orphan, Vec::new())
            }
        }
    }

    /// Take the mirror request for a delivered asset.
    pub fn complete_mirror(&mut self, item_id: &Uuid) -> Option<AssetMirrorRequest> {
        self.mirrors.remove(item_id)
    }

    pub fn retry_overdue(
        &mut self,
        job: JobId,
        now: Instant,
        policy: &RetryPolicy,
        remote: &mut dyn RemoteChannel,
    ) -> RetryOutcome {
        let out = self.pending.retry_overdue(now, policy, |q| {
            debug!("re-requesting inventory for {} (retry {})", q.object, q.retries + 1);
            remote.request_inventory(job, q.object, q.local_id);
        });
        self.abandoned += out.abandoned.len() as u32;
        out
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn settled(&self) -> u32 {
        self.answered + self.abandoned
    }

    pub fn outstanding_mirrors(&self) -> usize {
        self.mirrors.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.answered = 0;
        self.abandoned = 0;
        self.mirrors.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::document::{NodeBase, NodeRecord};
    use crate::scene::{ItemPermissions, SceneObject, PERM_COPY, PERM_MODIFY, PERM_TRANSFER};

    #[derive(Default)]
    struct Recorder {
        inventory: Vec<LocalId>,
    }

    impl RemoteChannel for Recorder {
        fn send_properties_request(&mut self, _: JobId, _: ObjectId, _: LocalId) {}
        fn request_inventory(&mut self, _: JobId, _: ObjectId, local_id: LocalId) {
            self.inventory.push(local_id);
        }
        fn request_asset(&mut self, _: JobId, _: &AssetMirrorRequest) {}
        fn fetch_texture(&mut self, _: JobId, _: Uuid) -> crate::host::TextureFetch {
            crate::host::TextureFetch::Pending
        }
    }

    fn item(n: u128, asset_type: AssetType, owner_mask: u32) -> InventoryItem {
        InventoryItem {
            item_id: Uuid::from_u128(n),
            asset_id: Uuid::from_u128(n + 100),
            name: format!("item {}", n),
            description: String::new(),
            asset_type,
            permissions: ItemPermissions { owner: Uuid::from_u128(7), owner_mask, ..Default::default() },
        }
    }

    #[test]
    fn test_filter_and_mirror_paths() {
        let agent = Uuid::from_u128(7);
        let obj = Uuid::from_u128(1);
        let full = PERM_COPY | PERM_MODIFY | PERM_TRANSFER;

        let mut doc = DocumentModel::new();
        let ls = doc.begin_linkset(obj);
        doc.push_node(ls, NodeRecord::new(NodeBase::capture(&SceneObject::volume(obj, 1))));

        let mut remote = Recorder::default();
        let mut inv = InventoryCollector::new();
        assert!(inv.submit(1, obj, 1, Instant::now(), &mut remote));
        assert_eq!(remote.inventory, vec![1]);

        let items = vec![
            item(10, AssetType::Notecard, full),
            item(11, AssetType::Object, full),
            item(12, AssetType::LslText, PERM_COPY | PERM_MODIFY),
            item(13, AssetType::LslText, full),
        ];
        let (outcome, mirrors) = inv.on_reply(&obj, &items, &agent, Path::new("/out"), &mut doc);
        assert_eq!(outcome, ReplyOutcome::Applied);
        assert_eq!(mirrors.len(), 2);
        assert_eq!(
            mirrors[1].destination,
            Path::new("/out/inventory").join(format!("{}.lsltext", Uuid::from_u128(13)))
        );

        let stored = doc.get(&obj).unwrap().inventory.as_ref().unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].name, "item 10");
        assert_eq!(inv.outstanding_mirrors(), 2);
        assert!(inv.complete_mirror(&Uuid::from_u128(10)).is_some());
        assert!(inv.complete_mirror(&Uuid::from_u128(10)).is_none());

        // Late duplicate: nothing pending any more.
        let (outcome, _) = inv.on_reply(&obj, &items, &agent, Path::new("/out"), &mut doc);
        assert_eq!(outcome, ReplyOutcome::Unmatched);
        assert_eq!(inv.settled(), 1);
    }
}
