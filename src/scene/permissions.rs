//! Permission masks for objects and inventory items.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PERM_TRANSFER: u32 = 1 << 13;
pub const PERM_MODIFY: u32 = 1 << 14;
pub const PERM_COPY: u32 = 1 << 15;
pub const PERM_MOVE: u32 = 1 << 19;
pub const PERM_ALL: u32 = 0x7fff_ffff;

/// Effective permissions the exporting agent holds on an in-world object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectPermissions {
    pub modify: bool,
    pub copy: bool,
    pub transfer: bool,
}

impl ObjectPermissions {
    pub const FULL: Self = Self { modify: true, copy: true, transfer: true };

    /// Modify, copy and transfer all granted.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.modify && self.copy && self.transfer
    }
}

/// Permission block carried by an inventory item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ItemPermissions {
    pub owner: Uuid,
    pub base_mask: u32,
    pub owner_mask: u32,
    pub group_mask: u32,
    pub everyone_mask: u32,
    pub next_owner_mask: u32,
}

impl Default for ItemPermissions {
    fn default() -> Self {
        Self {
            owner: Uuid::nil(),
            base_mask: PERM_ALL,
            owner_mask: PERM_ALL,
            group_mask: 0,
            everyone_mask: 0,
            next_owner_mask: PERM_ALL,
        }
    }
}

impl ItemPermissions {
    fn mask_for(&self, agent: &Uuid) -> u32 {
        if *agent == self.owner {
            self.owner_mask
        } else {
            self.everyone_mask
        }
    }

    pub fn allow_copy_by(&self, agent: &Uuid) -> bool {
        self.mask_for(agent) & PERM_COPY != 0
    }

    pub fn allow_modify_by(&self, agent: &Uuid) -> bool {
        self.mask_for(agent) & PERM_MODIFY != 0
    }

    /// Transfer to another agent. Passing the owner always succeeds.
    pub fn allow_transfer_to(&self, recipient: &Uuid) -> bool {
        *recipient == self.owner || self.owner_mask & PERM_TRANSFER != 0
    }

    /// Copy + modify by `agent` and transfer to anyone.
    pub fn allows_export_by(&self, agent: &Uuid) -> bool {
        self.allow_copy_by(agent) && self.allow_modify_by(agent) && self.allow_transfer_to(&Uuid::nil())
    }
}
