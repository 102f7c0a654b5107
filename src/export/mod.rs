//! The export pipeline.
//!
//! An [`ExportJob`] turns a selection into a structured document. It is
//! driven by two entry points: [`ExportJob::tick`], called periodically
//! by the host, and [`ExportJob::deliver`] (or the inbox channel) for
//! replies to the requests it issued.
//!
//! ```text
//! start ─▶ SubmittingLinksets ─▶ DrainingQueries ─▶ Finalized
//!              │   (per tick:       │  (retry overdue,
//!              │    backpressure)   │   check completion)
//!              └──────── output write failure ────▶ Failed
//! ```
//!
//! Per-node failures never fail a job: they are logged, counted and
//! kept as [`ExportIssue`]s in the job's [`Progress`].

mod dedup;
mod document;
mod finalize;
mod inventory;
mod job;
mod pending;
mod progress;
mod query;
mod replies;
mod settings;
mod texture;
mod tick;
mod walker;

pub use dedup::{AssetDeduplicator, TextureRequest, TextureRole};
pub use document::{
    DocumentModel, FieldWrite, InventoryEntry, LinksetRecord, NodeBase, NodeMetadata, NodeRecord,
};
pub use inventory::{exportable, AssetMirrorRequest, InventoryCollector, INVENTORY_FOLDER};
pub use job::{ExportJob, ExportRequest};
pub use pending::{PendingQuery, PendingSet, RetryOutcome, RetryPolicy};
pub use progress::{Counter, ExportIssue, JobState, Progress, ProgressHandle};
pub use query::{RemoteQueryTracker, ReplyOutcome};
pub use settings::{ExportSettings, TextureFormat};
pub use texture::{encode, save_texture, to_dynamic};
pub use walker::{LinksetPlan, PermissionFilter, SelectionWalker, SkipReason, WalkResult};

use uuid::Uuid;

use crate::scene::{AssetId, InventoryItem, ObjectId, RawImage};

/// Identity of one job run. Replies tagged with an older id are dropped.
pub type JobId = u64;

/// A reply from the remote side, tagged with the job that asked.
#[derive(Clone, Debug)]
pub enum Reply {
    Properties {
        job: JobId,
        object: ObjectId,
        fields: NodeMetadata,
    },
    Inventory {
        job: JobId,
        object: ObjectId,
        items: Vec<InventoryItem>,
    },
    Texture {
        job: JobId,
        asset: AssetId,
        result: std::result::Result<RawImage, String>,
    },
    Asset {
        job: JobId,
        item_id: Uuid,
        result: std::result::Result<Vec<u8>, String>,
    },
}

impl Reply {
    pub fn job(&self) -> JobId {
        match self {
            Self::Properties { job, .. }
            | Self::Inventory { job, .. }
            | Self::Texture { job, .. }
            | Self::Asset { job, .. } => *job,
        }
    }
}
