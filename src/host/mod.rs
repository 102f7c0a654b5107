//! Host environment seams.
//!
//! The exporter never talks to a viewer directly. It reads objects from a
//! [`SceneGraph`], issues requests through a [`RemoteChannel`] and writes
//! through an [`OutputFs`]. Replies come back as [`Reply`](crate::export::Reply)
//! values, either pushed into the job's inbox or handed to
//! [`ExportJob::deliver`](crate::export::ExportJob::deliver).
//!
//! In-memory implementations live here too; the command line tool and the
//! tests drive whole jobs with them.

mod fs;
mod memory;
mod replay;

pub use fs::{LocalFs, MemoryFs};
pub use memory::{MemoryScene, SceneFile, SceneTexture};
pub use replay::{ReplayRemote, ReplayStats};

use std::io;
use std::path::Path;

use crate::export::{AssetMirrorRequest, JobId};
use crate::scene::{AssetId, LocalId, ObjectId, RawImage, SceneObject};

/// Read access to the host's object graph.
pub trait SceneGraph {
    fn object(&self, id: &ObjectId) -> Option<&SceneObject>;

    /// Clear the host's selection.
    fn deselect_all(&mut self);
}

/// Result of asking for a texture's pixels.
#[derive(Debug)]
pub enum TextureFetch {
    /// Already decoded at full resolution; handled synchronously.
    Resident(RawImage),
    /// A [`Reply::Texture`](crate::export::Reply::Texture) will follow.
    Pending,
}

/// Outbound requests. Every request is tagged with the job that issued it.
pub trait RemoteChannel {
    fn send_properties_request(&mut self, job: JobId, object: ObjectId, local_id: LocalId);

    fn request_inventory(&mut self, job: JobId, object: ObjectId, local_id: LocalId);

    fn request_asset(&mut self, job: JobId, request: &AssetMirrorRequest);

    fn fetch_texture(&mut self, job: JobId, asset: AssetId) -> TextureFetch;
}

/// Output file system.
pub trait OutputFs {
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create or truncate `path` and write `bytes`. The file is closed on return.
    fn write_file(&self, path: &Path, bytes: &[u8]) -> io::Result<()>;
}

/// Everything a job needs from its host for one call.
pub struct HostContext<'a> {
    pub scene: &'a mut dyn SceneGraph,
    pub remote: &'a mut dyn RemoteChannel,
    pub fs: &'a dyn OutputFs,
}

impl<'a> HostContext<'a> {
    pub fn new(
        scene: &'a mut dyn SceneGraph,
        remote: &'a mut dyn RemoteChannel,
        fs: &'a dyn OutputFs,
    ) -> Self {
        Self { scene, remote, fs }
    }
}
