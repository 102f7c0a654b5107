//! # primexport
//!
//! Asynchronous export of in-world prim linksets to a hierarchical
//! project document.
//!
//! A job walks a selection of linkset roots, records every member's
//! geometry, asks the remote side for each prim's properties and
//! contained inventory, saves the textures it references, and once every
//! reply is in (or given up on) writes one XML document plus the asset
//! folders next to it.
//!
//! ## Modules
//!
//! - [`util`] - Errors, math re-exports, bounds
//! - [`scene`] - Scene objects, volume parameters, textures, inventory, permissions
//! - [`host`] - Scene graph / remote / file system seams and in-memory hosts
//! - [`export`] - The job: submission, queries, replies, finalize
//! - [`shape`] - Shape classification and shape-specific parameters
//! - [`hpa`] - Document writer, XML tree, JSON snapshot
//!
//! ## Example
//!
//! ```ignore
//! use primexport::prelude::*;
//!
//! let file = SceneFile::load("scene.json")?;
//! let mut scene = file.scene();
//! let mut job = ExportJob::new(ExportSettings::default());
//! let mut remote = ReplayRemote::new(Arc::new(file.clone()), job.reply_sender());
//!
//! job.start(ExportRequest::new(file.effective_selection(&scene), "out/house.xml"), ExportSettings::default(), &mut scene);
//! loop {
//!     remote.pump();
//!     let mut host = HostContext::new(&mut scene, &mut remote, &LocalFs);
//!     if !job.tick(Instant::now(), &mut host)?.is_running() {
//!         break;
//!     }
//! }
//! ```

pub mod util;
pub mod scene;
pub mod host;
pub mod export;
pub mod shape;
pub mod hpa;

// Re-export commonly used types
pub use util::{Error, Result};
pub use export::{ExportJob, ExportRequest, ExportSettings, JobState};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{Error, Result};
    pub use crate::scene::{ObjectId, SceneObject};
    pub use crate::host::{HostContext, LocalFs, MemoryFs, MemoryScene, ReplayRemote, SceneFile};
    pub use crate::export::{ExportJob, ExportRequest, ExportSettings, JobState, Progress, Reply};
    pub use crate::shape::{classify_object, PrimShape, ShapeKind};
    pub use std::sync::Arc;
    pub use std::time::Instant;
}
