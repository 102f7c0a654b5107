//! Reply handling.

use tracing::{debug, info};
use uuid::Uuid;

use crate::host::{HostContext, OutputFs};
use crate::scene::{AssetId, RawImage};
use crate::util::Result;

use super::job::ExportJob;
use super::progress::{ExportIssue, JobState};
use super::query::ReplyOutcome;
use super::texture::save_texture;
use super::Reply;

impl ExportJob {
    /// Apply one reply directly and re-check completion.
    ///
    /// Same as sending it through [`reply_sender`](Self::reply_sender) and
    /// ticking, minus the submission and retry work.
    pub fn deliver(&mut self, reply: Reply, host: &mut HostContext<'_>) -> Result<JobState> {
        self.apply(reply, host);
        let result = self.check_completion(host);
        self.publish();
        result.map(|_| self.state)
    }

    /// Apply every queued reply, checking completion after each.
    pub(super) fn drain_inbox(&mut self, host: &mut HostContext<'_>) -> Result<()> {
        while let Ok(reply) = self.inbox_rx.try_recv() {
            self.apply(reply, host);
            self.check_completion(host)?;
        }
        Ok(())
    }

    fn apply(&mut self, reply: Reply, host: &mut HostContext<'_>) {
        if reply.job() != self.id {
            debug!("dropping reply for stale job {} (current {})", reply.job(), self.id);
            return;
        }
        match reply {
            Reply::Properties { object, fields, .. } => {
                if !self.state.is_running() {
                    debug!("properties for {} after job end, ignored", object);
                    return;
                }
                match self.properties.on_reply(&object, fields, &mut self.document) {
                    ReplyOutcome::Unmatched => debug!("unsolicited properties for {}", object),
                    ReplyOutcome::Duplicate => debug!("duplicate properties for {}", object),
                    ReplyOutcome::Applied | ReplyOutcome::Orphan => {}
                }
            }
            Reply::Inventory { object, items, .. } => {
                if !self.state.is_running() {
                    debug!("inventory for {} after job end, ignored", object);
                    return;
                }
                let agent = self.agent_id();
                let asset_dir = self.asset_dir();
                let (outcome, mirrors) =
                    self.inventory.on_reply(&object, &items, &agent, &asset_dir, &mut self.document);
                if outcome == ReplyOutcome::Unmatched {
                    debug!("unsolicited inventory for {}", object);
                }
                if let Some(first) = mirrors.first() {
                    if let Some(dir) = first.destination.parent() {
                        self.ensure_dir(dir, host.fs);
                    }
                }
                for request in &mirrors {
                    self.stats.assets.grow();
                    host.remote.request_asset(self.id, request);
                }
            }
            Reply::Texture { asset, result, .. } => self.finish_texture(&asset, result, host.fs),
            Reply::Asset { item_id, result, .. } => self.finish_asset(&item_id, result, host.fs),
        }
    }

    /// Save a delivered texture. Failures are logged and counted; the
    /// texture counter advances either way.
    pub(super) fn finish_texture(
        &mut self,
        asset: &AssetId,
        result: std::result::Result<RawImage, String>,
        fs: &dyn OutputFs,
    ) {
        let Some(request) = self.textures.complete(asset) else {
            debug!("texture {} was not requested or already saved", asset);
            return;
        };
        let saved = result.and_then(|image| {
            save_texture(&request, &image, &self.settings.texture_formats, fs).map_err(|e| e.to_string())
        });
        match saved {
            Ok(paths) => {
                for path in &paths {
                    info!("saved {} {}", request.role.label(), path.display());
                }
            }
            Err(e) => {
                self.stats.textures_failed += 1;
                self.issue(ExportIssue::new(format!("{} {} not saved: {}", request.role.label(), asset, e)));
            }
        }
        self.stats.textures.advance();
    }

    fn finish_asset(&mut self, item_id: &Uuid, result: std::result::Result<Vec<u8>, String>, fs: &dyn OutputFs) {
        let Some(request) = self.inventory.complete_mirror(item_id) else {
            debug!("asset for item {} was not requested", item_id);
            return;
        };
        let written = result.and_then(|bytes| {
            fs.write_file(&request.destination, &bytes).map_err(|e| e.to_string())
        });
        match written {
            Ok(()) => info!("saved inventory item {}", request.destination.display()),
            Err(e) => {
                self.stats.assets_failed += 1;
                self.issue(ExportIssue::new(format!("Inventory item {} not saved: {}", item_id, e)).object(request.container));
            }
        }
        self.stats.assets.advance();
    }
}
