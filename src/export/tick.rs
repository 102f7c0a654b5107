//! Periodic driver: linkset submission with backpressure, retries and
//! the completion check.

use std::time::Instant;

use tracing::{debug, info};

use crate::host::{HostContext, TextureFetch};
use crate::scene::{AssetId, ObjectId};
use crate::util::Result;

use super::dedup::{TextureRequest, TextureRole};
use super::document::{NodeBase, NodeRecord};
use super::job::{ActiveLinkset, ExportJob};
use super::pending::RetryPolicy;
use super::progress::{ExportIssue, JobState};
use super::walker::{PermissionFilter, SkipReason};

impl ExportJob {
    /// Advance the job by one host tick.
    ///
    /// Queued replies are applied first. While linksets remain, up to
    /// `linksets_per_tick` are submitted subject to the pending-query cap;
    /// afterwards overdue queries are retried until every reply is in and
    /// the document is written. Returns the state after the tick.
    pub fn tick(&mut self, now: Instant, host: &mut HostContext<'_>) -> Result<JobState> {
        let result = self.tick_inner(now, host);
        self.publish();
        result.map(|()| self.state)
    }

    fn tick_inner(&mut self, now: Instant, host: &mut HostContext<'_>) -> Result<()> {
        self.drain_inbox(host)?;
        if !self.state.is_running() {
            return Ok(());
        }

        if self.stats.linksets.current < self.stats.linksets.total {
            self.state = JobState::SubmittingLinksets;
            self.submit_linksets(now, host);
            return Ok(());
        }

        if self.state != JobState::DrainingQueries {
            info!("export job {}: all linksets submitted, waiting for replies", self.id);
            self.state = JobState::DrainingQueries;
        }
        if !self.check_completion(host)? {
            self.retry_overdue(now, host);
        }
        Ok(())
    }

    /// Pending queries after submitting a node must stay within the cap.
    /// An empty pipeline always admits one node.
    fn has_capacity(&self, cost: usize) -> bool {
        let pending = self.properties.pending() + self.inventory.pending();
        pending == 0 || pending + cost <= self.settings.max_pending_queries as usize
    }

    fn submit_linksets(&mut self, now: Instant, host: &mut HostContext<'_>) {
        let filter = PermissionFilter { follow_permissions: self.settings.follow_permissions };
        let mut budget = self.settings.linksets_per_tick;

        while budget > 0 {
            let mut active = match self.active.take() {
                Some(active) => active,
                None => {
                    let Some(plan) = self.queue.pop_front() else { break };
                    // The scene may have changed since the walk.
                    let root = host.scene.object(&plan.root);
                    let position = root.map(|obj| obj.position);
                    let verdict = root.map_or(Err(SkipReason::Missing), |obj| filter.check(obj));
                    if let Err(reason) = verdict {
                        let mut issue = ExportIssue::new(reason.message()).object(plan.root);
                        if let Some(position) = position {
                            issue = issue.at(position);
                        }
                        self.issue(issue);
                        self.stats.linksets.shrink(1);
                        self.stats.prims.shrink(plan.members.len() as u32);
                        continue;
                    }
                    let doc_index = self.document.begin_linkset(plan.root);
                    ActiveLinkset { plan, next: 0, doc_index }
                }
            };

            while active.next < active.plan.members.len() {
                let id = active.plan.members[active.next];
                if !self.has_capacity(self.node_cost(&id, host)) {
                    debug!(
                        "backpressure: {} properties, {} inventories pending",
                        self.properties.pending(),
                        self.inventory.pending()
                    );
                    self.active = Some(active);
                    return;
                }
                active.next += 1;
                self.submit_node(id, active.doc_index, now, host);
            }

            self.stats.linksets.advance();
            budget -= 1;
        }
    }

    /// Remote queries a node will add.
    fn node_cost(&self, id: &ObjectId, host: &HostContext<'_>) -> usize {
        let volume = host.scene.object(id).is_some_and(|o| o.is_volume());
        if !volume || !self.settings.export_properties {
            return 0;
        }
        1 + usize::from(self.settings.wants_inventory())
    }

    fn submit_node(&mut self, id: ObjectId, linkset: usize, now: Instant, host: &mut HostContext<'_>) {
        let Some(object) = host.scene.object(&id).cloned() else {
            self.issue(ExportIssue::new("Missing child").object(id));
            self.stats.prims.shrink(1);
            return;
        };

        if !self.document.push_node(linkset, NodeRecord::new(NodeBase::capture(&object))) {
            debug!("{} is already in the document", id);
            self.stats.prims.shrink(1);
            return;
        }
        self.document.bounds.expand_centered(object.position, object.scale);
        self.stats.prims.advance();

        if self.settings.wants_textures() {
            for entry in &object.textures {
                self.request_texture(entry.image, TextureRole::Face, host);
            }
            if let Some(sculpt) = object.sculpt {
                self.request_texture(sculpt.texture, TextureRole::SculptMap, host);
            }
        }

        if object.is_volume() && self.settings.export_properties {
            if self.properties.submit(self.id, id, object.local_id, now, host.remote) {
                self.stats.properties.grow();
            }
            if self.settings.wants_inventory()
                && self.inventory.submit(self.id, id, object.local_id, now, host.remote)
            {
                self.stats.inventories.grow();
            }
        }
    }

    fn request_texture(&mut self, asset: AssetId, role: TextureRole, host: &mut HostContext<'_>) {
        if asset.is_nil() {
            return;
        }
        let dir = self.asset_dir().join(role.folder());
        let request = TextureRequest { asset, role, destination: dir.join(asset.to_string()) };
        if !self.textures.request_once(request) {
            return;
        }
        self.stats.textures.grow();
        self.ensure_dir(&dir, host.fs);
        debug!("requesting {} {}", role.label(), asset);

        match host.remote.fetch_texture(self.id, asset) {
            TextureFetch::Resident(image) => self.finish_texture(&asset, Ok(image), host.fs),
            TextureFetch::Pending => {}
        }
    }

    /// Finalize once every linkset is submitted and every query settled.
    pub(super) fn check_completion(&mut self, host: &mut HostContext<'_>) -> Result<bool> {
        if !self.state.is_running() {
            return Ok(self.state == JobState::Finalized);
        }
        let done = self.active.is_none()
            && self.stats.linksets.is_complete()
            && self.properties.pending() == 0
            && self.inventory.pending() == 0
            && self.properties.settled() >= self.stats.properties.total;
        if !done {
            return Ok(false);
        }
        self.finalize(host.fs)?;
        Ok(true)
    }

    fn retry_overdue(&mut self, now: Instant, host: &mut HostContext<'_>) {
        let mut policy = RetryPolicy {
            timeout: self.settings.query_timeout(),
            max_batch: self.settings.retry_batch,
            max_retries: self.settings.max_retries,
        };

        let props = self.properties.retry_overdue(self.id, now, &policy, host.remote);
        for q in &props.abandoned {
            self.issue(ExportIssue::new("Failed to retrieve properties").object(q.object).local_id(q.local_id));
        }

        policy.max_batch = policy.max_batch.saturating_sub(props.resent);
        let inv = self.inventory.retry_overdue(self.id, now, &policy, host.remote);
        for q in &inv.abandoned {
            self.issue(ExportIssue::new("Failed to retrieve inventory").object(q.object).local_id(q.local_id));
        }

        if props.resent + inv.resent > 0 {
            info!("export job {}: re-sent {} overdue requests", self.id, props.resent + inv.resent);
        }
    }
}
