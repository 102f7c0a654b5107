//! Remote channel that answers from a [`SceneFile`].
//!
//! Replies are queued with a configurable latency and released by
//! [`ReplayRemote::pump`], one host tick at a time. The first few
//! properties requests per object can be dropped to exercise retries.

use std::collections::{HashMap, VecDeque};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use tracing::trace;

use crate::export::{AssetMirrorRequest, JobId, Reply};
use crate::scene::{AssetId, LocalId, ObjectId};

use super::{RemoteChannel, SceneFile, TextureFetch};

/// Request counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub properties_requests: u32,
    pub inventory_requests: u32,
    pub asset_requests: u32,
    pub texture_fetches: u32,
    pub dropped: u32,
}

pub struct ReplayRemote {
    file: Arc<SceneFile>,
    outbox: Sender<Reply>,
    latency: u64,
    drop_first: u32,
    tick: u64,
    queue: VecDeque<(u64, Reply)>,
    property_attempts: HashMap<ObjectId, u32>,
    stats: ReplayStats,
}

impl ReplayRemote {
    pub fn new(file: Arc<SceneFile>, outbox: Sender<Reply>) -> Self {
        Self {
            file,
            outbox,
            latency: 1,
            drop_first: 0,
            tick: 0,
            queue: VecDeque::new(),
            property_attempts: HashMap::new(),
            stats: ReplayStats::default(),
        }
    }

    /// Ticks between a request and its reply.
    pub fn with_latency(mut self, ticks: u64) -> Self {
        self.latency = ticks;
        self
    }

    /// Ignore the first `n` properties requests for each object.
    pub fn dropping_first(mut self, n: u32) -> Self {
        self.drop_first = n;
        self
    }

    fn enqueue(&mut self, reply: Reply) {
        self.queue.push_back((self.tick + self.latency, reply));
    }

    /// Advance one tick and send every reply that is due. Returns the number sent.
    pub fn pump(&mut self) -> usize {
        self.tick += 1;
        let mut sent = 0;
        while self.queue.front().is_some_and(|(due, _)| *due <= self.tick) {
            if let Some((_, reply)) = self.queue.pop_front() {
                let _ = self.outbox.send(reply);
                sent += 1;
            }
        }
        sent
    }

    /// Send everything queued regardless of latency.
    pub fn flush(&mut self) -> usize {
        let n = self.queue.len();
        for (_, reply) in self.queue.drain(..) {
            let _ = self.outbox.send(reply);
        }
        n
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn stats(&self) -> ReplayStats {
        self.stats
    }
}

impl RemoteChannel for ReplayRemote {
    fn send_properties_request(&mut self, job: JobId, object: ObjectId, local_id: LocalId) {
        self.stats.properties_requests += 1;
        let attempts = self.property_attempts.entry(object).or_insert(0);
        *attempts += 1;
        if *attempts <= self.drop_first {
            trace!("dropping properties request for local {}", local_id);
            self.stats.dropped += 1;
            return;
        }
        if let Some(fields) = self.file.properties.get(&object).cloned() {
            self.enqueue(Reply::Properties { job, object, fields });
        }
    }

    fn request_inventory(&mut self, job: JobId, object: ObjectId, _local_id: LocalId) {
        self.stats.inventory_requests += 1;
        let items = self.file.inventories.get(&object).cloned().unwrap_or_default();
        self.enqueue(Reply::Inventory { job, object, items });
    }

    fn request_asset(&mut self, job: JobId, request: &AssetMirrorRequest) {
        self.stats.asset_requests += 1;
        let result = self
            .file
            .assets
            .get(&request.item_id)
            .map(|text| text.as_bytes().to_vec())
            .ok_or_else(|| format!("asset for item {} not found", request.item_id));
        self.enqueue(Reply::Asset { job, item_id: request.item_id, result });
    }

    fn fetch_texture(&mut self, job: JobId, asset: AssetId) -> TextureFetch {
        self.stats.texture_fetches += 1;
        match self.file.textures.get(&asset) {
            Some(tex) if tex.resident => TextureFetch::Resident(tex.image.clone()),
            Some(tex) => {
                let image = tex.image.clone();
                self.enqueue(Reply::Texture { job, asset, result: Ok(image) });
                TextureFetch::Pending
            }
            None => {
                self.enqueue(Reply::Texture { job, asset, result: Err("texture not found".to_string()) });
                TextureFetch::Pending
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::NodeMetadata;
    use std::sync::mpsc::channel;
    use uuid::Uuid;

    #[test]
    fn test_latency_and_drops() {
        let obj = Uuid::from_u128(1);
        let mut file = SceneFile::default();
        file.properties.insert(obj, NodeMetadata { name: "Root".into(), ..Default::default() });

        let (tx, rx) = channel();
        let mut remote = ReplayRemote::new(Arc::new(file), tx).with_latency(2).dropping_first(1);

        remote.send_properties_request(3, obj, 1);
        assert_eq!(remote.queued(), 0);
        remote.send_properties_request(3, obj, 1);
        assert_eq!(remote.queued(), 1);

        assert_eq!(remote.pump(), 0);
        assert_eq!(remote.pump(), 1);
        match rx.try_recv().unwrap() {
            Reply::Properties { job, fields, .. } => {
                assert_eq!(job, 3);
                assert_eq!(fields.name, "Root");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(remote.stats().dropped, 1);

        // Unknown objects never answer.
        remote.send_properties_request(3, Uuid::from_u128(2), 2);
        assert_eq!(remote.queued(), 0);
    }
}
