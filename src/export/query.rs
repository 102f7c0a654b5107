//! Object properties requests.

use std::time::Instant;

use tracing::{debug, warn};

use crate::host::RemoteChannel;
use crate::scene::{LocalId, ObjectId};

use super::document::{DocumentModel, FieldWrite, NodeMetadata};
use super::pending::{PendingQuery, PendingSet, RetryOutcome, RetryPolicy};
use super::JobId;

/// What a properties reply did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Nothing pending for the object; not ours.
    Unmatched,
    /// Fields stored on the node.
    Applied,
    /// Node already had metadata; the reply only cleared the pending entry.
    Duplicate,
    /// Pending entry existed but the node record is gone.
    Orphan,
}

impl ReplyOutcome {
    /// The reply answered one of our requests.
    #[inline]
    pub fn matched(self) -> bool {
        self != Self::Unmatched
    }
}

/// Tracks outstanding properties requests.
#[derive(Debug, Default)]
pub struct RemoteQueryTracker {
    pending: PendingSet,
    answered: u32,
    abandoned: u32,
}

impl RemoteQueryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record and send a request. False if one is already pending for `object`.
    pub fn submit(
        &mut self,
        job: JobId,
        object: ObjectId,
        local_id: LocalId,
        now: Instant,
        remote: &mut dyn RemoteChannel,
    ) -> bool {
        if !self.pending.insert(object, local_id, now) {
            debug!("properties for {} already pending", object);
            return false;
        }
        remote.send_properties_request(job, object, local_id);
        true
    }

    /// Match a reply against the pending set and store its fields.
    pub fn on_reply(
        &mut self,
        object: &ObjectId,
        fields: NodeMetadata,
        document: &mut DocumentModel,
    ) -> ReplyOutcome {
        if self.pending.remove(object).is_none() {
            return ReplyOutcome::Unmatched;
        }
        self.answered += 1;
        match document.set_metadata(object, fields) {
            FieldWrite::Written => ReplyOutcome::Applied,
            FieldWrite::AlreadySet => ReplyOutcome::Duplicate,
            FieldWrite::Orphan => {
                warn!("properties reply for {} has no node record", object);
                ReplyOutcome::Orphan
            }
        }
    }

    /// Re-send overdue requests, abandoning those out of retries.
    pub fn retry_overdue(
        &mut self,
        job: JobId,
        now: Instant,
        policy: &RetryPolicy,
        remote: &mut dyn RemoteChannel,
    ) -> RetryOutcome {
        let out = self.pending.retry_overdue(now, policy, |q| {
            debug!("re-requesting properties for {} (retry {})", q.object, q.retries + 1);
            remote.send_properties_request(job, q.object, q.local_id);
        });
        self.abandoned += out.abandoned.len() as u32;
        out
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_queries(&self) -> impl Iterator<Item = &PendingQuery> {
        self.pending.iter()
    }

    /// Replies matched plus requests abandoned.
    pub fn settled(&self) -> u32 {
        self.answered + self.abandoned
    }

    pub fn clear(&mut self) {
        self.pending.clear();
        self.answered = 0;
        self.abandoned = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::document::{NodeBase, NodeRecord};
    use crate::export::inventory::AssetMirrorRequest;
    use crate::host::TextureFetch;
    use crate::scene::SceneObject;
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Default)]
    struct Recorder {
        properties: Vec<LocalId>,
    }

    impl RemoteChannel for Recorder {
        fn send_properties_request(&mut self, _: JobId, _: ObjectId, local_id: LocalId) {
            self.properties.push(local_id);
        }
        fn request_inventory(&mut self, _: JobId, _: ObjectId, _: LocalId) {}
        fn request_asset(&mut self, _: JobId, _: &AssetMirrorRequest) {}
        fn fetch_texture(&mut self, _: JobId, _: Uuid) -> TextureFetch {
            TextureFetch::Pending
        }
    }

    fn named(name: &str) -> NodeMetadata {
        NodeMetadata { name: name.into(), ..Default::default() }
    }

    fn document(obj: ObjectId) -> DocumentModel {
        let mut doc = DocumentModel::new();
        let ls = doc.begin_linkset(obj);
        doc.push_node(ls, NodeRecord::new(NodeBase::capture(&SceneObject::volume(obj, 1))));
        doc
    }

    #[test]
    fn test_reply_to_retry_keeps_first_fields() {
        let obj = Uuid::from_u128(1);
        let mut doc = document(obj);
        let mut remote = Recorder::default();
        let mut tracker = RemoteQueryTracker::new();
        let t0 = Instant::now();
        let policy = RetryPolicy { timeout: Duration::from_secs(10), max_batch: 10, max_retries: 3 };

        assert!(tracker.submit(1, obj, 1, t0, &mut remote));
        assert!(!tracker.submit(1, obj, 1, t0, &mut remote));
        let out = tracker.retry_overdue(1, t0 + Duration::from_secs(10), &policy, &mut remote);
        assert_eq!(out.resent, 1);
        assert_eq!(remote.properties, vec![1, 1]);

        // Both the original request and the retry get answered.
        assert_eq!(tracker.on_reply(&obj, named("A"), &mut doc), ReplyOutcome::Applied);
        assert_eq!(tracker.on_reply(&obj, named("B"), &mut doc), ReplyOutcome::Unmatched);
        assert_eq!(doc.get(&obj).unwrap().metadata.as_ref().unwrap().name, "A");
        assert_eq!(tracker.settled(), 1);
        assert_eq!(tracker.pending(), 0);

        // A fresh request for an object that already has fields.
        assert!(tracker.submit(1, obj, 1, t0, &mut remote));
        assert_eq!(tracker.on_reply(&obj, named("B"), &mut doc), ReplyOutcome::Duplicate);
        assert_eq!(doc.get(&obj).unwrap().metadata.as_ref().unwrap().name, "A");
    }

    #[test]
    fn test_abandoned_query_counts_as_settled() {
        let obj = Uuid::from_u128(2);
        let mut remote = Recorder::default();
        let mut tracker = RemoteQueryTracker::new();
        let t0 = Instant::now();
        let policy = RetryPolicy { timeout: Duration::from_secs(1), max_batch: 10, max_retries: 1 };

        tracker.submit(1, obj, 2, t0, &mut remote);
        tracker.retry_overdue(1, t0 + Duration::from_secs(1), &policy, &mut remote);
        let out = tracker.retry_overdue(1, t0 + Duration::from_secs(2), &policy, &mut remote);
        assert_eq!(out.abandoned.len(), 1);
        assert_eq!(tracker.pending(), 0);
        assert_eq!(tracker.settled(), 1);

        let mut doc = document(obj);
        assert_eq!(tracker.on_reply(&obj, named("late"), &mut doc), ReplyOutcome::Unmatched);
        assert!(doc.get(&obj).unwrap().metadata.is_none());
    }
}
