//! Outstanding remote requests with timeout and retry bookkeeping.

use std::time::{Duration, Instant};

use crate::scene::{LocalId, ObjectId};

/// One request awaiting a reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PendingQuery {
    pub object: ObjectId,
    pub local_id: LocalId,
    pub submitted_at: Instant,
    pub retries: u32,
}

/// When and how much to re-send.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    /// Re-sends allowed in one pass.
    pub max_batch: u32,
    /// Re-sends before a query is abandoned; 0 never abandons.
    pub max_retries: u32,
}

/// Result of one retry pass.
#[derive(Debug, Default)]
pub struct RetryOutcome {
    pub resent: u32,
    pub abandoned: Vec<PendingQuery>,
}

/// Insertion-ordered set of pending queries keyed by object id.
#[derive(Debug, Default)]
pub struct PendingSet {
    entries: Vec<PendingQuery>,
}

impl PendingSet {
    /// Add a query unless one for `object` is already pending.
    pub fn insert(&mut self, object: ObjectId, local_id: LocalId, now: Instant) -> bool {
        if self.contains(&object) {
            return false;
        }
        self.entries.push(PendingQuery { object, local_id, submitted_at: now, retries: 0 });
        true
    }

    pub fn contains(&self, object: &ObjectId) -> bool {
        self.entries.iter().any(|q| q.object == *object)
    }

    pub fn remove(&mut self, object: &ObjectId) -> Option<PendingQuery> {
        let idx = self.entries.iter().position(|q| q.object == *object)?;
        Some(self.entries.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingQuery> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Re-send up to `max_batch` overdue queries in insertion order.
    ///
    /// A query that already used `max_retries` re-sends is removed and
    /// returned as abandoned instead; abandoning does not use the batch.
    pub fn retry_overdue(
        &mut self,
        now: Instant,
        policy: &RetryPolicy,
        mut resend: impl FnMut(&PendingQuery),
    ) -> RetryOutcome {
        let mut out = RetryOutcome::default();
        let mut kept = Vec::with_capacity(self.entries.len());

        for mut query in self.entries.drain(..) {
            let overdue = now.saturating_duration_since(query.submitted_at) >= policy.timeout;
            if !overdue {
                kept.push(query);
                continue;
            }
            if policy.max_retries > 0 && query.retries >= policy.max_retries {
                out.abandoned.push(query);
                continue;
            }
            if out.resent < policy.max_batch {
                resend(&query);
                query.submitted_at = now;
                query.retries += 1;
                out.resent += 1;
            }
            kept.push(query);
        }

        self.entries = kept;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn policy(max_batch: u32, max_retries: u32) -> RetryPolicy {
        RetryPolicy { timeout: Duration::from_secs(10), max_batch, max_retries }
    }

    #[test]
    fn test_insert_is_unique() {
        let now = Instant::now();
        let mut set = PendingSet::default();
        assert!(set.insert(Uuid::from_u128(1), 1, now));
        assert!(!set.insert(Uuid::from_u128(1), 1, now));
        assert_eq!(set.len(), 1);
        assert!(set.remove(&Uuid::from_u128(1)).is_some());
        assert!(set.is_empty());
    }

    #[test]
    fn test_retry_respects_timeout_and_batch() {
        let t0 = Instant::now();
        let mut set = PendingSet::default();
        for i in 0..5 {
            set.insert(Uuid::from_u128(i), i as u32, t0);
        }

        let mut sent = Vec::new();
        let out = set.retry_overdue(t0 + Duration::from_secs(9), &policy(2, 0), |q| sent.push(q.local_id));
        assert_eq!(out.resent, 0);

        let t1 = t0 + Duration::from_secs(10);
        let out = set.retry_overdue(t1, &policy(2, 0), |q| sent.push(q.local_id));
        assert_eq!(out.resent, 2);
        assert_eq!(sent, vec![0, 1]);

        // Re-sent queries got a fresh timestamp; the rest are still overdue.
        let out = set.retry_overdue(t1, &policy(10, 0), |q| sent.push(q.local_id));
        assert_eq!(out.resent, 3);
        assert_eq!(sent, vec![0, 1, 2, 3, 4]);
        assert!(set.iter().all(|q| q.retries == 1));
    }

    #[test]
    fn test_abandon_after_max_retries() {
        let mut now = Instant::now();
        let mut set = PendingSet::default();
        set.insert(Uuid::from_u128(1), 1, now);

        for _ in 0..3 {
            now += Duration::from_secs(10);
            let out = set.retry_overdue(now, &policy(50, 3), |_| {});
            assert_eq!(out.resent, 1);
        }
        now += Duration::from_secs(10);
        let out = set.retry_overdue(now, &policy(50, 3), |_| panic!("no resend"));
        assert_eq!(out.abandoned.len(), 1);
        assert_eq!(out.abandoned[0].retries, 3);
        assert!(set.is_empty());
    }
}
