//! Suppression of duplicate audit entries.
//!
//! A fingerprint is the content of an entry (subject, code, door, granted,
//! status) plus, for entries written on behalf of an access attempt, the
//! request id of that attempt. Separate attempts therefore never collapse
//! into one entry; only repeated unsolicited events do. The clock is divided into buckets counted from the creation of
//! the deduplicator; a fingerprint accepted in bucket `b` suppresses the same
//! fingerprint until bucket `b + window_buckets`.
//!
//! Accepted fingerprints sit in a time-ordered queue and are evicted as soon
//! as their window has elapsed, so memory is bounded by the write rate.

use doorlink_core::{AccessStatus, RequestId};
use doorlink_storage::AccessLog;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// Content identity of an audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub request_id: Option<RequestId>,
    pub subject: Option<String>,
    pub code: Option<String>,
    pub door_id: String,
    pub granted: bool,
    pub status: AccessStatus,
}

impl From<&AccessLog> for Fingerprint {
    fn from(log: &AccessLog) -> Self {
        Self {
            request_id: None,
            subject: log.user_id.clone(),
            code: log.access_code.clone(),
            door_id: log.door_id.clone(),
            granted: log.granted,
            status: log.status,
        }
    }
}

impl Fingerprint {
    /// Fingerprint of an entry written for the access attempt `request_id`.
    pub fn for_request(log: &AccessLog, request_id: &RequestId) -> Self {
        Self {
            request_id: Some(request_id.clone()),
            ..Self::from(log)
        }
    }
}

#[derive(Debug, Default)]
struct Window {
    accepted: HashMap<Fingerprint, u64>,
    queue: VecDeque<(u64, Fingerprint)>,
}

impl Window {
    fn evict(&mut self, now: u64, window_buckets: u64) {
        while let Some((bucket, _)) = self.queue.front() {
            if now - bucket < window_buckets {
                break;
            }
            if let Some((bucket, fingerprint)) = self.queue.pop_front()
                && self.accepted.get(&fingerprint) == Some(&bucket)
            {
                self.accepted.remove(&fingerprint);
            }
        }
    }
}

#[derive(Debug)]
pub struct Deduplicator {
    origin: Instant,
    bucket: Duration,
    window_buckets: u64,
    window: Mutex<Window>,
}

impl Deduplicator {
    /// `window` is rounded up to a whole number of buckets.
    pub fn new(window: Duration, bucket: Duration) -> Self {
        let bucket = bucket.max(Duration::from_millis(1));
        let window_buckets = window.as_nanos().div_ceil(bucket.as_nanos()).max(1);
        Self {
            origin: Instant::now(),
            bucket,
            window_buckets: u64::try_from(window_buckets).unwrap_or(u64::MAX),
            window: Mutex::new(Window::default()),
        }
    }

    fn current_bucket(&self) -> u64 {
        let elapsed = Instant::now().saturating_duration_since(self.origin);
        u64::try_from(elapsed.as_nanos() / self.bucket.as_nanos()).unwrap_or(u64::MAX)
    }

    /// Record `fingerprint` and return `true`, or return `false` if it was
    /// already accepted within the window.
    pub fn accept(&self, fingerprint: Fingerprint) -> bool {
        let now = self.current_bucket();
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.evict(now, self.window_buckets);

        if window.accepted.contains_key(&fingerprint) {
            return false;
        }
        window.accepted.insert(fingerprint.clone(), now);
        window.queue.push_back((now, fingerprint));
        true
    }

    /// Withdraw a fingerprint, e.g. when the write it guarded failed.
    pub fn forget(&self, fingerprint: &Fingerprint) {
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.accepted.remove(fingerprint);
    }

    /// Number of fingerprints currently remembered.
    pub fn len(&self) -> usize {
        let now = self.current_bucket();
        let mut window = self.window.lock().unwrap_or_else(PoisonError::into_inner);
        window.evict(now, self.window_buckets);
        window.accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
