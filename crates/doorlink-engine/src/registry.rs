//! Correlation registry: request id to in-flight request.
//!
//! Presence in the registry is the single source of truth for "still
//! pending". Every resolution path (acknowledgment failure, sensor
//! confirmation, timeout, unmatched close) starts with [`CorrelationRegistry::take`],
//! which removes the entry under the shard lock and hands back ownership.
//! Whoever gets `Some` resolves the request; everyone else sees `None` and
//! does nothing.
//!
//! Entries are spread over independently locked shards by hash of the id, so
//! unrelated requests do not contend. Locks are never held across an await.

use crate::outcome::AccessOutcome;
use doorlink_core::constants::{ADMIN_SUBJECT_ID, DEFAULT_ADMIN_NAME, MANUAL_ACCESS_CODE};
use doorlink_core::{DoorId, RequestId, RequestKind};
use doorlink_storage::User;
use std::collections::HashMap;
use std::collections::hash_map::{Entry, RandomState};
use std::hash::BuildHasher;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Who a request is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub user_id: String,
    pub name: String,
}

impl Subject {
    pub fn from_user(user: &User) -> Self {
        Self {
            user_id: user.subject_id(),
            name: user.name.clone(),
        }
    }

    /// Synthetic operator for manual openings.
    pub fn admin(name: Option<&str>) -> Self {
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(DEFAULT_ADMIN_NAME);
        Self {
            user_id: ADMIN_SUBJECT_ID.to_string(),
            name: name.to_string(),
        }
    }
}

/// An access request waiting for the controller.
#[derive(Debug)]
pub struct PendingRequest {
    pub id: RequestId,
    pub kind: RequestKind,
    pub subject: Subject,
    pub presented_code: String,
    pub door_id: DoorId,
    pub created_at: Instant,
    /// Set once the controller acknowledged the open command.
    pub acknowledged: bool,
    responder: oneshot::Sender<AccessOutcome>,
}

impl PendingRequest {
    /// Create a pending request and the receiver its outcome will arrive on.
    pub fn new(
        id: RequestId,
        kind: RequestKind,
        subject: Subject,
        presented_code: impl Into<String>,
        door_id: DoorId,
    ) -> (Self, oneshot::Receiver<AccessOutcome>) {
        let (responder, receiver) = oneshot::channel();
        let request = Self {
            id,
            kind,
            subject,
            presented_code: presented_code.into(),
            door_id,
            created_at: Instant::now(),
            acknowledged: false,
            responder,
        };
        (request, receiver)
    }

    /// Pending request for a manual opening.
    pub fn manual(
        id: RequestId,
        admin_name: Option<&str>,
        door_id: DoorId,
    ) -> (Self, oneshot::Receiver<AccessOutcome>) {
        Self::new(
            id,
            RequestKind::ManualOpen,
            Subject::admin(admin_name),
            MANUAL_ACCESS_CODE,
            door_id,
        )
    }

    #[inline]
    pub fn is_manual(&self) -> bool {
        self.kind.is_manual()
    }

    /// Deliver the terminal outcome. Returns `false` if the caller stopped
    /// waiting.
    pub fn respond(self, outcome: AccessOutcome) -> bool {
        self.responder.send(outcome).is_ok()
    }
}

type Shard = Mutex<HashMap<RequestId, PendingRequest>>;

#[derive(Debug)]
pub struct CorrelationRegistry {
    shards: Box<[Shard]>,
    hasher: RandomState,
}

impl CorrelationRegistry {
    pub fn new(shards: usize) -> Self {
        let shards = (0..shards.max(1))
            .map(|_| Mutex::new(HashMap::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    fn shard(&self, id: &RequestId) -> MutexGuard<'_, HashMap<RequestId, PendingRequest>> {
        let index = (self.hasher.hash_one(id) % self.shards.len() as u64) as usize;
        self.shards[index]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a request. Gives the request back if its id is already taken.
    pub fn insert(&self, request: PendingRequest) -> Result<(), PendingRequest> {
        match self.shard(&request.id).entry(request.id.clone()) {
            Entry::Occupied(_) => Err(request),
            Entry::Vacant(slot) => {
                slot.insert(request);
                Ok(())
            }
        }
    }

    /// Atomically remove and return a request. The first caller wins.
    pub fn take(&self, id: &RequestId) -> Option<PendingRequest> {
        self.shard(id).remove(id)
    }

    /// Record a successful acknowledgment. Returns `false` if not pending.
    pub fn mark_acknowledged(&self, id: &RequestId) -> bool {
        match self.shard(id).get_mut(id) {
            Some(request) => {
                request.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &RequestId) -> bool {
        self.shard(id).contains_key(id)
    }

    /// Remove and return every request for `door_id`.
    pub fn take_for_door(&self, door_id: &DoorId) -> Vec<PendingRequest> {
        let mut taken = Vec::new();
        for shard in self.shards.iter() {
            let mut map = shard.lock().unwrap_or_else(PoisonError::into_inner);
            let ids: Vec<RequestId> = map
                .iter()
                .filter(|(_, request)| &request.door_id == door_id)
                .map(|(id, _)| id.clone())
                .collect();
            taken.extend(ids.iter().filter_map(|id| map.remove(id)));
        }
        taken
    }

    /// Number of requests for `door_id` still pending.
    pub fn pending_for_door(&self, door_id: &DoorId) -> usize {
        self.shards
            .iter()
            .map(|shard| {
                shard
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .values()
                    .filter(|request| &request.door_id == door_id)
                    .count()
            })
            .sum()
    }

    pub fn len(&self) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.lock().unwrap_or_else(PoisonError::into_inner).len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
