//! Door state tracker.
//!
//! Owns the single door record. State only moves on an explicit signal:
//! a sensor flag set to `true` or a reported physical opening. Updates that
//! carry no signal leave the record untouched, including `lastEvent`.

use crate::error::EngineResult;
use doorlink_core::constants::DOOR_INITIALIZED_EVENT;
use doorlink_core::{DoorId, DoorSignal, DoorState};
use doorlink_protocol::SensorObservation;
use doorlink_storage::{Database, DoorRecord, DoorRepository, SqliteDoorRepository};
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct DoorTracker {
    repo: SqliteDoorRepository,
    door_id: DoorId,
    // Serializes read-modify-write of the door record.
    write_lock: Mutex<()>,
}

impl DoorTracker {
    pub fn new(db: &Database, door_id: DoorId) -> Self {
        Self {
            repo: SqliteDoorRepository::new(db.pool().clone()),
            door_id,
            write_lock: Mutex::new(()),
        }
    }

    pub fn door_id(&self) -> &DoorId {
        &self.door_id
    }

    /// Prepare the door table for a single-door deployment.
    ///
    /// Records for other doors are removed, and the configured door starts
    /// `closed` if it has no record yet. An existing record is kept as is.
    pub async fn initialize(&self) -> EngineResult<DoorRecord> {
        let _guard = self.write_lock.lock().await;

        let removed = self.repo.delete_except(self.door_id.as_str()).await?;
        if removed > 0 {
            info!(removed, door_id = %self.door_id, "removed records of other doors");
        }

        let initial = DoorRecord::new(
            self.door_id.as_str(),
            DoorState::Closed,
            DOOR_INITIALIZED_EVENT,
        );
        if self.repo.insert_if_absent(&initial).await? {
            info!(door_id = %self.door_id, "door record created");
            return Ok(initial);
        }

        match self.repo.find(self.door_id.as_str()).await? {
            Some(record) => {
                info!(door_id = %record.door_id, state = %record.state, "door record loaded");
                Ok(record)
            }
            None => Ok(initial),
        }
    }

    /// Apply an explicit signal, recording the causing event.
    pub async fn apply(
        &self,
        signal: DoorSignal,
        event: Option<&str>,
        device_ts: Option<String>,
    ) -> EngineResult<DoorRecord> {
        let _guard = self.write_lock.lock().await;

        let previous = self
            .repo
            .find(self.door_id.as_str())
            .await?
            .map_or(DoorState::Unknown, |record| record.state);
        let state = previous.on_signal(signal);
        let event = event.unwrap_or(signal.default_event());

        let record =
            DoorRecord::new(self.door_id.as_str(), state, event).with_device_ts(device_ts);
        self.repo.upsert(&record).await?;

        debug!(
            door_id = %self.door_id,
            from = %previous,
            to = %state,
            event,
            "door state updated"
        );
        Ok(record)
    }

    /// Apply a sensor observation. Returns `None` when it carried no signal.
    pub async fn observe(
        &self,
        observation: SensorObservation,
        event: Option<&str>,
        device_ts: Option<String>,
    ) -> EngineResult<Option<DoorRecord>> {
        match observation.signal() {
            Some(signal) => self.apply(signal, event, device_ts).await.map(Some),
            None => Ok(None),
        }
    }

    /// Record of the configured door.
    pub async fn current(&self) -> EngineResult<Option<DoorRecord>> {
        self.find(self.door_id.as_str()).await
    }

    pub async fn find(&self, door_id: &str) -> EngineResult<Option<DoorRecord>> {
        Ok(self.repo.find(door_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup() -> (Database, DoorTracker) {
        let db = Database::in_memory().await.unwrap();
        let tracker = DoorTracker::new(&db, DoorId::default());
        (db, tracker)
    }

    #[tokio::test]
    async fn test_initialize_creates_closed_record() {
        let (_db, tracker) = setup().await;

        let record = tracker.initialize().await.unwrap();
        assert_eq!(record.state, DoorState::Closed);
        assert_eq!(record.last_event, "initialized");
    }

    #[tokio::test]
    async fn test_initialize_keeps_existing_and_drops_others() {
        let (db, tracker) = setup().await;
        let repo = SqliteDoorRepository::new(db.pool().clone());
        repo.upsert(&DoorRecord::new("Back Door", DoorState::Open, "door_opened"))
            .await
            .unwrap();
        tracker
            .apply(DoorSignal::Opened, Some("door_opened"), None)
            .await
            .unwrap();

        let record = tracker.initialize().await.unwrap();
        assert_eq!(record.state, DoorState::Open);
        assert!(repo.find("Back Door").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signals_drive_state() {
        let (_db, tracker) = setup().await;
        tracker.initialize().await.unwrap();

        let record = tracker
            .apply(DoorSignal::Opened, None, Some("2025-01-01T00:00:00Z".into()))
            .await
            .unwrap();
        assert_eq!(record.state, DoorState::Open);
        assert_eq!(record.last_event, "status_update");
        assert_eq!(record.device_ts.as_deref(), Some("2025-01-01T00:00:00Z"));

        let record = tracker
            .apply(DoorSignal::Closed, Some("door_closed"), None)
            .await
            .unwrap();
        assert_eq!(record.state, DoorState::Closed);
        assert_eq!(record.last_event, "door_closed");

        let record = tracker
            .apply(DoorSignal::ForcedOpen, Some("forced_open"), None)
            .await
            .unwrap();
        assert_eq!(record.state, DoorState::Open);
    }

    #[tokio::test]
    async fn test_silent_observation_changes_nothing() {
        let (_db, tracker) = setup().await;
        let before = tracker.initialize().await.unwrap();

        let result = tracker
            .observe(SensorObservation::Silent, Some("heartbeat"), None)
            .await
            .unwrap();
        assert!(result.is_none());

        let after = tracker.current().await.unwrap().unwrap();
        assert_eq!(after.state, before.state);
        assert_eq!(after.last_event, before.last_event);
    }

    #[tokio::test]
    async fn test_ambiguous_observation_settles_closed() {
        let (_db, tracker) = setup().await;
        tracker.apply(DoorSignal::Opened, None, None).await.unwrap();

        let record = tracker
            .observe(SensorObservation::Ambiguous, None, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.state, DoorState::Closed);
    }
}
