// Snapshot store: the result store, participants store, and lock flag the
// engine reads from, backed by SQLite and fanned out over watch channels.

use chrono::Utc;
use playoff_pool_core::bracket::BracketDefinition;
use playoff_pool_core::entry::{participant_key, Entry, EntrySlot, Participants, PickSet};
use playoff_pool_core::reconcile::reconcile;
use playoff_pool_core::results::{ResultField, ResultSet};
use playoff_pool_core::snapshot::{normalize_participants, normalize_results};
use playoff_pool_core::validate::{validate_result_write, validate_submission, ValidationError};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

use crate::db::Database;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("picks are locked")]
    Locked,

    #[error("entry slot {slot} is not allowed; at most {max} entries per participant")]
    SlotNotAllowed { slot: u8, max: u8 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// A submission as received from an entrant.
#[derive(Debug, Clone)]
pub struct Submission {
    pub name: String,
    pub email: Option<String>,
    pub slot: EntrySlot,
    pub picks: PickSet,
}

/// Owns the persisted pool state. Every successful write publishes a full
/// replacement snapshot to subscribers.
pub struct PoolStore {
    db: Database,
    bracket: BracketDefinition,
    max_per_participant: u8,
    results_tx: watch::Sender<ResultSet>,
    participants_tx: watch::Sender<Participants>,
    locked_tx: watch::Sender<bool>,
}

impl PoolStore {
    /// Wrap an open database, loading the current snapshots.
    pub fn new(
        db: Database,
        bracket: BracketDefinition,
        max_per_participant: u8,
    ) -> anyhow::Result<Self> {
        let results = db.load_results()?;
        let participants = db.load_participants()?;
        let locked = db.is_locked()?;
        info!(
            settled = results.settled_count(),
            participants = participants.len(),
            locked,
            "pool store loaded"
        );

        Ok(PoolStore {
            db,
            bracket,
            max_per_participant,
            results_tx: watch::Sender::new(results),
            participants_tx: watch::Sender::new(participants),
            locked_tx: watch::Sender::new(locked),
        })
    }

    pub fn bracket(&self) -> &BracketDefinition {
        &self.bracket
    }

    pub fn max_per_participant(&self) -> u8 {
        self.max_per_participant
    }

    // ------------------------------------------------------------------
    // Result store
    // ------------------------------------------------------------------

    pub fn read_results(&self) -> ResultSet {
        self.results_tx.borrow().clone()
    }

    pub fn subscribe_results(&self) -> watch::Receiver<ResultSet> {
        self.results_tx.subscribe()
    }

    /// Administrator write of a single result field.
    pub fn write_result(&self, series_id: &str, field: ResultField) -> Result<(), StoreError> {
        let current = self.read_results();
        validate_result_write(&self.bracket, &current, series_id, &field)?;

        self.db.set_result_field(series_id, &field)?;
        info!(series = series_id, ?field, "result recorded");
        self.publish_results()?;
        Ok(())
    }

    /// Replace all results from an external snapshot. Returns the number of
    /// series that ended up with a stored result.
    pub fn import_results(&self, snapshot: &serde_json::Value) -> Result<usize, StoreError> {
        let results = normalize_results(&self.bracket, snapshot);
        self.db.replace_results(&results)?;
        info!(series = results.len(), "results imported");
        self.publish_results()?;
        Ok(results.len())
    }

    fn publish_results(&self) -> anyhow::Result<()> {
        let results = self.db.load_results()?;
        self.results_tx.send_replace(results);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Participants store
    // ------------------------------------------------------------------

    pub fn read_participants(&self) -> Participants {
        self.participants_tx.borrow().clone()
    }

    pub fn subscribe_participants(&self) -> watch::Receiver<Participants> {
        self.participants_tx.subscribe()
    }

    /// Entrant write of one entry. The key is derived from the display
    /// name, so an entrant can only ever address their own record. Picks are
    /// reconciled against the current results before they are checked and
    /// stored.
    pub fn write_entry(&self, submission: Submission) -> Result<Entry, StoreError> {
        if self.is_locked() {
            return Err(StoreError::Locked);
        }
        if submission.slot.number() > self.max_per_participant {
            return Err(StoreError::SlotNotAllowed {
                slot: submission.slot.number(),
                max: self.max_per_participant,
            });
        }

        let name = submission.name.trim().to_string();
        let key = participant_key(&name);
        if key.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }

        let picks = reconcile(&self.bracket, &submission.picks, &self.read_results());
        validate_submission(&self.bracket, &name, &picks)?;

        let entry = Entry {
            participant_key: key,
            name: name.clone(),
            slot: submission.slot,
            picks,
            submitted_at: Some(Utc::now().timestamp_millis()),
        };
        let email = submission.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        self.db.save_entry(&name, email, &entry)?;
        info!(entry = %entry.id(), "entry saved");

        self.publish_participants()?;
        Ok(entry)
    }

    /// Replace all participants from an external snapshot. Returns the
    /// number of entries imported.
    pub fn import_participants(&self, snapshot: &serde_json::Value) -> Result<usize, StoreError> {
        let participants = normalize_participants(snapshot);
        self.db.replace_participants(&participants)?;
        let entries: usize = participants.values().map(|p| p.entries.len()).sum();
        info!(participants = participants.len(), entries, "participants imported");
        self.publish_participants()?;
        Ok(entries)
    }

    fn publish_participants(&self) -> anyhow::Result<()> {
        let participants = self.db.load_participants()?;
        self.participants_tx.send_replace(participants);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Lock flag
    // ------------------------------------------------------------------

    pub fn is_locked(&self) -> bool {
        *self.locked_tx.borrow()
    }

    pub fn subscribe_lock(&self) -> watch::Receiver<bool> {
        self.locked_tx.subscribe()
    }

    pub fn set_locked(&self, locked: bool) -> Result<(), StoreError> {
        self.db.set_locked(locked)?;
        info!(locked, "pick lock changed");
        self.locked_tx.send_replace(locked);
        Ok(())
    }
}
