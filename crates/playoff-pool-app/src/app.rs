// Application state and orchestration logic.
//
// The event loop that serves front-end commands and recomputes the
// leaderboard and eliminated set whenever the store publishes a new
// results or participants snapshot. Nothing derived is cached between
// snapshots; every update is computed from scratch.

use std::collections::BTreeSet;

use playoff_pool_core::entry::{all_entries, EntrySlot};
use playoff_pool_core::stats::{pool_stats, PoolStats};
use playoff_pool_core::{
    build_leaderboard, eliminated, ghost_picks, reconcile, resolution_source, resolve,
    synthetic_results, PickSet, ResultSet, ScoredEntry, TeamName,
};
use playoff_pool_store::config::Config;
use playoff_pool_store::{PoolStore, Submission};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::protocol::{PoolCommand, PoolUpdate};

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub store: PoolStore,
    pub pool_name: String,
    passphrase: String,
}

impl AppState {
    pub fn new(store: PoolStore, pool_name: impl Into<String>, passphrase: impl Into<String>) -> Self {
        AppState {
            store,
            pool_name: pool_name.into(),
            passphrase: passphrase.into(),
        }
    }

    pub fn from_config(config: &Config, store: PoolStore) -> Self {
        AppState::new(store, config.pool.name.clone(), config.admin.passphrase.clone())
    }

    fn is_admin(&self, passphrase: &str) -> bool {
        passphrase == self.passphrase
    }

    /// Current standings over every entry.
    pub fn leaderboard(&self) -> Vec<ScoredEntry> {
        let participants = self.store.read_participants();
        let results = self.store.read_results();
        build_leaderboard(self.store.bracket(), all_entries(&participants), &results)
    }

    pub fn eliminated(&self) -> BTreeSet<TeamName> {
        eliminated(self.store.bracket(), &self.store.read_results())
    }

    pub fn stats(&self) -> PoolStats {
        let participants = self.store.read_participants();
        let results = self.store.read_results();
        let bracket = self.store.bracket();
        let board = build_leaderboard(bracket, all_entries(&participants), &results);
        pool_stats(
            bracket,
            participants.len(),
            all_entries(&participants),
            &board,
            &results,
        )
    }

    /// Handle one command and return the updates it produces. Store writes
    /// also trigger snapshot updates through the subscriptions in `run`.
    pub fn handle_command(&self, cmd: PoolCommand) -> Vec<PoolUpdate> {
        debug!(command = cmd.name(), "handling command");
        match cmd {
            PoolCommand::SetResult {
                passphrase,
                series_id,
                update,
            } => {
                if !self.is_admin(&passphrase) {
                    return vec![reject_passphrase("SET_RESULT")];
                }
                match self.store.write_result(&series_id, update) {
                    Ok(()) => vec![PoolUpdate::accepted(format!("result recorded for {series_id}"))],
                    Err(e) => {
                        warn!(series = %series_id, "result write rejected: {}", e);
                        vec![PoolUpdate::rejected(e)]
                    }
                }
            }

            PoolCommand::SetLock { passphrase, locked } => {
                if !self.is_admin(&passphrase) {
                    return vec![reject_passphrase("SET_LOCK")];
                }
                match self.store.set_locked(locked) {
                    Ok(()) => {
                        let state = if locked { "locked" } else { "unlocked" };
                        vec![PoolUpdate::accepted(format!("picks {state}"))]
                    }
                    Err(e) => vec![PoolUpdate::rejected(e)],
                }
            }

            PoolCommand::ImportResults {
                passphrase,
                snapshot,
            } => {
                if !self.is_admin(&passphrase) {
                    return vec![reject_passphrase("IMPORT_RESULTS")];
                }
                match self.store.import_results(&snapshot) {
                    Ok(n) => vec![PoolUpdate::accepted(format!("imported results for {n} series"))],
                    Err(e) => vec![PoolUpdate::rejected(e)],
                }
            }

            PoolCommand::ImportParticipants {
                passphrase,
                snapshot,
            } => {
                if !self.is_admin(&passphrase) {
                    return vec![reject_passphrase("IMPORT_PARTICIPANTS")];
                }
                match self.store.import_participants(&snapshot) {
                    Ok(n) => vec![PoolUpdate::accepted(format!("imported {n} entries"))],
                    Err(e) => vec![PoolUpdate::rejected(e)],
                }
            }

            PoolCommand::SubmitEntry {
                name,
                email,
                slot,
                picks,
            } => {
                let submission = Submission {
                    name,
                    email,
                    slot,
                    picks,
                };
                match self.store.write_entry(submission) {
                    Ok(entry) => vec![PoolUpdate::accepted(format!("entry {} saved", entry.id()))],
                    Err(e) => {
                        info!("entry rejected: {}", e);
                        vec![PoolUpdate::rejected(e)]
                    }
                }
            }

            PoolCommand::ReconcilePicks { picks } => vec![self.reconcile_picks(&picks)],

            PoolCommand::Project {
                hypothetical,
                participant_key,
                slot,
            } => vec![self.project(
                &hypothetical,
                participant_key.as_deref(),
                slot.unwrap_or(EntrySlot::First),
            )],

            PoolCommand::RequestStats => vec![PoolUpdate::Stats { stats: self.stats() }],

            // Handled by the event loop.
            PoolCommand::Quit => Vec::new(),
        }
    }

    fn reconcile_picks(&self, picks: &PickSet) -> PoolUpdate {
        let bracket = self.store.bracket();
        let results = self.store.read_results();
        let picks = reconcile(bracket, picks, &results);
        let view = resolve(bracket, &resolution_source(&picks, &results.winners()));
        PoolUpdate::PicksReconciled {
            picks,
            bracket: view,
        }
    }

    fn project(
        &self,
        hypothetical: &ResultSet,
        participant_key: Option<&str>,
        slot: EntrySlot,
    ) -> PoolUpdate {
        let bracket = self.store.bracket();
        let results = self.store.read_results();
        let participants = self.store.read_participants();

        let synthetic = synthetic_results(bracket, hypothetical, &results);
        let leaderboard = build_leaderboard(bracket, all_entries(&participants), &synthetic);

        let ghosts = match participant_key {
            None => Vec::new(),
            Some(key) => {
                let Some(entry) = participants.get(key).and_then(|p| p.entry(slot)) else {
                    return PoolUpdate::rejected(format!(
                        "no entry {key}#{} to project",
                        slot.number()
                    ));
                };
                ghost_picks(bracket, &entry.picks, &results, &synthetic)
            }
        };

        PoolUpdate::Projection {
            results: synthetic,
            leaderboard,
            ghosts,
        }
    }
}

fn reject_passphrase(command: &str) -> PoolUpdate {
    warn!(command, "admin command with wrong passphrase");
    PoolUpdate::rejected("incorrect admin passphrase")
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

/// Run the application event loop.
///
/// Listens on the command channel and on the store's results,
/// participants, and lock subscriptions. Pushes updates through
/// `update_tx`. Returns when `Quit` arrives or the command channel closes.
pub async fn run(
    mut cmd_rx: mpsc::Receiver<PoolCommand>,
    update_tx: mpsc::Sender<PoolUpdate>,
    state: AppState,
) -> anyhow::Result<()> {
    info!(pool = %state.pool_name, "Application event loop started");

    let mut results_rx = state.store.subscribe_results();
    let mut participants_rx = state.store.subscribe_participants();
    let mut lock_rx = state.store.subscribe_lock();

    // Initial snapshot for a freshly connected front end.
    let locked = *lock_rx.borrow_and_update();
    results_rx.borrow_and_update();
    participants_rx.borrow_and_update();
    let _ = update_tx.send(PoolUpdate::LockChanged { locked }).await;
    send_standings(&state, &update_tx).await;

    loop {
        tokio::select! {
            // --- Result snapshots ---
            changed = results_rx.changed() => {
                if changed.is_err() {
                    info!("Result subscription closed, shutting down");
                    break;
                }
                results_rx.borrow_and_update();
                send_standings(&state, &update_tx).await;
            }

            // --- Participant snapshots ---
            changed = participants_rx.changed() => {
                if changed.is_err() {
                    info!("Participant subscription closed, shutting down");
                    break;
                }
                participants_rx.borrow_and_update();
                let rows = state.leaderboard();
                let _ = update_tx.send(PoolUpdate::Leaderboard { rows }).await;
            }

            // --- Lock flag ---
            changed = lock_rx.changed() => {
                if changed.is_err() {
                    info!("Lock subscription closed, shutting down");
                    break;
                }
                let locked = *lock_rx.borrow_and_update();
                let _ = update_tx.send(PoolUpdate::LockChanged { locked }).await;
            }

            // --- Front-end commands ---
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(PoolCommand::Quit) => {
                        info!("Quit command received, shutting down");
                        break;
                    }
                    Some(cmd) => {
                        for update in state.handle_command(cmd) {
                            let _ = update_tx.send(update).await;
                        }
                    }
                    None => {
                        info!("Command channel closed, shutting down");
                        break;
                    }
                }
            }
        }
    }

    info!("Application event loop exiting");
    Ok(())
}

/// Leaderboard and eliminated set, recomputed from the current results.
async fn send_standings(state: &AppState, update_tx: &mpsc::Sender<PoolUpdate>) {
    let rows = state.leaderboard();
    let teams = state.eliminated();
    debug!(rows = rows.len(), eliminated = teams.len(), "standings recomputed");
    let _ = update_tx.send(PoolUpdate::Leaderboard { rows }).await;
    let _ = update_tx.send(PoolUpdate::Eliminated { teams }).await;
}
