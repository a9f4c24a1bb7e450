// JSON message types exchanged with the pool front end.
//
// Commands arrive one JSON object per line, tagged by `type`. Updates go
// back the same way.

use std::collections::BTreeSet;

use playoff_pool_core::entry::{EntrySlot, PickSet};
use playoff_pool_core::leaderboard::ScoredEntry;
use playoff_pool_core::resolve::ResolvedBracket;
use playoff_pool_core::results::{ResultField, ResultSet};
use playoff_pool_core::scenario::GhostPick;
use playoff_pool_core::stats::PoolStats;
use playoff_pool_core::{SeriesId, TeamName};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A request from the front end. Admin commands carry the shared passphrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolCommand {
    SetResult {
        passphrase: String,
        series_id: SeriesId,
        update: ResultField,
    },
    SetLock {
        passphrase: String,
        locked: bool,
    },
    ImportResults {
        passphrase: String,
        snapshot: Value,
    },
    ImportParticipants {
        passphrase: String,
        snapshot: Value,
    },
    SubmitEntry {
        name: String,
        #[serde(default)]
        email: Option<String>,
        slot: EntrySlot,
        picks: PickSet,
    },
    /// Check a bracket in progress against the current results.
    ReconcilePicks { picks: PickSet },
    /// Score every entry under a what-if outcome. When an entry is named,
    /// its ghost picks are returned as well.
    Project {
        hypothetical: ResultSet,
        #[serde(default)]
        participant_key: Option<String>,
        #[serde(default)]
        slot: Option<EntrySlot>,
    },
    RequestStats,
    Quit,
}

impl PoolCommand {
    pub fn name(&self) -> &'static str {
        match self {
            PoolCommand::SetResult { .. } => "SET_RESULT",
            PoolCommand::SetLock { .. } => "SET_LOCK",
            PoolCommand::ImportResults { .. } => "IMPORT_RESULTS",
            PoolCommand::ImportParticipants { .. } => "IMPORT_PARTICIPANTS",
            PoolCommand::SubmitEntry { .. } => "SUBMIT_ENTRY",
            PoolCommand::ReconcilePicks { .. } => "RECONCILE_PICKS",
            PoolCommand::Project { .. } => "PROJECT",
            PoolCommand::RequestStats => "REQUEST_STATS",
            PoolCommand::Quit => "QUIT",
        }
    }
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PoolUpdate {
    Leaderboard {
        rows: Vec<ScoredEntry>,
    },
    Eliminated {
        teams: BTreeSet<TeamName>,
    },
    LockChanged {
        locked: bool,
    },
    /// The submitted picks after clearing impossible ones, and the bracket
    /// as the entrant would now see it.
    PicksReconciled {
        picks: PickSet,
        bracket: ResolvedBracket,
    },
    Projection {
        results: ResultSet,
        leaderboard: Vec<ScoredEntry>,
        ghosts: Vec<GhostPick>,
    },
    Stats {
        stats: PoolStats,
    },
    Accepted {
        message: String,
    },
    Rejected {
        reason: String,
    },
}

impl PoolUpdate {
    pub fn accepted(message: impl Into<String>) -> Self {
        PoolUpdate::Accepted {
            message: message.into(),
        }
    }

    pub fn rejected(reason: impl ToString) -> Self {
        PoolUpdate::Rejected {
            reason: reason.to_string(),
        }
    }
}
