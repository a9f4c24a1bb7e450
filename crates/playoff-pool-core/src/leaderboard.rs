// Leaderboard: score every entry and rank them.

use std::cmp::Reverse;
use std::collections::HashSet;

use serde::Serialize;
use tracing::warn;

use crate::bracket::BracketDefinition;
use crate::entry::{Entry, EntryId, EntrySlot};
use crate::results::ResultSet;
use crate::scoring::{Score, ScoringContext};

/// One ranked leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredEntry {
    /// 1-based position after sorting.
    pub rank: usize,
    pub id: EntryId,
    pub participant_key: String,
    pub name: String,
    pub slot: EntrySlot,
    #[serde(flatten)]
    pub score: Score,
    pub submitted_at: Option<i64>,
}

/// Score every entry against `results` and sort: points descending, then
/// max points descending, then entry id for a deterministic order.
///
/// Each entry is its own row; a participant with two entries appears twice
/// under distinct ids. An id seen more than once keeps its first row.
pub fn build_leaderboard<'e>(
    bracket: &BracketDefinition,
    entries: impl IntoIterator<Item = &'e Entry>,
    results: &ResultSet,
) -> Vec<ScoredEntry> {
    let ctx = ScoringContext::new(bracket, results);
    let mut seen: HashSet<EntryId> = HashSet::new();

    let mut rows: Vec<ScoredEntry> = entries
        .into_iter()
        .filter_map(|entry| {
            let id = entry.id();
            if !seen.insert(id.clone()) {
                warn!(entry = %id, "duplicate entry id; keeping the first");
                return None;
            }
            Some(ScoredEntry {
                rank: 0,
                id,
                participant_key: entry.participant_key.clone(),
                name: entry.name.clone(),
                slot: entry.slot,
                score: ctx.score(&entry.picks),
                submitted_at: entry.submitted_at,
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        (Reverse(a.score.points), Reverse(a.score.max_points), &a.id).cmp(&(
            Reverse(b.score.points),
            Reverse(b.score.max_points),
            &b.id,
        ))
    });
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }
    rows
}
