// Scenario projection: overlay hypothetical results on the real ones and
// rescore without touching either.

use serde::Serialize;

use crate::bracket::{BracketDefinition, SeriesId, SlotPosition, SlotSource, TeamName};
use crate::elimination::eliminated;
use crate::entry::{Entry, Pick, PickSet};
use crate::leaderboard::{build_leaderboard, ScoredEntry};
use crate::reconcile::reconcile;
use crate::resolve::consistent_results;
use crate::results::{ResultSet, SeriesResult};

/// Build the result set a projection is scored against.
///
/// A settled authoritative series always keeps its real result. Otherwise
/// the hypothetical outcome is used, after dropping any hypothetical winner
/// that the real results (or the other hypotheticals) make impossible. A
/// hypothetical winner without a length borrows the recorded one. Series
/// with neither stay unsettled.
pub fn synthetic_results(
    bracket: &BracketDefinition,
    hypothetical: &ResultSet,
    authoritative: &ResultSet,
) -> ResultSet {
    let as_picks: PickSet = hypothetical
        .iter()
        .map(|(id, r)| {
            let pick = Pick {
                winner: r.winner.clone(),
                games: r.games,
            };
            (id.clone(), pick)
        })
        .collect();
    let consistent = reconcile(bracket, &as_picks, authoritative);

    let merged: ResultSet = bracket
        .series()
        .filter_map(|series| {
            let id = series.id();
            let result = match (authoritative.get(id), consistent.get(id)) {
                (Some(real), _) if real.is_settled() => real.clone(),
                (real, Some(pick)) if pick.winner.is_some() => SeriesResult {
                    winner: pick.winner.clone(),
                    games: pick.games.or_else(|| real.and_then(|r| r.games)),
                },
                (Some(real), _) => real.clone(),
                (None, _) => return None,
            };
            Some((id.to_string(), result))
        })
        .collect();
    consistent_results(bracket, &merged)
}

/// Projected leaderboard under a hypothetical outcome.
pub fn project<'e>(
    bracket: &BracketDefinition,
    hypothetical: &ResultSet,
    authoritative: &ResultSet,
    entries: impl IntoIterator<Item = &'e Entry>,
) -> Vec<ScoredEntry> {
    let synthetic = synthetic_results(bracket, hypothetical, authoritative);
    build_leaderboard(bracket, entries, &synthetic)
}

// ---------------------------------------------------------------------------
// Ghost picks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostReason {
    /// The team has lost a real, settled series.
    Eliminated,
    /// The projection has a different team winning the feeder series.
    Contradicted,
}

/// An entrant's original feeder pick that can no longer fill a slot of an
/// unsettled series in the projected tree. Display only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GhostPick {
    pub series_id: SeriesId,
    pub slot: SlotPosition,
    pub feeder_id: SeriesId,
    pub team: TeamName,
    pub reason: GhostReason,
}

/// For every series still unsettled in `synthetic`, flag each slot whose
/// feeder the entrant picked for a team that is already eliminated in the
/// real results or that loses the feeder in the projection.
pub fn ghost_picks(
    bracket: &BracketDefinition,
    picks: &PickSet,
    authoritative: &ResultSet,
    synthetic: &ResultSet,
) -> Vec<GhostPick> {
    let out_for_real = eliminated(bracket, authoritative);
    let mut ghosts = Vec::new();

    for series in bracket.series() {
        if synthetic.is_settled(series.id()) {
            continue;
        }
        for pos in SlotPosition::BOTH {
            let SlotSource::WinnerOf { series: feeder, .. } = series.source(pos) else {
                continue;
            };
            let Some(team) = picks.get(feeder).and_then(|p| p.winner.as_deref()) else {
                continue;
            };

            let reason = if out_for_real.contains(team) {
                GhostReason::Eliminated
            } else if synthetic.winner(feeder).is_some_and(|w| w != team) {
                GhostReason::Contradicted
            } else {
                continue;
            };
            ghosts.push(GhostPick {
                series_id: series.id().to_string(),
                slot: pos,
                feeder_id: feeder.to_string(),
                team: team.to_string(),
                reason,
            });
        }
    }

    ghosts
}
