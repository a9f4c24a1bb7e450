// Pick consistency: clear downstream picks that an upstream change has made
// impossible.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::debug;

use crate::bracket::{BracketDefinition, Series, SeriesId, SlotPosition, SlotSource, TeamName};
use crate::entry::PickSet;
use crate::results::ResultSet;

/// Return `picks` with every provably impossible pick cleared.
///
/// Settled series in `authoritative` are ground truth: their winners
/// override the entrant's own picks when resolving the tree, and picks on
/// those series are never cleared. For every other series, a pick is
/// cleared (winner and games together) when the slot its team would have to
/// arrive through holds a different team, or when both slots are known and
/// the team can reach neither. A slot that still shows its placeholder keeps
/// the pick, unless the feeder pick for that same team was cleared by this
/// call, so one upstream change cascades to the final in a single call.
pub fn reconcile(
    bracket: &BracketDefinition,
    picks: &PickSet,
    authoritative: &ResultSet,
) -> PickSet {
    let settled = authoritative.winners();
    let candidates = bracket.candidates();
    let mut reconciled = picks.clone();
    let mut source = resolution_source(&reconciled, &settled);
    // Team whose pick was cleared, by series.
    let mut dropped: BTreeMap<SeriesId, TeamName> = BTreeMap::new();

    for pass in 0..=bracket.depth() {
        let mut cleared = 0usize;

        for series in bracket.series() {
            let id = series.id();
            if settled.contains_key(id) {
                continue;
            }
            let Some(pick) = reconciled.get_mut(id) else {
                continue;
            };
            let Some(team) = pick.winner.clone() else {
                continue;
            };
            if !is_provably_wrong(&series, &team, &source, &dropped, &candidates) {
                continue;
            }

            debug!(series = id, team = %team, pass, "clearing pick that can no longer occur");
            pick.clear();
            source.remove(id);
            dropped.insert(id.to_string(), team);
            cleared += 1;
        }

        if cleared == 0 {
            break;
        }
    }

    reconciled
}

/// Winners used to resolve the tree: the entrant's picks with settled
/// results layered on top.
pub fn resolution_source(
    picks: &PickSet,
    settled: &BTreeMap<SeriesId, TeamName>,
) -> BTreeMap<SeriesId, TeamName> {
    let mut source: BTreeMap<SeriesId, TeamName> = picks
        .iter()
        .filter_map(|(id, p)| p.winner.clone().map(|w| (id.clone(), w)))
        .collect();
    source.extend(settled.iter().map(|(id, w)| (id.clone(), w.clone())));
    source
}

/// The slot through which `team` would have to enter `series`, if any.
fn entry_slot(
    series: &Series<'_>,
    team: &str,
    candidates: &HashMap<&str, BTreeSet<&str>>,
) -> Option<SlotPosition> {
    SlotPosition::BOTH
        .into_iter()
        .find(|&pos| match series.source(pos) {
            SlotSource::Literal(name) => name == team,
            SlotSource::WinnerOf { series: feeder, .. } => candidates
                .get(feeder)
                .is_some_and(|teams| teams.contains(team)),
        })
}

/// Current occupant of a slot, or `None` while it shows its placeholder.
fn occupant<'a>(
    series: &Series<'a>,
    pos: SlotPosition,
    source: &'a BTreeMap<SeriesId, TeamName>,
) -> Option<&'a str> {
    match series.source(pos) {
        SlotSource::Literal(team) => Some(team),
        SlotSource::WinnerOf { series: feeder, .. } => source.get(feeder).map(String::as_str),
    }
}

fn is_provably_wrong(
    series: &Series<'_>,
    team: &str,
    source: &BTreeMap<SeriesId, TeamName>,
    dropped: &BTreeMap<SeriesId, TeamName>,
    candidates: &HashMap<&str, BTreeSet<&str>>,
) -> bool {
    let Some(pos) = entry_slot(series, team, candidates) else {
        return SlotPosition::BOTH
            .into_iter()
            .all(|pos| occupant(series, pos, source).is_some());
    };
    match (occupant(series, pos, source), series.source(pos)) {
        (Some(current), _) => current != team,
        (None, SlotSource::WinnerOf { series: feeder, .. }) => {
            dropped.get(feeder).is_some_and(|t| t == team)
        }
        (None, SlotSource::Literal(_)) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Pick;
    use crate::results::SeriesResult;

    fn bracket() -> BracketDefinition {
        BracketDefinition::nba_2025_playoffs()
    }

    fn picks(pairs: &[(&str, &str, u8)]) -> PickSet {
        pairs
            .iter()
            .map(|(s, t, g)| (s.to_string(), Pick::new(*t, *g)))
            .collect()
    }

    #[test]
    fn changing_first_round_pick_clears_round_two() {
        let bracket = bracket();
        let mut p = picks(&[("s1", "Boston Celtics", 6), ("s9", "Boston Celtics", 7)]);
        p.insert("s1".into(), Pick::new("Miami Heat", 6));

        let out = reconcile(&bracket, &p, &ResultSet::new());
        assert_eq!(out["s1"].winner.as_deref(), Some("Miami Heat"));
        assert_eq!(out["s9"], Pick::default());
    }

    #[test]
    fn cascade_reaches_the_finals_in_one_call() {
        let bracket = bracket();
        let mut p = picks(&[
            ("s1", "Boston Celtics", 5),
            ("s4", "New York Knicks", 6),
            ("s9", "Boston Celtics", 6),
            ("s2", "Milwaukee Bucks", 6),
            ("s3", "Cleveland Cavaliers", 5),
            ("s10", "Cleveland Cavaliers", 7),
            ("s13", "Boston Celtics", 6),
            ("s15", "Boston Celtics", 7),
        ]);
        p.insert("s1".into(), Pick::new("Miami Heat", 7));

        let out = reconcile(&bracket, &p, &ResultSet::new());
        assert_eq!(out["s9"].winner, None);
        assert_eq!(out["s13"].winner, None);
        assert_eq!(out["s15"].winner, None);
        assert_eq!(out["s10"].winner.as_deref(), Some("Cleveland Cavaliers"));
    }

    #[test]
    fn pending_slot_keeps_pick() {
        let bracket = bracket();
        // No pick or result for s4, so Philadelphia can still arrive.
        let p = picks(&[("s1", "Boston Celtics", 6), ("s9", "Philadelphia 76ers", 6)]);
        let out = reconcile(&bracket, &p, &ResultSet::new());
        assert_eq!(out, p);
    }

    #[test]
    fn placeholder_slot_keeps_pick_for_team_beaten_upstream() {
        let bracket = bracket();
        // s9 has no pick, so s13's top slot is still a placeholder.
        let p = picks(&[("s1", "Miami Heat", 6), ("s13", "Boston Celtics", 6)]);
        let out = reconcile(&bracket, &p, &ResultSet::new());
        assert_eq!(out, p);
    }

    #[test]
    fn cleared_feeder_pick_does_not_clear_a_different_team() {
        let bracket = bracket();
        let mut p = picks(&[
            ("s1", "Boston Celtics", 6),
            ("s4", "New York Knicks", 6),
            ("s9", "Boston Celtics", 6),
            ("s13", "New York Knicks", 7),
        ]);
        p.insert("s1".into(), Pick::new("Miami Heat", 6));

        let out = reconcile(&bracket, &p, &ResultSet::new());
        assert_eq!(out["s9"], Pick::default());
        // The Knicks can still come through s9 once it is picked again.
        assert_eq!(out["s13"], Pick::new("New York Knicks", 7));
    }

    #[test]
    fn unreachable_team_is_cleared_once_both_slots_are_known() {
        let bracket = bracket();
        let p = picks(&[("s9", "Denver Nuggets", 6)]);
        assert_eq!(reconcile(&bracket, &p, &ResultSet::new()), p);

        let mut p = p;
        p.insert("s1".into(), Pick::new("Boston Celtics", 6));
        p.insert("s4".into(), Pick::new("New York Knicks", 6));
        let out = reconcile(&bracket, &p, &ResultSet::new());
        assert_eq!(out["s9"].winner, None);
    }

    #[test]
    fn first_round_pick_for_outside_team_is_cleared() {
        let bracket = bracket();
        let p = picks(&[("s1", "Denver Nuggets", 6)]);
        let out = reconcile(&bracket, &p, &ResultSet::new());
        assert_eq!(out["s1"], Pick::default());
    }

    #[test]
    fn authoritative_result_overrides_entrant_pick_for_resolution() {
        let bracket = bracket();
        let p = picks(&[("s1", "Boston Celtics", 6), ("s9", "Boston Celtics", 6)]);
        let mut results = ResultSet::new();
        results.insert("s1", SeriesResult::new("Miami Heat", 7));

        let out = reconcile(&bracket, &p, &results);
        // The settled series keeps the (wrong) pick; downstream is cleared.
        assert_eq!(out["s1"].winner.as_deref(), Some("Boston Celtics"));
        assert_eq!(out["s9"].winner, None);
        assert_eq!(results.winner("s1"), Some("Miami Heat"));
    }

    #[test]
    fn settled_series_pick_never_cleared() {
        let bracket = bracket();
        let p = picks(&[("s9", "Denver Nuggets", 6)]);
        let mut results = ResultSet::new();
        results.insert("s1", SeriesResult::new("Boston Celtics", 5));
        results.insert("s4", SeriesResult::new("New York Knicks", 6));
        results.insert("s9", SeriesResult::new("Boston Celtics", 6));

        let out = reconcile(&bracket, &p, &results);
        assert_eq!(out, p);
    }

    #[test]
    fn empty_picks_stay_empty() {
        let bracket = bracket();
        let out = reconcile(&bracket, &PickSet::new(), &ResultSet::new());
        assert!(out.is_empty());
    }
}
