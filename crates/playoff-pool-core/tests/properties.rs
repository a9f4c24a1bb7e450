// Property and end-to-end tests for the bracket engine.
//
// Random cases use a fixed seed so failures reproduce. Outcomes are drawn
// by playing the bracket forward, so every settled winner is a real
// occupant of its series.

use playoff_pool_core::bracket::{BracketDefinition, SlotPosition};
use playoff_pool_core::entry::{Entry, EntrySlot, Pick, PickSet};
use playoff_pool_core::resolve::resolve;
use playoff_pool_core::results::{ResultSet, SeriesResult};
use playoff_pool_core::{
    build_leaderboard, eliminated, project, reconcile, score, synthetic_results, GAME_OPTIONS,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CASES: usize = 300;

// ===========================================================================
// Generators
// ===========================================================================

fn bracket() -> BracketDefinition {
    BracketDefinition::nba_2025_playoffs()
}

fn games(rng: &mut StdRng) -> u8 {
    GAME_OPTIONS[rng.gen_range(0..GAME_OPTIONS.len())]
}

/// A full tournament outcome, in round order.
fn outcome(bracket: &BracketDefinition, rng: &mut StdRng) -> Vec<(String, SeriesResult)> {
    let mut results = ResultSet::new();
    let mut order = Vec::new();
    for series in bracket.series() {
        let resolved = resolve(bracket, &results.winners());
        let matchup = &resolved[series.id()];
        let pos = if rng.gen_bool(0.5) {
            SlotPosition::Top
        } else {
            SlotPosition::Bottom
        };
        let winner = matchup.slot(pos).label().to_string();
        let result = SeriesResult::new(winner, games(rng));
        results.insert(series.id(), result.clone());
        order.push((series.id().to_string(), result));
    }
    order
}

/// The first `count` series of an outcome, as a result set.
fn settled(outcome: &[(String, SeriesResult)], count: usize) -> ResultSet {
    outcome.iter().take(count).cloned().collect()
}

/// Arbitrary picks: any team that could reach the series, sometimes with
/// missing fields. Deliberately not consistent across rounds.
fn random_picks(bracket: &BracketDefinition, rng: &mut StdRng) -> PickSet {
    let candidates = bracket.candidates();
    let mut picks = PickSet::new();
    for series in bracket.series() {
        if !rng.gen_bool(0.85) {
            continue;
        }
        let teams: Vec<&str> = candidates[series.id()].iter().copied().collect();
        let team = teams[rng.gen_range(0..teams.len())];
        let winner = rng.gen_bool(0.9).then(|| team.to_string());
        let length = if rng.gen_bool(0.9) { Some(games(rng)) } else { None };
        let pick = Pick {
            winner,
            games: length,
        };
        picks.insert(series.id().to_string(), pick);
    }
    picks
}

fn entry(key: &str, picks: PickSet) -> Entry {
    Entry {
        participant_key: key.into(),
        name: key.into(),
        slot: EntrySlot::First,
        picks,
        submitted_at: None,
    }
}

// ===========================================================================
// Properties
// ===========================================================================

#[test]
fn reconcile_is_idempotent() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..CASES {
        let full = outcome(&bracket, &mut rng);
        let results = settled(&full, rng.gen_range(0..=15));
        let picks = random_picks(&bracket, &mut rng);

        let once = reconcile(&bracket, &picks, &results);
        let twice = reconcile(&bracket, &once, &results);
        assert_eq!(once, twice);
    }
}

#[test]
fn reconcile_only_clears_and_never_touches_settled_series() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..CASES {
        let full = outcome(&bracket, &mut rng);
        let results = settled(&full, rng.gen_range(0..=15));
        let picks = random_picks(&bracket, &mut rng);

        let out = reconcile(&bracket, &picks, &results);
        assert_eq!(out.len(), picks.len());
        for (id, before) in &picks {
            let after = &out[id];
            if results.is_settled(id) {
                assert_eq!(after, before, "settled series {id} was modified");
            } else {
                assert!(after == before || *after == Pick::default());
            }
        }
    }
}

#[test]
fn elimination_is_monotonic() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..CASES / 10 {
        let full = outcome(&bracket, &mut rng);
        let mut previous = eliminated(&bracket, &ResultSet::new());
        assert!(previous.is_empty());
        for k in 1..=full.len() {
            let current = eliminated(&bracket, &settled(&full, k));
            assert!(previous.is_subset(&current));
            assert_eq!(current.len(), k, "every settled series eliminates one team");
            previous = current;
        }
        assert_eq!(previous.len(), 15);
    }
}

#[test]
fn games_points_never_without_winner_points() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..CASES {
        let full = outcome(&bracket, &mut rng);
        let results = settled(&full, rng.gen_range(0..=15));
        let picks = random_picks(&bracket, &mut rng);

        for series in bracket.series() {
            let Some(pick) = picks.get(series.id()) else {
                continue;
            };
            let single = PickSet::from([(series.id().to_string(), pick.clone())]);
            let s = score(&bracket, &single, &results);
            let right = pick.winner.is_some()
                && pick.winner.as_deref() == results.winner(series.id());
            if right {
                assert!(s.points == series.winner_points || s.points == series.full_points());
            } else {
                assert_eq!(s.points, 0);
                assert_eq!(s.correct_games, 0);
            }
        }
    }
}

#[test]
fn max_points_never_below_points() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(19);
    for _ in 0..CASES {
        let full = outcome(&bracket, &mut rng);
        let results = settled(&full, rng.gen_range(0..=15));
        let picks = reconcile(&bracket, &random_picks(&bracket, &mut rng), &results);

        let s = score(&bracket, &picks, &results);
        assert!(s.max_points >= s.points);
        assert!(s.max_points <= bracket.max_points());
        assert!(s.correct_games <= s.correct_series);
    }
}

#[test]
fn absent_winner_contributes_nothing() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..CASES {
        let full = outcome(&bracket, &mut rng);
        let results = settled(&full, rng.gen_range(0..=15));
        let winnerless: PickSet = bracket
            .series()
            .map(|s| {
                let pick = Pick {
                    winner: None,
                    games: Some(games(&mut rng)),
                };
                (s.id().to_string(), pick)
            })
            .collect();

        let s = score(&bracket, &winnerless, &results);
        assert_eq!((s.points, s.max_points), (0, 0));
    }
}

#[test]
fn projection_keeps_authoritative_winners() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(29);
    for _ in 0..CASES {
        let real = settled(&outcome(&bracket, &mut rng), rng.gen_range(0..=15));
        let what_if = settled(&outcome(&bracket, &mut rng), 15);

        let synthetic = synthetic_results(&bracket, &what_if, &real);
        for (id, result) in real.iter() {
            if result.is_settled() {
                assert_eq!(synthetic.get(id), Some(result));
            }
        }
    }
}

#[test]
fn projection_with_no_hypotheticals_matches_real_leaderboard() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(31);
    let real = settled(&outcome(&bracket, &mut rng), 9);
    let entries: Vec<Entry> = (0..6)
        .map(|i| entry(&format!("p{i}"), random_picks(&bracket, &mut rng)))
        .collect();

    let projected = project(&bracket, &ResultSet::new(), &real, &entries);
    let actual = build_leaderboard(&bracket, &entries, &real);
    assert_eq!(projected, actual);
}

// ===========================================================================
// Worked examples
// ===========================================================================

fn celtics_result(games: u8) -> ResultSet {
    let mut results = ResultSet::new();
    results.insert("s1", SeriesResult::new("Boston Celtics", games));
    results
}

#[test]
fn exact_pick_scores_fifteen() {
    let picks = PickSet::from([("s1".to_string(), Pick::new("Boston Celtics", 6))]);
    let s = score(&bracket(), &picks, &celtics_result(6));
    assert_eq!(s.points, 15);
    assert_eq!(s.correct_series, 1);
    assert_eq!(s.correct_games, 1);
}

#[test]
fn wrong_length_scores_winner_only() {
    let picks = PickSet::from([("s1".to_string(), Pick::new("Boston Celtics", 7))]);
    let s = score(&bracket(), &picks, &celtics_result(6));
    assert_eq!(s.points, 10);
    assert_eq!(s.correct_games, 0);
}

#[test]
fn wrong_winner_scores_zero_and_eliminates_loser() {
    let bracket = bracket();
    let picks = PickSet::from([("s1".to_string(), Pick::new("Miami Heat", 5))]);
    let results = celtics_result(6);
    assert_eq!(score(&bracket, &picks, &results).points, 0);
    assert!(eliminated(&bracket, &results).contains("Miami Heat"));
}

#[test]
fn changing_round_one_pick_clears_round_two() {
    let bracket = bracket();
    let mut picks = PickSet::from([
        ("s1".to_string(), Pick::new("Boston Celtics", 6)),
        ("s9".to_string(), Pick::new("Boston Celtics", 6)),
    ]);
    picks.insert("s1".to_string(), Pick::new("Miami Heat", 6));

    let out = reconcile(&bracket, &picks, &ResultSet::new());
    assert_eq!(out["s9"].winner, None);
    assert_eq!(out["s9"].games, None);
}

#[test]
fn full_bracket_scores_max_when_everything_is_right() {
    let bracket = bracket();
    let mut rng = StdRng::seed_from_u64(37);
    let full = outcome(&bracket, &mut rng);
    let picks: PickSet = full
        .iter()
        .map(|(id, r)| {
            let pick = Pick {
                winner: r.winner.clone(),
                games: r.games,
            };
            (id.clone(), pick)
        })
        .collect();

    assert_eq!(reconcile(&bracket, &picks, &ResultSet::new()), picks);
    let before = score(&bracket, &picks, &ResultSet::new());
    assert_eq!(before.max_points, 350);

    let after = score(&bracket, &picks, &settled(&full, 15));
    assert_eq!(after.points, 350);
    assert_eq!(after.correct_series, 15);
}
