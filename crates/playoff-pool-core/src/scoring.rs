// Scoring engine: earned and still-achievable points for one pick set.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::bracket::{BracketDefinition, Series, TeamName};
use crate::elimination::eliminated;
use crate::entry::{Pick, PickSet};
use crate::resolve::consistent_results;
use crate::results::{ResultSet, SeriesResult};

/// Points summary for one entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Score {
    pub points: u32,
    pub max_points: u32,
    pub correct_series: u32,
    pub correct_games: u32,
}

/// Everything scoring needs that depends only on the results, computed once
/// and shared across all entries. Results naming a winner that cannot be in
/// the series are dropped up front and score as unplayed.
pub struct ScoringContext<'a> {
    bracket: &'a BracketDefinition,
    results: ResultSet,
    eliminated: BTreeSet<TeamName>,
    candidates: HashMap<&'a str, BTreeSet<&'a str>>,
}

impl<'a> ScoringContext<'a> {
    pub fn new(bracket: &'a BracketDefinition, results: &ResultSet) -> Self {
        let results = consistent_results(bracket, results);
        ScoringContext {
            bracket,
            eliminated: eliminated(bracket, &results),
            results,
            candidates: bracket.candidates(),
        }
    }

    pub fn eliminated(&self) -> &BTreeSet<TeamName> {
        &self.eliminated
    }

    pub fn score(&self, picks: &PickSet) -> Score {
        let mut score = Score::default();

        for series in self.bracket.series() {
            let Some(pick) = picks.get(series.id()) else {
                continue;
            };
            let Some(team) = pick.winner.as_deref() else {
                continue;
            };

            match self.results.get(series.id()) {
                Some(result) if result.is_settled() => {
                    let earned = settled_points(&series, pick, team, result);
                    score.points += earned.points;
                    score.max_points += earned.max_points;
                    score.correct_series += earned.correct_series;
                    score.correct_games += earned.correct_games;
                }
                _ => {
                    if self.is_alive(&series, team) {
                        score.max_points += series.full_points();
                    }
                }
            }
        }

        score
    }

    /// The picked team can still win this unsettled series.
    fn is_alive(&self, series: &Series<'_>, team: &str) -> bool {
        !self.eliminated.contains(team)
            && self
                .candidates
                .get(series.id())
                .is_some_and(|teams| teams.contains(team))
    }
}

/// Contribution of one settled series: exactly what was earned, in both
/// points and max points. The games bonus is only ever paid alongside the
/// winner points, and only against a recorded length.
fn settled_points(series: &Series<'_>, pick: &Pick, team: &str, result: &SeriesResult) -> Score {
    if result.winner.as_deref() != Some(team) {
        return Score::default();
    }

    let mut score = Score {
        points: series.winner_points,
        max_points: series.winner_points,
        correct_series: 1,
        correct_games: 0,
    };
    if pick.games.is_some() && pick.games == result.games {
        score.points += series.games_points;
        score.max_points += series.games_points;
        score.correct_games = 1;
    }
    score
}

/// Score a single pick set against the authoritative results.
pub fn score(bracket: &BracketDefinition, picks: &PickSet, results: &ResultSet) -> Score {
    ScoringContext::new(bracket, results).score(picks)
}
