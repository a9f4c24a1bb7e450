// Pool statistics: headline numbers and pick distribution per settled series.

use serde::Serialize;

use crate::bracket::{BracketDefinition, SeriesId, SlotPosition, TeamName};
use crate::entry::Entry;
use crate::leaderboard::ScoredEntry;
use crate::resolve::{consistent_results, resolve};
use crate::results::ResultSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickSplit {
    pub team: TeamName,
    pub count: usize,
    /// Share of all entries, rounded to a whole percent.
    pub percent: u32,
    pub won: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesSplit {
    pub series_id: SeriesId,
    pub round: String,
    pub top: PickSplit,
    pub bottom: PickSplit,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub participants: usize,
    pub entries: usize,
    pub completed_series: usize,
    pub top_score: u32,
    pub average_points: u32,
    pub series: Vec<SeriesSplit>,
}

/// Summarise the pool. `leaderboard` must be built from the same `entries`
/// and `results`.
pub fn pool_stats<'e>(
    bracket: &BracketDefinition,
    participants: usize,
    entries: impl IntoIterator<Item = &'e Entry>,
    leaderboard: &[ScoredEntry],
    results: &ResultSet,
) -> PoolStats {
    let entries: Vec<&Entry> = entries.into_iter().collect();
    let results = consistent_results(bracket, results);
    let resolved = resolve(bracket, &results.winners());

    let total_points: u32 = leaderboard.iter().map(|r| r.score.points).sum();
    let average_points = rounded_ratio(total_points as usize, leaderboard.len());

    let mut series = Vec::new();
    let mut completed_series = 0;
    for round in bracket.rounds.iter() {
        for def in &round.series {
            let Some(winner) = results.winner(&def.id) else {
                continue;
            };
            completed_series += 1;
            let Some(matchup) = resolved.get(&def.id) else {
                continue;
            };

            let split = |pos: SlotPosition| {
                let team = matchup.slot(pos).label().to_string();
                let count = entries
                    .iter()
                    .filter(|e| {
                        e.picks
                            .get(&def.id)
                            .and_then(|p| p.winner.as_deref())
                            .is_some_and(|w| w == team)
                    })
                    .count();
                PickSplit {
                    percent: rounded_ratio(count * 100, entries.len()),
                    won: team == winner,
                    team,
                    count,
                }
            };
            series.push(SeriesSplit {
                series_id: def.id.clone(),
                round: round.name.clone(),
                top: split(SlotPosition::Top),
                bottom: split(SlotPosition::Bottom),
            });
        }
    }

    PoolStats {
        participants,
        entries: entries.len(),
        completed_series,
        top_score: leaderboard.first().map(|r| r.score.points).unwrap_or(0),
        average_points,
        series,
    }
}

/// `num / den` rounded half up; zero when `den` is zero.
fn rounded_ratio(num: usize, den: usize) -> u32 {
    if den == 0 {
        return 0;
    }
    ((2 * num + den) / (2 * den)) as u32
}
