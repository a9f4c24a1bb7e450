// Bracket resolution: fill later-round slots with the winners of their
// feeder series.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::warn;

use crate::bracket::{BracketDefinition, SeriesId, SlotPosition, SlotSource, TeamName};
use crate::results::ResultSet;

/// The occupant of one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "name", rename_all = "lowercase")]
pub enum Slot {
    /// A concrete team.
    Team(TeamName),
    /// Feeder not settled yet; carries the configured placeholder label.
    Pending(String),
}

impl Slot {
    pub fn team(&self) -> Option<&str> {
        match self {
            Slot::Team(team) => Some(team),
            Slot::Pending(_) => None,
        }
    }

    /// Team name or placeholder, whichever the slot holds.
    pub fn label(&self) -> &str {
        match self {
            Slot::Team(name) | Slot::Pending(name) => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matchup {
    pub top: Slot,
    pub bottom: Slot,
}

impl Matchup {
    pub fn slot(&self, pos: SlotPosition) -> &Slot {
        match pos {
            SlotPosition::Top => &self.top,
            SlotPosition::Bottom => &self.bottom,
        }
    }

    /// Both slots hold concrete teams.
    pub fn is_resolved(&self) -> bool {
        self.top.team().is_some() && self.bottom.team().is_some()
    }

    pub fn contains(&self, team: &str) -> bool {
        self.top.team() == Some(team) || self.bottom.team() == Some(team)
    }

    /// The other occupant when `team` holds one of the slots and the other
    /// slot is resolved.
    pub fn opponent_of(&self, team: &str) -> Option<&str> {
        match (self.top.team(), self.bottom.team()) {
            (Some(top), Some(bottom)) if top == team => Some(bottom),
            (Some(top), Some(bottom)) if bottom == team => Some(top),
            _ => None,
        }
    }
}

pub type ResolvedBracket = BTreeMap<SeriesId, Matchup>;

/// Resolve every series's two slots from a (possibly partial) set of
/// declared winners. First-round slots are always their literal teams; a
/// later slot is the declared winner of its feeder, or the placeholder when
/// the feeder has none. Pure; unknown winners are simply carried through.
pub fn resolve(
    bracket: &BracketDefinition,
    winners: &BTreeMap<SeriesId, TeamName>,
) -> ResolvedBracket {
    bracket
        .series()
        .map(|series| {
            let slot = |pos: SlotPosition| match series.source(pos) {
                SlotSource::Literal(team) => Slot::Team(team.to_string()),
                SlotSource::WinnerOf {
                    series: feeder,
                    placeholder,
                } => match winners.get(feeder) {
                    Some(team) => Slot::Team(team.clone()),
                    None => Slot::Pending(placeholder.to_string()),
                },
            };
            let matchup = Matchup {
                top: slot(SlotPosition::Top),
                bottom: slot(SlotPosition::Bottom),
            };
            (series.id().to_string(), matchup)
        })
        .collect()
}

/// Drop every result whose winner does not occupy its series, resolving
/// each series from the results kept before it. A dropped result counts as
/// no result at all, and so does anything that depended on it. Rows
/// without a winner are kept as they are.
pub fn consistent_results(bracket: &BracketDefinition, results: &ResultSet) -> ResultSet {
    let mut winners: BTreeMap<SeriesId, TeamName> = BTreeMap::new();
    let mut out = ResultSet::new();

    for series in bracket.series() {
        let Some(result) = results.get(series.id()) else {
            continue;
        };
        if let Some(winner) = result.winner.as_deref() {
            let occupies = SlotPosition::BOTH
                .into_iter()
                .any(|pos| match series.source(pos) {
                    SlotSource::Literal(team) => team == winner,
                    SlotSource::WinnerOf { series: feeder, .. } => {
                        winners.get(feeder).is_some_and(|w| w == winner)
                    }
                });
            if !occupies {
                warn!(
                    series = series.id(),
                    winner, "recorded winner is not an occupant of the series; ignoring result"
                );
                continue;
            }
            winners.insert(series.id().to_string(), winner.to_string());
        }
        out.insert(series.id(), result.clone());
    }

    out
}
