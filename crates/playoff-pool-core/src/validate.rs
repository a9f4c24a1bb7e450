// Checks applied at the write boundary before anything reaches the store.

use thiserror::Error;

use crate::bracket::{is_valid_games, BracketDefinition, SeriesId, TeamName, GAME_OPTIONS};
use crate::entry::{picked_count, PickSet};
use crate::resolve::resolve;
use crate::results::{ResultField, ResultSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown series `{0}`")]
    UnknownSeries(SeriesId),

    #[error("series `{series}` does not have both teams yet")]
    SlotsUnresolved { series: SeriesId },

    #[error("`{team}` is not playing in series `{series}`")]
    NotAnOccupant { series: SeriesId, team: TeamName },

    #[error("games must be one of {options:?}, got {0}", options = GAME_OPTIONS)]
    InvalidGames(u8),

    #[error("name must not be empty")]
    EmptyName,

    #[error("entry is incomplete: {picked} of {total} series picked")]
    IncompletePicks { picked: usize, total: usize },
}

/// Check an administrator's single-field result write against the current
/// results. A winner must be one of the two teams occupying the series.
pub fn validate_result_write(
    bracket: &BracketDefinition,
    results: &ResultSet,
    series_id: &str,
    field: &ResultField,
) -> Result<(), ValidationError> {
    if bracket.get(series_id).is_none() {
        return Err(ValidationError::UnknownSeries(series_id.to_string()));
    }

    match field {
        ResultField::Games(games) => {
            if !is_valid_games(*games) {
                return Err(ValidationError::InvalidGames(*games));
            }
        }
        ResultField::Winner(team) => {
            let resolved = resolve(bracket, &results.winners());
            let Some(matchup) = resolved.get(series_id) else {
                return Err(ValidationError::UnknownSeries(series_id.to_string()));
            };
            if !matchup.is_resolved() {
                return Err(ValidationError::SlotsUnresolved {
                    series: series_id.to_string(),
                });
            }
            if !matchup.contains(team) {
                return Err(ValidationError::NotAnOccupant {
                    series: series_id.to_string(),
                    team: team.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Check an entrant's submission: a display name and a complete pick set.
pub fn validate_submission(
    bracket: &BracketDefinition,
    name: &str,
    picks: &PickSet,
) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyName);
    }
    let picked = picked_count(bracket, picks);
    let total = bracket.series_count();
    if picked < total {
        return Err(ValidationError::IncompletePicks { picked, total });
    }
    Ok(())
}
