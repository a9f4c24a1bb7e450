// Elimination tracking from settled results.

use std::collections::BTreeSet;

use crate::bracket::{BracketDefinition, TeamName};
use crate::resolve::{consistent_results, resolve};
use crate::results::ResultSet;

/// Teams that have lost a settled series in `authoritative`.
///
/// Each series's occupants come from resolving the bracket against the
/// settled winners, so a later-round loser is only known once both feeders
/// are settled. Series with an unresolved slot are skipped. A recorded
/// winner that is not one of the occupants eliminates nobody.
pub fn eliminated(bracket: &BracketDefinition, authoritative: &ResultSet) -> BTreeSet<TeamName> {
    let results = consistent_results(bracket, authoritative);
    let resolved = resolve(bracket, &results.winners());
    let mut out = BTreeSet::new();

    for series in bracket.series() {
        let Some(winner) = results.winner(series.id()) else {
            continue;
        };
        let Some(matchup) = resolved.get(series.id()) else {
            continue;
        };
        if !matchup.is_resolved() {
            continue;
        }
        if let Some(loser) = matchup.opponent_of(winner) {
            out.insert(loser.to_string());
        }
    }

    out
}
