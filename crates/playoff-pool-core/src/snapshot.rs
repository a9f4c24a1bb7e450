// Snapshot normalization for externally stored JSON.
//
// Stores that compact arrays into keyed objects (`{"0": .., "1": ..}`) are
// accepted alongside dense lists. Anything that does not fit degrades to an
// empty value with a warning; nothing here returns an error.

use serde_json::{Map, Value};
use tracing::warn;

use crate::bracket::{is_valid_games, BracketDefinition};
use crate::entry::{participant_key, Entry, EntrySlot, Participant, Participants, Pick, PickSet};
use crate::results::{ResultSet, SeriesResult};

/// Normalize a `{rounds: [{series: [{id, winner, games}]}]}` results
/// snapshot into a [`ResultSet`].
///
/// A series without an `id` takes the id of the bracket series at the same
/// round and series index. Series ids the bracket does not know are skipped.
pub fn normalize_results(bracket: &BracketDefinition, snapshot: &Value) -> ResultSet {
    if snapshot.is_null() {
        return ResultSet::new();
    }
    let Some(rounds) = snapshot.get("rounds") else {
        warn!("results snapshot has no rounds; treating as empty");
        return ResultSet::new();
    };
    let Some(rounds) = indexed(rounds) else {
        warn!("results rounds are neither a list nor a map; treating as empty");
        return ResultSet::new();
    };

    let mut out = ResultSet::new();
    for (ri, round) in rounds {
        let Some(series_list) = round.get("series").and_then(indexed) else {
            continue;
        };
        for (si, raw) in series_list {
            let Some(raw) = raw.as_object() else {
                continue;
            };
            let id = match raw.get("id").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => match bracket.at(ri, si) {
                    Some(series) => series.id().to_string(),
                    None => continue,
                },
            };
            if bracket.get(&id).is_none() {
                warn!(series = %id, "result for unknown series; skipping");
                continue;
            }

            let result = SeriesResult {
                winner: non_empty_str(raw.get("winner")),
                games: parse_games(raw.get("games")),
            };
            if result.winner.is_some() || result.games.is_some() {
                out.insert(id, result);
            }
        }
    }
    out
}

/// Normalize a `{key: {name, email, picks, submittedAt, picks2?,
/// submittedAt2?}}` participants snapshot. Each participant yields one
/// entry per non-empty pick set.
pub fn normalize_participants(snapshot: &Value) -> Participants {
    if snapshot.is_null() {
        return Participants::new();
    }
    let Some(root) = snapshot.as_object() else {
        warn!("participants snapshot is not a map; treating as empty");
        return Participants::new();
    };

    let mut out = Participants::new();
    for (raw_key, raw) in root {
        let Some(raw) = raw.as_object() else {
            warn!(key = %raw_key, "malformed participant; skipping");
            continue;
        };
        let name = non_empty_str(raw.get("name")).unwrap_or_else(|| raw_key.clone());
        let key = participant_key(raw_key);
        if key.is_empty() {
            continue;
        }

        let mut participant = Participant {
            key: key.clone(),
            name: name.clone(),
            email: non_empty_str(raw.get("email")),
            entries: Vec::new(),
        };
        for (slot, picks_field, time_field) in [
            (EntrySlot::First, "picks", "submittedAt"),
            (EntrySlot::Second, "picks2", "submittedAt2"),
        ] {
            let picks = raw.get(picks_field).map(normalize_picks).unwrap_or_default();
            if picks.is_empty() {
                continue;
            }
            participant.upsert_entry(Entry {
                participant_key: key.clone(),
                name: name.clone(),
                slot,
                picks,
                submitted_at: raw.get(time_field).and_then(Value::as_i64),
            });
        }
        out.insert(key, participant);
    }
    out
}

fn normalize_picks(raw: &Value) -> PickSet {
    let Some(map) = raw.as_object() else {
        return PickSet::new();
    };
    map.iter()
        .filter_map(|(id, pick)| {
            let pick = pick.as_object()?;
            let pick = Pick {
                winner: non_empty_str(pick.get("winner")),
                games: parse_games(pick.get("games")),
            };
            (pick.winner.is_some() || pick.games.is_some()).then(|| (id.clone(), pick))
        })
        .collect()
}

/// Pair each element of a list, or each numerically keyed member of a map,
/// with its index. Map members with non-numeric keys take their position.
fn indexed(value: &Value) -> Option<Vec<(usize, &Value)>> {
    match value {
        Value::Array(items) => Some(items.iter().enumerate().collect()),
        Value::Object(map) => Some(keyed(map)),
        _ => None,
    }
}

fn keyed(map: &Map<String, Value>) -> Vec<(usize, &Value)> {
    let mut items: Vec<(usize, &Value)> = map
        .iter()
        .enumerate()
        .map(|(pos, (k, v))| (k.parse().unwrap_or(pos), v))
        .collect();
    items.sort_by_key(|(i, _)| *i);
    items
}

fn non_empty_str(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Games may arrive as a number or a numeric string; anything that is not a
/// valid series length is dropped.
fn parse_games(value: Option<&Value>) -> Option<u8> {
    let n = match value? {
        Value::Number(n) => n.as_u64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    let games = u8::try_from(n).ok()?;
    is_valid_games(games).then_some(games)
}
