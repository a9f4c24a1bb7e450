// Authoritative series results entered by the administrator.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bracket::{SeriesId, TeamName};

/// The recorded outcome of one series. A series is settled once it has a
/// winner; `games` may be filled in before or after the winner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesResult {
    #[serde(default)]
    pub winner: Option<TeamName>,
    #[serde(default)]
    pub games: Option<u8>,
}

impl SeriesResult {
    pub fn new(winner: impl Into<TeamName>, games: u8) -> Self {
        SeriesResult {
            winner: Some(winner.into()),
            games: Some(games),
        }
    }

    pub fn is_settled(&self) -> bool {
        self.winner.is_some()
    }
}

/// A single-field update from the admin path: `write(seriesId, field, value)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "lowercase")]
pub enum ResultField {
    Winner(TeamName),
    Games(u8),
}

/// Result snapshot keyed by series id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultSet {
    series: BTreeMap<SeriesId, SeriesResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<&SeriesResult> {
        self.series.get(id)
    }

    /// The settled winner of a series, if any.
    pub fn winner(&self, id: &str) -> Option<&str> {
        self.series.get(id).and_then(|r| r.winner.as_deref())
    }

    pub fn is_settled(&self, id: &str) -> bool {
        self.winner(id).is_some()
    }

    pub fn insert(&mut self, id: impl Into<SeriesId>, result: SeriesResult) {
        self.series.insert(id.into(), result);
    }

    /// Overwrite one field of a series result, leaving the other untouched.
    pub fn apply(&mut self, id: &str, field: ResultField) {
        let entry = self.series.entry(id.to_string()).or_default();
        match field {
            ResultField::Winner(team) => entry.winner = Some(team),
            ResultField::Games(games) => entry.games = Some(games),
        }
    }

    /// Winners of all settled series.
    pub fn winners(&self) -> BTreeMap<SeriesId, TeamName> {
        self.series
            .iter()
            .filter_map(|(id, r)| r.winner.clone().map(|w| (id.clone(), w)))
            .collect()
    }

    pub fn settled_count(&self) -> usize {
        self.series.values().filter(|r| r.is_settled()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SeriesId, &SeriesResult)> {
        self.series.iter()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<(SeriesId, SeriesResult)> for ResultSet {
    fn from_iter<T: IntoIterator<Item = (SeriesId, SeriesResult)>>(iter: T) -> Self {
        ResultSet {
            series: iter.into_iter().collect(),
        }
    }
}
