// Static bracket definition: rounds, series, point values, and feed edges.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type SeriesId = String;
pub type TeamName = String;

/// Valid series lengths for a best-of-seven.
pub const GAME_OPTIONS: [u8; 4] = [4, 5, 6, 7];

/// Whether `games` is a possible length for a best-of-seven series.
pub fn is_valid_games(games: u8) -> bool {
    GAME_OPTIONS.contains(&games)
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BracketError {
    #[error("bracket has no rounds")]
    Empty,

    #[error("round `{round}` has no series")]
    EmptyRound { round: String },

    #[error("series id `{0}` is defined more than once")]
    DuplicateSeries(SeriesId),

    #[error("team `{0}` appears in more than one first-round slot")]
    DuplicateTeam(TeamName),

    #[error("first-round series `{series}` has an empty team name")]
    EmptyTeamName { series: SeriesId },

    #[error("first-round series `{series}` must not have a feed entry")]
    UnexpectedFeed { series: SeriesId },

    #[error("series `{series}` has no feed entry")]
    MissingFeed { series: SeriesId },

    #[error("feed entry for unknown series `{series}`")]
    UnknownFeedTarget { series: SeriesId },

    #[error("series `{series}` is fed by unknown series `{feeder}`")]
    UnknownFeeder { series: SeriesId, feeder: SeriesId },

    #[error("series `{series}` must be fed by two distinct series")]
    SameFeeders { series: SeriesId },

    #[error("series `{series}` is fed by `{feeder}` which is not in an earlier round")]
    FeederNotEarlier { series: SeriesId, feeder: SeriesId },

    #[error("series `{feeder}` feeds more than one slot")]
    FeedsMultiple { feeder: SeriesId },

    #[error("bracket must have exactly one championship series, found {0}")]
    RootCount(usize),
}

// ---------------------------------------------------------------------------
// Definition types (deserialized from bracket.toml)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Conference {
    East,
    West,
    Finals,
}

/// Which of a series's two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotPosition {
    Top,
    Bottom,
}

impl SlotPosition {
    pub const BOTH: [SlotPosition; 2] = [SlotPosition::Top, SlotPosition::Bottom];
}

/// One series as written in the bracket config.
///
/// `top` and `bottom` are literal team names in the first round. In later
/// rounds they are display placeholders ("Eastern Champion") that stand in
/// until the feeder series is settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesDef {
    pub id: SeriesId,
    pub top: String,
    pub bottom: String,
    pub conference: Conference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundDef {
    pub id: String,
    pub name: String,
    pub winner_points: u32,
    pub games_points: u32,
    pub series: Vec<SeriesDef>,
}

/// The two series whose winners fill a later-round series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feed {
    pub top: SeriesId,
    pub bottom: SeriesId,
}

impl Feed {
    pub fn source(&self, pos: SlotPosition) -> &str {
        match pos {
            SlotPosition::Top => &self.top,
            SlotPosition::Bottom => &self.bottom,
        }
    }
}

fn default_version() -> u32 {
    1
}

/// The whole tournament: rounds in play order plus the feed map for
/// rounds 2 and later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketDefinition {
    #[serde(default = "default_version")]
    pub version: u32,
    pub sport: String,
    pub season: String,
    pub rounds: Vec<RoundDef>,
    #[serde(default)]
    pub feeds: BTreeMap<SeriesId, Feed>,
}

// ---------------------------------------------------------------------------
// Series view
// ---------------------------------------------------------------------------

/// Where a slot's occupant comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotSource<'a> {
    /// A first-round team, always known.
    Literal(&'a str),
    /// The winner of an earlier series; `placeholder` is shown until then.
    WinnerOf {
        series: &'a str,
        placeholder: &'a str,
    },
}

/// A series joined with its round's scoring and its feed edges.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    pub def: &'a SeriesDef,
    pub round_index: usize,
    pub series_index: usize,
    pub winner_points: u32,
    pub games_points: u32,
    pub feed: Option<&'a Feed>,
}

impl<'a> Series<'a> {
    pub fn id(&self) -> &'a str {
        &self.def.id
    }

    pub fn is_first_round(&self) -> bool {
        self.feed.is_none()
    }

    /// Points for a correct winner plus the exact-games bonus.
    pub fn full_points(&self) -> u32 {
        self.winner_points + self.games_points
    }

    pub fn source(&self, pos: SlotPosition) -> SlotSource<'a> {
        let label = match pos {
            SlotPosition::Top => self.def.top.as_str(),
            SlotPosition::Bottom => self.def.bottom.as_str(),
        };
        match self.feed {
            None => SlotSource::Literal(label),
            Some(feed) => SlotSource::WinnerOf {
                series: feed.source(pos),
                placeholder: label,
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

impl BracketDefinition {
    /// All series in round order (first round first). For a validated
    /// bracket every feeder is yielded before the series it feeds.
    pub fn series(&self) -> impl Iterator<Item = Series<'_>> + '_ {
        self.rounds.iter().enumerate().flat_map(move |(ri, round)| {
            round.series.iter().enumerate().map(move |(si, def)| Series {
                def,
                round_index: ri,
                series_index: si,
                winner_points: round.winner_points,
                games_points: round.games_points,
                feed: self.feeds.get(&def.id),
            })
        })
    }

    pub fn get(&self, id: &str) -> Option<Series<'_>> {
        self.series().find(|s| s.id() == id)
    }

    /// Look up the series at a round/series index pair.
    pub fn at(&self, round_index: usize, series_index: usize) -> Option<Series<'_>> {
        self.series()
            .find(|s| s.round_index == round_index && s.series_index == series_index)
    }

    pub fn series_count(&self) -> usize {
        self.rounds.iter().map(|r| r.series.len()).sum()
    }

    /// Maximum total any entry can score.
    pub fn max_points(&self) -> u32 {
        self.rounds
            .iter()
            .map(|r| r.series.len() as u32 * (r.winner_points + r.games_points))
            .sum()
    }

    /// First-round team names in bracket order.
    pub fn teams(&self) -> Vec<&str> {
        self.series()
            .filter(|s| s.is_first_round())
            .flat_map(|s| [s.def.top.as_str(), s.def.bottom.as_str()])
            .collect()
    }

    /// Number of feed edges on the longest path from a first-round series to
    /// the championship. A four-round bracket has depth 3.
    pub fn depth(&self) -> usize {
        let mut depths: HashMap<&str, usize> = HashMap::new();
        for series in self.series() {
            let d = match series.feed {
                None => 0,
                Some(feed) => {
                    let top = depths.get(feed.top.as_str()).copied().unwrap_or(0);
                    let bottom = depths.get(feed.bottom.as_str()).copied().unwrap_or(0);
                    top.max(bottom) + 1
                }
            };
            depths.insert(series.id(), d);
        }
        depths.values().copied().max().unwrap_or(0)
    }

    /// For every series, the set of first-round teams that could possibly
    /// play in it.
    pub fn candidates(&self) -> HashMap<&str, BTreeSet<&str>> {
        let mut sets: HashMap<&str, BTreeSet<&str>> = HashMap::new();
        for series in self.series() {
            let mut set = BTreeSet::new();
            for pos in SlotPosition::BOTH {
                match series.source(pos) {
                    SlotSource::Literal(team) => {
                        set.insert(team);
                    }
                    SlotSource::WinnerOf { series: feeder, .. } => {
                        if let Some(upstream) = sets.get(feeder) {
                            set.extend(upstream.iter().copied());
                        }
                    }
                }
            }
            sets.insert(series.id(), set);
        }
        sets
    }

    /// The series whose winner fills the given slot, if any.
    pub fn feeder(&self, id: &str, pos: SlotPosition) -> Option<&str> {
        self.feeds.get(id).map(|f| f.source(pos))
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    /// Check that the definition forms a strict binary tree: first-round
    /// leaves with literal teams, every later series fed by two distinct
    /// series from earlier rounds, no series feeding two slots, and a single
    /// championship root.
    pub fn validate(&self) -> Result<(), BracketError> {
        if self.rounds.is_empty() {
            return Err(BracketError::Empty);
        }

        let mut round_of: HashMap<&str, usize> = HashMap::new();
        for (ri, round) in self.rounds.iter().enumerate() {
            if round.series.is_empty() {
                return Err(BracketError::EmptyRound {
                    round: round.id.clone(),
                });
            }
            for def in &round.series {
                if round_of.insert(def.id.as_str(), ri).is_some() {
                    return Err(BracketError::DuplicateSeries(def.id.clone()));
                }
            }
        }

        for target in self.feeds.keys() {
            if !round_of.contains_key(target.as_str()) {
                return Err(BracketError::UnknownFeedTarget {
                    series: target.clone(),
                });
            }
        }

        let mut teams: HashSet<&str> = HashSet::new();
        let mut fed: HashSet<&str> = HashSet::new();
        for series in self.series() {
            let id = series.id();
            match (series.round_index, series.feed) {
                (0, Some(_)) => {
                    return Err(BracketError::UnexpectedFeed { series: id.into() });
                }
                (0, None) => {
                    for team in [&series.def.top, &series.def.bottom] {
                        if team.trim().is_empty() {
                            return Err(BracketError::EmptyTeamName { series: id.into() });
                        }
                        if !teams.insert(team.as_str()) {
                            return Err(BracketError::DuplicateTeam(team.clone()));
                        }
                    }
                }
                (_, None) => {
                    return Err(BracketError::MissingFeed { series: id.into() });
                }
                (ri, Some(feed)) => {
                    if feed.top == feed.bottom {
                        return Err(BracketError::SameFeeders { series: id.into() });
                    }
                    for feeder in [&feed.top, &feed.bottom] {
                        let Some(&feeder_round) = round_of.get(feeder.as_str()) else {
                            return Err(BracketError::UnknownFeeder {
                                series: id.into(),
                                feeder: feeder.clone(),
                            });
                        };
                        if feeder_round >= ri {
                            return Err(BracketError::FeederNotEarlier {
                                series: id.into(),
                                feeder: feeder.clone(),
                            });
                        }
                        if !fed.insert(feeder.as_str()) {
                            return Err(BracketError::FeedsMultiple {
                                feeder: feeder.clone(),
                            });
                        }
                    }
                }
            }
        }

        let roots = round_of.keys().filter(|id| !fed.contains(*id)).count();
        if roots != 1 {
            return Err(BracketError::RootCount(roots));
        }

        Ok(())
    }

    // -----------------------------------------------------------------------
    // Built-in bracket
    // -----------------------------------------------------------------------

    /// The 2025 NBA playoff bracket: 16 teams, 15 best-of-seven series.
    pub fn nba_2025_playoffs() -> Self {
        fn series(id: &str, top: &str, bottom: &str, conference: Conference) -> SeriesDef {
            SeriesDef {
                id: id.into(),
                top: top.into(),
                bottom: bottom.into(),
                conference,
            }
        }
        fn feed(top: &str, bottom: &str) -> Feed {
            Feed {
                top: top.into(),
                bottom: bottom.into(),
            }
        }
        use Conference::*;

        let rounds = vec![
            RoundDef {
                id: "r1".into(),
                name: "First Round".into(),
                winner_points: 10,
                games_points: 5,
                series: vec![
                    series("s1", "Boston Celtics", "Miami Heat", East),
                    series("s2", "Milwaukee Bucks", "Indiana Pacers", East),
                    series("s3", "Cleveland Cavaliers", "Orlando Magic", East),
                    series("s4", "New York Knicks", "Philadelphia 76ers", East),
                    series("s5", "Oklahoma City Thunder", "New Orleans Pelicans", West),
                    series("s6", "Denver Nuggets", "LA Lakers", West),
                    series("s7", "Minnesota Timberwolves", "Phoenix Suns", West),
                    series("s8", "LA Clippers", "Dallas Mavericks", West),
                ],
            },
            RoundDef {
                id: "r2".into(),
                name: "Conference Semifinals".into(),
                winner_points: 20,
                games_points: 5,
                series: vec![
                    series("s9", "East R1 Winner (1/8)", "East R1 Winner (4/5)", East),
                    series("s10", "East R1 Winner (2/7)", "East R1 Winner (3/6)", East),
                    series("s11", "West R1 Winner (1/8)", "West R1 Winner (4/5)", West),
                    series("s12", "West R1 Winner (2/7)", "West R1 Winner (3/6)", West),
                ],
            },
            RoundDef {
                id: "r3".into(),
                name: "Conference Finals".into(),
                winner_points: 30,
                games_points: 10,
                series: vec![
                    series("s13", "East Semifinal Winner A", "East Semifinal Winner B", East),
                    series("s14", "West Semifinal Winner A", "West Semifinal Winner B", West),
                ],
            },
            RoundDef {
                id: "r4".into(),
                name: "NBA Finals".into(),
                winner_points: 40,
                games_points: 10,
                series: vec![series("s15", "Eastern Champion", "Western Champion", Finals)],
            },
        ];

        let feeds = BTreeMap::from([
            ("s9".to_string(), feed("s1", "s4")),
            ("s10".to_string(), feed("s2", "s3")),
            ("s11".to_string(), feed("s5", "s8")),
            ("s12".to_string(), feed("s6", "s7")),
            ("s13".to_string(), feed("s9", "s10")),
            ("s14".to_string(), feed("s11", "s12")),
            ("s15".to_string(), feed("s13", "s14")),
        ]);

        BracketDefinition {
            version: 1,
            sport: "NBA".into(),
            season: "2025 Playoffs".into(),
            rounds,
            feeds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bracket_is_valid() {
        let bracket = BracketDefinition::nba_2025_playoffs();
        assert_eq!(bracket.validate(), Ok(()));
        assert_eq!(bracket.series_count(), 15);
        assert_eq!(bracket.teams().len(), 16);
    }

    #[test]
    fn default_bracket_depth_and_max_points() {
        let bracket = BracketDefinition::nba_2025_playoffs();
        assert_eq!(bracket.depth(), 3);
        // 8*15 + 4*25 + 2*40 + 1*50
        assert_eq!(bracket.max_points(), 350);
    }

    #[test]
    fn series_iterates_in_round_order_with_points() {
        let bracket = BracketDefinition::nba_2025_playoffs();
        let ids: Vec<&str> = bracket.series().map(|s| s.id()).collect();
        assert_eq!(ids.first(), Some(&"s1"));
        assert_eq!(ids.last(), Some(&"s15"));

        let s13 = bracket.get("s13").unwrap();
        assert_eq!(s13.round_index, 2);
        assert_eq!(s13.winner_points, 30);
        assert_eq!(s13.games_points, 10);
        assert_eq!(
            s13.source(SlotPosition::Bottom),
            SlotSource::WinnerOf {
                series: "s10",
                placeholder: "East Semifinal Winner B"
            }
        );
    }

    #[test]
    fn at_maps_indices_to_series() {
        let bracket = BracketDefinition::nba_2025_playoffs();
        assert_eq!(bracket.at(1, 2).map(|s| s.id()), Some("s11"));
        assert!(bracket.at(3, 1).is_none());
    }

    #[test]
    fn candidates_follow_subtrees() {
        let bracket = BracketDefinition::nba_2025_playoffs();
        let candidates = bracket.candidates();

        let s9 = &candidates["s9"];
        assert_eq!(s9.len(), 4);
        assert!(s9.contains("Boston Celtics"));
        assert!(s9.contains("Philadelphia 76ers"));
        assert!(!s9.contains("Indiana Pacers"));

        assert_eq!(candidates["s13"].len(), 8);
        assert_eq!(candidates["s15"].len(), 16);
    }

    #[test]
    fn rejects_missing_feed() {
        let mut bracket = BracketDefinition::nba_2025_playoffs();
        bracket.feeds.remove("s12");
        assert_eq!(
            bracket.validate(),
            Err(BracketError::MissingFeed {
                series: "s12".into()
            })
        );
    }

    #[test]
    fn rejects_same_feeders() {
        let mut bracket = BracketDefinition::nba_2025_playoffs();
        bracket.feeds.insert(
            "s9".into(),
            Feed {
                top: "s1".into(),
                bottom: "s1".into(),
            },
        );
        assert_eq!(
            bracket.validate(),
            Err(BracketError::SameFeeders {
                series: "s9".into()
            })
        );
    }

    #[test]
    fn rejects_series_feeding_two_slots() {
        let mut bracket = BracketDefinition::nba_2025_playoffs();
        bracket.feeds.insert(
            "s10".into(),
            Feed {
                top: "s1".into(),
                bottom: "s3".into(),
            },
        );
        assert_eq!(
            bracket.validate(),
            Err(BracketError::FeedsMultiple {
                feeder: "s1".into()
            })
        );
    }

    #[test]
    fn rejects_feeder_from_same_or_later_round() {
        let mut bracket = BracketDefinition::nba_2025_playoffs();
        bracket.feeds.insert(
            "s13".into(),
            Feed {
                top: "s9".into(),
                bottom: "s14".into(),
            },
        );
        assert_eq!(
            bracket.validate(),
            Err(BracketError::FeederNotEarlier {
                series: "s13".into(),
                feeder: "s14".into()
            })
        );
    }

    #[test]
    fn rejects_unknown_feeder() {
        let mut bracket = BracketDefinition::nba_2025_playoffs();
        bracket.feeds.insert(
            "s15".into(),
            Feed {
                top: "s13".into(),
                bottom: "s99".into(),
            },
        );
        assert!(matches!(
            bracket.validate(),
            Err(BracketError::UnknownFeeder { .. })
        ));
    }

    #[test]
    fn rejects_duplicate_team() {
        let mut bracket = BracketDefinition::nba_2025_playoffs();
        bracket.rounds[0].series[1].top = "Boston Celtics".into();
        assert_eq!(
            bracket.validate(),
            Err(BracketError::DuplicateTeam("Boston Celtics".into()))
        );
    }

    #[test]
    fn rejects_two_roots() {
        let mut bracket = BracketDefinition::nba_2025_playoffs();
        bracket.rounds[3].series.push(SeriesDef {
            id: "s16".into(),
            top: "A".into(),
            bottom: "B".into(),
            conference: Conference::Finals,
        });
        bracket.feeds.remove("s15");
        bracket.feeds.insert(
            "s15".into(),
            Feed {
                top: "s13".into(),
                bottom: "s12".into(),
            },
        );
        bracket.feeds.insert(
            "s16".into(),
            Feed {
                top: "s14".into(),
                bottom: "s11".into(),
            },
        );
        // s11 and s12 now feed two slots each, caught before the root count.
        assert!(bracket.validate().is_err());
    }

    #[test]
    fn rejects_empty_bracket() {
        let mut bracket = BracketDefinition::nba_2025_playoffs();
        bracket.rounds.clear();
        bracket.feeds.clear();
        assert_eq!(bracket.validate(), Err(BracketError::Empty));
    }

    #[test]
    fn deserializes_config_shape_with_default_version() {
        let value = serde_json::json!({
            "sport": "NBA",
            "season": "Mini",
            "rounds": [
                {"id": "r1", "name": "Semis", "winner_points": 10, "games_points": 5,
                 "series": [
                    {"id": "a", "top": "Celtics", "bottom": "Heat", "conference": "East"},
                    {"id": "b", "top": "Nuggets", "bottom": "Lakers", "conference": "West"}
                 ]},
                {"id": "r2", "name": "Final", "winner_points": 20, "games_points": 5,
                 "series": [
                    {"id": "f", "top": "East Champion", "bottom": "West Champion", "conference": "Finals"}
                 ]}
            ],
            "feeds": {"f": {"top": "a", "bottom": "b"}}
        });
        let bracket: BracketDefinition = serde_json::from_value(value).unwrap();
        assert_eq!(bracket.version, 1);
        assert_eq!(bracket.validate(), Ok(()));
        assert_eq!(bracket.depth(), 1);
        assert_eq!(bracket.max_points(), 55);
    }
}
