// Picks, entries, and participants.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::bracket::{is_valid_games, BracketDefinition, SeriesId, TeamName};

/// One entrant's prediction for one series. Either field may be unset while
/// the entrant is still filling in the bracket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pick {
    #[serde(default)]
    pub winner: Option<TeamName>,
    #[serde(default)]
    pub games: Option<u8>,
}

impl Pick {
    pub fn new(winner: impl Into<TeamName>, games: u8) -> Self {
        Pick {
            winner: Some(winner.into()),
            games: Some(games),
        }
    }

    pub fn winner_only(winner: impl Into<TeamName>) -> Self {
        Pick {
            winner: Some(winner.into()),
            games: None,
        }
    }

    /// Both a winner and a valid series length are set.
    pub fn is_complete(&self) -> bool {
        self.winner.is_some() && self.games.is_some_and(is_valid_games)
    }

    /// Drop the winner together with the games count; a length without a
    /// winner scores nothing.
    pub fn clear(&mut self) {
        self.winner = None;
        self.games = None;
    }
}

/// An entrant's full set of picks, keyed by series id.
pub type PickSet = BTreeMap<SeriesId, Pick>;

/// Number of bracket series with a complete pick.
pub fn picked_count(bracket: &BracketDefinition, picks: &PickSet) -> usize {
    bracket
        .series()
        .filter(|s| picks.get(s.id()).is_some_and(Pick::is_complete))
        .count()
}

/// Every series in the bracket has a complete pick.
pub fn is_complete(bracket: &BracketDefinition, picks: &PickSet) -> bool {
    picked_count(bracket, picks) == bracket.series_count()
}

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// Which of a participant's two entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EntrySlot {
    First,
    Second,
}

impl EntrySlot {
    pub fn number(self) -> u8 {
        match self {
            EntrySlot::First => 1,
            EntrySlot::Second => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(EntrySlot::First),
            2 => Some(EntrySlot::Second),
            _ => None,
        }
    }
}

impl TryFrom<u8> for EntrySlot {
    type Error = String;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        EntrySlot::from_number(n).ok_or_else(|| format!("entry slot must be 1 or 2, got {n}"))
    }
}

impl From<EntrySlot> for u8 {
    fn from(slot: EntrySlot) -> u8 {
        slot.number()
    }
}

/// Stable identity of one scored entry: `{participant_key}#{slot}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId {
    pub participant_key: String,
    pub slot: EntrySlot,
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.participant_key, self.slot.number())
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One independently scored submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub participant_key: String,
    /// Display name of the owning participant.
    pub name: String,
    pub slot: EntrySlot,
    pub picks: PickSet,
    /// Submission time in Unix milliseconds.
    #[serde(default)]
    pub submitted_at: Option<i64>,
}

impl Entry {
    pub fn id(&self) -> EntryId {
        EntryId {
            participant_key: self.participant_key.clone(),
            slot: self.slot,
        }
    }
}

/// A participant and the entries they have submitted (zero, one, or two).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub entries: Vec<Entry>,
}

impl Participant {
    pub fn new(name: &str, email: Option<String>) -> Self {
        Participant {
            key: participant_key(name),
            name: name.trim().to_string(),
            email,
            entries: Vec::new(),
        }
    }

    pub fn entry(&self, slot: EntrySlot) -> Option<&Entry> {
        self.entries.iter().find(|e| e.slot == slot)
    }

    /// Insert or replace the entry in `entry.slot`, keeping slot order.
    pub fn upsert_entry(&mut self, entry: Entry) {
        self.entries.retain(|e| e.slot != entry.slot);
        self.entries.push(entry);
        self.entries.sort_by_key(|e| e.slot);
    }
}

/// Participants snapshot keyed by participant key.
pub type Participants = BTreeMap<String, Participant>;

/// All entries across all participants, in key then slot order.
pub fn all_entries(participants: &Participants) -> impl Iterator<Item = &Entry> {
    participants.values().flat_map(|p| p.entries.iter())
}

/// Derive the storage key for a display name: trimmed, lowercased, with
/// every character outside `[a-z0-9]` replaced by `_`.
pub fn participant_key(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_key_slugifies_names() {
        assert_eq!(participant_key("  Jane Doe "), "jane_doe");
        assert_eq!(participant_key("O'Neil-42"), "o_neil_42");
        assert_eq!(participant_key("ALLCAPS"), "allcaps");
    }

    #[test]
    fn entry_id_display_is_distinct_per_slot() {
        let first = EntryId {
            participant_key: "jane".into(),
            slot: EntrySlot::First,
        };
        let second = EntryId {
            participant_key: "jane".into(),
            slot: EntrySlot::Second,
        };
        assert_eq!(first.to_string(), "jane#1");
        assert_eq!(second.to_string(), "jane#2");
        assert_ne!(first, second);
        assert_eq!(serde_json::to_value(&first).unwrap(), "jane#1");
    }

    #[test]
    fn entry_slot_rejects_out_of_range() {
        assert_eq!(serde_json::from_str::<EntrySlot>("2").unwrap(), EntrySlot::Second);
        assert!(serde_json::from_str::<EntrySlot>("3").is_err());
        assert!(EntrySlot::from_number(0).is_none());
    }

    #[test]
    fn pick_completeness_requires_valid_games() {
        assert!(Pick::new("Miami Heat", 6).is_complete());
        assert!(!Pick::new("Miami Heat", 3).is_complete());
        assert!(!Pick::winner_only("Miami Heat").is_complete());

        let mut pick = Pick::new("Miami Heat", 6);
        pick.clear();
        assert_eq!(pick, Pick::default());
    }

    #[test]
    fn picked_count_ignores_partial_and_foreign_picks() {
        let bracket = BracketDefinition::nba_2025_playoffs();
        let mut picks = PickSet::new();
        picks.insert("s1".into(), Pick::new("Boston Celtics", 5));
        picks.insert("s2".into(), Pick::winner_only("Indiana Pacers"));
        picks.insert("s99".into(), Pick::new("Nobody", 4));

        assert_eq!(picked_count(&bracket, &picks), 1);
        assert!(!is_complete(&bracket, &picks));
    }

    #[test]
    fn upsert_entry_replaces_same_slot() {
        let mut participant = Participant::new("Jane Doe", None);
        let entry = |slot, team: &str| Entry {
            participant_key: "jane_doe".into(),
            name: "Jane Doe".into(),
            slot,
            picks: PickSet::from([("s1".to_string(), Pick::new(team, 6))]),
            submitted_at: None,
        };

        participant.upsert_entry(entry(EntrySlot::Second, "Miami Heat"));
        participant.upsert_entry(entry(EntrySlot::First, "Boston Celtics"));
        participant.upsert_entry(entry(EntrySlot::Second, "Boston Celtics"));

        assert_eq!(participant.entries.len(), 2);
        assert_eq!(participant.entries[0].slot, EntrySlot::First);
        let second = participant.entry(EntrySlot::Second).unwrap();
        assert_eq!(second.picks["s1"].winner.as_deref(), Some("Boston Celtics"));
    }
}
