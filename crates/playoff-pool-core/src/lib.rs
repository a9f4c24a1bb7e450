// Library root: bracket resolution, pick consistency, elimination, scoring,
// leaderboards, and scenario projection. Pure functions over in-memory
// snapshots; no I/O.

pub mod bracket;
pub mod elimination;
pub mod entry;
pub mod leaderboard;
pub mod reconcile;
pub mod resolve;
pub mod results;
pub mod scenario;
pub mod scoring;
pub mod snapshot;
pub mod stats;
pub mod validate;

pub use bracket::{BracketDefinition, BracketError, SeriesId, TeamName, GAME_OPTIONS};
pub use elimination::eliminated;
pub use entry::{Entry, EntryId, EntrySlot, Participant, Participants, Pick, PickSet};
pub use leaderboard::{build_leaderboard, ScoredEntry};
pub use reconcile::{reconcile, resolution_source};
pub use resolve::{consistent_results, resolve, Matchup, ResolvedBracket, Slot};
pub use results::{ResultField, ResultSet, SeriesResult};
pub use scenario::{ghost_picks, project, synthetic_results, GhostPick, GhostReason};
pub use scoring::{score, Score, ScoringContext};
pub use validate::ValidationError;
