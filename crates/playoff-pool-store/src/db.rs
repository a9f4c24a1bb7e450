// SQLite persistence layer for results, participants, entries, and pool state.

use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use playoff_pool_core::entry::{Entry, EntrySlot, Participant, Participants, PickSet};
use playoff_pool_core::results::{ResultField, ResultSet, SeriesResult};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use tracing::warn;

/// SQLite-backed persistence for series results, participants and their
/// entries, and key-value pool state (such as the lock flag).
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database (useful
    /// for tests).
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS results (
                series_id  TEXT PRIMARY KEY,
                winner     TEXT,
                games      INTEGER,
                updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE IF NOT EXISTS participants (
                key   TEXT PRIMARY KEY,
                name  TEXT NOT NULL,
                email TEXT
            );

            CREATE TABLE IF NOT EXISTS entries (
                participant_key TEXT NOT NULL REFERENCES participants(key) ON DELETE CASCADE,
                slot            INTEGER NOT NULL,
                picks           TEXT NOT NULL,
                submitted_at    INTEGER,
                PRIMARY KEY (participant_key, slot)
            );

            CREATE TABLE IF NOT EXISTS pool_state (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Acquire the database connection.
    ///
    /// Panics if the mutex is poisoned (another thread panicked while
    /// holding the lock). This should never happen in normal operation.
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("database mutex poisoned")
    }

    // ------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------

    /// Write one field of a series result, creating the row if needed and
    /// leaving the other field untouched.
    pub fn set_result_field(&self, series_id: &str, field: &ResultField) -> Result<()> {
        let conn = self.conn();
        let sql = match field {
            ResultField::Winner(_) => {
                "INSERT INTO results (series_id, winner) VALUES (?1, ?2)
                 ON CONFLICT(series_id) DO UPDATE SET
                    winner     = excluded.winner,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"
            }
            ResultField::Games(_) => {
                "INSERT INTO results (series_id, games) VALUES (?1, ?2)
                 ON CONFLICT(series_id) DO UPDATE SET
                    games      = excluded.games,
                    updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')"
            }
        };
        let value: rusqlite::types::Value = match field {
            ResultField::Winner(team) => team.clone().into(),
            ResultField::Games(games) => i64::from(*games).into(),
        };
        conn.execute(sql, params![series_id, value])
            .context("failed to write series result")?;
        Ok(())
    }

    /// Load every stored series result.
    pub fn load_results(&self) -> Result<ResultSet> {
        let conn = self.conn();
        let mut stmt = conn
            .prepare("SELECT series_id, winner, games FROM results ORDER BY series_id")
            .context("failed to prepare load_results query")?;

        let rows = stmt
            .query_map([], |row| {
                let id: String = row.get(0)?;
                let winner: Option<String> = row.get(1)?;
                let games: Option<i64> = row.get(2)?;
                Ok((id, winner, games))
            })
            .context("failed to query results")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map result rows")?;

        Ok(rows
            .into_iter()
            .map(|(id, winner, games)| {
                let games = games.and_then(|g| u8::try_from(g).ok());
                (id, SeriesResult { winner, games })
            })
            .collect())
    }

    /// Replace all stored results with `results` in one transaction.
    pub fn replace_results(&self, results: &ResultSet) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM results", [])
            .context("failed to delete results")?;
        for (id, result) in results.iter() {
            tx.execute(
                "INSERT INTO results (series_id, winner, games) VALUES (?1, ?2, ?3)",
                params![id, result.winner, result.games.map(i64::from)],
            )
            .context("failed to insert result in batch")?;
        }
        tx.commit().context("failed to commit replace_results")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Participants and entries
    // ------------------------------------------------------------------

    /// Insert or update a participant and one of their entries atomically.
    pub fn save_entry(&self, name: &str, email: Option<&str>, entry: &Entry) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        upsert_participant(&tx, &entry.participant_key, name, email)?;
        insert_entry(&tx, entry)?;
        tx.commit().context("failed to commit save_entry")?;
        Ok(())
    }

    /// Load all participants with their entries, keyed by participant key.
    pub fn load_participants(&self) -> Result<Participants> {
        let conn = self.conn();

        let mut participants = Participants::new();
        {
            let mut stmt = conn
                .prepare("SELECT key, name, email FROM participants ORDER BY key")
                .context("failed to prepare participants query")?;
            let rows = stmt
                .query_map([], |row| {
                    Ok(Participant {
                        key: row.get(0)?,
                        name: row.get(1)?,
                        email: row.get(2)?,
                        entries: Vec::new(),
                    })
                })
                .context("failed to query participants")?
                .collect::<std::result::Result<Vec<_>, _>>()
                .context("failed to map participant rows")?;
            for p in rows {
                participants.insert(p.key.clone(), p);
            }
        }

        let mut stmt = conn
            .prepare(
                "SELECT participant_key, slot, picks, submitted_at
                 FROM entries ORDER BY participant_key, slot",
            )
            .context("failed to prepare entries query")?;
        let rows = stmt
            .query_map([], |row| {
                let key: String = row.get(0)?;
                let slot: i64 = row.get(1)?;
                let picks: String = row.get(2)?;
                let submitted_at: Option<i64> = row.get(3)?;
                Ok((key, slot, picks, submitted_at))
            })
            .context("failed to query entries")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map entry rows")?;

        for (key, slot, picks_json, submitted_at) in rows {
            let Some(slot) = u8::try_from(slot).ok().and_then(EntrySlot::from_number) else {
                warn!(participant = %key, slot, "entry with invalid slot; skipping");
                continue;
            };
            let picks: PickSet = serde_json::from_str(&picks_json)
                .with_context(|| format!("failed to deserialize picks for {key}#{}", slot.number()))?;
            let Some(participant) = participants.get_mut(&key) else {
                continue;
            };
            let entry = Entry {
                participant_key: key.clone(),
                name: participant.name.clone(),
                slot,
                picks,
                submitted_at,
            };
            participant.upsert_entry(entry);
        }

        Ok(participants)
    }

    /// Replace all participants and entries in one transaction.
    pub fn replace_participants(&self, participants: &Participants) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction().context("failed to begin transaction")?;
        tx.execute("DELETE FROM entries", [])
            .context("failed to delete entries")?;
        tx.execute("DELETE FROM participants", [])
            .context("failed to delete participants")?;
        for participant in participants.values() {
            upsert_participant(
                &tx,
                &participant.key,
                &participant.name,
                participant.email.as_deref(),
            )?;
            for entry in &participant.entries {
                insert_entry(&tx, entry)?;
            }
        }
        tx.commit().context("failed to commit replace_participants")?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Key-value pool state
    // ------------------------------------------------------------------

    /// Key used in the pool_state table for the pick lock flag.
    const LOCK_KEY: &'static str = "picks_locked";

    /// Persist an arbitrary JSON value under `key`. Uses INSERT OR REPLACE so
    /// repeated saves overwrite the previous value.
    pub fn save_state(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let conn = self.conn();
        let json_str =
            serde_json::to_string(value).context("failed to serialize state value")?;
        conn.execute(
            "INSERT OR REPLACE INTO pool_state (key, value) VALUES (?1, ?2)",
            params![key, json_str],
        )
        .context("failed to save state")?;
        Ok(())
    }

    /// Load a previously saved JSON value by `key`. Returns `None` if the key
    /// does not exist.
    pub fn load_state(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let conn = self.conn();
        let json_str: Option<String> = conn
            .query_row(
                "SELECT value FROM pool_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query pool state")?;

        json_str
            .map(|s| serde_json::from_str(&s).context("failed to deserialize state value"))
            .transpose()
    }

    /// Whether entrant submissions are currently locked. Defaults to open.
    pub fn is_locked(&self) -> Result<bool> {
        let value = self.load_state(Self::LOCK_KEY)?;
        Ok(value.and_then(|v| v.as_bool()).unwrap_or(false))
    }

    pub fn set_locked(&self, locked: bool) -> Result<()> {
        self.save_state(Self::LOCK_KEY, &serde_json::Value::Bool(locked))
    }
}

fn upsert_participant(tx: &Transaction<'_>, key: &str, name: &str, email: Option<&str>) -> Result<()> {
    tx.execute(
        "INSERT INTO participants (key, name, email) VALUES (?1, ?2, ?3)
         ON CONFLICT(key) DO UPDATE SET
            name  = excluded.name,
            email = COALESCE(excluded.email, participants.email)",
        params![key, name, email],
    )
    .context("failed to upsert participant")?;
    Ok(())
}

fn insert_entry(tx: &Transaction<'_>, entry: &Entry) -> Result<()> {
    let picks_json = serde_json::to_string(&entry.picks).context("failed to serialize picks")?;
    tx.execute(
        "INSERT OR REPLACE INTO entries (participant_key, slot, picks, submitted_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            entry.participant_key,
            entry.slot.number(),
            picks_json,
            entry.submitted_at,
        ],
    )
    .context("failed to save entry")?;
    Ok(())
}
