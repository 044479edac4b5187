use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::{rusqlite::params, SqliteConnectionManager};
use uuid::Uuid;

use pizzeria::{
    stats::{GameRun, GameRunSubmission},
    GameMode,
};

pub struct Db {
    pub pool: Pool<SqliteConnectionManager>,
}

struct RunRow {
    document_id: String,
    total_time: f64,
    average_time: f64,
    game_type: String,
    average_wip: Option<f64>,
    timestamp: i64,
    created_at: String,
}

impl Db {
    pub fn init(filename: impl AsRef<Path>) -> Result<Self> {
        let manager = SqliteConnectionManager::file(filename);
        let s = Self {
            pool: Pool::new(manager)?,
        };
        s.init_table()?;
        Ok(s)
    }

    // Every pooled connection would get its own memory database, so keep one.
    pub fn in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory();
        let s = Self {
            pool: Pool::builder().max_size(1).build(manager)?,
        };
        s.init_table()?;
        Ok(s)
    }

    fn init_table(&self) -> Result<()> {
        let conn = self.pool.get()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS gameruns (
                    document_id TEXT PRIMARY KEY,
                    total_time REAL NOT NULL,
                    average_time REAL NOT NULL,
                    game_type TEXT NOT NULL,
                    average_wip REAL,
                    timestamp INTEGER NOT NULL,
                    created_at TEXT NOT NULL
                );",
            params![],
        )?;
        Ok(())
    }

    /// Runs are only ever appended.
    pub fn insert_run(&self, run: &GameRunSubmission) -> Result<GameRun> {
        let conn = self.pool.get()?;
        let now = Utc::now();
        let stored = GameRun {
            document_id: Uuid::new_v4().to_string(),
            total_time: run.total_time,
            average_time: run.average_time,
            game_type: run.game_type,
            average_wip: run.average_wip,
            timestamp: now.timestamp_millis() as u64,
            created_at: now.to_rfc3339(),
        };
        conn.execute(
            "INSERT INTO gameruns
            (document_id, total_time, average_time, game_type, average_wip, timestamp, created_at)
            VALUES
            (?1, ?2, ?3, ?4, ?5, ?6, ?7);
            ",
            params![
                stored.document_id,
                stored.total_time,
                stored.average_time,
                stored.game_type.as_str(),
                stored.average_wip,
                stored.timestamp as i64,
                stored.created_at
            ],
        )?;
        Ok(stored)
    }

    pub fn get_runs(&self) -> Result<Vec<GameRun>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            "
            SELECT document_id, total_time, average_time, game_type, average_wip, timestamp, created_at
            FROM gameruns
            ORDER BY timestamp;
            ",
        )?;
        let rows = stmt
            .query_map(params![], |row| {
                Ok(RunRow {
                    document_id: row.get(0)?,
                    total_time: row.get(1)?,
                    average_time: row.get(2)?,
                    game_type: row.get(3)?,
                    average_wip: row.get(4)?,
                    timestamp: row.get(5)?,
                    created_at: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<RunRow>, _>>()?;
        rows.into_iter()
            .map(|r| -> Result<GameRun> {
                let game_type = r
                    .game_type
                    .parse::<GameMode>()
                    .with_context(|| format!("Bad game run {} in the database", r.document_id))?;
                Ok(GameRun {
                    document_id: r.document_id,
                    total_time: r.total_time,
                    average_time: r.average_time,
                    game_type,
                    average_wip: r.average_wip,
                    timestamp: r.timestamp as u64,
                    created_at: r.created_at,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(game_type: GameMode, average_wip: Option<f64>) -> GameRunSubmission {
        GameRunSubmission {
            total_time: 100.0,
            average_time: 25.0,
            game_type,
            average_wip,
        }
    }

    #[test]
    fn test_insert_and_read_back() {
        let db = Db::in_memory().unwrap();
        let first = db.insert_run(&submission(GameMode::Wip, Some(1.5))).unwrap();
        let second = db.insert_run(&submission(GameMode::Multitask, None)).unwrap();
        assert_ne!(first.document_id, second.document_id);

        let runs = db.get_runs().unwrap();
        assert_eq!(runs.len(), 2);
        assert!(runs.contains(&first));
        assert!(runs.contains(&second));
        let wip = runs.iter().find(|r| r.game_type == GameMode::Wip).unwrap();
        assert_eq!(wip.average_wip, Some(1.5));
    }

    #[test]
    fn test_empty_table() {
        let db = Db::in_memory().unwrap();
        assert!(db.get_runs().unwrap().is_empty());
    }
}
