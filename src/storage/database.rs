//! Database operations using rusqlite.
//!
//! A local SQLite implementation of the goal and log stores.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use uuid::Uuid;

use crate::goals::types::{Goal, ProposedGoal};
use crate::recording::types::{DoneExerciseLogEntry, NewLogEntry};
use crate::storage::schema::{CURRENT_VERSION, SCHEMA, SCHEMA_VERSION_TABLE};
use crate::storage::traits::{GoalStore, LogStore, StoreError};

const GOAL_COLUMNS: &str = "id, user_id, cycle, exercise_name, target_sets, target_reps,
     target_weight, target_duration_seconds, categories_json, equipment_json, active, notes,
     created_at";

const LOG_COLUMNS: &str = "id, goal_id, user_id, cycle, reps, weight, duration_seconds, failed,
     notes, logged_at";

/// Database wrapper for SQLite operations.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| DatabaseError::IoError(e.to_string()))?;
        }

        let conn =
            Connection::open(path).map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        let db = Self {
            conn: Mutex::new(conn),
        };
        db.initialize()?;

        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DatabaseError> {
        self.conn
            .lock()
            .map_err(|_| DatabaseError::ConnectionFailed("connection lock poisoned".to_string()))
    }

    /// Initialize the database schema.
    fn initialize(&self) -> Result<(), DatabaseError> {
        let conn = self.conn()?;

        conn.execute_batch(SCHEMA_VERSION_TABLE)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        let current_version = get_schema_version(&conn)?;
        if current_version < CURRENT_VERSION {
            migrate(&conn, current_version)?;
        }

        Ok(())
    }

    /// Get the current schema version.
    pub fn schema_version(&self) -> Result<i32, DatabaseError> {
        get_schema_version(&*self.conn()?)
    }

    // ========== Goal Operations ==========

    /// Insert a single goal.
    pub fn insert_goal(&self, goal: &Goal) -> Result<(), DatabaseError> {
        insert_goal_row(&*self.conn()?, goal)
    }

    /// Get a goal by ID.
    pub fn get_goal(&self, id: Uuid) -> Result<Option<Goal>, DatabaseError> {
        let conn = self.conn()?;
        let result = conn.query_row(
            &format!("SELECT {} FROM goals WHERE id = ?1", GOAL_COLUMNS),
            params![id.to_string()],
            GoalRow::from_row,
        );

        match result {
            Ok(row) => Ok(Some(row.into_goal()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
        }
    }

    /// Active goals for a user in one cycle, in creation order.
    pub fn active_goals(&self, user_id: Uuid, cycle: u32) -> Result<Vec<Goal>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM goals
                 WHERE user_id = ?1 AND cycle = ?2 AND active = 1
                 ORDER BY created_at ASC, exercise_name ASC",
                GOAL_COLUMNS
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string(), cycle], GoalRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.map(|row| {
            row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
                .into_goal()
        })
        .collect()
    }

    /// Set a goal's active flag and return the updated goal.
    pub fn update_goal_active(&self, id: Uuid, active: bool) -> Result<Goal, DatabaseError> {
        let updated = self
            .conn()?
            .execute(
                "UPDATE goals SET active = ?1 WHERE id = ?2",
                params![active, id.to_string()],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        if updated == 0 {
            return Err(DatabaseError::NotFound(id.to_string()));
        }

        self.get_goal(id)?
            .ok_or_else(|| DatabaseError::NotFound(id.to_string()))
    }

    /// Create goals for `cycle` from proposals in a single transaction.
    pub fn insert_proposals(
        &self,
        user_id: Uuid,
        cycle: u32,
        proposals: &[ProposedGoal],
    ) -> Result<Vec<Goal>, DatabaseError> {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        let goals: Vec<Goal> = proposals
            .iter()
            .cloned()
            .map(|proposal| proposal.into_goal(user_id, cycle))
            .collect();

        for goal in &goals {
            insert_goal_row(&tx, goal)?;
        }

        tx.commit()
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        tracing::info!("Inserted {} goals into cycle {}", goals.len(), cycle);
        Ok(goals)
    }

    /// Distinct cycles the user has goals in, ascending.
    pub fn cycles_for_user(&self, user_id: Uuid) -> Result<Vec<u32>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT cycle FROM goals WHERE user_id = ?1 ORDER BY cycle ASC")
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string()], |row| row.get::<_, u32>(0))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.collect::<SqliteResult<Vec<_>>>()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))
    }

    // ========== Log Operations ==========

    /// Append a completed set.
    pub fn insert_log_entry(
        &self,
        entry: NewLogEntry,
    ) -> Result<DoneExerciseLogEntry, DatabaseError> {
        let entry = entry.into_entry(Uuid::new_v4());

        self.conn()?
            .execute(
                &format!(
                    "INSERT INTO done_exercise_log ({}) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                    LOG_COLUMNS
                ),
                params![
                    entry.id.to_string(),
                    entry.goal_id.to_string(),
                    entry.user_id.to_string(),
                    entry.cycle,
                    entry.reps,
                    entry.weight,
                    entry.duration_seconds,
                    entry.failed,
                    entry.notes,
                    entry.logged_at.to_rfc3339(),
                ],
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(entry)
    }

    /// All sets a user logged in one cycle, oldest first.
    pub fn log_entries(
        &self,
        user_id: Uuid,
        cycle: u32,
    ) -> Result<Vec<DoneExerciseLogEntry>, DatabaseError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM done_exercise_log
                 WHERE user_id = ?1 AND cycle = ?2
                 ORDER BY logged_at ASC",
                LOG_COLUMNS
            ))
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map(params![user_id.to_string(), cycle], LogRow::from_row)
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        rows.map(|row| {
            row.map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
                .into_entry()
        })
        .collect()
    }

    /// Count logged sets for a goal.
    pub fn count_log_entries(&self, goal_id: Uuid) -> Result<usize, DatabaseError> {
        let count: i64 = self
            .conn()?
            .query_row(
                "SELECT COUNT(*) FROM done_exercise_log WHERE goal_id = ?1",
                params![goal_id.to_string()],
                |row| row.get(0),
            )
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

        Ok(count as usize)
    }
}

fn get_schema_version(conn: &Connection) -> Result<i32, DatabaseError> {
    let result: SqliteResult<i32> = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    );

    match result {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(DatabaseError::QueryFailed(e.to_string())),
    }
}

fn migrate(conn: &Connection, from_version: i32) -> Result<(), DatabaseError> {
    if from_version < 1 {
        conn.execute_batch(SCHEMA)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))",
            [CURRENT_VERSION],
        )
        .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        tracing::info!("Database migrated to version {}", CURRENT_VERSION);
    }

    Ok(())
}

fn insert_goal_row(conn: &Connection, goal: &Goal) -> Result<(), DatabaseError> {
    let categories_json = serde_json::to_string(&goal.categories)
        .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
    let equipment_json = serde_json::to_string(&goal.equipment)
        .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;

    conn.execute(
        &format!(
            "INSERT INTO goals ({}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
            GOAL_COLUMNS
        ),
        params![
            goal.id.to_string(),
            goal.user_id.to_string(),
            goal.cycle,
            goal.exercise_name,
            goal.target_sets,
            goal.target_reps,
            goal.target_weight,
            goal.target_duration_seconds,
            categories_json,
            equipment_json,
            goal.active,
            goal.notes,
            goal.created_at.to_rfc3339(),
        ],
    )
    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;

    Ok(())
}

fn parse_uuid(value: &str, what: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(value)
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {} UUID: {}", what, e)))
}

fn parse_timestamp(value: &str, what: &str) -> Result<DateTime<Utc>, DatabaseError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid {}: {}", what, e)))
}

fn parse_tags(json: &str) -> Result<BTreeSet<String>, DatabaseError> {
    serde_json::from_str(json)
        .map_err(|e| DatabaseError::DeserializationError(format!("Invalid tags JSON: {}", e)))
}

/// Intermediate struct for reading goal rows from database.
struct GoalRow {
    id: String,
    user_id: String,
    cycle: u32,
    exercise_name: String,
    target_sets: u32,
    target_reps: Option<u32>,
    target_weight: Option<f64>,
    target_duration_seconds: Option<u32>,
    categories_json: String,
    equipment_json: String,
    active: bool,
    notes: Option<String>,
    created_at: String,
}

impl GoalRow {
    fn from_row(row: &rusqlite::Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            cycle: row.get(2)?,
            exercise_name: row.get(3)?,
            target_sets: row.get(4)?,
            target_reps: row.get(5)?,
            target_weight: row.get(6)?,
            target_duration_seconds: row.get(7)?,
            categories_json: row.get(8)?,
            equipment_json: row.get(9)?,
            active: row.get(10)?,
            notes: row.get(11)?,
            created_at: row.get(12)?,
        })
    }

    fn into_goal(self) -> Result<Goal, DatabaseError> {
        Ok(Goal {
            id: parse_uuid(&self.id, "goal")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            cycle: self.cycle,
            exercise_name: self.exercise_name,
            target_sets: self.target_sets,
            target_reps: self.target_reps,
            target_weight: self.target_weight,
            target_duration_seconds: self.target_duration_seconds,
            categories: parse_tags(&self.categories_json)?,
            equipment: parse_tags(&self.equipment_json)?,
            active: self.active,
            notes: self.notes,
            created_at: parse_timestamp(&self.created_at, "created date")?,
            performance: None,
        })
    }
}

/// Intermediate struct for reading log rows from database.
struct LogRow {
    id: String,
    goal_id: String,
    user_id: String,
    cycle: u32,
    reps: u32,
    weight: Option<f64>,
    duration_seconds: Option<u32>,
    failed: bool,
    notes: Option<String>,
    logged_at: String,
}

impl LogRow {
    fn from_row(row: &rusqlite::Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get(0)?,
            goal_id: row.get(1)?,
            user_id: row.get(2)?,
            cycle: row.get(3)?,
            reps: row.get(4)?,
            weight: row.get(5)?,
            duration_seconds: row.get(6)?,
            failed: row.get(7)?,
            notes: row.get(8)?,
            logged_at: row.get(9)?,
        })
    }

    fn into_entry(self) -> Result<DoneExerciseLogEntry, DatabaseError> {
        Ok(DoneExerciseLogEntry {
            id: parse_uuid(&self.id, "log entry")?,
            goal_id: parse_uuid(&self.goal_id, "goal")?,
            user_id: parse_uuid(&self.user_id, "user")?,
            cycle: self.cycle,
            reps: self.reps,
            weight: self.weight,
            duration_seconds: self.duration_seconds,
            failed: self.failed,
            notes: self.notes,
            logged_at: parse_timestamp(&self.logged_at, "log date")?,
        })
    }
}

impl GoalStore for Database {
    async fn list_active_goals(&self, user_id: Uuid, cycle: u32) -> Result<Vec<Goal>, StoreError> {
        Ok(self.active_goals(user_id, cycle)?)
    }

    async fn set_goal_active(&self, goal_id: Uuid, active: bool) -> Result<Goal, StoreError> {
        match self.update_goal_active(goal_id, active) {
            Err(DatabaseError::NotFound(_)) => Err(StoreError::GoalNotFound(goal_id)),
            other => Ok(other?),
        }
    }

    async fn bulk_insert_goals(
        &self,
        user_id: Uuid,
        cycle: u32,
        proposals: &[ProposedGoal],
    ) -> Result<Vec<Goal>, StoreError> {
        Ok(self.insert_proposals(user_id, cycle, proposals)?)
    }

    async fn list_cycles_for_user(&self, user_id: Uuid) -> Result<Vec<u32>, StoreError> {
        Ok(self.cycles_for_user(user_id)?)
    }
}

impl LogStore for Database {
    async fn append_entry(&self, entry: NewLogEntry) -> Result<DoneExerciseLogEntry, StoreError> {
        Ok(self.insert_log_entry(entry)?)
    }

    async fn list_entries_for_cycle(
        &self,
        user_id: Uuid,
        cycle: u32,
    ) -> Result<Vec<DoneExerciseLogEntry>, StoreError> {
        Ok(self.log_entries(user_id, cycle)?)
    }
}

/// Database errors.
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}
