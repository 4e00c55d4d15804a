//! Database schema definitions for repcycle.

/// SQL schema for creating all database tables.
pub const SCHEMA: &str = r#"
-- Goals table: one row per planned exercise per cycle
CREATE TABLE IF NOT EXISTS goals (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    cycle INTEGER NOT NULL,
    exercise_name TEXT NOT NULL,
    target_sets INTEGER NOT NULL DEFAULT 0,
    target_reps INTEGER,
    target_weight REAL,
    target_duration_seconds INTEGER,
    categories_json TEXT NOT NULL DEFAULT '[]',
    equipment_json TEXT NOT NULL DEFAULT '[]',
    active INTEGER NOT NULL DEFAULT 1,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_goals_user_cycle ON goals(user_id, cycle);

-- Done exercise log: append-only, one row per completed set
CREATE TABLE IF NOT EXISTS done_exercise_log (
    id TEXT PRIMARY KEY,
    goal_id TEXT NOT NULL REFERENCES goals(id),
    user_id TEXT NOT NULL,
    cycle INTEGER NOT NULL,
    reps INTEGER NOT NULL DEFAULT 0,
    weight REAL,
    duration_seconds INTEGER,
    failed INTEGER NOT NULL DEFAULT 0,
    notes TEXT,
    logged_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_done_exercise_log_user_cycle ON done_exercise_log(user_id, cycle);
CREATE INDEX IF NOT EXISTS idx_done_exercise_log_goal ON done_exercise_log(goal_id);
"#;

/// Schema version table.
pub const SCHEMA_VERSION_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// Current schema version.
pub const CURRENT_VERSION: i32 = 1;
